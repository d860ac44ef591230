use std::collections::HashMap;
use std::path::Path;

use anyhow::{Result, bail, ensure};
use chrono::Utc;
use tracing::{info, warn};

use policy_structure::model::{
    ArtifactPaths, Chunk, DocumentRunEntry, ParseRunManifest, StoredChunk, TocArtifact,
};
use policy_structure::structure::{ParsedDocument, StructureParser, segment_lines};
use policy_structure::util::{
    now_utc_string, read_text, sha256_hex, utc_compact_string, write_json_pretty, write_text,
};

use super::load_rules;
use crate::cli::ParseArgs;

const DOC_ID_LEN: usize = 16;
const CHUNK_ID_LEN: usize = 32;
const EMBEDDING_PENDING: &str = "pending";

pub fn run(args: ParseArgs) -> Result<()> {
    ensure!(
        args.file_name.is_none() || args.inputs.len() == 1,
        "--file-name applies to a single --input only ({} given)",
        args.inputs.len()
    );

    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let (rules, rules_source) = load_rules(args.rules.as_deref())?;
    let parser = StructureParser::new(&rules)?;
    let output_dir = (!args.dry_run).then_some(args.output_dir.as_path());

    info!(run_id = %run_id, inputs = args.inputs.len(), rules = %rules_source, "starting parse");

    let mut documents = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let file_name = args.file_name.clone().or_else(|| display_name(input));
        let entry = read_text(input).and_then(|raw| {
            process_document(
                &parser,
                &input.display().to_string(),
                &raw,
                file_name.as_deref(),
                output_dir,
            )
        });

        match entry {
            Ok(entry) => documents.push(entry),
            Err(err) => {
                warn!(document = %input.display(), error = %format!("{err:#}"), "document failed");
                documents.push(failed_entry(input, &format!("{err:#}")));
            }
        }
    }

    let failed_count = documents.iter().filter(|entry| entry.status == "failed").count();
    let succeeded_count = documents.len() - failed_count;

    let manifest = ParseRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: if failed_count == 0 { "completed" } else { "completed_with_failures" }.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_parse_command(&args),
        rules_source,
        output_dir: args.output_dir.display().to_string(),
        document_count: documents.len(),
        succeeded_count,
        failed_count,
        documents,
        notes: vec![
            "Segments, table of contents and chunks are derived from normalized text.".to_string(),
        ],
    };

    if args.dry_run {
        info!(succeeded = succeeded_count, failed = failed_count, "parse dry-run complete");
    } else {
        let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
            args.output_dir
                .join("manifests")
                .join(format!("parse_run_{}.json", utc_compact_string(started_ts)))
        });
        write_json_pretty(&manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote parse run manifest");
        info!(succeeded = succeeded_count, failed = failed_count, "parse completed");
    }

    if failed_count > 0 {
        bail!("{failed_count} of {} documents failed", manifest.document_count);
    }

    Ok(())
}

pub(crate) fn process_document(
    parser: &StructureParser,
    source: &str,
    raw: &str,
    file_name: Option<&str>,
    output_dir: Option<&Path>,
) -> Result<DocumentRunEntry> {
    let doc_id = document_id(raw);
    let parsed = parser.parse(raw, file_name);

    info!(
        document = %source,
        doc_id = %doc_id,
        kind = parsed.kind.as_str(),
        chapters = parsed.counts.chapters,
        sections = parsed.counts.sections,
        articles = parsed.counts.articles,
        chunks = parsed.chunks.len(),
        "parsed document"
    );

    let artifacts = match output_dir {
        Some(root) => Some(write_artifacts(root, &doc_id, raw, file_name, &parsed)?),
        None => None,
    };

    Ok(DocumentRunEntry {
        source: source.to_string(),
        status: "succeeded".to_string(),
        doc_id: Some(doc_id),
        title: Some(parsed.document.title.clone()),
        structure_kind: Some(parsed.kind),
        counts: Some(parsed.counts),
        chunk_count: parsed.chunks.len(),
        normalize_stats: Some(parsed.normalize_stats),
        artifacts,
        failure_reason: None,
        warnings: parsed.warnings,
    })
}

fn write_artifacts(
    root: &Path,
    doc_id: &str,
    raw: &str,
    file_name: Option<&str>,
    parsed: &ParsedDocument,
) -> Result<ArtifactPaths> {
    let doc_dir = root.join("docs").join(doc_id);
    let content = doc_dir.join("content.txt");
    let normalized = doc_dir.join("normalized.txt");
    let segments = doc_dir.join("segments.json");
    let toc = doc_dir.join("toc.json");
    let chunks = doc_dir.join("chunks.json");
    let lines = doc_dir.join("segments.txt");

    write_text(&content, raw)?;
    write_text(&normalized, &parsed.normalized)?;
    write_json_pretty(&segments, &parsed.document)?;
    write_json_pretty(
        &toc,
        &TocArtifact {
            toc: parsed.toc.clone(),
            counts: parsed.counts,
        },
    )?;
    write_json_pretty(&chunks, &stored_chunks(doc_id, &parsed.chunks))?;

    let mut rendered = segment_lines(&parsed.document.segments, file_name).join("\n");
    if !rendered.is_empty() {
        rendered.push('\n');
    }
    write_text(&lines, &rendered)?;

    Ok(ArtifactPaths {
        doc_dir: doc_dir.display().to_string(),
        content: content.display().to_string(),
        normalized: normalized.display().to_string(),
        segments: segments.display().to_string(),
        toc: toc.display().to_string(),
        chunks: chunks.display().to_string(),
        segment_lines: lines.display().to_string(),
    })
}

pub(crate) fn document_id(raw: &str) -> String {
    sha256_hex(raw.as_bytes())[..DOC_ID_LEN].to_string()
}

pub(crate) fn stored_chunks(doc_id: &str, chunks: &[Chunk]) -> Vec<StoredChunk> {
    let mut seen = HashMap::<String, usize>::new();

    chunks
        .iter()
        .map(|chunk| {
            let identity = format!(
                "{}\u{1f}{}\u{1f}{}\u{1f}{}",
                doc_id,
                chunk.section_path.join("\u{1e}"),
                chunk.title.as_deref().unwrap_or(""),
                chunk.content
            );
            let occurrence = seen.entry(identity.clone()).or_insert(0);
            *occurrence += 1;
            let digest = sha256_hex(format!("{identity}\u{1f}{occurrence}").as_bytes());

            StoredChunk {
                chunk_id: digest[..CHUNK_ID_LEN].to_string(),
                doc_id: doc_id.to_string(),
                chunk: chunk.clone(),
                embedding_status: EMBEDDING_PENDING.to_string(),
            }
        })
        .collect()
}

fn failed_entry(input: &Path, reason: &str) -> DocumentRunEntry {
    DocumentRunEntry {
        source: input.display().to_string(),
        status: "failed".to_string(),
        doc_id: None,
        title: None,
        structure_kind: None,
        counts: None,
        chunk_count: 0,
        normalize_stats: None,
        artifacts: None,
        failure_reason: Some(reason.to_string()),
        warnings: Vec::new(),
    }
}

fn display_name(input: &Path) -> Option<String> {
    input
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
}

pub(crate) fn render_parse_command(args: &ParseArgs) -> String {
    let mut command = vec!["policy-structure".to_string(), "parse".to_string()];

    for input in &args.inputs {
        command.push("--input".to_string());
        command.push(input.display().to_string());
    }
    if let Some(name) = &args.file_name {
        command.push("--file-name".to_string());
        command.push(name.clone());
    }
    command.push("--output-dir".to_string());
    command.push(args.output_dir.display().to_string());
    if let Some(path) = &args.rules {
        command.push("--rules".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if args.dry_run {
        command.push("--dry-run".to_string());
    }

    command.join(" ")
}

