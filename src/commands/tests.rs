use std::fs;
use std::path::PathBuf;

use policy_structure::model::{Document, StoredChunk, StructureKind, TocArtifact};
use policy_structure::structure::StructureParser;
use tempfile::tempdir;

use super::outline::{MAX_SEGMENT_DEPTH, build_outline};
use super::parse::{document_id, process_document, render_parse_command, stored_chunks};
use super::{BUILTIN_RULES, load_rules};
use crate::cli::ParseArgs;

const CHAPTERED: &str = "绿色电力交易管理办法\n第一章 总则\n第一条 本办法适用于绿色电力交易。\n第二条 市场交易遵循公开原则。\n第二章 附则\n第三条 本办法自发布之日起施行。\n";

fn parser() -> StructureParser {
    StructureParser::with_default_rules().expect("default rules compile")
}

fn parse_args(inputs: Vec<PathBuf>, output_dir: PathBuf) -> ParseArgs {
    ParseArgs {
        inputs,
        file_name: None,
        output_dir,
        rules: None,
        manifest_path: None,
        dry_run: false,
    }
}

#[test]
fn process_document_writes_every_artifact() {
    let dir = tempdir().expect("tempdir");
    let parser = parser();

    let entry = process_document(
        &parser,
        "inputs/办法.txt",
        CHAPTERED,
        Some("办法.txt"),
        Some(dir.path()),
    )
    .expect("document processes");

    assert_eq!(entry.status, "succeeded");
    assert_eq!(entry.structure_kind, Some(StructureKind::Chaptered));
    assert_eq!(entry.title.as_deref(), Some("办法"));
    assert_eq!(entry.chunk_count, 3);

    let doc_id = document_id(CHAPTERED);
    assert_eq!(entry.doc_id.as_deref(), Some(doc_id.as_str()));
    let doc_dir = dir.path().join("docs").join(&doc_id);

    let content = fs::read_to_string(doc_dir.join("content.txt")).expect("content.txt");
    assert_eq!(content, CHAPTERED);

    let segments: Document = serde_json::from_str(
        &fs::read_to_string(doc_dir.join("segments.json")).expect("segments.json"),
    )
    .expect("segments.json parses");
    assert_eq!(segments.title, "办法");
    assert_eq!(segments.segments.keys(), vec!["第一章 总则", "第二章 附则"]);

    let toc: TocArtifact =
        serde_json::from_str(&fs::read_to_string(doc_dir.join("toc.json")).expect("toc.json"))
            .expect("toc.json parses");
    assert_eq!(toc.counts.chapters, 2);
    assert_eq!(toc.counts.articles, 3);

    let chunks: Vec<StoredChunk> = serde_json::from_str(
        &fs::read_to_string(doc_dir.join("chunks.json")).expect("chunks.json"),
    )
    .expect("chunks.json parses");
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|chunk| chunk.doc_id == doc_id));
    assert!(chunks.iter().all(|chunk| chunk.embedding_status == "pending"));
    assert_eq!(chunks[2].chunk.section_path, vec!["第二章 附则".to_string()]);

    let lines = fs::read_to_string(doc_dir.join("segments.txt")).expect("segments.txt");
    assert_eq!(
        lines.lines().next(),
        Some("办法.txt 第一章 总则 第一条 本办法适用于绿色电力交易。")
    );
    assert!(doc_dir.join("normalized.txt").exists());
}

#[test]
fn dry_run_processing_writes_nothing() {
    let dir = tempdir().expect("tempdir");
    let entry = process_document(&parser(), "a.txt", CHAPTERED, None, None)
        .expect("document processes");

    assert!(entry.artifacts.is_none());
    assert_eq!(entry.title.as_deref(), Some("绿色电力交易管理办法"));
    assert!(fs::read_dir(dir.path()).expect("read dir").next().is_none());
}

#[test]
fn document_id_is_stable_content_hash() {
    let id = document_id(CHAPTERED);
    assert_eq!(id.len(), 16);
    assert!(id.chars().all(|ch| ch.is_ascii_hexdigit()));
    assert_eq!(id, document_id(CHAPTERED));
    assert_ne!(id, document_id("第一条 内容"));
}

#[test]
fn chunk_ids_are_unique_and_independent_of_position() {
    let parser = parser();
    let parsed = parser.parse("第一条 甲\n第一条 甲\n第二条 乙", None);
    let stored = stored_chunks("abc", &parsed.chunks);

    assert_eq!(stored.len(), 3);
    assert_ne!(stored[0].chunk_id, stored[1].chunk_id);
    assert!(stored.iter().all(|chunk| chunk.chunk_id.len() == 32));

    let only_second = stored_chunks("abc", &parsed.chunks[2..]);
    assert_eq!(only_second[0].chunk_id, stored[2].chunk_id);

    let other_doc = stored_chunks("def", &parsed.chunks);
    assert_ne!(other_doc[2].chunk_id, stored[2].chunk_id);
}

#[test]
fn run_records_failures_in_manifest_and_reports_error() {
    let dir = tempdir().expect("tempdir");
    let good = dir.path().join("good.txt");
    fs::write(&good, CHAPTERED).expect("write input");
    let missing = dir.path().join("missing.txt");
    let manifest_path = dir.path().join("manifest.json");

    let mut args = parse_args(vec![good, missing], dir.path().join("out"));
    args.manifest_path = Some(manifest_path.clone());

    let err = super::parse::run(args).expect_err("missing input fails the run");
    assert!(format!("{err:#}").contains("1 of 2 documents failed"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).expect("manifest"))
            .expect("manifest parses");
    assert_eq!(manifest["status"], "completed_with_failures");
    assert_eq!(manifest["succeeded_count"], 1);
    assert_eq!(manifest["failed_count"], 1);
    assert_eq!(manifest["documents"][0]["status"], "succeeded");
    assert_eq!(manifest["documents"][1]["status"], "failed");
    assert!(
        manifest["documents"][1]["failure_reason"]
            .as_str()
            .unwrap_or_default()
            .contains("missing.txt")
    );
}

#[test]
fn run_rejects_file_name_with_several_inputs() {
    let dir = tempdir().expect("tempdir");
    let mut args = parse_args(
        vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")],
        dir.path().to_path_buf(),
    );
    args.file_name = Some("办法.pdf".to_string());

    let err = super::parse::run(args).expect_err("ambiguous file name");
    assert!(err.to_string().contains("--file-name"));
}

#[test]
fn outline_rebuilds_toc_from_written_segments() {
    let dir = tempdir().expect("tempdir");
    let parser = parser();
    let entry = process_document(&parser, "a.txt", CHAPTERED, None, Some(dir.path()))
        .expect("document processes");
    let segments_path = PathBuf::from(entry.artifacts.expect("artifacts written").segments);

    let outline = build_outline(&parser, &segments_path, true).expect("outline builds");
    assert_eq!(outline.title.as_deref(), Some("绿色电力交易管理办法"));
    assert_eq!(outline.counts, entry.counts.expect("counts recorded"));
    assert_eq!(outline.chunks.map(|chunks| chunks.len()), Some(3));
}

#[test]
fn outline_accepts_a_bare_segment_tree() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("tree.json");
    fs::write(&path, r#"{"第一章 总则": ["第一条 甲"], "第二章 附则": []}"#).expect("write tree");

    let outline = build_outline(&parser(), &path, false).expect("outline builds");
    assert_eq!(outline.title, None);
    assert_eq!(outline.counts.chapters, 2);
    assert_eq!(outline.counts.articles, 1);
    assert!(outline.chunks.is_none());
}

#[test]
fn outline_rejects_pathologically_deep_segments() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("deep.json");
    let depth = MAX_SEGMENT_DEPTH + 8;
    let nested = format!("{}\"第一条 甲\"{}", "[".repeat(depth), "]".repeat(depth));
    fs::write(&path, nested).expect("write tree");

    let err = build_outline(&parser(), &path, false).expect_err("too deep");
    assert!(err.to_string().contains("levels deep"));
}

#[test]
fn render_parse_command_lists_every_flag() {
    let mut args = parse_args(
        vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")],
        PathBuf::from("out"),
    );
    args.rules = Some(PathBuf::from("rules.json"));
    args.dry_run = true;

    assert_eq!(
        render_parse_command(&args),
        "policy-structure parse --input a.txt --input b.txt --output-dir out --rules rules.json --dry-run"
    );
}

#[test]
fn load_rules_defaults_to_builtin_table() {
    let (_, source) = load_rules(None).expect("builtin rules");
    assert_eq!(source, BUILTIN_RULES);

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("rules.json");
    fs::write(&path, r#"{"boilerplate_lines": ["^内部资料$"]}"#).expect("write rules");
    let (rules, source) = load_rules(Some(&path)).expect("rules load");
    assert_eq!(rules.boilerplate_lines, vec!["^内部资料$".to_string()]);
    assert_eq!(source, path.display().to_string());
}
