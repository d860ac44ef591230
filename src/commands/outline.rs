use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use tracing::info;

use policy_structure::model::{Chunk, Counts, Document, SegmentTree, TocNode};
use policy_structure::structure::StructureParser;

use crate::cli::OutlineArgs;

pub(crate) const MAX_SEGMENT_DEPTH: usize = 32;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredSegments {
    Document(Document),
    Tree(SegmentTree),
}

#[derive(Debug, Serialize)]
pub(crate) struct Outline {
    pub title: Option<String>,
    pub toc: TocNode,
    pub counts: Counts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<Chunk>>,
}

pub fn run(args: OutlineArgs) -> Result<()> {
    let parser = StructureParser::with_default_rules()?;
    let outline = build_outline(&parser, &args.segments, args.chunks)?;

    info!(
        path = %args.segments.display(),
        chapters = outline.counts.chapters,
        sections = outline.counts.sections,
        articles = outline.counts.articles,
        "rebuilt outline"
    );

    let rendered = serde_json::to_string_pretty(&outline).context("failed to render outline")?;
    println!("{rendered}");

    Ok(())
}

pub(crate) fn build_outline(
    parser: &StructureParser,
    path: &Path,
    with_chunks: bool,
) -> Result<Outline> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let stored: StoredSegments = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse segments {}", path.display()))?;

    let (title, tree) = match stored {
        StoredSegments::Document(document) => (Some(document.title), document.segments),
        StoredSegments::Tree(tree) => (None, tree),
    };

    let depth = tree.depth();
    ensure!(
        depth <= MAX_SEGMENT_DEPTH,
        "segments in {} nest {} levels deep (limit {})",
        path.display(),
        depth,
        MAX_SEGMENT_DEPTH
    );

    let (toc, counts) = parser.build_toc(&tree);
    let chunks = with_chunks.then(|| parser.flatten(&tree));

    Ok(Outline {
        title,
        toc,
        counts,
        chunks,
    })
}
