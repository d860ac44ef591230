use std::path::Path;

use anyhow::Result;
use tracing::{debug, warn};

use crate::model::{Chunk, Counts, Document, SegmentTree, StructureKind, TocNode};

mod chunks;
mod detect;
mod hierarchy;
mod normalize;
mod patterns;
mod rules;
mod toc;

pub use chunks::segment_lines;
pub use hierarchy::{
    CHAPTER_PREFACE_KEY, DOCUMENT_PREFACE_KEY, LEVEL1_PREFACE_KEY, THREE_LEVEL_PREFACE_KEY,
};
pub use normalize::NormalizeStats;
pub use rules::NormalizeRules;

use normalize::Normalizer;
use patterns::HeadingPatterns;

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub kind: StructureKind,
    pub normalized: String,
    pub document: Document,
    pub toc: TocNode,
    pub counts: Counts,
    pub chunks: Vec<Chunk>,
    pub normalize_stats: NormalizeStats,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct StructureParser {
    normalizer: Normalizer,
    patterns: HeadingPatterns,
}

impl StructureParser {
    pub fn new(rules: &NormalizeRules) -> Result<Self> {
        Ok(Self {
            normalizer: Normalizer::new(rules.compile()?),
            patterns: HeadingPatterns::new()?,
        })
    }

    pub fn with_default_rules() -> Result<Self> {
        Self::new(&NormalizeRules::default())
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.normalizer.normalize(raw).0
    }

    pub fn normalize_with_stats(&self, raw: &str) -> (String, NormalizeStats) {
        self.normalizer.normalize(raw)
    }

    pub fn detect(&self, normalized: &str) -> StructureKind {
        detect::detect_structure(&self.patterns, normalized)
    }

    pub fn build(&self, normalized: &str, kind: StructureKind) -> SegmentTree {
        hierarchy::build_hierarchy(&self.patterns, normalized, kind)
    }

    pub fn build_toc(&self, tree: &SegmentTree) -> (TocNode, Counts) {
        toc::build_toc(&self.patterns, tree)
    }

    pub fn flatten(&self, tree: &SegmentTree) -> Vec<Chunk> {
        chunks::flatten_chunks(&self.patterns, tree)
    }

    pub fn document_title(&self, file_name: Option<&str>, normalized: &str) -> String {
        if let Some(title) = file_name.and_then(title_from_file_name) {
            return title;
        }

        normalized
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !self.patterns.title_skip.is_match(line))
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn parse(&self, raw: &str, file_name: Option<&str>) -> ParsedDocument {
        let (normalized, normalize_stats) = self.normalize_with_stats(raw);
        let title = self.document_title(file_name, &normalized);
        let kind = self.detect(&normalized);
        let segments = self.build(&normalized, kind);
        let (toc, counts) = self.build_toc(&segments);
        let chunks = self.flatten(&segments);

        let mut warnings = Vec::new();
        for line in normalize::suspect_lines(&normalized) {
            warn!(line = %line, "line looks like a page marker no rule recognizes");
            warnings.push(format!("possible unrecognized page marker: {line}"));
        }
        if !normalize_stats.converged {
            warnings.push(format!(
                "normalization stopped after {} rounds without reaching a fixed point",
                normalize_stats.rounds
            ));
        }
        if segments.is_empty() && !normalized.is_empty() {
            warnings.push("no structural headings recognized; document produced no segments".to_string());
        }

        debug!(
            kind = kind.as_str(),
            chapters = counts.chapters,
            sections = counts.sections,
            articles = counts.articles,
            chunks = chunks.len(),
            "parsed document structure"
        );

        ParsedDocument {
            kind,
            normalized,
            document: Document { title, segments },
            toc,
            counts,
            chunks,
            normalize_stats,
            warnings,
        }
    }
}

fn title_from_file_name(file_name: &str) -> Option<String> {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .or_else(|| path.file_name())
        .and_then(|name| name.to_str())?
        .trim();

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
