use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::structure::NormalizeStats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentTree {
    Leaf(String),
    Sequence(Vec<SegmentTree>),
    Keyed(Vec<(String, SegmentTree)>),
}

impl SegmentTree {
    pub fn empty() -> Self {
        SegmentTree::Sequence(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SegmentTree::Leaf(_) => false,
            SegmentTree::Sequence(items) => items.is_empty(),
            SegmentTree::Keyed(entries) => entries.is_empty(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            SegmentTree::Leaf(_) => 0,
            SegmentTree::Sequence(items) => {
                1 + items.iter().map(SegmentTree::depth).max().unwrap_or(0)
            }
            SegmentTree::Keyed(entries) => {
                1 + entries
                    .iter()
                    .map(|(_, value)| value.depth())
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            SegmentTree::Leaf(_) => 1,
            SegmentTree::Sequence(items) => items.iter().map(SegmentTree::leaf_count).sum(),
            SegmentTree::Keyed(entries) => entries.iter().map(|(_, value)| value.leaf_count()).sum(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SegmentTree> {
        match self {
            SegmentTree::Keyed(entries) => entries
                .iter()
                .find(|(label, _)| label == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        match self {
            SegmentTree::Keyed(entries) => entries.iter().map(|(label, _)| label.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

impl Serialize for SegmentTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SegmentTree::Leaf(text) => serializer.serialize_str(text),
            SegmentTree::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            SegmentTree::Keyed(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (label, value) in entries {
                    map.serialize_entry(label, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for SegmentTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SegmentTreeVisitor)
    }
}

struct SegmentTreeVisitor;

impl<'de> Visitor<'de> for SegmentTreeVisitor {
    type Value = SegmentTree;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string, an array of segments or an object of labeled segments")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<SegmentTree, E> {
        Ok(SegmentTree::Leaf(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<SegmentTree, E> {
        Ok(SegmentTree::Leaf(value))
    }

    // Absent values in stored artifacts read back as empty levels.
    fn visit_unit<E: de::Error>(self) -> Result<SegmentTree, E> {
        Ok(SegmentTree::empty())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<SegmentTree, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<SegmentTree>()? {
            items.push(item);
        }
        Ok(SegmentTree::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<SegmentTree, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((label, value)) = map.next_entry::<String, SegmentTree>()? {
            entries.push((label, value));
        }
        Ok(SegmentTree::Keyed(entries))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub segments: SegmentTree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Chaptered,
    TwoLevel,
    ThreeLevel,
    Flat,
}

impl StructureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StructureKind::Chaptered => "chaptered",
            StructureKind::TwoLevel => "two_level",
            StructureKind::ThreeLevel => "three_level",
            StructureKind::Flat => "flat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TocKind {
    Document,
    Chapter,
    Section,
    Article,
}

impl TocKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            TocKind::Document => "doc",
            TocKind::Chapter => "ch",
            TocKind::Section => "sec",
            TocKind::Article => "art",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TocKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TocNode>>,
}

impl TocNode {
    pub fn children(&self) -> &[TocNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn count_kind(&self, kind: TocKind) -> usize {
        let own = usize::from(self.kind == kind);
        own + self
            .children()
            .iter()
            .map(|child| child.count_kind(kind))
            .sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub chapters: usize,
    pub sections: usize,
    pub articles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_index: usize,
    pub title: Option<String>,
    pub content: String,
    pub section_path: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk_id: String,
    pub doc_id: String,
    #[serde(flatten)]
    pub chunk: Chunk,
    pub embedding_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocArtifact {
    pub toc: TocNode,
    pub counts: Counts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactPaths {
    pub doc_dir: String,
    pub content: String,
    pub normalized: String,
    pub segments: String,
    pub toc: String,
    pub chunks: String,
    pub segment_lines: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRunEntry {
    pub source: String,
    pub status: String,
    pub doc_id: Option<String>,
    pub title: Option<String>,
    pub structure_kind: Option<StructureKind>,
    pub counts: Option<Counts>,
    pub chunk_count: usize,
    pub normalize_stats: Option<NormalizeStats>,
    pub artifacts: Option<ArtifactPaths>,
    pub failure_reason: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub rules_source: String,
    pub output_dir: String,
    pub document_count: usize,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub documents: Vec<DocumentRunEntry>,
    pub notes: Vec<String>,
}
