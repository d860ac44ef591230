use crate::model::{Chunk, SegmentTree};

use super::patterns::HeadingPatterns;

pub(crate) fn flatten_chunks(patterns: &HeadingPatterns, tree: &SegmentTree) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut path = Vec::new();
    collect_chunks(patterns, tree, &mut path, &mut chunks);
    chunks
}

fn collect_chunks(
    patterns: &HeadingPatterns,
    tree: &SegmentTree,
    path: &mut Vec<String>,
    chunks: &mut Vec<Chunk>,
) {
    match tree {
        SegmentTree::Leaf(text) => {
            let (title, content) = match patterns.split_article(text) {
                Some((marker, body)) => (Some(marker.to_string()), body.to_string()),
                None => (None, text.trim().to_string()),
            };
            chunks.push(Chunk {
                chunk_index: chunks.len(),
                title,
                content,
                section_path: path.clone(),
            });
        }
        SegmentTree::Sequence(items) => {
            for item in items {
                collect_chunks(patterns, item, path, chunks);
            }
        }
        SegmentTree::Keyed(entries) => {
            for (label, value) in entries {
                path.push(label.clone());
                collect_chunks(patterns, value, path, chunks);
                path.pop();
            }
        }
    }
}

pub fn segment_lines(tree: &SegmentTree, file_name: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut path = Vec::new();
    collect_lines(tree, &mut path, file_name, &mut lines);
    lines
}

fn collect_lines<'t>(
    tree: &'t SegmentTree,
    path: &mut Vec<&'t str>,
    file_name: Option<&str>,
    lines: &mut Vec<String>,
) {
    match tree {
        SegmentTree::Leaf(text) => {
            let text = text.trim();
            if text.is_empty() {
                return;
            }
            let prefix = path
                .iter()
                .copied()
                .filter(|label| !label.is_empty())
                .collect::<Vec<&str>>()
                .join(" ");
            let line = match file_name {
                Some(name) => format!("{name} {prefix} {text}"),
                None => format!("{prefix} {text}"),
            };
            lines.push(line.split_whitespace().collect::<Vec<&str>>().join(" "));
        }
        SegmentTree::Sequence(items) => {
            for item in items {
                collect_lines(item, path, file_name, lines);
            }
        }
        SegmentTree::Keyed(entries) => {
            for (label, value) in entries {
                path.push(label.as_str());
                collect_lines(value, path, file_name, lines);
                path.pop();
            }
        }
    }
}
