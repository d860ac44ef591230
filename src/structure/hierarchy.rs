use tracing::debug;

use crate::model::{SegmentTree, StructureKind};

use super::patterns::{HeadingBlock, HeadingPatterns, preamble, split_headings};

pub const DOCUMENT_PREFACE_KEY: &str = "前置条款";
pub const CHAPTER_PREFACE_KEY: &str = "章节前置条款";
pub const LEVEL1_PREFACE_KEY: &str = "前置内容";
pub const THREE_LEVEL_PREFACE_KEY: &str = "";

pub(crate) fn build_hierarchy(
    patterns: &HeadingPatterns,
    text: &str,
    kind: StructureKind,
) -> SegmentTree {
    match kind {
        StructureKind::Chaptered => build_chaptered(patterns, text),
        StructureKind::TwoLevel => build_two_level(patterns, text),
        StructureKind::ThreeLevel => build_three_level(patterns, text),
        StructureKind::Flat => build_flat(patterns, text),
    }
}

#[derive(Debug, Default)]
struct KeyedLevel {
    entries: Vec<(String, SegmentTree)>,
}

impl KeyedLevel {
    fn insert(&mut self, label: &str, value: SegmentTree) {
        let mut key = label.to_string();
        let mut ordinal = 1usize;
        while self.entries.iter().any(|(existing, _)| *existing == key) {
            ordinal += 1;
            key = format!("{label} ({ordinal})");
        }
        if ordinal > 1 {
            debug!(label, key = %key, "renamed repeated heading");
        }
        self.entries.push((key, value));
    }

    fn extend(&mut self, tree: SegmentTree) {
        if let SegmentTree::Keyed(entries) = tree {
            for (label, value) in entries {
                self.insert(&label, value);
            }
        }
    }

    fn into_tree(self) -> SegmentTree {
        if self.entries.is_empty() {
            SegmentTree::empty()
        } else {
            SegmentTree::Keyed(self.entries)
        }
    }
}

fn build_chaptered(patterns: &HeadingPatterns, text: &str) -> SegmentTree {
    let Some(first_chapter) = patterns.chapter.find(text) else {
        return article_leaves(patterns, text);
    };

    let mut level = KeyedLevel::default();

    let preface = text[..first_chapter.start()].trim();
    if !preface.is_empty() {
        let numeral_preface = build_three_level(patterns, preface);
        if numeral_preface.is_empty() {
            let articles = article_leaves(patterns, preface);
            if !articles.is_empty() {
                level.insert(DOCUMENT_PREFACE_KEY, articles);
            }
        } else {
            level.extend(numeral_preface);
        }
    }

    for chapter in split_headings(&text[first_chapter.start()..], &patterns.chapter) {
        level.insert(chapter.heading, chapter_body(patterns, chapter.body));
    }

    level.into_tree()
}

fn chapter_body(patterns: &HeadingPatterns, body: &str) -> SegmentTree {
    let Some(before_sections) = preamble(body, &patterns.section) else {
        return article_leaves(patterns, body);
    };

    let mut sections = KeyedLevel::default();
    if !before_sections.is_empty() {
        let articles = article_leaves(patterns, before_sections);
        if !articles.is_empty() {
            sections.insert(CHAPTER_PREFACE_KEY, articles);
        }
    }

    for section in split_headings(body, &patterns.section) {
        sections.insert(section.heading, article_leaves(patterns, section.body));
    }

    sections.into_tree()
}

fn build_two_level(patterns: &HeadingPatterns, text: &str) -> SegmentTree {
    build_numeral_levels(patterns, text, LEVEL1_PREFACE_KEY, true)
}

// numbered `1.` items stay inside second-level text
fn build_three_level(patterns: &HeadingPatterns, text: &str) -> SegmentTree {
    build_numeral_levels(patterns, text, THREE_LEVEL_PREFACE_KEY, false)
}

fn build_numeral_levels(
    patterns: &HeadingPatterns,
    text: &str,
    preface_key: &str,
    inline_items: bool,
) -> SegmentTree {
    let mut level = KeyedLevel::default();

    for item in split_headings(text, &patterns.level1) {
        let value = match preamble(item.body, &patterns.level2) {
            None => single_or_empty(item.body),
            Some(before) => {
                let mut children = KeyedLevel::default();
                if !before.is_empty() {
                    children.insert(preface_key, single_or_empty(before));
                }
                for sub in split_headings(item.body, &patterns.level2) {
                    let content = if inline_items {
                        second_level_content(patterns, &sub)
                    } else {
                        single_or_empty(sub.body)
                    };
                    children.insert(sub.heading, content);
                }
                SegmentTree::Keyed(children.entries)
            }
        };
        level.insert(item.heading, value);
    }

    level.into_tree()
}

fn build_flat(patterns: &HeadingPatterns, text: &str) -> SegmentTree {
    let articles = article_leaves(patterns, text);
    if !articles.is_empty() {
        return articles;
    }

    let items = split_headings(text, &patterns.level3)
        .map(|block| block.joined())
        .filter(|joined| !joined.is_empty())
        .map(SegmentTree::Leaf)
        .collect();
    SegmentTree::Sequence(items)
}

fn article_leaves(patterns: &HeadingPatterns, text: &str) -> SegmentTree {
    let items = split_headings(text, &patterns.article)
        .map(|block| block.joined())
        .filter(|joined| !joined.is_empty())
        .map(SegmentTree::Leaf)
        .collect();
    SegmentTree::Sequence(items)
}

fn single_or_empty(text: &str) -> SegmentTree {
    let text = text.trim();
    if text.is_empty() {
        SegmentTree::empty()
    } else {
        SegmentTree::Sequence(vec![SegmentTree::Leaf(text.to_string())])
    }
}

// a one-line item carries its content after the marker
fn second_level_content(patterns: &HeadingPatterns, block: &HeadingBlock<'_>) -> SegmentTree {
    if !block.body.is_empty() {
        return single_or_empty(block.body);
    }

    let remainder = patterns
        .level2_marker
        .find(block.heading)
        .map(|marker| &block.heading[marker.end()..])
        .unwrap_or("");
    single_or_empty(remainder)
}
