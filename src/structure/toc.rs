use crate::model::{Counts, SegmentTree, TocKind, TocNode};

use super::hierarchy::{CHAPTER_PREFACE_KEY, DOCUMENT_PREFACE_KEY};
use super::patterns::HeadingPatterns;

const CHAPTER_MARKER: char = '章';

pub(crate) fn build_toc(patterns: &HeadingPatterns, tree: &SegmentTree) -> (TocNode, Counts) {
    let mut builder = TocBuilder {
        patterns,
        counts: Counts::default(),
    };

    let mut children = Vec::new();
    builder.document_children(tree, &mut children);

    let root = TocNode {
        id: format!("{}-1", TocKind::Document.id_prefix()),
        kind: TocKind::Document,
        label: None,
        index: None,
        text: None,
        children: Some(children),
    };
    (root, builder.counts)
}

struct TocBuilder<'p> {
    patterns: &'p HeadingPatterns,
    counts: Counts,
}

impl TocBuilder<'_> {
    fn document_children(&mut self, tree: &SegmentTree, out: &mut Vec<TocNode>) {
        match tree {
            SegmentTree::Leaf(text) => out.push(self.article(text)),
            SegmentTree::Sequence(items) => {
                for item in items {
                    self.document_children(item, out);
                }
            }
            SegmentTree::Keyed(entries) => {
                for (label, value) in entries {
                    if label == DOCUMENT_PREFACE_KEY {
                        self.articles_into(value, out);
                    } else if is_chapter(label, value) {
                        let chapter = self.chapter(label, value);
                        out.push(chapter);
                    } else {
                        self.articles_into(value, out);
                    }
                }
            }
        }
    }

    fn chapter(&mut self, label: &str, value: &SegmentTree) -> TocNode {
        self.counts.chapters += 1;
        let index = self.counts.chapters;

        let mut children = Vec::new();
        match value {
            SegmentTree::Keyed(entries) => {
                for (key, section_value) in entries {
                    if key == CHAPTER_PREFACE_KEY {
                        self.articles_into(section_value, &mut children);
                    } else {
                        let section = self.section(key, section_value);
                        children.push(section);
                    }
                }
            }
            other => self.articles_into(other, &mut children),
        }

        branch(TocKind::Chapter, label, index, children)
    }

    fn section(&mut self, label: &str, value: &SegmentTree) -> TocNode {
        self.counts.sections += 1;
        let index = self.counts.sections;

        let mut children = Vec::new();
        self.articles_into(value, &mut children);

        branch(TocKind::Section, label, index, children)
    }

    fn articles_into(&mut self, value: &SegmentTree, out: &mut Vec<TocNode>) {
        match value {
            SegmentTree::Leaf(text) => out.push(self.article(text)),
            SegmentTree::Sequence(items) => {
                for item in items {
                    self.articles_into(item, out);
                }
            }
            SegmentTree::Keyed(entries) => {
                for (_, nested) in entries {
                    self.articles_into(nested, out);
                }
            }
        }
    }

    fn article(&mut self, line: &str) -> TocNode {
        self.counts.articles += 1;
        let index = self.counts.articles;

        let (label, text) = match self.patterns.split_article(line) {
            Some((marker, body)) => (
                Some(marker.to_string()),
                format!("{marker} {body}").trim().to_string(),
            ),
            None => (None, line.trim().to_string()),
        };

        TocNode {
            id: format!("{}-{index}", TocKind::Article.id_prefix()),
            kind: TocKind::Article,
            label,
            index: Some(index),
            text: Some(text),
            children: None,
        }
    }
}

fn is_chapter(label: &str, value: &SegmentTree) -> bool {
    if label.contains(CHAPTER_MARKER) {
        return true;
    }

    match value {
        SegmentTree::Keyed(_) => true,
        SegmentTree::Sequence(items) => items
            .iter()
            .any(|item| matches!(item, SegmentTree::Keyed(_))),
        SegmentTree::Leaf(_) => false,
    }
}

fn branch(kind: TocKind, label: &str, index: usize, children: Vec<TocNode>) -> TocNode {
    TocNode {
        id: format!("{}-{index}", kind.id_prefix()),
        kind,
        label: Some(label.to_string()),
        index: Some(index),
        text: None,
        children: Some(children),
    }
}
