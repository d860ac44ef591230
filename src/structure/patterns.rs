use std::iter::Peekable;

use anyhow::{Context, Result};
use regex::{Matches, Regex};

const CJK_NUMERALS: &str = "一二三四五六七八九十百千";

#[derive(Debug)]
pub(crate) struct HeadingPatterns {
    pub chapter: Regex,
    pub section: Regex,
    pub article: Regex,
    pub level1: Regex,
    pub level2: Regex,
    pub level3: Regex,
    pub level2_marker: Regex,
    pub article_marker: Regex,
    pub title_skip: Regex,
}

impl HeadingPatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            chapter: Regex::new(&format!(
                r"(?m)^[ \t]*第[ \t]*[{CJK_NUMERALS}O0-9０-９]+[ \t]*章[^\n]*"
            ))
            .context("failed to compile chapter heading regex")?,
            section: Regex::new(&format!(
                r"(?m)^[ \t]*第[ \t]*[{CJK_NUMERALS}O0-9０-９]+[ \t]*节[^\n]*"
            ))
            .context("failed to compile section heading regex")?,
            article: Regex::new(&format!(
                r"(?m)^[ \t]*第[ \t]*[{CJK_NUMERALS}零O0-9０-９]+[ \t]*条[^\n]*"
            ))
            .context("failed to compile article heading regex")?,
            level1: Regex::new(&format!(r"(?m)^[ \t]*[{CJK_NUMERALS}]+、[^\n]*"))
                .context("failed to compile first-level heading regex")?,
            level2: Regex::new(&format!(r"(?m)^[ \t]*[（(][{CJK_NUMERALS}]+[）)][^\n]*"))
                .context("failed to compile second-level heading regex")?,
            level3: Regex::new(r"(?m)^[ \t]*\d+\.[^\n]*")
                .context("failed to compile third-level heading regex")?,
            level2_marker: Regex::new(&format!(r"^[ \t]*[（(][{CJK_NUMERALS}]+[）)]"))
                .context("failed to compile second-level marker regex")?,
            article_marker: Regex::new(&format!(
                r"(?s)^\s*(第[{CJK_NUMERALS}零O0-9０-９]+条)\s*(.*)$"
            ))
            .context("failed to compile article marker regex")?,
            title_skip: Regex::new(&format!(
                r"^(?:第[{CJK_NUMERALS}\d]+[章条节]|[{CJK_NUMERALS}]+、|[（(][{CJK_NUMERALS}]+[）)]|\d+\.)"
            ))
            .context("failed to compile title skip regex")?,
        })
    }

    pub fn split_article<'t>(&self, text: &'t str) -> Option<(&'t str, &'t str)> {
        let captures = self.article_marker.captures(text)?;
        let marker = captures.get(1)?.as_str().trim();
        let body = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        Some((marker, body))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeadingBlock<'t> {
    pub heading: &'t str,
    pub body: &'t str,
}

impl HeadingBlock<'_> {
    pub fn joined(&self) -> String {
        format!("{} {}", self.heading, self.body).trim().to_string()
    }
}

pub(crate) struct HeadingSplit<'r, 't> {
    text: &'t str,
    matches: Peekable<Matches<'r, 't>>,
}

impl<'r, 't> HeadingSplit<'r, 't> {
    pub fn new(text: &'t str, heading: &'r Regex) -> Self {
        Self {
            text,
            matches: heading.find_iter(text).peekable(),
        }
    }
}

impl<'t> Iterator for HeadingSplit<'_, 't> {
    type Item = HeadingBlock<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.matches.next()?;
        let end = self
            .matches
            .peek()
            .map(|next| next.start())
            .unwrap_or(self.text.len());

        Some(HeadingBlock {
            heading: current.as_str().trim(),
            body: self.text[current.end()..end].trim(),
        })
    }
}

pub(crate) fn split_headings<'r, 't>(text: &'t str, heading: &'r Regex) -> HeadingSplit<'r, 't> {
    HeadingSplit::new(text, heading)
}

pub(crate) fn preamble<'t>(text: &'t str, heading: &Regex) -> Option<&'t str> {
    heading.find(text).map(|first| text[..first.start()].trim())
}
