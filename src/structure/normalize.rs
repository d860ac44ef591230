use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::rules::CompiledRules;

const MIN_ROUND_LIMIT: usize = 8;

const SUSPECT_LINE_MAX_CHARS: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub rounds: usize,
    pub converged: bool,
    pub markup_removed: usize,
    pub page_number_lines_removed: usize,
    pub inline_page_numbers_removed: usize,
    pub decorative_lines_removed: usize,
    pub ocr_noise_removed: usize,
    pub noise_lines_removed: usize,
    pub boilerplate_lines_removed: usize,
    pub punctuation_runs_collapsed: usize,
    pub heading_breaks_inserted: usize,
}

#[derive(Debug)]
pub(crate) struct Normalizer {
    rules: CompiledRules,
}

impl Normalizer {
    pub fn new(rules: CompiledRules) -> Self {
        Self { rules }
    }

    pub fn normalize(&self, raw: &str) -> (String, NormalizeStats) {
        let mut stats = NormalizeStats::default();
        let mut current = raw.to_string();

        // each round short of the fixed point drops characters or adds a line break
        let limit = MIN_ROUND_LIMIT.max(2 * raw.chars().count() + 2);

        while stats.rounds < limit {
            stats.rounds += 1;
            let next = self.apply_passes(&current, &mut stats);
            if next == current {
                stats.converged = true;
                return (next, stats);
            }
            current = next;
        }

        warn!(rounds = stats.rounds, "normalization stopped before reaching a fixed point");
        (current, stats)
    }

    fn apply_passes(&self, input: &str, stats: &mut NormalizeStats) -> String {
        if input.is_empty() {
            return String::new();
        }

        let rules = &self.rules;

        let mut text = canonicalize_line_endings(input);

        text = replace_all(&rules.markup, &text, " ", &mut stats.markup_removed);

        text = drop_lines(&rules.page_number_lines, &text, &mut stats.page_number_lines_removed);
        text = drop_lines(&rules.decorative_lines, &text, &mut stats.decorative_lines_removed);
        text = replace_all(
            &rules.inline_page_numbers,
            &text,
            " ",
            &mut stats.inline_page_numbers_removed,
        );

        if let Some(noise_run) = &rules.noise_run {
            text = replace_all(std::slice::from_ref(noise_run), &text, "", &mut stats.ocr_noise_removed);
        }
        text = strip_isolated_noise(&rules.noise_single, &text, &mut stats.ocr_noise_removed);
        text = replace_all(&rules.ocr_noise, &text, "", &mut stats.ocr_noise_removed);
        text = drop_lines(&rules.noise_lines, &text, &mut stats.noise_lines_removed);

        text = drop_lines(&rules.boilerplate_lines, &text, &mut stats.boilerplate_lines_removed);

        text = collapse_punctuation_runs(
            &text,
            &rules.collapse_punctuation,
            rules.collapse_min_run,
            &mut stats.punctuation_runs_collapsed,
        );

        for marker in &rules.heading_breaks {
            text = insert_heading_breaks(marker, &text, false, &mut stats.heading_breaks_inserted);
        }
        for marker in &rules.numbered_item_breaks {
            text = insert_heading_breaks(marker, &text, true, &mut stats.heading_breaks_inserted);
        }

        text.retain(|ch| !rules.strip_characters.contains(&ch));

        let text = collapse_line_whitespace(&text);
        collapse_blank_runs(&text)
    }
}

fn canonicalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace(['\r', '\u{2028}', '\u{2029}', '\u{85}', '\u{0B}', '\u{0C}'], "\n")
}

fn replace_all(patterns: &[Regex], text: &str, replacement: &str, hits: &mut usize) -> String {
    let mut current = text.to_string();
    for pattern in patterns {
        let replaced = pattern.replace_all(&current, |_: &Captures| {
            *hits += 1;
            replacement
        });
        current = replaced.into_owned();
    }
    current
}

fn drop_lines(patterns: &[Regex], text: &str, removed: &mut usize) -> String {
    if patterns.is_empty() {
        return text.to_string();
    }

    text.split('\n')
        .filter(|line| {
            let matched = patterns.iter().any(|pattern| pattern.is_match(line));
            if matched {
                *removed += 1;
            }
            !matched
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

fn strip_isolated_noise(noise: &[char], text: &str, removed: &mut usize) -> String {
    if noise.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if noise.contains(&ch) {
            let attached = chars
                .peek()
                .map(|next| next.is_ascii_alphabetic() || is_cjk_ideograph(*next))
                .unwrap_or(false);
            if !attached {
                *removed += 1;
                continue;
            }
        }
        out.push(ch);
    }
    out
}

fn is_cjk_ideograph(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&ch)
}

fn collapse_punctuation_runs(
    text: &str,
    punctuation: &[char],
    min_run: usize,
    collapsed: &mut usize,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        out.push(ch);
        if !punctuation.contains(&ch) {
            continue;
        }

        let mut run = 1usize;
        while chars.peek() == Some(&ch) {
            chars.next();
            run += 1;
        }

        if run >= min_run {
            *collapsed += 1;
        } else {
            out.extend(std::iter::repeat_n(ch, run - 1));
        }
    }

    out
}

fn insert_heading_breaks(
    marker: &Regex,
    text: &str,
    numbered: bool,
    inserted: &mut usize,
) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0usize;

    for found in marker.find_iter(text) {
        let before = text[..found.start()].chars().next_back();
        let after = text[found.end()..].chars().next();
        if !marker_needs_break(before, after, numbered) {
            continue;
        }

        out.push_str(&text[last..found.start()]);
        out.push('\n');
        last = found.start();
        *inserted += 1;
    }

    out.push_str(&text[last..]);
    out
}

fn marker_needs_break(before: Option<char>, after: Option<char>, numbered: bool) -> bool {
    let Some(before) = before else {
        return false;
    };
    if before == '\n' {
        return false;
    }
    if !numbered {
        return true;
    }

    // decimals, version strings and already-bracketed numbers
    if before.is_ascii_digit() || matches!(before, '.' | '(' | '（') {
        return false;
    }
    !after.map(|ch| ch.is_ascii_digit()).unwrap_or(false)
}

fn collapse_line_whitespace(text: &str) -> String {
    text.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<&str>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<String>>()
        .join("\n")
}

fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(ch);
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }
    out
}

pub(crate) fn suspect_lines(normalized: &str) -> Vec<String> {
    normalized
        .lines()
        .filter(|line| {
            let count = line.chars().count();
            count <= SUSPECT_LINE_MAX_CHARS
                && line.chars().any(|ch| ch.is_ascii_digit())
                && !line.chars().any(is_cjk_ideograph)
                && !line.chars().any(|ch| ch.is_ascii_alphabetic())
        })
        .map(str::to_string)
        .collect()
}
