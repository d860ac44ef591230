use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeRules {
    pub markup: Vec<String>,
    pub page_number_lines: Vec<String>,
    pub inline_page_numbers: Vec<String>,
    pub decorative_lines: Vec<String>,
    pub noise_run_characters: String,
    pub noise_single_characters: String,
    pub ocr_noise: Vec<String>,
    pub noise_lines: Vec<String>,
    pub boilerplate_lines: Vec<String>,
    pub collapse_punctuation: String,
    pub collapse_min_run: usize,
    pub heading_breaks: Vec<String>,
    /// Like `heading_breaks`, but skipped inside decimals and version numbers.
    pub numbered_item_breaks: Vec<String>,
    pub strip_characters: String,
}

impl Default for NormalizeRules {
    fn default() -> Self {
        let owned = |patterns: &[&str]| patterns.iter().map(|p| p.to_string()).collect();

        Self {
            markup: owned(&[
                r"(?s)<!--.*?-->",
                r"(?is)!\[[^\]]*?\]\(\s*https?://[^)]*?\.(?:png|jpe?g|gif|bmp|webp)[^)]*?\)",
            ]),
            page_number_lines: owned(&[
                r"^\s*[-–—―－]+\s*\d+\s*[-–—―－]+\s*$",
                r"^\s*一+\s*\d+\s*一+\s*$",
                r"^\s*[—―－一]+\s*\d+\s*$",
                r"^\s*\d+\s*[—―－一]+\s*$",
                r"^\s*\d{1,3}\s*$",
                r"^\s*[（(\[]\s*\d+\s*[）)\]]\s*$",
                r"^\s*第\s*\d+\s*页\s*$",
                r"^\s*第\s*\d+\s*页\s*[/，,]?\s*共\s*\d+\s*页\s*$",
                r"(?i)^\s*page\s+\d+\s*$",
            ]),
            inline_page_numbers: owned(&[
                r"[—―]+\s*\d+\s*[—―]+",
                r"[-–－]+\s+\d+\s+[-–－]+",
                r"一+\s*\d+\s*一+",
            ]),
            decorative_lines: owned(&[
                r"^\s*【.*?】\s*$",
                r"^\s*\*{3,}.*?\*{3,}\s*$",
                r"^\s*\*{3,}\s*$",
                r"^\s*={3,}\s*$",
                r"^\s*-{3,}\s*$",
            ]),
            noise_run_characters: "剧黯潍撇粼鹳鐾霭麟".to_string(),
            noise_single_characters: "鐾霭麟鹳黯潍撇粼".to_string(),
            ocr_noise: owned(&[
                r"[a-zA-Z]\d{1,2}[a-zA-Z]{1,3}\d*",
                r"[∶∷⋯]{2,}",
                r"[，。；：]{3,}",
                r"[ \t]*[▪▫■□▲△]{2,}[ \t]*",
            ]),
            noise_lines: owned(&[r"^\s*[^\x{4e00}-\x{9fa5}a-zA-Z0-9\s]\s*$"]),
            boilerplate_lines: owned(&[
                r"^\s*抄送[:：].*$",
                r"^.*印发\s*$",
                r"^.*办公厅.*年.*月.*日.*$",
                r"^\s*[(（]?\s*此页无正文\s*[)）]?\s*$",
                r"^\s*国家发展改革委\s*$",
                r"^\s*国家发展改革委办公厅\s*$",
                r"^\s*\d{4}年\d{1,2}月\d{1,2}日\s*$",
            ]),
            collapse_punctuation: "，。；：！？".to_string(),
            collapse_min_run: 3,
            heading_breaks: owned(&[
                r"[一二三四五六七八九十]+、",
                r"[（(][一二三四五六七八九十]+[）)]",
            ]),
            numbered_item_breaks: owned(&[r"\d+[.、)]"]),
            strip_characters: "*#".to_string(),
        }
    }
}

impl NormalizeRules {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read rule table {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse rule table {}", path.display()))
    }

    pub(crate) fn compile(&self) -> Result<CompiledRules> {
        Ok(CompiledRules {
            markup: compile_group("markup", &self.markup)?,
            page_number_lines: compile_group("page_number_lines", &self.page_number_lines)?,
            inline_page_numbers: compile_group("inline_page_numbers", &self.inline_page_numbers)?,
            decorative_lines: compile_group("decorative_lines", &self.decorative_lines)?,
            noise_run: character_run("noise_run_characters", &self.noise_run_characters)?,
            noise_single: self.noise_single_characters.chars().collect(),
            ocr_noise: compile_group("ocr_noise", &self.ocr_noise)?,
            noise_lines: compile_group("noise_lines", &self.noise_lines)?,
            boilerplate_lines: compile_group("boilerplate_lines", &self.boilerplate_lines)?,
            collapse_punctuation: self.collapse_punctuation.chars().collect(),
            collapse_min_run: self.collapse_min_run.max(2),
            heading_breaks: compile_group("heading_breaks", &self.heading_breaks)?,
            numbered_item_breaks: compile_group("numbered_item_breaks", &self.numbered_item_breaks)?,
            strip_characters: self.strip_characters.chars().collect(),
        })
    }
}

#[derive(Debug)]
pub(crate) struct CompiledRules {
    pub markup: Vec<Regex>,
    pub page_number_lines: Vec<Regex>,
    pub inline_page_numbers: Vec<Regex>,
    pub decorative_lines: Vec<Regex>,
    pub noise_run: Option<Regex>,
    pub noise_single: Vec<char>,
    pub ocr_noise: Vec<Regex>,
    pub noise_lines: Vec<Regex>,
    pub boilerplate_lines: Vec<Regex>,
    pub collapse_punctuation: Vec<char>,
    pub collapse_min_run: usize,
    pub heading_breaks: Vec<Regex>,
    pub numbered_item_breaks: Vec<Regex>,
    pub strip_characters: Vec<char>,
}

fn compile_group(group: &str, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .enumerate()
        .map(|(index, pattern)| {
            Regex::new(pattern).with_context(|| {
                format!("failed to compile {group} rule #{index}: {pattern}")
            })
        })
        .collect()
}

fn character_run(group: &str, characters: &str) -> Result<Option<Regex>> {
    if characters.is_empty() {
        return Ok(None);
    }

    let class = characters
        .chars()
        .map(|ch| regex::escape(&ch.to_string()))
        .collect::<String>();
    let pattern = format!("[{class}]{{2,}}");
    Regex::new(&pattern)
        .map(Some)
        .with_context(|| format!("failed to compile {group} rule: {pattern}"))
}
