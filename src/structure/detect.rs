use crate::model::StructureKind;

use super::patterns::HeadingPatterns;

pub(crate) fn detect_structure(patterns: &HeadingPatterns, text: &str) -> StructureKind {
    if patterns.chapter.is_match(text) {
        return StructureKind::Chaptered;
    }

    let has_level1 = patterns.level1.is_match(text);
    let has_level2 = patterns.level2.is_match(text);
    let has_level3 = patterns.level3.is_match(text);

    if has_level1 && has_level2 && !has_level3 {
        StructureKind::TwoLevel
    } else if has_level1 {
        StructureKind::ThreeLevel
    } else {
        StructureKind::Flat
    }
}
