//! Unicode script-range heuristics.
//!
//! Used directly for short text, and as the fallback when the statistical
//! model cannot decide.

use std::ops::RangeInclusive;

/// A writing system and the language it is taken to indicate.
struct ScriptRule {
    language: &'static str,
    ranges: &'static [RangeInclusive<char>],
}

/// Checked in order; the first rule with any matching character wins.
///
/// Hangul precedes CJK unified ideographs because Korean text may contain
/// Hanja, and kana precedes CJK for the same reason with Japanese kanji.
static SCRIPT_RULES: &[ScriptRule] = &[
    ScriptRule {
        language: "ko",
        ranges: &[
            '\u{AC00}'..='\u{D7AF}', // Hangul syllables
            '\u{1100}'..='\u{11FF}', // Hangul jamo
            '\u{3130}'..='\u{318F}', // Hangul compatibility jamo
        ],
    },
    ScriptRule {
        language: "ja",
        ranges: &[
            '\u{3040}'..='\u{309F}', // Hiragana
            '\u{30A0}'..='\u{30FF}', // Katakana
        ],
    },
    ScriptRule {
        language: "zh",
        ranges: &['\u{4E00}'..='\u{9FFF}'],
    },
    ScriptRule {
        language: "th",
        ranges: &['\u{0E00}'..='\u{0E7F}'],
    },
    ScriptRule {
        language: "ar",
        ranges: &['\u{0600}'..='\u{06FF}'],
    },
    ScriptRule {
        language: "km",
        ranges: &['\u{1780}'..='\u{17FF}'],
    },
    ScriptRule {
        language: "vi",
        ranges: &[
            '\u{1EA0}'..='\u{1EF9}', // Latin Extended Additional (tone-marked vowels)
            'ă'..='ă',
            'Ă'..='Ă',
            'đ'..='đ',
            'Đ'..='Đ',
            'ơ'..='ơ',
            'Ơ'..='Ơ',
            'ư'..='ư',
            'Ư'..='Ư',
        ],
    },
    ScriptRule {
        language: "hi",
        ranges: &['\u{0900}'..='\u{097F}'],
    },
    ScriptRule {
        language: "bn",
        ranges: &['\u{0980}'..='\u{09FF}'],
    },
];

/// Return the language of the first script rule any character of `text` hits.
pub fn detect_script(text: &str) -> Option<&'static str> {
    SCRIPT_RULES
        .iter()
        .find(|rule| {
            text.chars()
                .any(|c| rule.ranges.iter().any(|range| range.contains(&c)))
        })
        .map(|rule| rule.language)
}
