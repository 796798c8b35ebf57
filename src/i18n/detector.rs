//! Source-language detection for chat messages.
//!
//! Two tiers: script-range heuristics for short text, and a trigram model
//! (`whatlang`) for anything long enough to classify statistically, with the
//! script table as its fallback. Detection never fails; it defaults to English.

use crate::i18n::language::LanguageCode;
use crate::i18n::script::detect_script;
use tracing::debug;

/// Below this many characters (after trimming) the statistical model is skipped.
pub const MIN_STATISTICAL_LENGTH: usize = 10;

/// ISO 639-3 → ISO 639-1 for the codes the model emits that we care about.
static ISO_639_3_TO_1: &[(&str, &str)] = &[
    ("eng", "en"),
    ("spa", "es"),
    ("fra", "fr"),
    ("deu", "de"),
    ("ita", "it"),
    ("por", "pt"),
    ("rus", "ru"),
    ("cmn", "zh"),
    ("zho", "zh"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("ara", "ar"),
    ("arb", "ar"),
    ("hin", "hi"),
    ("ben", "bn"),
    ("tha", "th"),
    ("vie", "vi"),
    ("khm", "km"),
    ("ind", "id"),
    ("msa", "ms"),
    ("zsm", "ms"),
    ("tur", "tr"),
    ("nld", "nl"),
    ("pol", "pl"),
    ("ukr", "uk"),
    ("tgl", "tl"),
];

/// Map a three-letter code to its two-letter form.
///
/// Codes missing from the table are truncated to two characters. That is
/// only approximately right (e.g. `pes` becomes `pe`, not `fa`), and
/// consumers already depend on it. A truncated code can also land on a
/// supported one: `est` becomes `es`, `jav` becomes `ja`.
pub fn to_iso639_1(code: &str) -> String {
    ISO_639_3_TO_1
        .iter()
        .find(|(three, _)| *three == code)
        .map(|(_, two)| (*two).to_string())
        .unwrap_or_else(|| code.chars().take(2).collect())
}

/// Run the statistical model. `None` means undetermined.
fn statistical_detect(text: &str) -> Option<&'static str> {
    whatlang::detect(text).map(|info| info.lang().code())
}

/// Detect the source language of `text`.
pub fn detect(text: &str) -> LanguageCode {
    detect_with(text, statistical_detect)
}

/// Detection with an injectable statistical tier.
fn detect_with<F>(text: &str, statistical: F) -> LanguageCode
where
    F: FnOnce(&str) -> Option<&'static str>,
{
    let trimmed = text.trim();

    if trimmed.chars().count() < MIN_STATISTICAL_LENGTH {
        return script_or_default(trimmed);
    }

    match statistical(trimmed) {
        Some(code) if !code.is_empty() => {
            let mapped = to_iso639_1(code);
            debug!("Statistical detection: {} -> {}", code, mapped);
            LanguageCode::new(mapped)
        }
        _ => {
            debug!("Statistical detection undetermined, using script ranges");
            script_or_default(trimmed)
        }
    }
}

fn script_or_default(text: &str) -> LanguageCode {
    detect_script(text)
        .map(LanguageCode::from)
        .unwrap_or_else(LanguageCode::english)
}
