//! Language registry: the closed set of languages the chat translates between.
//!
//! The registry is a static table. Membership in it is what decides whether a
//! detected language is eligible for translation fan-out.

/// Metadata for a supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "ko")
    pub code: &'static str,

    /// English name of the language (e.g., "Korean")
    pub name: &'static str,

    /// Native name of the language (e.g., "한국어")
    pub native_name: &'static str,
}

const fn lang(code: &'static str, name: &'static str, native_name: &'static str) -> LanguageConfig {
    LanguageConfig {
        code,
        name,
        native_name,
    }
}

/// Every language the chat supports translation for.
static SUPPORTED_LANGUAGES: [LanguageConfig; 20] = [
    lang("en", "English", "English"),
    lang("es", "Spanish", "Español"),
    lang("fr", "French", "Français"),
    lang("de", "German", "Deutsch"),
    lang("it", "Italian", "Italiano"),
    lang("pt", "Portuguese", "Português"),
    lang("ru", "Russian", "Русский"),
    lang("zh", "Chinese", "中文"),
    lang("ja", "Japanese", "日本語"),
    lang("ko", "Korean", "한국어"),
    lang("ar", "Arabic", "العربية"),
    lang("hi", "Hindi", "हिन्दी"),
    lang("bn", "Bengali", "বাংলা"),
    lang("th", "Thai", "ไทย"),
    lang("vi", "Vietnamese", "Tiếng Việt"),
    lang("km", "Khmer", "ខ្មែរ"),
    lang("id", "Indonesian", "Bahasa Indonesia"),
    lang("tr", "Turkish", "Türkçe"),
    lang("nl", "Dutch", "Nederlands"),
    lang("pl", "Polish", "Polski"),
];

/// Read-only view over the supported language table.
pub struct LanguageRegistry;

impl LanguageRegistry {
    /// Get a language configuration by its code.
    pub fn get_by_code(code: &str) -> Option<&'static LanguageConfig> {
        SUPPORTED_LANGUAGES.iter().find(|lang| lang.code == code)
    }

    /// All supported languages, in table order.
    pub fn list_all() -> &'static [LanguageConfig] {
        &SUPPORTED_LANGUAGES
    }

    /// The language detection falls back to when there is no signal.
    pub fn default_language() -> &'static LanguageConfig {
        &SUPPORTED_LANGUAGES[0]
    }
}

/// Check whether a language code is in the supported set.
///
/// Codes outside the set are "detected but unsupported for translation".
pub fn is_supported_language(code: &str) -> bool {
    LanguageRegistry::get_by_code(code).is_some()
}
