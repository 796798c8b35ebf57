//! Language code and per-member language preference types.

use crate::i18n::registry::{is_supported_language, LanguageConfig, LanguageRegistry};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A detected ISO 639-1 language code.
///
/// Detection always yields exactly one non-empty code. It is usually in the
/// supported set, but codes outside the set can appear (e.g. a statistical
/// result with no supported counterpart), so this is not a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> Self {
        LanguageCode(code.into())
    }

    /// The fallback when detection finds no signal.
    pub fn english() -> Self {
        LanguageCode::new(LanguageRegistry::default_language().code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this code can be used as a translation source or target.
    pub fn is_supported(&self) -> bool {
        is_supported_language(&self.0)
    }

    /// Registry metadata, when the code is supported.
    pub fn config(&self) -> Option<&'static LanguageConfig> {
        LanguageRegistry::get_by_code(&self.0)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageCode {
    fn from(code: &str) -> Self {
        LanguageCode::new(code)
    }
}

impl PartialEq<&str> for LanguageCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Marker stored on the backend when a member never picked a language.
pub const NOT_SET: &str = "not_set";

/// A member's preferred reading language, stored as member metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguagePreference {
    #[default]
    NotSet,
    Preferred(LanguageCode),
}

impl LanguagePreference {
    /// Parse a stored value. Empty and `not_set` both mean no preference.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == NOT_SET {
            LanguagePreference::NotSet
        } else {
            LanguagePreference::Preferred(LanguageCode::new(value))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LanguagePreference::NotSet => NOT_SET,
            LanguagePreference::Preferred(code) => code.as_str(),
        }
    }

    pub fn language(&self) -> Option<&LanguageCode> {
        match self {
            LanguagePreference::NotSet => None,
            LanguagePreference::Preferred(code) => Some(code),
        }
    }
}

impl Serialize for LanguagePreference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LanguagePreference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(LanguagePreference::parse(&value))
    }
}
