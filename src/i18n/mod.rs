//! Language detection and the supported-language set.
//!
//! # Architecture
//!
//! - `registry`: the closed set of languages translation fan-out supports
//! - `language`: `LanguageCode` and the per-member `LanguagePreference`
//! - `script`: Unicode script-range heuristics
//! - `detector`: two-tier detection (script ranges, then `whatlang`)
//!
//! # Example
//!
//! ```rust
//! use alma_chat::i18n::{detect, is_supported_language};
//!
//! let code = detect("안녕하세요");
//! assert_eq!(code.as_str(), "ko");
//! assert!(is_supported_language(code.as_str()));
//! ```

mod detector;
mod language;
mod registry;
mod script;

pub use detector::{detect, to_iso639_1, MIN_STATISTICAL_LENGTH};
pub use language::{LanguageCode, LanguagePreference, NOT_SET};
pub use registry::{is_supported_language, LanguageConfig, LanguageRegistry};
pub use script::detect_script;
