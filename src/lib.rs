//! Language detection and channel lifecycle for a multilingual chat.
//!
//! - `i18n`: two-tier source-language detection and the supported set
//! - `chat`: the messaging backend capability (Stream Chat, in-memory)
//! - `channels`: browse/create/join/leave/delete over a backend
//! - `fanout`: per-message translation targets from member preferences
//! - `translation`: optional OpenAI-backed translation of each target
//! - `server`: axum routes exposing all of the above

pub mod channels;
pub mod chat;
pub mod config;
pub mod error;
pub mod fanout;
pub mod i18n;
pub mod security;
pub mod server;
pub mod translation;
