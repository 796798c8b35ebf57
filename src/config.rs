use anyhow::{bail, Context, Result};

/// Which chat backend the server talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Stream Chat REST API
    Stream,
    /// In-process store, for local development
    Memory,
}

impl BackendKind {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "stream" => Ok(BackendKind::Stream),
            "memory" => Ok(BackendKind::Memory),
            other => bail!("Unknown CHAT_BACKEND '{}'. Expected 'stream' or 'memory'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Chat backend
    pub chat_backend: BackendKind,
    pub stream_api_key: Option<String>,
    pub stream_api_secret: Option<String>,
    pub stream_base_url: String,
    pub stream_timeout_secs: u64,

    // OpenAI (optional, enables translation fan-out)
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,
    pub openai_timeout_secs: u64,

    // Server
    pub api_key: Option<String>,
    pub port: u16,
}

/// Read an optional variable, treating an empty value as unset
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a timeout in whole seconds. Unparsable or zero values are rejected.
fn timeout_secs(name: &str, default: u64) -> Result<u64> {
    let Some(value) = optional_var(name) else {
        return Ok(default);
    };

    let secs: u64 = value
        .parse()
        .with_context(|| format!("{} must be a whole number of seconds, got '{}'", name, value))?;
    if secs == 0 {
        bail!("{} must be greater than 0", name);
    }
    Ok(secs)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let chat_backend = match optional_var("CHAT_BACKEND") {
            Some(value) => BackendKind::parse(&value).context("Invalid CHAT_BACKEND")?,
            None => BackendKind::Stream,
        };

        let port = match optional_var("PORT") {
            Some(value) => value
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", value))?,
            None => 8080,
        };

        Ok(Self {
            chat_backend,

            // Stream - missing credentials leave the service unconfigured rather than failing startup
            stream_api_key: optional_var("STREAM_API_KEY"),
            stream_api_secret: optional_var("STREAM_API_SECRET"),
            stream_base_url: optional_var("STREAM_BASE_URL")
                .unwrap_or_else(|| "https://chat.stream-io-api.com".to_string()),
            stream_timeout_secs: timeout_secs("STREAM_TIMEOUT_SECS", 10)?,

            // OpenAI
            openai_api_key: optional_var("OPENAI_API_KEY"),
            openai_model: optional_var("OPENAI_MODEL")
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            openai_api_url: optional_var("OPENAI_API_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string()),
            openai_timeout_secs: timeout_secs("OPENAI_TIMEOUT_SECS", 30)?,

            // Server
            api_key: optional_var("API_KEY"),
            port,
        })
    }

    /// Whether translation fan-out can call out to OpenAI
    pub fn translation_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }
}
