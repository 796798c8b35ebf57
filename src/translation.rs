use crate::config::Config;
use crate::fanout::RoutedMessage;
use crate::i18n::LanguageCode;
use anyhow::{Context, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Outcome of translating a message into one target language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translation {
    pub language: LanguageCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// HTTP client for translation calls, bounded by `OPENAI_TIMEOUT_SECS`
pub fn translation_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.openai_timeout_secs))
        .build()
        .context("Failed to build translation HTTP client")
}

/// English name for prompts, falling back to the raw code
fn language_name(code: &LanguageCode) -> &str {
    code.config().map(|c| c.name).unwrap_or_else(|| code.as_str())
}

fn build_system_prompt(source: &str, target: &str) -> String {
    format!(
        r#"You translate chat messages from {} to {}.

- Reply with the translation only, no quotes or commentary
- Keep @mentions, #hashtags, URLs, emojis and code unchanged
- Keep the casual tone of a chat message
- If a word has no good translation, keep the original word"#,
        source, target
    )
}

/// Translate one chat message into `target`
pub async fn translate_text(
    client: &reqwest::Client,
    config: &Config,
    text: &str,
    source: &LanguageCode,
    target: &LanguageCode,
) -> Result<String> {
    if source == target {
        return Ok(text.to_string());
    }

    let api_key = config
        .openai_api_key
        .as_deref()
        .context("OPENAI_API_KEY not set")?;

    let request = TranslationRequest {
        model: config.openai_model.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: build_system_prompt(language_name(source), language_name(target)),
            },
            ChatMessage {
                role: "user".to_string(),
                content: text.to_string(),
            },
        ],
        temperature: 0.3,
    };

    let response = client
        .post(&config.openai_api_url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await
        .context("Failed to send translation request to OpenAI API")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        anyhow::bail!("OpenAI API error during translation ({}): {}", status, body);
    }

    let chat_response: ChatResponse = response
        .json()
        .await
        .context("Failed to parse OpenAI translation response")?;

    chat_response
        .choices
        .first()
        .map(|c| c.message.content.trim().to_string())
        .context("OpenAI translation response contained no choices")
}

/// Translate a routed message into each of its targets concurrently.
///
/// A failed target is reported in its entry; it does not fail the others.
pub async fn translate_fanout(
    client: &reqwest::Client,
    config: &Config,
    routed: &RoutedMessage,
) -> Vec<Translation> {
    let jobs = routed.translation_targets.iter().map(|target| async move {
        match translate_text(client, config, &routed.text, &routed.detected_language, target).await {
            Ok(text) => Translation {
                language: target.clone(),
                text: Some(text),
                error: None,
            },
            Err(e) => {
                warn!(
                    "Translation {} -> {} failed: {:#}",
                    routed.detected_language, target, e
                );
                Translation {
                    language: target.clone(),
                    text: None,
                    error: Some(format!("{:#}", e)),
                }
            }
        }
    });

    let translations = join_all(jobs).await;
    info!(
        "Translated message in {} into {} language(s)",
        routed.channel_id,
        translations.iter().filter(|t| t.text.is_some()).count()
    );
    translations
}
