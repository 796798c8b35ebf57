//! Message routing: detect a message's language and work out which member
//! languages it must be translated into.

use crate::channels::ChannelManager;
use crate::chat::MemberRecord;
use crate::error::{ChannelError, ChannelResult};
use crate::i18n::{detect, LanguageCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// An incoming chat message. Owned by the messaging backend; only read here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub channel_id: String,
}

/// A message with its detected language and translation targets attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedMessage {
    pub text: String,
    pub sender_id: String,
    pub channel_id: String,
    pub detected_language: LanguageCode,
    /// Whether the source language can be translated from at all
    pub supported: bool,
    pub translation_targets: Vec<LanguageCode>,
}

/// Distinct member languages a message in `source` must be translated into.
///
/// Members without a preference, or whose preference already matches the
/// source, need nothing. Unsupported codes on either side are skipped.
/// Output is sorted so fan-out order is deterministic.
pub fn translation_targets(source: &LanguageCode, members: &[MemberRecord]) -> Vec<LanguageCode> {
    if !source.is_supported() {
        return Vec::new();
    }

    members
        .iter()
        .filter_map(|m| m.preferred_language.language())
        .filter(|lang| *lang != source && lang.is_supported())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Attach detection and fan-out targets to a message.
pub fn plan_message(message: Message, members: &[MemberRecord]) -> RoutedMessage {
    let detected_language = detect(&message.text);
    let translation_targets = translation_targets(&detected_language, members);

    debug!(
        "Message in {} detected as {} -> targets {:?}",
        message.channel_id, detected_language, translation_targets
    );

    RoutedMessage {
        supported: detected_language.is_supported(),
        detected_language,
        translation_targets,
        text: message.text,
        sender_id: message.sender_id,
        channel_id: message.channel_id,
    }
}

/// Look up the channel's members and plan the message's fan-out.
pub async fn route_message(
    channels: &ChannelManager,
    message: Message,
    channel_type: Option<&str>,
) -> ChannelResult<RoutedMessage> {
    channels.ensure_configured()?;
    if message.sender_id.trim().is_empty() {
        return Err(ChannelError::validation("senderId is required"));
    }

    let channel = channels
        .get_channel(Some(&message.channel_id), channel_type)
        .await?;

    Ok(plan_message(message, &channel.members))
}
