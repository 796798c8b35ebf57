//! Chat backend capability and the channel records it deals in.
//!
//! The channel lifecycle only needs a handful of operations from the
//! messaging service, captured by [`ChatBackend`]. Two implementations:
//!
//! - `stream`: Stream Chat REST API
//! - `memory`: in-process store for local development and tests

pub mod memory;
pub mod stream;

use crate::i18n::LanguagePreference;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryBackend;
pub use stream::StreamClient;

/// Channel type used when the caller does not name one.
pub const DEFAULT_CHANNEL_TYPE: &str = "messaging";

/// A channel member as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub user_id: String,
    pub preferred_language: LanguagePreference,
}

impl MemberRecord {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            preferred_language: LanguagePreference::NotSet,
        }
    }
}

/// A channel and the member state returned alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub id: String,
    pub channel_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    /// Count reported by the backend, which may exceed `members.len()`
    pub member_count: Option<usize>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub members: Vec<MemberRecord>,
}

impl ChannelRecord {
    pub fn new(channel_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_type: channel_type.into(),
            name: None,
            description: None,
            created_by: None,
            member_count: None,
            created_at: None,
            last_message_at: None,
            members: Vec::new(),
        }
    }

    /// Channel name, falling back to the id for unnamed channels
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Backend-reported count when present, otherwise the returned members
    pub fn effective_member_count(&self) -> usize {
        self.member_count.unwrap_or(self.members.len())
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }
}

/// Data for a channel that may need to be created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewChannel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
}

/// Filter for listing channels. Results are always newest activity first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelQuery {
    pub channel_type: String,
    pub channel_id: Option<String>,
    pub limit: usize,
}

impl ChannelQuery {
    pub fn by_type(channel_type: impl Into<String>, limit: usize) -> Self {
        Self {
            channel_type: channel_type.into(),
            channel_id: None,
            limit,
        }
    }

    pub fn by_id(channel_type: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            channel_type: channel_type.into(),
            channel_id: Some(channel_id.into()),
            limit: 1,
        }
    }
}

/// Operations the channel lifecycle needs from the messaging service.
///
/// Implementations must make `add_members` and `remove_members` idempotent;
/// this crate never does read-modify-write on membership.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Whether credentials are present. Checked before every operation.
    fn is_configured(&self) -> bool;

    async fn query_channels(&self, query: &ChannelQuery) -> Result<Vec<ChannelRecord>>;

    /// Return the channel, creating it with `data` if it does not exist yet.
    async fn get_or_create_channel(
        &self,
        channel_type: &str,
        channel_id: &str,
        data: &NewChannel,
    ) -> Result<ChannelRecord>;

    async fn add_members(&self, channel_type: &str, channel_id: &str, user_ids: &[String])
        -> Result<()>;

    async fn remove_members(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<()>;

    /// Hard delete. Irreversible.
    async fn delete_channel(&self, channel_type: &str, channel_id: &str) -> Result<()>;

    /// Store a member's preferred language as member-level metadata.
    async fn set_member_language(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_id: &str,
        preference: &LanguagePreference,
    ) -> Result<()>;
}
