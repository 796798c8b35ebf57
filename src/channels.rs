//! Channel lifecycle: browse, create, join, leave, delete.
//!
//! Each operation checks backend readiness first, then validates its input,
//! then makes its backend calls. Nothing is retried and no state is kept
//! between calls; concurrent membership changes are left to the backend.

use crate::chat::{ChannelQuery, ChannelRecord, ChatBackend, NewChannel, DEFAULT_CHANNEL_TYPE};
use crate::error::{ChannelError, ChannelResult};
use crate::i18n::{is_supported_language, LanguagePreference, NOT_SET};
use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::info;

/// Channel every user lands in by default
pub const DEFAULT_CHANNEL_ID: &str = "alma-global";
pub const DEFAULT_CHANNEL_NAME: &str = "Alma Global";
pub const DEFAULT_CHANNEL_DESCRIPTION: &str = "The global room where everyone chats in their own language";

/// Most channels a browse call returns
pub const BROWSE_LIMIT: usize = 50;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

const MAX_SLUG_LENGTH: usize = 40;
const SUFFIX_LENGTH: usize = 5;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const FALLBACK_SLUG: &str = "channel";

// ==================== Responses ====================

/// One entry of a browse listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub member_count: usize,
    pub is_member: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl ChannelSummary {
    fn from_record(channel: &ChannelRecord, user_id: Option<&str>) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.display_name().to_string(),
            description: channel.description.clone().unwrap_or_default(),
            member_count: channel.effective_member_count(),
            is_member: user_id.is_some_and(|id| channel.has_member(id)),
            created_at: channel.created_at,
            last_message_at: channel.last_message_at,
        }
    }
}

/// Identifies the channel a create or join landed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRef {
    pub channel_id: String,
    pub channel_name: String,
}

// ==================== Validation ====================

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex pattern is valid"))
}

/// A present, non-blank field, trimmed
fn required<'a>(value: Option<&'a str>, field: &str) -> ChannelResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ChannelError::validation(format!("{} is required", field))),
    }
}

/// Ids and types are interpolated into backend URLs, so keep them to a safe alphabet
fn validate_identifier<'a>(value: &'a str, field: &str) -> ChannelResult<&'a str> {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    if regex(&IDENTIFIER, r"^[a-zA-Z0-9@_-]{1,64}$").is_match(value) {
        Ok(value)
    } else {
        Err(ChannelError::validation(format!(
            "{} may only contain letters, digits, '@', '_' and '-' (max 64)",
            field
        )))
    }
}

fn channel_type_or_default(channel_type: Option<&str>) -> ChannelResult<&str> {
    match channel_type.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => validate_identifier(t, "channelType"),
        None => Ok(DEFAULT_CHANNEL_TYPE),
    }
}

/// Validate and trim a channel name
pub fn validate_channel_name(name: Option<&str>) -> ChannelResult<String> {
    let name = match name {
        Some(n) if !n.is_empty() => n.trim(),
        _ => return Err(ChannelError::validation("Channel name is required")),
    };

    let length = name.chars().count();
    if length < MIN_NAME_LENGTH {
        return Err(ChannelError::validation(format!(
            "Channel name must be at least {} characters",
            MIN_NAME_LENGTH
        )));
    }
    if length > MAX_NAME_LENGTH {
        return Err(ChannelError::validation(format!(
            "Channel name must be {} characters or less",
            MAX_NAME_LENGTH
        )));
    }

    Ok(name.to_string())
}

/// Validate an optional description; blank means none
pub fn validate_description(description: Option<&str>) -> ChannelResult<Option<String>> {
    let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };

    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ChannelError::validation(format!(
            "Channel description must be {} characters or less",
            MAX_DESCRIPTION_LENGTH
        )));
    }

    Ok(Some(description.to_string()))
}

// ==================== Channel Ids ====================

/// Turn a display name into a URL-safe slug.
///
/// Idempotent: slugifying a slug returns it unchanged.
pub fn slugify(name: &str) -> String {
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    static HYPHENS: OnceLock<Regex> = OnceLock::new();

    let lowered = name.to_lowercase();
    let stripped = regex(&DISALLOWED, r"[^a-z0-9\s-]").replace_all(&lowered, "");
    let hyphenated = regex(&WHITESPACE, r"\s+").replace_all(&stripped, "-");
    let collapsed = regex(&HYPHENS, r"-+").replace_all(&hyphenated, "-");

    // Only ASCII remains, so byte truncation is safe
    let truncated = &collapsed[..collapsed.len().min(MAX_SLUG_LENGTH)];
    let slug = truncated.trim_matches('-');

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LENGTH)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Slug plus a random base-36 suffix. Not checked against existing ids.
pub fn generate_channel_id(name: &str) -> String {
    format!("{}-{}", slugify(name), random_suffix())
}

// ==================== Manager ====================

/// Orchestrates channel operations over an injected chat backend.
#[derive(Clone)]
pub struct ChannelManager {
    backend: Arc<dyn ChatBackend>,
}

impl ChannelManager {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Fail with `NotConfigured` when the backend has no credentials
    pub fn ensure_configured(&self) -> ChannelResult<()> {
        if self.backend.is_configured() {
            Ok(())
        } else {
            Err(ChannelError::NotConfigured)
        }
    }

    /// List up to 50 messaging channels, most recently active first.
    pub async fn browse_channels(&self, user_id: Option<&str>) -> ChannelResult<Vec<ChannelSummary>> {
        self.ensure_configured()?;
        let user_id = user_id.map(str::trim).filter(|id| !id.is_empty());

        let query = ChannelQuery::by_type(DEFAULT_CHANNEL_TYPE, BROWSE_LIMIT);
        let channels = self
            .backend
            .query_channels(&query)
            .await
            .map_err(ChannelError::backend)?;

        Ok(channels
            .iter()
            .take(BROWSE_LIMIT)
            .map(|channel| ChannelSummary::from_record(channel, user_id))
            .collect())
    }

    /// Create a channel and make its creator the first member.
    pub async fn create_channel(
        &self,
        user_id: Option<&str>,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ChannelResult<ChannelRef> {
        self.ensure_configured()?;
        let user_id = required(user_id, "userId")?;
        let name = validate_channel_name(name)?;
        let description = validate_description(description)?;

        let channel_id = generate_channel_id(&name);
        info!("Creating channel {} ('{}') for {}", channel_id, name, user_id);

        let data = NewChannel {
            name: Some(name.clone()),
            description,
            created_by: Some(user_id.to_string()),
        };
        let channel = self
            .backend
            .get_or_create_channel(DEFAULT_CHANNEL_TYPE, &channel_id, &data)
            .await
            .map_err(ChannelError::backend)?;

        self.backend
            .add_members(DEFAULT_CHANNEL_TYPE, &channel.id, &[user_id.to_string()])
            .await
            .map_err(ChannelError::backend)?;

        Ok(ChannelRef {
            channel_id: channel.id,
            channel_name: name,
        })
    }

    /// Add a user to a channel, creating the default channel on first use.
    pub async fn join_channel(
        &self,
        user_id: Option<&str>,
        channel_id: Option<&str>,
        channel_type: Option<&str>,
    ) -> ChannelResult<ChannelRef> {
        self.ensure_configured()?;
        let user_id = required(user_id, "userId")?;
        let channel_id = match channel_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => validate_identifier(id, "channelId")?,
            None => DEFAULT_CHANNEL_ID,
        };
        let channel_type = channel_type_or_default(channel_type)?;

        let channel = if channel_id == DEFAULT_CHANNEL_ID {
            let data = NewChannel {
                name: Some(DEFAULT_CHANNEL_NAME.to_string()),
                description: Some(DEFAULT_CHANNEL_DESCRIPTION.to_string()),
                created_by: Some(user_id.to_string()),
            };
            self.backend
                .get_or_create_channel(channel_type, channel_id, &data)
                .await
                .map_err(ChannelError::backend)?
        } else {
            self.fetch_channel(channel_type, channel_id).await?
        };

        self.backend
            .add_members(channel_type, &channel.id, &[user_id.to_string()])
            .await
            .map_err(ChannelError::backend)?;

        info!("{} joined channel {}:{}", user_id, channel_type, channel.id);

        Ok(ChannelRef {
            channel_name: channel.display_name().to_string(),
            channel_id: channel.id,
        })
    }

    /// Remove a user from a channel. Removing a non-member is not an error here.
    pub async fn leave_channel(
        &self,
        user_id: Option<&str>,
        channel_id: Option<&str>,
        channel_type: Option<&str>,
    ) -> ChannelResult<()> {
        self.ensure_configured()?;
        let user_id = required(user_id, "userId")?;
        let channel_id = validate_identifier(required(channel_id, "channelId")?, "channelId")?;
        let channel_type = channel_type_or_default(channel_type)?;

        self.backend
            .remove_members(channel_type, channel_id, &[user_id.to_string()])
            .await
            .map_err(ChannelError::backend)?;

        info!("{} left channel {}:{}", user_id, channel_type, channel_id);
        Ok(())
    }

    /// Hard-delete a channel.
    pub async fn delete_channel(
        &self,
        channel_id: Option<&str>,
        channel_type: Option<&str>,
    ) -> ChannelResult<()> {
        self.ensure_configured()?;
        let channel_id = validate_identifier(required(channel_id, "channelId")?, "channelId")?;
        let channel_type = channel_type_or_default(channel_type)?;

        self.backend
            .delete_channel(channel_type, channel_id)
            .await
            .map_err(ChannelError::backend)?;

        info!("Deleted channel {}:{}", channel_type, channel_id);
        Ok(())
    }

    /// Record a member's preferred reading language (or `not_set`).
    pub async fn set_preferred_language(
        &self,
        user_id: Option<&str>,
        channel_id: Option<&str>,
        channel_type: Option<&str>,
        language: Option<&str>,
    ) -> ChannelResult<LanguagePreference> {
        self.ensure_configured()?;
        let user_id = required(user_id, "userId")?;
        let channel_id = validate_identifier(required(channel_id, "channelId")?, "channelId")?;
        let channel_type = channel_type_or_default(channel_type)?;
        let language = required(language, "language")?;

        if language != NOT_SET && !is_supported_language(language) {
            return Err(ChannelError::validation(format!(
                "Unsupported language code: {}",
                language
            )));
        }
        let preference = LanguagePreference::parse(language);

        self.backend
            .set_member_language(channel_type, channel_id, user_id, &preference)
            .await
            .map_err(ChannelError::backend)?;

        info!(
            "{} prefers {} in {}:{}",
            user_id,
            preference.as_str(),
            channel_type,
            channel_id
        );
        Ok(preference)
    }

    /// Fetch one channel with its member state.
    pub async fn get_channel(
        &self,
        channel_id: Option<&str>,
        channel_type: Option<&str>,
    ) -> ChannelResult<ChannelRecord> {
        self.ensure_configured()?;
        let channel_id = validate_identifier(required(channel_id, "channelId")?, "channelId")?;
        let channel_type = channel_type_or_default(channel_type)?;

        self.fetch_channel(channel_type, channel_id).await
    }

    async fn fetch_channel(&self, channel_type: &str, channel_id: &str) -> ChannelResult<ChannelRecord> {
        let channels = self
            .backend
            .query_channels(&ChannelQuery::by_id(channel_type, channel_id))
            .await
            .map_err(ChannelError::backend)?;

        channels
            .into_iter()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| {
                ChannelError::Backend(format!("Channel {}:{} not found", channel_type, channel_id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{MemberRecord, MemoryBackend};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn manager() -> (ChannelManager, MemoryBackend) {
        let backend = MemoryBackend::new();
        (ChannelManager::new(Arc::new(backend.clone())), backend)
    }

    // ==================== slugify Tests ====================

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Rust Fans"), "rust-fans");
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("a - - b"), "a-b");
        assert_eq!(slugify("--edge--"), "edge");
    }

    #[test]
    fn test_slugify_strips_non_ascii() {
        assert_eq!(slugify("Café Crème"), "caf-crme");
        assert_eq!(slugify("한국어 채팅"), "channel");
        assert_eq!(slugify("!!!"), "channel");
        assert_eq!(slugify(""), "channel");
    }

    #[test]
    fn test_slugify_truncates_to_forty() {
        let long = "word ".repeat(20);
        let slug = slugify(&long);
        assert!(slug.len() <= 40);
        assert!(!slug.ends_with('-'));
        assert!(slug.starts_with("word-word"));
    }

    #[test]
    fn test_generate_channel_id_shape() {
        let id = generate_channel_id("Rust Fans");
        let (slug, suffix) = id.rsplit_once('-').expect("has suffix");

        assert_eq!(slug, "rust-fans");
        assert_eq!(suffix.len(), 5);
        assert!(suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b)));
    }

    proptest! {
        #[test]
        fn prop_slugify_is_idempotent(name in "\\PC{0,80}") {
            let once = slugify(&name);
            prop_assert_eq!(slugify(&once), once.clone());
        }

        #[test]
        fn prop_slug_is_url_safe(name in "\\PC{0,80}") {
            let slug = slugify(&name);
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.len() <= 40);
            prop_assert!(slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_name_validation_errors_are_distinct() {
        let missing = validate_channel_name(None).unwrap_err();
        let short = validate_channel_name(Some("a")).unwrap_err();
        let long = validate_channel_name(Some(&"x".repeat(51))).unwrap_err();

        assert_eq!(missing, ChannelError::validation("Channel name is required"));
        assert_eq!(short, ChannelError::validation("Channel name must be at least 2 characters"));
        assert_eq!(long, ChannelError::validation("Channel name must be 50 characters or less"));
    }

    #[test]
    fn test_name_validation_bounds() {
        assert_eq!(validate_channel_name(Some("ab")).unwrap(), "ab");
        assert_eq!(validate_channel_name(Some(&"x".repeat(50))).unwrap().len(), 50);
        assert_eq!(validate_channel_name(Some("  ab  ")).unwrap(), "ab");
        assert!(validate_channel_name(Some("   a   ")).is_err());
        assert!(validate_channel_name(Some("")).is_err());
    }

    #[test]
    fn test_name_length_counts_characters() {
        // 50 Hangul syllables is 150 bytes but within the limit
        assert!(validate_channel_name(Some(&"가".repeat(50))).is_ok());
    }

    #[test]
    fn test_description_validation() {
        assert_eq!(validate_description(None).unwrap(), None);
        assert_eq!(validate_description(Some("   ")).unwrap(), None);
        assert_eq!(validate_description(Some(" hi ")).unwrap().as_deref(), Some("hi"));
        assert!(validate_description(Some(&"d".repeat(201))).is_err());
    }

    // ==================== Configuration Tests ====================

    #[tokio::test]
    async fn test_every_operation_checks_configuration_first() {
        let manager = ChannelManager::new(Arc::new(MemoryBackend::unconfigured()));

        assert_eq!(manager.browse_channels(Some("u")).await.unwrap_err(), ChannelError::NotConfigured);
        assert_eq!(
            manager.create_channel(None, None, None).await.unwrap_err(),
            ChannelError::NotConfigured
        );
        assert_eq!(
            manager.join_channel(None, None, None).await.unwrap_err(),
            ChannelError::NotConfigured
        );
        assert_eq!(
            manager.leave_channel(None, None, None).await.unwrap_err(),
            ChannelError::NotConfigured
        );
        assert_eq!(
            manager.delete_channel(None, None).await.unwrap_err(),
            ChannelError::NotConfigured
        );
        assert_eq!(
            manager.set_preferred_language(None, None, None, None).await.unwrap_err(),
            ChannelError::NotConfigured
        );
    }

    // ==================== Create Tests ====================

    #[tokio::test]
    async fn test_create_channel_adds_creator() {
        let (manager, backend) = manager();

        let created = manager
            .create_channel(Some("alice"), Some("  Rust Fans "), Some("All things Rust"))
            .await
            .expect("create should succeed");

        assert_eq!(created.channel_name, "Rust Fans");
        assert!(created.channel_id.starts_with("rust-fans-"));

        let channel = backend.channel("messaging", &created.channel_id).unwrap().unwrap();
        assert_eq!(channel.created_by.as_deref(), Some("alice"));
        assert_eq!(channel.description.as_deref(), Some("All things Rust"));
        assert_eq!(channel.members, vec![MemberRecord::new("alice")]);
    }

    #[tokio::test]
    async fn test_create_channel_validation() {
        let (manager, backend) = manager();

        let short = manager.create_channel(Some("alice"), Some("a"), None).await;
        let long = manager
            .create_channel(Some("alice"), Some(&"n".repeat(51)), None)
            .await;
        let no_user = manager.create_channel(None, Some("Valid"), None).await;

        assert!(matches!(short, Err(ChannelError::Validation(_))));
        assert!(matches!(long, Err(ChannelError::Validation(_))));
        assert_ne!(short.unwrap_err(), long.unwrap_err());
        assert_eq!(no_user.unwrap_err(), ChannelError::validation("userId is required"));
        assert_eq!(backend.channel_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_channel_accepts_boundary_lengths() {
        let (manager, _) = manager();

        assert!(manager.create_channel(Some("alice"), Some("ab"), None).await.is_ok());
        assert!(manager
            .create_channel(Some("alice"), Some(&"n".repeat(50)), None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_create_same_name_twice_gives_distinct_ids() {
        let (manager, backend) = manager();

        let first = manager.create_channel(Some("a"), Some("Lobby"), None).await.unwrap();
        let second = manager.create_channel(Some("b"), Some("Lobby"), None).await.unwrap();

        assert_ne!(first.channel_id, second.channel_id);
        assert_eq!(backend.channel_count().unwrap(), 2);
    }

    // ==================== Join Tests ====================

    #[tokio::test]
    async fn test_join_defaults_to_global_channel() {
        let (manager, backend) = manager();

        let joined = manager.join_channel(Some("alice"), None, None).await.unwrap();
        assert_eq!(joined.channel_id, DEFAULT_CHANNEL_ID);
        assert_eq!(joined.channel_name, DEFAULT_CHANNEL_NAME);

        let channel = backend.channel("messaging", DEFAULT_CHANNEL_ID).unwrap().unwrap();
        assert!(channel.has_member("alice"));
        assert_eq!(channel.description.as_deref(), Some(DEFAULT_CHANNEL_DESCRIPTION));
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let (manager, backend) = manager();

        manager.join_channel(Some("alice"), Some("alma-global"), None).await.unwrap();
        let once = backend.channel("messaging", DEFAULT_CHANNEL_ID).unwrap().unwrap();

        manager.join_channel(Some("alice"), Some("alma-global"), None).await.unwrap();
        let twice = backend.channel("messaging", DEFAULT_CHANNEL_ID).unwrap().unwrap();

        assert_eq!(once.members, twice.members);
        assert_eq!(twice.members.len(), 1);
    }

    #[tokio::test]
    async fn test_join_existing_channel() {
        let (manager, backend) = manager();
        let created = manager.create_channel(Some("alice"), Some("Book Club"), None).await.unwrap();

        let joined = manager
            .join_channel(Some("bob"), Some(&created.channel_id), Some("messaging"))
            .await
            .unwrap();

        assert_eq!(joined.channel_name, "Book Club");
        let channel = backend.channel("messaging", &created.channel_id).unwrap().unwrap();
        assert!(channel.has_member("alice"));
        assert!(channel.has_member("bob"));
    }

    #[tokio::test]
    async fn test_join_unknown_channel_fails_without_creating() {
        let (manager, backend) = manager();

        let result = manager.join_channel(Some("bob"), Some("nowhere"), None).await;
        assert!(matches!(result, Err(ChannelError::Backend(_))));
        assert_eq!(backend.channel_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_join_requires_user_and_safe_ids() {
        let (manager, _) = manager();

        assert!(matches!(
            manager.join_channel(Some("  "), None, None).await,
            Err(ChannelError::Validation(_))
        ));
        assert!(matches!(
            manager.join_channel(Some("alice"), Some("../admin"), None).await,
            Err(ChannelError::Validation(_))
        ));
        assert!(matches!(
            manager.join_channel(Some("alice"), None, Some("bad type")).await,
            Err(ChannelError::Validation(_))
        ));
    }

    // ==================== Leave / Delete Tests ====================

    #[tokio::test]
    async fn test_leave_channel() {
        let (manager, backend) = manager();
        manager.join_channel(Some("alice"), None, None).await.unwrap();

        manager
            .leave_channel(Some("alice"), Some(DEFAULT_CHANNEL_ID), None)
            .await
            .unwrap();
        // Leaving again is not an error
        manager
            .leave_channel(Some("alice"), Some(DEFAULT_CHANNEL_ID), None)
            .await
            .unwrap();

        let channel = backend.channel("messaging", DEFAULT_CHANNEL_ID).unwrap().unwrap();
        assert!(!channel.has_member("alice"));
    }

    #[tokio::test]
    async fn test_leave_requires_both_ids() {
        let (manager, _) = manager();

        assert_eq!(
            manager.leave_channel(None, Some("c"), None).await.unwrap_err(),
            ChannelError::validation("userId is required")
        );
        assert_eq!(
            manager.leave_channel(Some("u"), None, None).await.unwrap_err(),
            ChannelError::validation("channelId is required")
        );
    }

    #[tokio::test]
    async fn test_delete_channel() {
        let (manager, backend) = manager();
        let created = manager.create_channel(Some("alice"), Some("Temp"), None).await.unwrap();

        manager.delete_channel(Some(&created.channel_id), None).await.unwrap();
        assert_eq!(backend.channel_count().unwrap(), 0);

        // Second delete surfaces the backend failure
        let again = manager.delete_channel(Some(&created.channel_id), None).await;
        assert!(matches!(again, Err(ChannelError::Backend(_))));
    }

    #[tokio::test]
    async fn test_delete_requires_channel_id() {
        let (manager, _) = manager();
        assert_eq!(
            manager.delete_channel(Some(""), None).await.unwrap_err(),
            ChannelError::validation("channelId is required")
        );
    }

    // ==================== Browse Tests ====================

    #[tokio::test]
    async fn test_browse_reports_membership_and_counts() {
        let (manager, backend) = manager();
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let mut busy = ChannelRecord::new("messaging", "busy");
        busy.members = vec![MemberRecord::new("alice"), MemberRecord::new("bob")];
        busy.last_message_at = Some(base + Duration::minutes(5));
        backend.insert_channel(busy).unwrap();

        let mut quiet = ChannelRecord::new("messaging", "quiet");
        quiet.name = Some("Quiet Room".to_string());
        quiet.members = vec![MemberRecord::new("carol")];
        quiet.last_message_at = Some(base);
        backend.insert_channel(quiet).unwrap();

        let listing = manager.browse_channels(Some("alice")).await.unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].id, "busy");
        assert_eq!(listing[0].name, "busy");
        assert_eq!(listing[0].member_count, 2);
        assert!(listing[0].is_member);
        assert_eq!(listing[1].name, "Quiet Room");
        assert_eq!(listing[1].member_count, 1);
        assert!(!listing[1].is_member);
    }

    #[tokio::test]
    async fn test_browse_caps_at_fifty() {
        let (manager, backend) = manager();
        for i in 0..60 {
            backend
                .insert_channel(ChannelRecord::new("messaging", format!("room-{}", i)))
                .unwrap();
        }

        let listing = manager.browse_channels(None).await.unwrap();
        assert_eq!(listing.len(), BROWSE_LIMIT);
        assert!(listing.iter().all(|c| !c.is_member));
    }

    #[test]
    fn test_channel_summary_serializes_camel_case() {
        let mut record = ChannelRecord::new("messaging", "c");
        record.member_count = Some(3);
        let summary = ChannelSummary::from_record(&record, Some("x"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["memberCount"], 3);
        assert_eq!(json["isMember"], false);
        assert_eq!(json["description"], "");
        assert!(json["lastMessageAt"].is_null());
    }

    // ==================== Language Preference Tests ====================

    #[tokio::test]
    async fn test_set_preferred_language() {
        let (manager, backend) = manager();
        manager.join_channel(Some("alice"), None, None).await.unwrap();

        let pref = manager
            .set_preferred_language(Some("alice"), Some(DEFAULT_CHANNEL_ID), None, Some("ko"))
            .await
            .unwrap();
        assert_eq!(pref.as_str(), "ko");

        let channel = backend.channel("messaging", DEFAULT_CHANNEL_ID).unwrap().unwrap();
        assert_eq!(channel.members[0].preferred_language, pref);

        let cleared = manager
            .set_preferred_language(Some("alice"), Some(DEFAULT_CHANNEL_ID), None, Some("not_set"))
            .await
            .unwrap();
        assert_eq!(cleared, LanguagePreference::NotSet);
    }

    #[tokio::test]
    async fn test_set_preferred_language_rejects_unsupported() {
        let (manager, _) = manager();
        let result = manager
            .set_preferred_language(Some("alice"), Some(DEFAULT_CHANNEL_ID), None, Some("xx"))
            .await;
        assert_eq!(
            result.unwrap_err(),
            ChannelError::validation("Unsupported language code: xx")
        );
    }
}
