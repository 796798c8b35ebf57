//! In-process chat backend.
//!
//! Mirrors the parts of Stream's channel semantics the lifecycle relies on:
//! get-or-create never overwrites existing data, membership changes are
//! idempotent, and operations on a missing channel fail.

use super::{ChannelQuery, ChannelRecord, ChatBackend, MemberRecord, NewChannel};
use crate::i18n::LanguagePreference;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type ChannelKey = (String, String);

#[derive(Clone)]
pub struct MemoryBackend {
    channels: Arc<Mutex<HashMap<ChannelKey, ChannelRecord>>>,
    configured: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            configured: true,
        }
    }

    /// A backend that reports missing credentials, for exercising that path
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// Insert or replace a channel as-is
    pub fn insert_channel(&self, channel: ChannelRecord) -> Result<()> {
        let key = (channel.channel_type.clone(), channel.id.clone());
        self.lock()?.insert(key, channel);
        Ok(())
    }

    /// Look up a channel without going through the query path
    pub fn channel(&self, channel_type: &str, channel_id: &str) -> Result<Option<ChannelRecord>> {
        Ok(self.lock()?.get(&key(channel_type, channel_id)).cloned())
    }

    pub fn channel_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ChannelKey, ChannelRecord>>> {
        self.channels
            .lock()
            .map_err(|_| anyhow!("Memory backend lock poisoned"))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn key(channel_type: &str, channel_id: &str) -> ChannelKey {
    (channel_type.to_string(), channel_id.to_string())
}

/// Channel as returned to callers: member count always reflects the members
fn snapshot(channel: &ChannelRecord) -> ChannelRecord {
    let mut channel = channel.clone();
    channel.member_count = Some(channel.members.len());
    channel
}

#[async_trait]
impl ChatBackend for MemoryBackend {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn query_channels(&self, query: &ChannelQuery) -> Result<Vec<ChannelRecord>> {
        let channels = self.lock()?;

        let mut matching: Vec<&ChannelRecord> = channels
            .values()
            .filter(|c| c.channel_type == query.channel_type)
            .filter(|c| query.channel_id.as_deref().map_or(true, |id| c.id == id))
            .collect();

        // HashMap order is arbitrary; sort by id first so ties come out stable
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        matching.sort_by_key(|c| Reverse(c.last_message_at));

        Ok(matching
            .into_iter()
            .take(query.limit)
            .map(snapshot)
            .collect())
    }

    async fn get_or_create_channel(
        &self,
        channel_type: &str,
        channel_id: &str,
        data: &NewChannel,
    ) -> Result<ChannelRecord> {
        let mut channels = self.lock()?;

        let channel = channels
            .entry(key(channel_type, channel_id))
            .or_insert_with(|| {
                let mut channel = ChannelRecord::new(channel_type, channel_id);
                channel.name = data.name.clone();
                channel.description = data.description.clone();
                channel.created_by = data.created_by.clone();
                channel.created_at = Some(Utc::now());
                channel
            });

        Ok(snapshot(channel))
    }

    async fn add_members(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<()> {
        let mut channels = self.lock()?;
        let Some(channel) = channels.get_mut(&key(channel_type, channel_id)) else {
            bail!("Channel {}:{} not found", channel_type, channel_id);
        };

        for user_id in user_ids {
            if !channel.has_member(user_id) {
                channel.members.push(MemberRecord::new(user_id.clone()));
            }
        }
        Ok(())
    }

    async fn remove_members(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<()> {
        let mut channels = self.lock()?;
        let Some(channel) = channels.get_mut(&key(channel_type, channel_id)) else {
            bail!("Channel {}:{} not found", channel_type, channel_id);
        };

        channel.members.retain(|m| !user_ids.contains(&m.user_id));
        Ok(())
    }

    async fn delete_channel(&self, channel_type: &str, channel_id: &str) -> Result<()> {
        if self.lock()?.remove(&key(channel_type, channel_id)).is_none() {
            bail!("Channel {}:{} not found", channel_type, channel_id);
        }
        Ok(())
    }

    async fn set_member_language(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_id: &str,
        preference: &LanguagePreference,
    ) -> Result<()> {
        let mut channels = self.lock()?;
        let Some(channel) = channels.get_mut(&key(channel_type, channel_id)) else {
            bail!("Channel {}:{} not found", channel_type, channel_id);
        };

        let Some(member) = channel.members.iter_mut().find(|m| m.user_id == user_id) else {
            bail!("User {} is not a member of {}:{}", user_id, channel_type, channel_id);
        };

        member.preferred_language = preference.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_or_create_does_not_overwrite() {
        let backend = MemoryBackend::new();
        let first = NewChannel {
            name: Some("First".to_string()),
            ..Default::default()
        };
        let second = NewChannel {
            name: Some("Second".to_string()),
            ..Default::default()
        };

        backend.get_or_create_channel("messaging", "c1", &first).await.unwrap();
        let channel = backend.get_or_create_channel("messaging", "c1", &second).await.unwrap();

        assert_eq!(channel.name.as_deref(), Some("First"));
        assert!(channel.created_at.is_some());
        assert_eq!(backend.channel_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_membership_is_idempotent() {
        let backend = MemoryBackend::new();
        backend
            .get_or_create_channel("messaging", "c1", &NewChannel::default())
            .await
            .unwrap();

        backend.add_members("messaging", "c1", &ids(&["alice"])).await.unwrap();
        backend.add_members("messaging", "c1", &ids(&["alice"])).await.unwrap();
        let channel = backend.channel("messaging", "c1").unwrap().unwrap();
        assert_eq!(channel.members.len(), 1);

        backend.remove_members("messaging", "c1", &ids(&["alice"])).await.unwrap();
        backend.remove_members("messaging", "c1", &ids(&["alice"])).await.unwrap();
        let channel = backend.channel("messaging", "c1").unwrap().unwrap();
        assert!(channel.members.is_empty());
    }

    #[tokio::test]
    async fn test_operations_on_missing_channel_fail() {
        let backend = MemoryBackend::new();
        assert!(backend.add_members("messaging", "nope", &ids(&["a"])).await.is_err());
        assert!(backend.remove_members("messaging", "nope", &ids(&["a"])).await.is_err());
        assert!(backend.delete_channel("messaging", "nope").await.is_err());
        assert!(backend
            .set_member_language("messaging", "nope", "a", &LanguagePreference::NotSet)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_query_sorts_by_last_message_and_limits() {
        let backend = MemoryBackend::new();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        for (i, id) in ["old", "new", "mid"].iter().enumerate() {
            let mut channel = ChannelRecord::new("messaging", *id);
            channel.last_message_at = Some(base + Duration::hours(match i {
                0 => 1,
                1 => 3,
                _ => 2,
            }));
            backend.insert_channel(channel).unwrap();
        }
        backend.insert_channel(ChannelRecord::new("messaging", "silent")).unwrap();
        backend.insert_channel(ChannelRecord::new("livestream", "other")).unwrap();

        let result = backend
            .query_channels(&ChannelQuery::by_type("messaging", 10))
            .await
            .unwrap();
        let order: Vec<_> = result.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old", "silent"]);

        let limited = backend
            .query_channels(&ChannelQuery::by_type("messaging", 2))
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_query_by_id() {
        let backend = MemoryBackend::new();
        backend.insert_channel(ChannelRecord::new("messaging", "a")).unwrap();
        backend.insert_channel(ChannelRecord::new("messaging", "b")).unwrap();

        let result = backend
            .query_channels(&ChannelQuery::by_id("messaging", "b"))
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "b");
    }

    #[tokio::test]
    async fn test_set_member_language() {
        let backend = MemoryBackend::new();
        backend
            .get_or_create_channel("messaging", "c1", &NewChannel::default())
            .await
            .unwrap();
        backend.add_members("messaging", "c1", &ids(&["alice"])).await.unwrap();

        let pref = LanguagePreference::parse("ko");
        backend
            .set_member_language("messaging", "c1", "alice", &pref)
            .await
            .unwrap();

        let channel = backend.channel("messaging", "c1").unwrap().unwrap();
        assert_eq!(channel.members[0].preferred_language, pref);

        let not_member = backend
            .set_member_language("messaging", "c1", "bob", &pref)
            .await;
        assert!(not_member.is_err());
    }

    #[test]
    fn test_unconfigured() {
        assert!(MemoryBackend::new().is_configured());
        assert!(!MemoryBackend::unconfigured().is_configured());
    }
}
