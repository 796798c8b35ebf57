//! Stream Chat REST client.
//!
//! Server-side calls authenticate with an HS256 JWT signed by the API secret
//! (`{"server": true}`), sent raw in `Authorization` together with
//! `stream-auth-type: jwt` and the `api_key` query parameter.

use super::{ChannelQuery, ChannelRecord, ChatBackend, MemberRecord, NewChannel};
use crate::config::Config;
use crate::i18n::LanguagePreference;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Members returned per channel when listing
const MEMBER_LIMIT: usize = 100;

#[derive(Debug, Serialize, Deserialize)]
struct ServerClaims {
    server: bool,
}

/// Sign the server-side token Stream expects for backend calls
pub fn server_token(api_secret: &str) -> Result<String> {
    encode(
        &Header::default(),
        &ServerClaims { server: true },
        &EncodingKey::from_secret(api_secret.as_bytes()),
    )
    .context("Failed to sign Stream server token")
}

// ==================== Wire Types ====================

#[derive(Debug, Deserialize)]
struct UserRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelData {
    id: String,
    #[serde(rename = "type")]
    channel_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_by: Option<UserRef>,
    #[serde(default)]
    member_count: Option<usize>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_message_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct MemberData {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    user: Option<UserRef>,
    #[serde(default)]
    preferred_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelStateResponse {
    channel: ChannelData,
    #[serde(default)]
    members: Vec<MemberData>,
}

#[derive(Debug, Deserialize)]
struct QueryChannelsResponse {
    #[serde(default)]
    channels: Vec<ChannelStateResponse>,
}

impl From<ChannelStateResponse> for ChannelRecord {
    fn from(state: ChannelStateResponse) -> Self {
        let members = state
            .members
            .into_iter()
            .filter_map(|m| {
                let user_id = m.user_id.or(m.user.map(|u| u.id))?;
                Some(MemberRecord {
                    user_id,
                    preferred_language: m
                        .preferred_language
                        .as_deref()
                        .map(LanguagePreference::parse)
                        .unwrap_or_default(),
                })
            })
            .collect();

        let channel = state.channel;
        ChannelRecord {
            id: channel.id,
            channel_type: channel.channel_type,
            name: channel.name,
            description: channel.description,
            created_by: channel.created_by.map(|u| u.id),
            member_count: channel.member_count,
            created_at: channel.created_at,
            last_message_at: channel.last_message_at,
            members,
        }
    }
}

// ==================== Client ====================

#[derive(Clone)]
pub struct StreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    token: Option<String>,
}

impl StreamClient {
    /// Build the client from configuration. Missing credentials are not an
    /// error here; `is_configured` reports them.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.stream_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Self::with_credentials(
            http,
            &config.stream_base_url,
            config.stream_api_key.as_deref(),
            config.stream_api_secret.as_deref(),
        )
    }

    pub fn with_credentials(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<&str>,
        api_secret: Option<&str>,
    ) -> Result<Self> {
        let token = api_secret.map(server_token).transpose()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let (Some(api_key), Some(token)) = (&self.api_key, &self.token) else {
            anyhow::bail!("Stream credentials are not configured");
        };

        Ok(self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .query(&[("api_key", api_key.as_str())])
            .header("Authorization", token.as_str())
            .header("stream-auth-type", "jwt"))
    }

    async fn execute(&self, request: RequestBuilder, operation: &str) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to Stream", operation))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Stream API error during {} ({}): {}", operation, status, body);
        }

        Ok(response)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T> {
        self.execute(request, operation)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse Stream {} response", operation))
    }

    async fn update_members(
        &self,
        channel_type: &str,
        channel_id: &str,
        field: &str,
        user_ids: &[String],
    ) -> Result<()> {
        let mut body = serde_json::Map::new();
        body.insert(field.to_string(), json!(user_ids));

        let request = self
            .request(Method::POST, &format!("/channels/{}/{}", channel_type, channel_id))?
            .json(&body);

        self.execute(request, field).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for StreamClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.token.is_some()
    }

    async fn query_channels(&self, query: &ChannelQuery) -> Result<Vec<ChannelRecord>> {
        let mut filter = json!({ "type": query.channel_type });
        if let Some(id) = &query.channel_id {
            filter["id"] = json!(id);
        }

        let body = json!({
            "filter_conditions": filter,
            "sort": [{ "field": "last_message_at", "direction": -1 }],
            "limit": query.limit,
            "member_limit": MEMBER_LIMIT,
            "state": true,
            "watch": false,
            "presence": false,
        });

        debug!("Querying Stream channels: {}", body);
        let request = self.request(Method::POST, "/channels")?.json(&body);
        let response: QueryChannelsResponse = self.execute_json(request, "query channels").await?;

        Ok(response.channels.into_iter().map(ChannelRecord::from).collect())
    }

    async fn get_or_create_channel(
        &self,
        channel_type: &str,
        channel_id: &str,
        data: &NewChannel,
    ) -> Result<ChannelRecord> {
        let mut channel_data = json!({});
        if let Some(name) = &data.name {
            channel_data["name"] = json!(name);
        }
        if let Some(description) = &data.description {
            channel_data["description"] = json!(description);
        }
        if let Some(created_by) = &data.created_by {
            channel_data["created_by_id"] = json!(created_by);
        }

        let request = self
            .request(
                Method::POST,
                &format!("/channels/{}/{}/query", channel_type, channel_id),
            )?
            .json(&json!({
                "data": channel_data,
                "state": true,
                "watch": false,
                "presence": false,
            }));

        let response: ChannelStateResponse = self.execute_json(request, "create channel").await?;
        Ok(response.into())
    }

    async fn add_members(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<()> {
        self.update_members(channel_type, channel_id, "add_members", user_ids)
            .await
    }

    async fn remove_members(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<()> {
        self.update_members(channel_type, channel_id, "remove_members", user_ids)
            .await
    }

    async fn delete_channel(&self, channel_type: &str, channel_id: &str) -> Result<()> {
        let request = self
            .request(
                Method::DELETE,
                &format!("/channels/{}/{}", channel_type, channel_id),
            )?
            .query(&[("hard_delete", "true")]);

        self.execute(request, "delete channel").await?;
        Ok(())
    }

    async fn set_member_language(
        &self,
        channel_type: &str,
        channel_id: &str,
        user_id: &str,
        preference: &LanguagePreference,
    ) -> Result<()> {
        let request = self
            .request(
                Method::PATCH,
                &format!("/channels/{}/{}/member", channel_type, channel_id),
            )?
            .query(&[("user_id", user_id)])
            .json(&json!({ "set": { "preferred_language": preference.as_str() } }));

        self.execute(request, "update member").await?;
        Ok(())
    }
}
