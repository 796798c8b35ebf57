//! HTTP surface: one JSON endpoint per operation.
//!
//! Errors are returned as `{"error": "<message>"}` with a status derived from
//! the error kind.

use crate::channels::{ChannelManager, ChannelRef, ChannelSummary};
use crate::config::Config;
use crate::error::ChannelError;
use crate::fanout::{route_message, Message, RoutedMessage};
use crate::i18n::{detect, LanguageCode};
use crate::security::is_authorized;
use crate::translation::{translate_fanout, Translation};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub channels: ChannelManager,
    pub http: reqwest::Client,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/language/detect", post(detect_language))
        .route("/api/channels", get(browse_channels).post(create_channel))
        .route("/api/channels/join", post(join_channel))
        .route("/api/channels/leave", post(leave_channel))
        .route("/api/channels/language", post(set_language))
        .route("/api/channels/:channel_id", delete(delete_channel))
        .route("/api/messages/route", post(route))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==================== Errors ====================

#[derive(Debug)]
pub enum ApiError {
    Channel(ChannelError),
    Unauthorized,
}

impl From<ChannelError> for ApiError {
    fn from(err: ChannelError) -> Self {
        ApiError::Channel(err)
    }
}

/// Unreadable bodies are validation errors like any other bad input
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Channel(ChannelError::Validation(rejection.body_text()))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Channel(ChannelError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Channel(ChannelError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Channel(ChannelError::Backend(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Channel(err) => err.to_string(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
        };

        if status.is_server_error() {
            warn!("Request failed ({}): {}", status, message);
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ==================== Requests / Responses ====================

#[derive(Debug, Deserialize)]
struct DetectRequest {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct DetectResponse {
    language: LanguageCode,
    supported: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrowseQuery {
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct BrowseResponse {
    channels: Vec<ChannelSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    user_id: Option<String>,
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MembershipRequest {
    user_id: Option<String>,
    channel_id: Option<String>,
    channel_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageRequest {
    user_id: Option<String>,
    channel_id: Option<String>,
    channel_type: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteQuery {
    channel_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteRequest {
    #[serde(flatten)]
    message: Message,
    channel_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct RouteResponse {
    #[serde(flatten)]
    routed: RoutedMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    translations: Option<Vec<Translation>>,
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
}

// ==================== Handlers ====================

async fn health() -> &'static str {
    "OK"
}

async fn detect_language(
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> ApiResult<DetectResponse> {
    let Json(request) = payload?;
    let language = detect(request.text.as_deref().unwrap_or_default());
    Ok(Json(DetectResponse {
        supported: language.is_supported(),
        language,
    }))
}

async fn browse_channels(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> ApiResult<BrowseResponse> {
    let channels = state
        .channels
        .browse_channels(query.user_id.as_deref())
        .await?;
    Ok(Json(BrowseResponse { channels }))
}

async fn create_channel(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ChannelRef>), ApiError> {
    let Json(request) = payload?;
    let created = state
        .channels
        .create_channel(
            request.user_id.as_deref(),
            request.name.as_deref(),
            request.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn join_channel(
    State(state): State<AppState>,
    payload: Result<Json<MembershipRequest>, JsonRejection>,
) -> ApiResult<ChannelRef> {
    let Json(request) = payload?;
    let joined = state
        .channels
        .join_channel(
            request.user_id.as_deref(),
            request.channel_id.as_deref(),
            request.channel_type.as_deref(),
        )
        .await?;
    Ok(Json(joined))
}

async fn leave_channel(
    State(state): State<AppState>,
    payload: Result<Json<MembershipRequest>, JsonRejection>,
) -> ApiResult<SuccessResponse> {
    let Json(request) = payload?;
    state
        .channels
        .leave_channel(
            request.user_id.as_deref(),
            request.channel_id.as_deref(),
            request.channel_type.as_deref(),
        )
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn delete_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<DeleteQuery>,
    headers: HeaderMap,
) -> ApiResult<SuccessResponse> {
    if !is_authorized(&headers, state.config.api_key.as_deref()) {
        return Err(ApiError::Unauthorized);
    }

    state
        .channels
        .delete_channel(Some(&channel_id), query.channel_type.as_deref())
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn set_language(
    State(state): State<AppState>,
    payload: Result<Json<LanguageRequest>, JsonRejection>,
) -> ApiResult<SuccessResponse> {
    let Json(request) = payload?;
    state
        .channels
        .set_preferred_language(
            request.user_id.as_deref(),
            request.channel_id.as_deref(),
            request.channel_type.as_deref(),
            request.language.as_deref(),
        )
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn route(
    State(state): State<AppState>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> ApiResult<RouteResponse> {
    let Json(request) = payload?;
    let routed = route_message(
        &state.channels,
        request.message,
        request.channel_type.as_deref(),
    )
    .await?;

    let translations = if state.config.translation_enabled() && !routed.translation_targets.is_empty() {
        Some(translate_fanout(&state.http, &state.config, &routed).await)
    } else {
        None
    };

    Ok(Json(RouteResponse {
        routed,
        translations,
    }))
}
