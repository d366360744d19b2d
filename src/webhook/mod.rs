use crate::config::AppConfig;
use crate::metrics;
use crate::models::{SyncResult, parse_push_event};
use crate::notifications::{DeliveryResult, NotificationGateway};
use crate::policy::AdmissionDecision;
use crate::report;
use crate::sync::SyncEngine;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header::USER_AGENT};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared read-only state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sync_engine: Arc<SyncEngine>,
    pub gateway: Arc<dyn NotificationGateway>,
}

/// Sync-or-skip outcome echoed to the webhook caller.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DeployReport {
    Skipped { skipped: bool, reason: String },
    Synced(SyncResult),
}

impl DeployReport {
    fn skipped(reason: String) -> Self {
        Self::Skipped {
            skipped: true,
            reason,
        }
    }
}

/// Body of the webhook endpoint's 200 response. Always `ok: true` once the
/// secret check passed: the contract is "event received and processed",
/// not "image is now running".
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub ok: bool,
    pub meow_result: DeliveryResult,
    pub deploy: DeployReport,
    pub user_agent: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/payload", post(handle_payload))
        .route("/", post(handle_payload))
        .route("/health", get(health_check))
        .route("/notify", get(notify_get).post(notify_post))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Shared-secret check. When no secret is configured every caller passes;
/// otherwise the supplied value must match. The values are compared as
/// SHA-256 digests.
pub fn secret_authorized(expected: Option<&str>, provided: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => match provided {
            Some(provided) => {
                Sha256::digest(expected.as_bytes()) == Sha256::digest(provided.as_bytes())
            }
            None => false,
        },
    }
}

/// The event-to-action pipeline: parse, admit, sync, report, notify.
/// Free of HTTP types so integration tests can drive it directly. The
/// secret check happens before this is called.
pub async fn process_webhook(
    state: &AppState,
    raw_body: &[u8],
    user_agent: Option<&str>,
) -> WebhookResponse {
    metrics::WEBHOOK_EVENTS_TOTAL.inc();

    let user_agent = user_agent.unwrap_or("").to_string();
    let raw_text = String::from_utf8_lossy(raw_body);
    info!("Webhook received (user agent: {})", user_agent);
    info!("Webhook payload: {}", truncate_chars(&raw_text, 4000));

    let event = parse_push_event(raw_body);
    let decision = state.config.admission.admit(&event);

    let (deploy, result) = match &decision {
        AdmissionDecision::Proceed => {
            let result = state.sync_engine.sync(&event, None).await;
            if result.terminated_early {
                metrics::SYNCS_TERMINATED_EARLY.inc();
            } else {
                metrics::SYNCS_COMPLETED.inc();
            }
            (DeployReport::Synced(result.clone()), Some(result))
        }
        AdmissionDecision::Skip { reason } => {
            info!("Sync not triggered: {}", reason);
            metrics::WEBHOOK_EVENTS_SKIPPED.inc();
            (DeployReport::skipped(reason.clone()), None)
        }
    };

    let status = report::build_status(&decision, result.as_ref(), &event, &state.config.notifier);
    let link = (!status.link.is_empty()).then_some(status.link.as_str());

    let meow_result = state
        .gateway
        .notify(
            &state.config.notifier.nickname,
            &status.headline,
            &status.body,
            link,
        )
        .await;

    if meow_result.http_status == 0 {
        metrics::NOTIFICATIONS_FAILED_TOTAL.inc();
    } else {
        metrics::NOTIFICATIONS_SENT_TOTAL.inc();
    }

    WebhookResponse {
        ok: true,
        meow_result,
        deploy,
        user_agent,
    }
}

#[derive(Debug, Deserialize)]
struct SecretQuery {
    secret: Option<String>,
}

async fn handle_payload(
    State(state): State<AppState>,
    Query(query): Query<SecretQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !secret_authorized(
        state.config.webhook_secret.as_deref(),
        query.secret.as_deref(),
    ) {
        warn!("Webhook secret mismatch");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "secret invalid"})),
        )
            .into_response();
    }

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let response = process_webhook(&state, &body, user_agent).await;

    (StatusCode::OK, Json(response)).into_response()
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "nickname": state.config.notifier.nickname,
        "api_base": state.config.notifier.api_base,
    }))
}

#[derive(Debug, Deserialize)]
struct NotifyParams {
    title: Option<String>,
    msg: Option<String>,
    url: Option<String>,
    nickname: Option<String>,
    secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotifyBody {
    title: Option<String>,
    msg: Option<String>,
    url: Option<String>,
    nickname: Option<String>,
}

async fn notify_get(State(state): State<AppState>, Query(params): Query<NotifyParams>) -> Response {
    if !secret_authorized(
        state.config.webhook_secret.as_deref(),
        params.secret.as_deref(),
    ) {
        warn!("Manual notify secret mismatch");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "secret invalid"})),
        )
            .into_response();
    }

    let Some(msg) = params.msg.filter(|m| !m.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "msg is required"})),
        )
            .into_response();
    };

    let result = manual_notify(&state, params.title, msg, params.url, params.nickname).await;
    Json(result).into_response()
}

async fn notify_post(
    State(state): State<AppState>,
    Query(query): Query<SecretQuery>,
    Json(body): Json<NotifyBody>,
) -> Response {
    if !secret_authorized(
        state.config.webhook_secret.as_deref(),
        query.secret.as_deref(),
    ) {
        warn!("Manual notify secret mismatch");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "secret invalid"})),
        )
            .into_response();
    }

    let Some(msg) = body.msg.filter(|m| !m.is_empty()) else {
        warn!("Manual notify without msg");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "msg is required"})),
        )
            .into_response();
    };

    let result = manual_notify(&state, body.title, msg, body.url, body.nickname).await;
    Json(result).into_response()
}

/// Manual-notify path: bypasses the event pipeline entirely and talks to
/// the gateway with caller-supplied content.
async fn manual_notify(
    state: &AppState,
    title: Option<String>,
    msg: String,
    url: Option<String>,
    nickname: Option<String>,
) -> DeliveryResult {
    let notifier = &state.config.notifier;

    let title = title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| notifier.default_title.clone());
    let nickname = nickname
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| notifier.nickname.clone());
    let link = url
        .filter(|u| !u.is_empty())
        .or_else(|| notifier.default_jump_url.clone());

    info!("Manual notification for {}: {}", nickname, title);

    let result = state
        .gateway
        .notify(&nickname, &title, &msg, link.as_deref())
        .await;

    if result.http_status == 0 {
        metrics::NOTIFICATIONS_FAILED_TOTAL.inc();
    } else {
        metrics::NOTIFICATIONS_SENT_TOTAL.inc();
    }

    result
}

/// Truncate to a character count without splitting a code point.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
