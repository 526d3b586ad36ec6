//! Push ingress
//!
//! A small HTTP surface the automation hub calls to fan out
//! notifications to registered chats. Requests address recipients by key
//! id selector (or an explicit chat id) and carry one payload; delivery
//! goes through the same broadcast layer the rest of the bridge uses.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::info;

use chatops_core::{Broadcaster, SendPayload, Target};

#[derive(Clone)]
struct PushState {
    broadcaster: Arc<Broadcaster>,
    token: Option<String>,
}

/// One send request.
#[derive(Debug, Deserialize)]
struct SendRequest {
    /// "text", "photo", "video", "audio" or "document".
    #[serde(default = "default_kind")]
    kind: String,

    /// `"*"`, a single key id, or a list of key ids.
    key_id: Option<Value>,

    /// Explicit chat target for sends without a selector.
    chat_id: Option<String>,

    text: Option<String>,
    media: Option<String>,
    caption: Option<String>,
}

fn default_kind() -> String {
    "text".to_string()
}

#[derive(Debug, Serialize)]
struct SendResponse {
    sent: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Serve the ingress on an already-bound listener until the shutdown
/// channel fires. The caller binds the listener, so a bad listen
/// address is a startup error rather than a background log line.
pub async fn serve(
    listener: tokio::net::TcpListener,
    token: Option<String>,
    broadcaster: Arc<Broadcaster>,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let state = PushState { broadcaster, token };

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/send", post(send))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Push ingress listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    info!("Push ingress stopped");
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn send(
    State(state): State<PushState>,
    headers: HeaderMap,
    Json(request): Json<SendRequest>,
) -> Result<Json<SendResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !authorized(&headers, state.token.as_deref()) {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "invalid or missing bearer token",
        ));
    }

    let target = parse_target(request.key_id.as_ref())
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e))?;
    let payload =
        parse_payload(&request).map_err(|e| error_response(StatusCode::BAD_REQUEST, &e))?;

    match state
        .broadcaster
        .send(&payload, target.as_ref(), request.chat_id.as_deref())
        .await
    {
        Ok(sent) => Ok(Json(SendResponse { sent })),
        Err(e) => Err(error_response(StatusCode::BAD_REQUEST, &e.to_string())),
    }
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Bearer check. With no configured token every caller is allowed; the
/// expected deployment then binds to loopback.
fn authorized(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

/// Parse the key id selector: `"*"`, one id, or a list of ids.
fn parse_target(key_id: Option<&Value>) -> Result<Option<Target>, String> {
    let Some(value) = key_id else {
        return Ok(None);
    };

    match value {
        Value::String(s) if s == "*" => Ok(Some(Target::All)),
        Value::String(s) => Ok(Some(Target::Keys(vec![s.clone()]))),
        Value::Array(items) => {
            let mut keys = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => keys.push(s.clone()),
                    other => return Err(format!("key_id entries must be strings, got {other}")),
                }
            }
            Ok(Some(Target::Keys(keys)))
        }
        other => Err(format!(
            "key_id must be \"*\", a string or a list of strings, got {other}"
        )),
    }
}

/// Build the send payload from the flat request fields.
fn parse_payload(request: &SendRequest) -> Result<SendPayload, String> {
    match request.kind.as_str() {
        "text" => {
            let text = request
                .text
                .clone()
                .ok_or_else(|| "kind \"text\" requires a \"text\" field".to_string())?;
            Ok(SendPayload::Text { text })
        }
        kind @ ("photo" | "video" | "audio" | "document") => {
            let media = request
                .media
                .clone()
                .ok_or_else(|| format!("kind {kind:?} requires a \"media\" field"))?;
            let caption = request.caption.clone();
            Ok(match kind {
                "photo" => SendPayload::Photo { media, caption },
                "video" => SendPayload::Video { media, caption },
                "audio" => SendPayload::Audio { media, caption },
                _ => SendPayload::Document { media, caption },
            })
        }
        other => Err(format!("unknown send kind {other:?}")),
    }
}
