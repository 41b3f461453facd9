use crate::client::SheetApi;
use crate::forward::RowForwarder;
use crate::processor::{self, ProcessedEvents};
use crate::types::{CallbackBatch, SheetId};
use crate::verification;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Inbound bodies may carry large batches.
const BODY_LIMIT: usize = 50 * 1024 * 1024;

const HOOK_RESPONSE_HEADER: &str = "smartsheet-hook-response";

/// Secret used to verify callbacks, installed once the hook is reconciled.
pub type SharedSecret = Arc<RwLock<Option<String>>>;

#[derive(Clone)]
pub struct ServerState {
    api: Arc<dyn SheetApi>,
    forwarder: Arc<dyn RowForwarder>,
    default_sheet: SheetId,
    shared_secret: SharedSecret,
}

impl ServerState {
    pub fn new(
        api: Arc<dyn SheetApi>,
        forwarder: Arc<dyn RowForwarder>,
        default_sheet: SheetId,
        shared_secret: SharedSecret,
    ) -> Self {
        Self {
            api,
            forwarder,
            default_sheet,
            shared_secret,
        }
    }
}

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("callback signature missing or invalid")]
    BadSignature,

    #[error("malformed event batch: {0}")]
    InvalidBatch(#[source] serde_json::Error),
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        let status = match &self {
            CallbackError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            CallbackError::BadSignature => StatusCode::UNAUTHORIZED,
            CallbackError::InvalidBatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("Error: {self}")).into_response()
    }
}

/// The four shapes a callback body can take.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Callback<'a> {
    Challenge(&'a Value),
    Events,
    Status(&'a Value),
    Unknown,
}

fn classify(body: &Value) -> Callback<'_> {
    let field = |name: &str| body.get(name).filter(|v| is_truthy(v));
    if let Some(challenge) = field("challenge") {
        Callback::Challenge(challenge)
    } else if field("events").is_some() {
        Callback::Events
    } else if let Some(status) = field("newWebHookStatus") {
        Callback::Status(status)
    } else {
        Callback::Unknown
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/", post(handle_callback))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// Bind `addr` and serve callbacks in the background.
pub async fn start(
    addr: SocketAddr,
    state: ServerState,
) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!("row relay listening on {local}");

    let app = build_router(state);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("HTTP server error: {e}");
        }
    });

    Ok((local, handle))
}

async fn handle_callback(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, CallbackError> {
    let span = tracing::info_span!(
        "callback",
        delivery_id = %uuid::Uuid::new_v4(),
        received_at = %Utc::now().to_rfc3339(),
    );
    dispatch(state, headers, body).instrument(span).await
}

async fn dispatch(
    state: ServerState,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, CallbackError> {
    let value: Value = serde_json::from_slice(&body).map_err(CallbackError::InvalidJson)?;
    let callback = classify(&value);

    if let Callback::Challenge(challenge) = callback {
        tracing::info!("Received verification callback");
        return Ok(challenge_response(challenge));
    }

    verify(&state, &headers, &body).await?;

    match callback {
        Callback::Events => {
            let batch: CallbackBatch = serde_json::from_value(value.clone())
                .map_err(CallbackError::InvalidBatch)?;
            tracing::info!("Received event callback with {} events", batch.events.len());

            let mut processed = ProcessedEvents::new();
            let summary = processor::process_events(
                &batch,
                &mut processed,
                state.api.as_ref(),
                state.forwarder.as_ref(),
                state.default_sheet,
            )
            .await;
            tracing::info!(
                forwarded = summary.forwarded,
                duplicates = summary.duplicates,
                skipped = summary.skipped,
                failed = summary.failed,
                unique = processed.len(),
                "batch processed"
            );
        }
        Callback::Status(status) => {
            tracing::info!("Received status callback, new status: {status}");
        }
        Callback::Unknown => {
            tracing::warn!("Received unknown callback: {value}");
        }
        Callback::Challenge(_) => {}
    }

    Ok(StatusCode::OK.into_response())
}

fn challenge_response(challenge: &Value) -> Response {
    let mut response = (
        StatusCode::OK,
        Json(serde_json::json!({ "smartsheetHookResponse": challenge })),
    )
        .into_response();

    let text = match challenge {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if let Ok(header) = HeaderValue::from_str(&text) {
        response.headers_mut().insert(HOOK_RESPONSE_HEADER, header);
    }
    response
}

async fn verify(state: &ServerState, headers: &HeaderMap, body: &[u8]) -> Result<(), CallbackError> {
    let secret = state.shared_secret.read().await;
    let Some(secret) = secret.as_deref() else {
        return Ok(());
    };

    let signature = headers
        .get(verification::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if verification::verify_signature(secret, body, signature) {
        Ok(())
    } else {
        tracing::warn!("rejecting callback with bad signature");
        Err(CallbackError::BadSignature)
    }
}
