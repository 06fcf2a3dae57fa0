use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::error::AppError;
use crate::relay::Relay;
use crate::session::Session;

/// POST /api/session
/// Create an empty session and return its id.
pub async fn create_session(
    Extension(relay): Extension<Arc<Relay>>,
) -> Result<Json<JsonValue>, AppError> {
    let session_id = relay.create_session();
    Ok(Json(json!({ "sessionId": session_id })))
}

/// GET /api/session/{session_id}
/// Full record: position, move log and creation time.
pub async fn get_session(
    Extension(relay): Extension<Arc<Relay>>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, AppError> {
    relay
        .get_session(&session_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Session not found".into()))
}
