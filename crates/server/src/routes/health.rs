use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::relay::Relay;

/// GET /health
pub async fn health_check(Extension(relay): Extension<Arc<Relay>>) -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "sessions": relay.session_count(),
    }))
}
