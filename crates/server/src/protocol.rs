//! Real-time channel messages. Every WebSocket text frame carries one event
//! encoded as `{"event": <name>, "data": <payload>}`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::{Move, MoveInput, Role, Session};

/// Server-assigned identity of one socket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Client → Server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinSession(JoinRequest),
    Move(MoveInput),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub session_id: String,
    pub role: Role,
}

/// Server → Client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent only to a connection that just joined.
    SessionState(SessionSnapshot),
    MoveMade(Move),
    UserJoined(Presence),
    UserLeft(Presence),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub position: String,
    pub moves: Vec<Move>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            position: session.position.clone(),
            moves: session.moves.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub role: Role,
    pub connection_id: ConnectionId,
}
