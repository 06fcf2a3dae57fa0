//! Session and move records kept by the relay.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Position alias understood by the client board for the standard setup.
pub const START_POSITION: &str = "start";

const SESSION_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SESSION_ID_LEN: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tutor,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Tutor => f.write_str("tutor"),
            Role::Student => f.write_str("student"),
        }
    }
}

/// Move payload as sent by the mover's client. `fen` is the position after
/// the move, computed by the client's rules library and stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    #[serde(default)]
    pub piece: String,
    #[serde(default)]
    pub san: String,
    pub fen: String,
}

/// A move as recorded in a session log and broadcast to participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    pub piece: String,
    pub san: String,
    pub fen: String,
    pub role: Role,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Move {
    pub fn stamp(input: MoveInput, role: Role, timestamp: DateTime<Utc>) -> Self {
        Self {
            from: input.from,
            to: input.to,
            promotion: input.promotion,
            piece: input.piece,
            san: input.san,
            fen: input.fen,
            role,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub position: String,
    pub moves: Vec<Move>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            position: START_POSITION.to_string(),
            moves: Vec::new(),
            created_at,
        }
    }

    /// Append to the log and take the move's `fen` as the current position.
    pub fn apply(&mut self, mv: Move) {
        self.position = mv.fen.clone();
        self.moves.push(mv);
    }

    pub fn is_expired(&self, now: DateTime<Utc>, retention: chrono::Duration) -> bool {
        now - self.created_at > retention
    }
}

/// Random 13-character base-36 identifier.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SESSION_ID_LEN)
        .map(|_| SESSION_ID_ALPHABET[rng.gen_range(0..SESSION_ID_ALPHABET.len())] as char)
        .collect()
}
