use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PgnHeaders {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// One replayed ply, shaped like the verbose move list a browser rules
/// library produces so the client can feed it straight into the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedMove {
    pub from: String,
    pub to: String,
    pub piece: String,
    pub san: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    /// Position after this move.
    pub fen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedGame {
    pub headers: PgnHeaders,
    /// Final position after all moves.
    pub position: String,
    pub moves: Vec<ImportedMove>,
}
