use axum::Json;
use chess_core::ImportedGame;
use serde::Deserialize;

use crate::error::AppError;

#[derive(Deserialize)]
pub struct PgnBody {
    pub pgn: String,
}

/// POST /api/pgn
/// Replay a pasted PGN and return the final position plus a verbose move
/// list. Stateless: no session is touched.
pub async fn import_pgn(Json(body): Json<PgnBody>) -> Result<Json<ImportedGame>, AppError> {
    let game = chess_core::import_pgn(&body.pgn)?;
    tracing::debug!(moves = game.moves.len(), "Imported PGN");
    Ok(Json(game))
}
