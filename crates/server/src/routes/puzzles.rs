use axum::Json;

use crate::error::AppError;
use crate::puzzles::{self, Puzzle, PUZZLES};

/// GET /api/puzzle
/// One fixture drawn uniformly from the pool.
pub async fn get_puzzle() -> Result<Json<&'static Puzzle>, AppError> {
    let puzzle = puzzles::random_puzzle(PUZZLES)
        .ok_or_else(|| AppError::Internal("Failed to generate puzzle".into()))?;
    tracing::debug!(puzzle_id = puzzle.id, "Selected puzzle");
    Ok(Json(puzzle))
}
