//! Fixed puzzle pool served by `GET /api/puzzle`.

use rand::seq::SliceRandom;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Puzzle {
    pub id: &'static str,
    /// Starting position of the puzzle.
    pub fen: &'static str,
    /// Expected continuation in UCI notation.
    pub moves: &'static [&'static str],
    pub rating: u32,
    pub themes: &'static [&'static str],
}

pub static PUZZLES: &[Puzzle] = &[
    Puzzle {
        id: "puzzle1",
        fen: "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        moves: &["d2d4", "f8c5", "c2c3"],
        rating: 1500,
        themes: &["opening", "middlegame"],
    },
    Puzzle {
        id: "puzzle2",
        fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        moves: &["e7e5", "g1f3", "b8c6"],
        rating: 1200,
        themes: &["opening"],
    },
    Puzzle {
        id: "puzzle3",
        fen: "rnbqkb1r/pppppppp/5n2/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 1 2",
        moves: &["e4e5", "f6d5", "d2d4"],
        rating: 1600,
        themes: &["opening", "attack"],
    },
];

/// Uniform pick from `pool`; `None` only when the pool is empty.
pub fn random_puzzle(pool: &'static [Puzzle]) -> Option<&'static Puzzle> {
    pool.choose(&mut rand::thread_rng())
}
