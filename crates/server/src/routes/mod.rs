pub mod health;
pub mod pgn;
pub mod puzzles;
pub mod relay_ws;
pub mod session;
