pub mod game_data;
pub mod pgn;

pub use game_data::{ImportedGame, ImportedMove, PgnHeaders};
pub use pgn::{import_pgn, PgnError};
