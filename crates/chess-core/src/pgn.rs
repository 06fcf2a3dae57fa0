//! PGN import: regex-based header/movetext extraction, replayed with shakmaty
//! to produce per-move squares and FENs.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::{
    fen::Fen,
    san::{San, SanPlus},
    uci::UciMove,
    CastlingMode, Chess, EnPassantMode, Position,
};

use crate::game_data::{ImportedGame, ImportedMove, PgnHeaders};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).unwrap());
static HEADER_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").unwrap());
// Innermost variation only; applied until nothing matches so nested lines go too.
static VARIATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^()]*\)").unwrap());
static NAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\d+").unwrap());
// Move number, possibly glued to the move that follows (`12.` `12...` `12.Nf3`).
static MOVE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.+").unwrap());

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PgnError {
    #[error("Please enter a PGN string")]
    Empty,

    #[error("Invalid FEN header: {0}")]
    InvalidFen(String),

    #[error("Invalid move '{token}' at ply {ply}")]
    InvalidSan { ply: usize, token: String },

    #[error("Illegal move '{token}' at ply {ply}")]
    IllegalMove { ply: usize, token: String },
}

/// Parse a PGN string into its headers, the final position and a verbose
/// move list. Starts from the `FEN` header when one is present.
pub fn import_pgn(pgn: &str) -> Result<ImportedGame, PgnError> {
    let pgn = pgn.trim();
    if pgn.is_empty() {
        return Err(PgnError::Empty);
    }

    let (headers, start_fen) = parse_headers(pgn);

    let mut pos = match start_fen {
        Some(fen) => position_from_fen(&fen)?,
        None => Chess::default(),
    };

    let mut moves = Vec::new();
    for (i, token) in extract_moves(pgn).into_iter().enumerate() {
        let ply = i + 1;
        let san_plus: SanPlus =
            normalize_san(&token)
                .parse()
                .map_err(|_| PgnError::InvalidSan {
                    ply,
                    token: token.clone(),
                })?;
        let mv = san_plus.san.to_move(&pos).map_err(|_| PgnError::IllegalMove {
            ply,
            token: token.clone(),
        })?;

        // Standard castling mode reports the king's destination (e1g1), which
        // is what board UIs expect rather than the rook square.
        let (from, to) = match mv.to_uci(CastlingMode::Standard) {
            UciMove::Normal { from, to, .. } => (from, to),
            _ => return Err(PgnError::IllegalMove { ply, token }),
        };

        let san = San::from_move(&pos, mv);
        pos.play_unchecked(mv);

        let suffix = if pos.is_checkmate() {
            "#"
        } else if pos.is_check() {
            "+"
        } else {
            ""
        };

        moves.push(ImportedMove {
            from: from.to_string(),
            to: to.to_string(),
            piece: mv.role().char().to_string(),
            san: format!("{san}{suffix}"),
            promotion: mv.promotion().map(|r| r.char().to_string()),
            fen: fen_of(&pos),
        });
    }

    Ok(ImportedGame {
        headers,
        position: fen_of(&pos),
        moves,
    })
}

fn parse_headers(pgn: &str) -> (PgnHeaders, Option<String>) {
    let mut headers = PgnHeaders {
        white: "Unknown".to_string(),
        black: "Unknown".to_string(),
        result: "*".to_string(),
        event: None,
        date: None,
    };
    let mut fen = None;

    for cap in HEADER_RE.captures_iter(pgn) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => headers.white = value,
            "Black" => headers.black = value,
            "Result" => headers.result = value,
            "Event" => headers.event = Some(value),
            "Date" => headers.date = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    (headers, fen)
}

/// Split the movetext into move tokens after removing headers, comments,
/// variations and NAGs. Move numbers and game results are dropped; every
/// other token is returned as written so bad input surfaces as a parse error.
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_LINE_RE.replace_all(pgn, "");
    let mut text = COMMENT_RE.replace_all(&no_headers, "").into_owned();

    while VARIATION_RE.is_match(&text) {
        text = VARIATION_RE.replace_all(&text, "").into_owned();
    }
    let text = NAG_RE.replace_all(&text, "");

    text.split_whitespace()
        .map(|token| MOVE_NUMBER_RE.replace(token, ""))
        .filter(|token| !token.is_empty() && !RESULT_TOKENS.contains(&&**token))
        .map(|token| token.into_owned())
        .collect()
}

/// Accept zero-digit castling (`0-0`) and trailing `!`/`?` annotations.
fn normalize_san(token: &str) -> String {
    let token = token.trim_end_matches(['!', '?']);
    match token.strip_prefix("0-0-0") {
        Some(rest) => format!("O-O-O{rest}"),
        None => match token.strip_prefix("0-0") {
            Some(rest) => format!("O-O{rest}"),
            None => token.to_string(),
        },
    }
}

fn position_from_fen(fen: &str) -> Result<Chess, PgnError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|e| PgnError::InvalidFen(format!("{fen}: {e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| PgnError::InvalidFen(format!("{fen}: {e}")))
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_basic_game() {
        let pgn = r#"[Event "Lesson 1"]
[White "Tutor"]
[Black "Student"]
[Result "*"]

1. e4 e5 2. Nf3 *"#;

        let game = import_pgn(pgn).unwrap();
        assert_eq!(game.headers.white, "Tutor");
        assert_eq!(game.headers.black, "Student");
        assert_eq!(game.headers.event.as_deref(), Some("Lesson 1"));
        assert_eq!(game.moves.len(), 3);

        let first = &game.moves[0];
        assert_eq!(first.from, "e2");
        assert_eq!(first.to, "e4");
        assert_eq!(first.piece, "p");
        assert_eq!(first.san, "e4");
        assert_eq!(first.promotion, None);

        assert_eq!(game.moves[2].piece, "n");
        assert_eq!(
            game.position,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
        assert_eq!(game.moves[2].fen, game.position);
    }

    #[test]
    fn test_comments_variations_and_nags_are_ignored() {
        let pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3 (2. c3 d5)) 2. Nf3 $1 ; line comment\n2... Nc6";
        let game = import_pgn(pgn).unwrap();
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn test_castling_reports_king_squares() {
        let game = import_pgn("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O").unwrap();
        let castle = game.moves.last().unwrap();
        assert_eq!(castle.from, "e1");
        assert_eq!(castle.to, "g1");
        assert_eq!(castle.piece, "k");
        assert_eq!(castle.san, "O-O");
    }

    #[test]
    fn test_zero_castling_and_annotations() {
        let game = import_pgn("1. e4 e5 2. Nf3!? Nc6 3. Bc4 Bc5?! 4. 0-0 Nf6 5.d3 1-0").unwrap();
        assert_eq!(game.moves.len(), 9);
        let castle = &game.moves[6];
        assert_eq!((castle.from.as_str(), castle.to.as_str()), ("e1", "g1"));
        assert_eq!(castle.san, "O-O");
        // Black's reply is replayed for black after the castle.
        assert_eq!(game.moves[7].san, "Nf6");
        assert_eq!(game.moves[8].from, "d2");
    }

    #[test]
    fn test_unparsable_tokens_are_rejected() {
        assert_eq!(
            import_pgn("hello world").unwrap_err(),
            PgnError::InvalidSan {
                ply: 1,
                token: "hello".to_string()
            }
        );

        let pgn = r#"[FEN "7k/P7/8/8/8/8/8/K7 w - - 0 1"]
1. a8X"#;
        assert_eq!(
            import_pgn(pgn).unwrap_err(),
            PgnError::InvalidSan {
                ply: 1,
                token: "a8X".to_string()
            }
        );
    }

    #[test]
    fn test_unterminated_comment_is_rejected() {
        let err = import_pgn("1. e4 { never closed e5 2. Nf3").unwrap_err();
        assert_eq!(
            err,
            PgnError::InvalidSan {
                ply: 2,
                token: "{".to_string()
            }
        );
    }

    #[test]
    fn test_check_and_mate_suffixes() {
        let game = import_pgn("1. f3 e5 2. g4 Qh4#").unwrap();
        assert_eq!(game.moves[3].san, "Qh4#");

        let game = import_pgn("1. e4 f5 2. Qh5").unwrap();
        assert_eq!(game.moves[2].san, "Qh5+");
    }

    #[test]
    fn test_fen_header_sets_start_position() {
        let pgn = r#"[SetUp "1"]
[FEN "7k/P7/8/8/8/8/8/K7 w - - 0 1"]

1. a8=Q+"#;
        let game = import_pgn(pgn).unwrap();
        assert_eq!(game.moves.len(), 1);
        let promo = &game.moves[0];
        assert_eq!(promo.from, "a7");
        assert_eq!(promo.to, "a8");
        assert_eq!(promo.promotion.as_deref(), Some("q"));
        assert_eq!(promo.san, "a8=Q+");
    }

    #[test]
    fn test_illegal_move_names_ply() {
        let err = import_pgn("1. e4 e5 2. Ke3").unwrap_err();
        assert_eq!(
            err,
            PgnError::IllegalMove {
                ply: 3,
                token: "Ke3".to_string()
            }
        );
    }

    #[test]
    fn test_empty_and_bad_fen() {
        assert_eq!(import_pgn("   \n").unwrap_err(), PgnError::Empty);

        let err = import_pgn("[FEN \"not a fen\"]\n1. e4").unwrap_err();
        assert!(matches!(err, PgnError::InvalidFen(_)));
    }
}
