// src/notation.rs
//
// Move text, FEN and PGN output. Move text is accumulated as flags on a
// builder and rendered on demand, so re-announcing a check or mate never
// duplicates a suffix.

use chrono::Local;
use std::fmt;

use crate::history::{CastleSide, GameState};
use crate::pieces::{ByteBoard, PieceKind, Square};

pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -";

/// SAN-like move text under construction. The base (piece letter,
/// disambiguation, capture marker, destination) is fixed when the move is
/// applied; the suffixes arrive afterwards as the position is evaluated.
#[derive(Debug, Clone)]
pub struct Notation {
    base: String,
    promotion: Option<PieceKind>,
    en_passant: bool,
    check: bool,
    checkmate: bool,
    stalemate: bool,
}

impl Notation {
    /// Builds the base text for a normal (non-castle) move. `common` holds
    /// the squares of same-kind pieces that could also reach `to`: sharing a
    /// row appends the origin file, sharing a column the origin rank, and
    /// neither defaults to the origin file.
    pub fn for_move(
        kind: PieceKind,
        from: Square,
        to: Square,
        capture: bool,
        common: &[Square],
    ) -> Notation {
        let mut base = String::new();
        if kind == PieceKind::Pawn {
            if capture {
                base.push(from.file_char());
                base.push('x');
            }
        } else {
            base.push_str(kind.letter());
            if !common.is_empty() {
                let shares_row = common.iter().any(|sq| sq.row == from.row);
                let shares_col = common.iter().any(|sq| sq.col == from.col);
                if shares_row {
                    base.push(from.file_char());
                }
                if shares_col {
                    base.push(from.rank_char());
                }
                if !shares_row && !shares_col {
                    base.push(from.file_char());
                }
            }
            if capture {
                base.push('x');
            }
        }
        base.push(to.file_char());
        base.push(to.rank_char());
        Notation::from_base(base)
    }

    pub fn castle(side: CastleSide) -> Notation {
        let base = match side {
            CastleSide::KingSide => "0-0",
            CastleSide::QueenSide => "0-0-0",
        };
        Notation::from_base(base.to_string())
    }

    fn from_base(base: String) -> Notation {
        Notation {
            base,
            promotion: None,
            en_passant: false,
            check: false,
            checkmate: false,
            stalemate: false,
        }
    }

    pub fn set_promotion(&mut self, kind: PieceKind) {
        self.promotion = Some(kind);
    }

    pub fn set_en_passant(&mut self) {
        self.en_passant = true;
    }

    pub fn set_check(&mut self) {
        self.check = true;
    }

    pub fn set_checkmate(&mut self) {
        self.checkmate = true;
    }

    pub fn set_stalemate(&mut self) {
        self.stalemate = true;
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        if self.en_passant {
            write!(f, "e.p.")?;
        }
        if self.checkmate {
            write!(f, "#")?;
        } else if self.check {
            write!(f, "+")?;
        }
        if self.stalemate {
            write!(f, "$")?;
        }
        Ok(())
    }
}

// --- FEN ---

/// FEN of the position at the cursor: placement, side to move, castling
/// rights and en-passant target. Rights come from the whole move list, not
/// the cursor, so a forfeited right reads false at every history index.
pub fn fen(state: &GameState) -> String {
    let (board, side) = match state.cursor() {
        None => (*state.initial_board(), " w"),
        Some(i) => (
            state.record(i).board,
            if i % 2 == 0 { " b" } else { " w" },
        ),
    };
    let mut fen = placement(&board);
    fen.push_str(side);
    fen.push(' ');
    fen.push_str(&state.derived_rights().fen_field());
    match ep_target(state) {
        Some(sq) => {
            fen.push(' ');
            fen.push(sq.file_char());
            fen.push(sq.rank_char());
        }
        None => fen.push_str(" -"),
    }
    fen
}

fn placement(board: &ByteBoard) -> String {
    let mut out = String::new();
    for row in (0..8).rev() {
        let mut run = 0u8;
        for col in 0..8 {
            match PieceKind::from_code(board[row][col]) {
                Some((kind, color)) => {
                    if run > 0 {
                        out.push((b'0' + run) as char);
                        run = 0;
                    }
                    out.push(kind.fen_char(color));
                }
                None => run += 1,
            }
        }
        if run > 0 {
            out.push((b'0' + run) as char);
        }
        if row > 0 {
            out.push('/');
        }
    }
    out
}

/// En-passant target square for the cursor position. Emitted only when the
/// move at the cursor was a pawn double step that an enemy pawn stands ready
/// to capture.
fn ep_target(state: &GameState) -> Option<Square> {
    let i = state.cursor()?;
    let record = state.record(i);
    let landing = record.double_step()?;
    let mover = GameState::mover(i);
    let enemy_pawn = PieceKind::Pawn.code(mover.opponent());
    let capturable = [-1i8, 1].iter().any(|&dc| {
        landing
            .offset(0, dc)
            .map_or(false, |sq| record.board[sq.row][sq.col] == enemy_pawn)
    });
    if !capturable {
        return None;
    }
    landing.offset(-mover.forward(), 0)
}

// --- PGN ---

/// Full PGN text: header block, then the move list numbered at every White
/// ply and wrapped every ten plies. The result tag line comes from the
/// caller so an unfinished game can export as "*".
pub fn pgn(state: &GameState, result_tag: &str) -> String {
    let mut out = headers(result_tag);
    for (i, ply) in state.plies().iter().enumerate() {
        if i % 10 == 0 {
            out.push('\n');
        }
        if i % 2 == 0 {
            out.push_str(&format!(" {}.", i / 2 + 1));
        }
        out.push(' ');
        out.push_str(ply);
    }
    out
}

fn headers(result_tag: &str) -> String {
    format!(
        "[Event \"Casual Game\"]\n[Site \"Local\"]\n[Date \"{}\"]\n[White \"Player1\"]\n[Black \"Player2\"]\n{}\n",
        Local::now().format("%Y/%m/%d %H:%M:%S"),
        result_tag
    )
}
