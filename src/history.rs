// src/history.rs
//
// The move list. Every applied move stores a full byte-board snapshot plus a
// castling-rights snapshot, so navigation is a rebuild from bytes and
// take-back is a pop. The cursor is `None` at the pre-game position.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::notation::Notation;
use crate::pieces::{ByteBoard, Color, PieceKind, Square, INITIAL_BOARD};

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
pub enum CastleSide {
    KingSide,
    QueenSide,
}

impl fmt::Display for CastleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastleSide::KingSide => write!(f, "kingside"),
            CastleSide::QueenSide => write!(f, "queenside"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn initial() -> Self {
        CastlingRights {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn revoke_both(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    pub fn allows(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::KingSide) => self.white_kingside,
            (Color::White, CastleSide::QueenSide) => self.white_queenside,
            (Color::Black, CastleSide::KingSide) => self.black_kingside,
            (Color::Black, CastleSide::QueenSide) => self.black_queenside,
        }
    }

    /// FEN castling field: "KQkq" subset, or "-" when all are gone.
    pub fn fen_field(&self) -> String {
        let mut field = String::new();
        if self.white_kingside {
            field.push('K');
        }
        if self.white_queenside {
            field.push('Q');
        }
        if self.black_kingside {
            field.push('k');
        }
        if self.black_queenside {
            field.push('q');
        }
        if field.is_empty() {
            field.push('-');
        }
        field
    }
}

/// One applied ply. Castle records carry `moved: None` and the side in
/// `castle`; the mover's color always follows from the record's index parity.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    pub moved: Option<(PieceKind, Color)>,
    pub capture: bool,
    pub castle: Option<CastleSide>,
    pub board: ByteBoard,
    pub rights: CastlingRights,
    pub notation: Notation,
}

impl MoveRecord {
    /// The double-step landing square, when this record is a pawn two-row
    /// advance from its start row.
    pub fn double_step(&self) -> Option<Square> {
        let (kind, color) = self.moved?;
        if kind != PieceKind::Pawn {
            return None;
        }
        let jumped = match color {
            Color::White => self.from.row == 1 && self.to.row == 3,
            Color::Black => self.from.row == 6 && self.to.row == 4,
        };
        if jumped {
            Some(self.to)
        } else {
            None
        }
    }
}

pub struct GameState {
    moves: Vec<MoveRecord>,
    initial: ByteBoard,
    cursor: Option<usize>,
}

impl GameState {
    pub fn new() -> Self {
        GameState::with_initial(INITIAL_BOARD)
    }

    /// Starts a history from an arbitrary position (White to move).
    pub fn with_initial(board: ByteBoard) -> Self {
        GameState {
            moves: Vec::new(),
            initial: board,
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn record(&self, index: usize) -> &MoveRecord {
        &self.moves[index]
    }

    pub fn last(&self) -> Option<&MoveRecord> {
        self.moves.last()
    }

    pub fn initial_board(&self) -> &ByteBoard {
        &self.initial
    }

    /// Snapshot the cursor points at; the starting board before any move.
    pub fn board_at_cursor(&self) -> ByteBoard {
        match self.cursor {
            Some(i) => self.moves[i].board,
            None => self.initial,
        }
    }

    /// Whether the cursor sits at the latest applied move. Only then may new
    /// moves be applied.
    pub fn at_live_position(&self) -> bool {
        match self.cursor {
            Some(i) => i + 1 == self.moves.len(),
            None => self.moves.is_empty(),
        }
    }

    /// Mover of the record at `index` (White plays the even indices).
    pub fn mover(index: usize) -> Color {
        if index % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// Side to move at the cursor position.
    pub fn side_to_move(&self) -> Color {
        match self.cursor {
            None => Color::White,
            Some(i) => GameState::mover(i).opponent(),
        }
    }

    // --- Recording ---

    /// Appends a ply. The castling-rights snapshot is folded from the
    /// previous record: a king move or castle forfeits both of that color's
    /// rights, and any departure from a corner square forfeits the matching
    /// one.
    pub fn push(
        &mut self,
        from: Square,
        to: Square,
        moved: Option<(PieceKind, Color)>,
        capture: bool,
        castle: Option<CastleSide>,
        board: ByteBoard,
        notation: Notation,
    ) {
        let rights = self.next_rights(from, moved, castle);
        self.moves.push(MoveRecord {
            from,
            to,
            moved,
            capture,
            castle,
            board,
            rights,
            notation,
        });
        self.cursor = Some(self.moves.len() - 1);
    }

    fn next_rights(
        &self,
        from: Square,
        moved: Option<(PieceKind, Color)>,
        castle: Option<CastleSide>,
    ) -> CastlingRights {
        let mut rights = self.derived_rights();
        if castle.is_some() {
            rights.revoke_both(GameState::mover(self.moves.len()));
            return rights;
        }
        if let Some((kind, color)) = moved {
            if kind == PieceKind::King {
                rights.revoke_both(color);
            }
        }
        match (from.row, from.col) {
            (0, 0) => rights.white_queenside = false,
            (0, 7) => rights.white_kingside = false,
            (7, 0) => rights.black_queenside = false,
            (7, 7) => rights.black_kingside = false,
            _ => {}
        }
        rights
    }

    /// Castling rights after everything that has ever been played. Snapshots
    /// fold forfeitures forward, so the latest one is the answer regardless
    /// of where the cursor sits; take-back restores rights by removing the
    /// record that forfeited them.
    pub fn derived_rights(&self) -> CastlingRights {
        self.moves
            .last()
            .map_or(CastlingRights::initial(), |m| m.rights)
    }

    /// Rights as of the cursor position, for display.
    pub fn rights_at_cursor(&self) -> CastlingRights {
        match self.cursor {
            Some(i) => self.moves[i].rights,
            None => CastlingRights::initial(),
        }
    }

    // --- Notation annotation (applies to the most recent move) ---

    pub fn set_recent_check(&mut self) {
        if let Some(m) = self.moves.last_mut() {
            m.notation.set_check();
        }
    }

    pub fn set_recent_checkmate(&mut self) {
        if let Some(m) = self.moves.last_mut() {
            m.notation.set_checkmate();
        }
    }

    pub fn set_recent_stalemate(&mut self) {
        if let Some(m) = self.moves.last_mut() {
            m.notation.set_stalemate();
        }
    }

    pub fn set_recent_en_passant(&mut self) {
        if let Some(m) = self.moves.last_mut() {
            m.notation.set_en_passant();
        }
    }

    pub fn set_recent_promotion(&mut self, kind: PieceKind) {
        if let Some(m) = self.moves.last_mut() {
            m.notation.set_promotion(kind);
        }
    }

    // --- Cursor Navigation ---
    // Boundary requests are silent no-ops; every method reports whether the
    // cursor actually moved so the caller knows to rebuild.

    pub fn go_left(&mut self) -> bool {
        match self.cursor {
            Some(0) => {
                self.cursor = None;
                true
            }
            Some(i) => {
                self.cursor = Some(i - 1);
                true
            }
            None => false,
        }
    }

    pub fn go_right(&mut self) -> bool {
        match self.cursor {
            None if !self.moves.is_empty() => {
                self.cursor = Some(0);
                true
            }
            Some(i) if i + 1 < self.moves.len() => {
                self.cursor = Some(i + 1);
                true
            }
            _ => false,
        }
    }

    pub fn go_far_left(&mut self) -> bool {
        if self.cursor.is_some() {
            self.cursor = None;
            true
        } else {
            false
        }
    }

    pub fn go_far_right(&mut self) -> bool {
        if self.moves.is_empty() || self.at_live_position() {
            return false;
        }
        self.cursor = Some(self.moves.len() - 1);
        true
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        if index < self.moves.len() && self.cursor != Some(index) {
            self.cursor = Some(index);
            true
        } else {
            false
        }
    }

    /// Removes the latest move outright and parks the cursor on the new
    /// tail. Returns false when there is nothing to take back.
    pub fn take_back(&mut self) -> bool {
        if self.moves.pop().is_none() {
            return false;
        }
        self.cursor = if self.moves.is_empty() {
            None
        } else {
            Some(self.moves.len() - 1)
        };
        true
    }

    /// Rendered move text for every ply, in order.
    pub fn plies(&self) -> Vec<String> {
        self.moves.iter().map(|m| m.notation.to_string()).collect()
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}
