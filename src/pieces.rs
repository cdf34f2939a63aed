// src/pieces.rs
//
// Piece vocabulary: colors, kinds, squares, the byte-board encoding and the
// pseudo-legal move generators. Legality filtering lives in `game`.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::position::{PieceId, Position};

// --- Board Geometry Constants ---

pub const BOARD_SIZE: usize = 8;

/// Ray directions for sliding pieces.
pub(crate) const DIAGONAL_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const ORTHOGONAL_DIRS: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1), (2, -1), (-2, 1), (-2, -1),
    (1, 2), (1, -2), (-1, 2), (-1, -2),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0), (1, 1), (0, 1), (-1, 1),
    (-1, 0), (-1, -1), (0, -1), (1, -1),
];

lazy_static! {
    /// Precomputed knight targets for every square, indexed by `Square::index`.
    pub(crate) static ref KNIGHT_TARGETS: Vec<Vec<Square>> = compute_targets(&KNIGHT_OFFSETS);
    /// Precomputed king-step targets for every square, indexed by `Square::index`.
    pub(crate) static ref KING_TARGETS: Vec<Vec<Square>> = compute_targets(&KING_OFFSETS);
}

fn compute_targets(offsets: &[(i8, i8)]) -> Vec<Vec<Square>> {
    let mut table = Vec::with_capacity(64);
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let sq = Square::new(row, col);
            table.push(
                offsets
                    .iter()
                    .filter_map(|&(dr, dc)| sq.offset(dr, dc))
                    .collect(),
            );
        }
    }
    table
}

// --- Squares ---

/// A board coordinate. Row 0 is White's back rank, column 0 is the a-file.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub fn new(row: usize, col: usize) -> Self {
        Square { row, col }
    }

    /// Offsets the square, returning `None` when the result leaves the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Square> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..BOARD_SIZE as i8).contains(&row) && (0..BOARD_SIZE as i8).contains(&col) {
            Some(Square::new(row as usize, col as usize))
        } else {
            None
        }
    }

    /// Flat 0..64 index used by the precomputed target tables.
    pub fn index(self) -> usize {
        self.row * BOARD_SIZE + self.col
    }

    pub fn file_char(self) -> char {
        (b'a' + self.col as u8) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.row as u8) as char
    }

    /// Parses algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        Some(Square::new(rank as usize - '1' as usize, file as usize - 'a' as usize))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

// --- Colors and Kinds ---

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Pawn advance direction along the rows.
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn back_row(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    pub fn pawn_row(&self) -> usize {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    pub fn promotion_row(&self) -> usize {
        self.opponent().back_row()
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Bishop,
    Knight,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Move-text letter; pawns have none.
    pub fn letter(&self) -> &'static str {
        match self {
            PieceKind::Pawn => "",
            PieceKind::Bishop => "B",
            PieceKind::Knight => "N",
            PieceKind::Rook => "R",
            PieceKind::Queen => "Q",
            PieceKind::King => "K",
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Bishop => 3,
            PieceKind::Knight => 3,
            PieceKind::Rook => 4,
            PieceKind::Queen => 9,
            PieceKind::King => 0,
        }
    }

    /// Byte-board code for this kind in the given color (1..=6 white, 7..=12 black).
    pub fn code(&self, color: Color) -> u8 {
        let base = match self {
            PieceKind::Pawn => 1,
            PieceKind::Bishop => 2,
            PieceKind::Knight => 3,
            PieceKind::Rook => 4,
            PieceKind::Queen => 5,
            PieceKind::King => 6,
        };
        match color {
            Color::White => base,
            Color::Black => base + 6,
        }
    }

    /// Decodes a byte-board code. Zero (empty) and out-of-range codes yield `None`.
    pub fn from_code(code: u8) -> Option<(PieceKind, Color)> {
        let color = match code {
            1..=6 => Color::White,
            7..=12 => Color::Black,
            _ => return None,
        };
        let kind = match (code - 1) % 6 {
            0 => PieceKind::Pawn,
            1 => PieceKind::Bishop,
            2 => PieceKind::Knight,
            3 => PieceKind::Rook,
            4 => PieceKind::Queen,
            _ => PieceKind::King,
        };
        Some((kind, color))
    }

    /// FEN character, uppercase for White.
    pub fn fen_char(&self, color: Color) -> char {
        let c = match self {
            PieceKind::Pawn => 'p',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn is_promotion_target(&self) -> bool {
        matches!(
            self,
            PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight
        )
    }
}

// --- Byte-Board Encoding ---

pub const EMPTY_CODE: u8 = 0;

/// Raw 8x8 snapshot, `[row][col]`, row 0 = White's back rank.
pub type ByteBoard = [[u8; 8]; 8];

pub const INITIAL_BOARD: ByteBoard = [
    [4, 3, 2, 5, 6, 2, 3, 4],
    [1, 1, 1, 1, 1, 1, 1, 1],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [7, 7, 7, 7, 7, 7, 7, 7],
    [10, 9, 8, 11, 12, 8, 9, 10],
];

// --- Pseudo-Legal Move Generators ---

/// Every square the piece could move to ignoring check, pins and turn order.
/// Pawns: single push, double push from the start row, diagonal captures only.
pub fn reachable_squares(pos: &Position, id: PieceId) -> Vec<Square> {
    let piece = pos.piece(id);
    match piece.kind {
        PieceKind::Pawn => pawn_squares(pos, piece.square, piece.color),
        PieceKind::Knight => leaper_squares(pos, piece.square, piece.color, &KNIGHT_TARGETS),
        PieceKind::King => leaper_squares(pos, piece.square, piece.color, &KING_TARGETS),
        PieceKind::Bishop => slider_squares(pos, piece.square, piece.color, &DIAGONAL_DIRS),
        PieceKind::Rook => slider_squares(pos, piece.square, piece.color, &ORTHOGONAL_DIRS),
        PieceKind::Queen => {
            let mut squares = slider_squares(pos, piece.square, piece.color, &DIAGONAL_DIRS);
            squares.extend(slider_squares(pos, piece.square, piece.color, &ORTHOGONAL_DIRS));
            squares
        }
    }
}

/// `reachable_squares` restricted to a whitelist (a pin ray or check-resolution set).
pub fn reachable_squares_within(pos: &Position, id: PieceId, allowed: &[Square]) -> Vec<Square> {
    let mut squares = reachable_squares(pos, id);
    squares.retain(|sq| allowed.contains(sq));
    squares
}

/// Locations of other same-kind, same-color pieces that could also reach
/// `target`. Feeds move-text disambiguation.
pub fn common_piece_locations(pos: &Position, id: PieceId, target: Square) -> Vec<Square> {
    let piece = *pos.piece(id);
    let mut locations = Vec::new();
    for other in pos.ids_of(piece.color) {
        if other == id {
            continue;
        }
        let candidate = pos.piece(other);
        if candidate.kind == piece.kind && reachable_squares(pos, other).contains(&target) {
            locations.push(candidate.square);
        }
    }
    locations
}

fn pawn_squares(pos: &Position, from: Square, color: Color) -> Vec<Square> {
    let mut squares = Vec::new();
    let dir = color.forward();
    if let Some(step) = from.offset(dir, 0) {
        if pos.is_empty(step) {
            squares.push(step);
            if from.row == color.pawn_row() {
                if let Some(jump) = from.offset(2 * dir, 0) {
                    if pos.is_empty(jump) {
                        squares.push(jump);
                    }
                }
            }
        }
    }
    for dc in [-1, 1] {
        if let Some(diag) = from.offset(dir, dc) {
            if pos.has_enemy(diag, color) {
                squares.push(diag);
            }
        }
    }
    squares
}

fn leaper_squares(
    pos: &Position,
    from: Square,
    color: Color,
    table: &[Vec<Square>],
) -> Vec<Square> {
    table[from.index()]
        .iter()
        .copied()
        .filter(|&sq| pos.is_empty(sq) || pos.has_enemy(sq, color))
        .collect()
}

fn slider_squares(pos: &Position, from: Square, color: Color, dirs: &[(i8, i8)]) -> Vec<Square> {
    let mut squares = Vec::new();
    for &(dr, dc) in dirs {
        let mut cur = from;
        while let Some(next) = cur.offset(dr, dc) {
            cur = next;
            if pos.is_empty(cur) {
                squares.push(cur);
            } else {
                if pos.has_enemy(cur, color) {
                    squares.push(cur);
                }
                break;
            }
        }
    }
    squares
}
