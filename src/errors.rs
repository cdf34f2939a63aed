// src/errors.rs
//
// Library error types. The CLI wraps these in its own command error.

use std::error::Error;
use std::fmt;
use std::io;

use crate::history::CastleSide;
use crate::pieces::{Color, PieceKind, Square};

/// Rejected board snapshots. Building a position fails fast instead of
/// producing a half-valid grid.
#[derive(Debug)]
pub enum BoardError {
    InvalidCode { code: u8, at: Square },
    MissingKing(Color),
    ExtraKing(Color),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidCode { code, at } => {
                write!(f, "Invalid piece code {} at {}", code, at)
            }
            BoardError::MissingKing(color) => write!(f, "No {:?} king on the board", color),
            BoardError::ExtraKing(color) => write!(f, "More than one {:?} king on the board", color),
        }
    }
}

impl Error for BoardError {}

/// Rejected move requests. Legality is checked up front, so callers get a
/// reason instead of a corrupted game.
#[derive(Debug)]
pub enum MoveError {
    NoPieceAt(Square),
    NotYourTurn,
    IllegalMove { from: Square, to: Square },
    PromotionRequired,
    InvalidPromotion(PieceKind),
    EnPassantUnavailable,
    CastleUnavailable(Color, CastleSide),
    HistoryDetached,
    GameOver,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::NoPieceAt(sq) => write!(f, "No piece found at {}", sq),
            MoveError::NotYourTurn => write!(f, "It's not that piece's turn to move."),
            MoveError::IllegalMove { from, to } => {
                write!(f, "Illegal move: {} to {}", from, to)
            }
            MoveError::PromotionRequired => {
                write!(f, "That pawn move promotes: append the new piece letter, e.g. 'e7e8q'.")
            }
            MoveError::InvalidPromotion(kind) => {
                write!(f, "Cannot promote to {:?}. Use queen, rook, bishop or knight.", kind)
            }
            MoveError::EnPassantUnavailable => {
                write!(f, "En passant is not available for that pawn right now.")
            }
            MoveError::CastleUnavailable(color, side) => {
                write!(f, "{:?} cannot castle {} here.", color, side)
            }
            MoveError::HistoryDetached => {
                write!(f, "Viewing an earlier position: go to the latest move before playing.")
            }
            MoveError::GameOver => write!(f, "The game is over. Take back a move or start a new game."),
        }
    }
}

impl Error for MoveError {}

/// File export failures for the JSON summary and PGN writers.
#[derive(Debug)]
pub enum SaveError {
    Serialization(serde_json::Error),
    Io(String, io::Error),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SaveError::Io(file, e) => write!(f, "I/O error with file '{}': {}", file, e),
        }
    }
}

impl Error for SaveError {}
