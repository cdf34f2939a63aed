// src/lib.rs
//
// chess_core: a two-player chess rules engine with snapshot-based move
// history, cursor navigation, and SAN-like/FEN/PGN output.

pub mod errors;
pub mod game;
pub mod history;
pub mod notation;
pub mod pieces;
pub mod position;

pub use errors::{BoardError, MoveError, SaveError};
pub use game::{EnPassantOffer, Game, GameStatus, Orientation};
pub use history::{CastleSide, CastlingRights, GameState, MoveRecord};
pub use notation::{Notation, INITIAL_FEN};
pub use pieces::{ByteBoard, Color, PieceKind, Square, INITIAL_BOARD};
pub use position::{Piece, PieceId, Position};
