// src/game.rs
//
// The game facade: owns the position and the move list, filters the
// pseudo-legal generators down to legal moves, drives the state machine and
// serves notation, FEN and PGN.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;

use crate::errors::{BoardError, MoveError, SaveError};
use crate::history::{CastleSide, GameState};
use crate::notation::{self, Notation};
use crate::pieces::{self, ByteBoard, Color, PieceKind, Square};
use crate::position::{PieceId, Position};

#[derive(Debug, Serialize, Copy, Clone, PartialEq, Eq)]
pub enum GameStatus {
    Initial,
    InProgress,
    Checkmate,
    Stalemate,
}

/// Which color sits at the bottom of the rendered board. Display-only.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Orientation {
    WhiteBottom,
    BlackBottom,
}

/// An en passant capture currently on offer for one pawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EnPassantOffer {
    pub dest: Square,
    pub captured: Square,
    /// Row offset from the destination back to the captured pawn.
    pub offset: i8,
}

/// JSON export of a finished or in-progress game.
#[derive(Serialize)]
struct GameSummary {
    status: GameStatus,
    result: Option<String>,
    plies: Vec<String>,
    final_fen: String,
}

pub struct Game {
    position: Position,
    history: GameState,
    status: GameStatus,
    orientation: Orientation,
    in_check: bool,
    attackers: Vec<Square>,
    king_moves: Vec<Square>,
    check_whitelist: Vec<Square>,
    available: HashMap<PieceId, Vec<Square>>,
    fen: String,
    result_line: Option<String>,
}

impl Game {
    pub fn new() -> Game {
        let mut game = Game {
            position: Position::initial(),
            history: GameState::new(),
            status: GameStatus::Initial,
            orientation: Orientation::WhiteBottom,
            in_check: false,
            attackers: Vec::new(),
            king_moves: Vec::new(),
            check_whitelist: Vec::new(),
            available: HashMap::new(),
            fen: String::new(),
            result_line: None,
        };
        game.evaluate();
        game
    }

    /// Starts a game from an arbitrary byte board, White to move. Terminal
    /// positions are recognized immediately.
    pub fn from_bytes(board: &ByteBoard) -> Result<Game, BoardError> {
        let position = Position::from_bytes(board)?;
        let mut game = Game {
            position,
            history: GameState::with_initial(*board),
            status: GameStatus::Initial,
            orientation: Orientation::WhiteBottom,
            in_check: false,
            attackers: Vec::new(),
            king_moves: Vec::new(),
            check_whitelist: Vec::new(),
            available: HashMap::new(),
            fen: String::new(),
            result_line: None,
        };
        game.evaluate();
        game.detect_terminal(false);
        Ok(game)
    }

    /// Discards everything and starts over. Orientation is kept.
    pub fn reset(&mut self) {
        let orientation = self.orientation;
        *self = Game::new();
        self.orientation = orientation;
    }

    // --- Read Access ---

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, GameStatus::Checkmate | GameStatus::Stalemate)
    }

    pub fn result_line(&self) -> Option<&str> {
        self.result_line.as_deref()
    }

    pub fn in_check(&self) -> bool {
        self.in_check
    }

    pub fn side_to_move(&self) -> Color {
        self.history.side_to_move()
    }

    pub fn history(&self) -> &GameState {
        &self.history
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn flip(&mut self) {
        self.orientation = match self.orientation {
            Orientation::WhiteBottom => Orientation::BlackBottom,
            Orientation::BlackBottom => Orientation::WhiteBottom,
        };
    }

    /// FEN of the position at the cursor, refreshed after every mutation.
    pub fn current_fen(&self) -> &str {
        &self.fen
    }

    pub fn game_pgn(&self, result_tag: &str) -> String {
        notation::pgn(&self.history, result_tag)
    }

    /// PGN result tag, "*" while unfinished. Any finished game, stalemate
    /// included, gets the last mover's win tag.
    pub fn pgn_result_tag(&self) -> String {
        match self.status {
            GameStatus::Checkmate | GameStatus::Stalemate => {
                if self.history.len() % 2 == 1 {
                    "[Result 1-0]".to_string()
                } else {
                    "[Result 0-1]".to_string()
                }
            }
            _ => "[Result *]".to_string(),
        }
    }

    /// Legal destinations for the piece on `sq`. Empty for vacant squares
    /// and for the side not on the move. Castling and en passant are offered
    /// through their own queries.
    pub fn legal_moves(&self, sq: Square) -> Vec<Square> {
        match self.position.id_at(sq) {
            Some(id) => self.available.get(&id).cloned().unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Whether the side to move has any legal piece move.
    pub fn has_legal_moves(&self) -> bool {
        self.available.values().any(|moves| !moves.is_empty())
    }

    // --- Legality Evaluation ---

    /// Recomputes check state and the per-piece legal move cache for the
    /// side to move at the cursor. Idempotent: reevaluating an unchanged
    /// position yields the same sets.
    fn evaluate(&mut self) {
        let color = self.side_to_move();
        let king = self.position.king_id(color);
        self.attackers = self.position.attackers_of(king);
        self.in_check = !self.attackers.is_empty();
        self.king_moves = self.position.king_safe_squares(king);
        self.check_whitelist = self.position.check_whitelist(&self.attackers, king);
        self.available.clear();
        for id in self.position.ids_of(color) {
            let moves = if id == king {
                self.king_moves.clone()
            } else {
                let pin = self.position.pin_ray(id, king);
                match (pin, self.attackers.len()) {
                    // Pinned with the king safe: slide along the pin ray.
                    (Some(ray), 0) => pieces::reachable_squares_within(&self.position, id, &ray),
                    (None, 0) => pieces::reachable_squares(&self.position, id),
                    // Single check: block or capture.
                    (None, 1) => {
                        pieces::reachable_squares_within(&self.position, id, &self.check_whitelist)
                    }
                    // Pinned while checked, or double check: the piece sits out.
                    _ => Vec::new(),
                }
            };
            self.available.insert(id, moves);
        }
        self.fen = notation::fen(&self.history);
    }

    fn rebuild(&mut self) {
        let board = self.history.board_at_cursor();
        match Position::from_bytes(&board) {
            Ok(position) => self.position = position,
            Err(e) => panic!("CRITICAL: corrupt history snapshot: {}", e),
        }
        self.evaluate();
    }

    fn ensure_playable(&self) -> Result<(), MoveError> {
        if self.is_finished() {
            return Err(MoveError::GameOver);
        }
        if !self.history.at_live_position() {
            return Err(MoveError::HistoryDetached);
        }
        Ok(())
    }

    fn mover_checked(&self, from: Square) -> Result<(PieceId, crate::position::Piece), MoveError> {
        let id = self
            .position
            .id_at(from)
            .ok_or(MoveError::NoPieceAt(from))?;
        let piece = *self.position.piece(id);
        if piece.color != self.side_to_move() {
            return Err(MoveError::NotYourTurn);
        }
        Ok((id, piece))
    }

    // --- Apply Operations ---

    /// Plays a normal move. Pawn moves onto the last rank are refused here
    /// and must go through `apply_promotion`.
    pub fn apply_move(&mut self, from: Square, to: Square) -> Result<GameStatus, MoveError> {
        self.ensure_playable()?;
        let (id, piece) = self.mover_checked(from)?;
        if !self.available.get(&id).map_or(false, |m| m.contains(&to)) {
            return Err(MoveError::IllegalMove { from, to });
        }
        if piece.kind == PieceKind::Pawn && to.row == piece.color.promotion_row() {
            return Err(MoveError::PromotionRequired);
        }
        let capture = self.position.id_at(to).is_some();
        let common = pieces::common_piece_locations(&self.position, id, to);
        let text = Notation::for_move(piece.kind, from, to, capture, &common);
        self.position.move_piece(from, to);
        self.history.push(
            from,
            to,
            Some((piece.kind, piece.color)),
            capture,
            None,
            self.position.to_bytes(),
            text,
        );
        self.post_move();
        Ok(self.status)
    }

    /// Plays a pawn move onto the last rank, rewriting the pawn as `kind`.
    pub fn apply_promotion(
        &mut self,
        from: Square,
        to: Square,
        kind: PieceKind,
    ) -> Result<GameStatus, MoveError> {
        self.ensure_playable()?;
        let (id, piece) = self.mover_checked(from)?;
        if piece.kind != PieceKind::Pawn || to.row != piece.color.promotion_row() {
            return Err(MoveError::IllegalMove { from, to });
        }
        if !self.available.get(&id).map_or(false, |m| m.contains(&to)) {
            return Err(MoveError::IllegalMove { from, to });
        }
        if !kind.is_promotion_target() {
            return Err(MoveError::InvalidPromotion(kind));
        }
        let capture = self.position.id_at(to).is_some();
        let text = Notation::for_move(PieceKind::Pawn, from, to, capture, &[]);
        self.position.move_piece(from, to);
        self.position.set_kind(id, kind);
        self.history.push(
            from,
            to,
            Some((PieceKind::Pawn, piece.color)),
            capture,
            None,
            self.position.to_bytes(),
            text,
        );
        self.history.set_recent_promotion(kind);
        self.post_move();
        Ok(self.status)
    }

    /// The en passant capture currently available to the pawn on `from`,
    /// if any. Offers exist only at the live position, for the ply right
    /// after the enemy double step, and never for a pinned pawn or while
    /// the side to move is in check.
    pub fn en_passant_option(&self, from: Square) -> Option<EnPassantOffer> {
        if self.is_finished() || !self.history.at_live_position() || self.in_check {
            return None;
        }
        let id = self.position.id_at(from)?;
        let piece = self.position.piece(id);
        if piece.kind != PieceKind::Pawn || piece.color != self.side_to_move() {
            return None;
        }
        let record = self.history.last()?;
        let landing = record.double_step()?;
        let (_, enemy_color) = record.moved?;
        if enemy_color == piece.color {
            return None;
        }
        if landing.row != from.row || landing.col.abs_diff(from.col) != 1 {
            return None;
        }
        let king = self.position.king_id(piece.color);
        if self.position.pin_ray(id, king).is_some() {
            return None;
        }
        let dest = from.offset(piece.color.forward(), 0)?;
        let dest = Square::new(dest.row, landing.col);
        Some(EnPassantOffer {
            dest,
            captured: landing,
            offset: landing.row as i8 - dest.row as i8,
        })
    }

    /// Plays an en passant capture. The request must match the standing
    /// offer, `offset` included.
    pub fn apply_en_passant(
        &mut self,
        from: Square,
        to: Square,
        offset: i8,
    ) -> Result<GameStatus, MoveError> {
        self.ensure_playable()?;
        let (_, piece) = self.mover_checked(from)?;
        let offer = self
            .en_passant_option(from)
            .ok_or(MoveError::EnPassantUnavailable)?;
        if offer.dest != to || offer.offset != offset {
            return Err(MoveError::EnPassantUnavailable);
        }
        let text = Notation::for_move(PieceKind::Pawn, from, to, true, &[]);
        self.position.move_piece(from, to);
        self.position.remove_piece(offer.captured);
        self.history.push(
            from,
            to,
            Some((PieceKind::Pawn, piece.color)),
            true,
            None,
            self.position.to_bytes(),
            text,
        );
        self.history.set_recent_en_passant();
        self.post_move();
        Ok(self.status)
    }

    /// The castle sides open to the side to move right now.
    pub fn castle_options(&self) -> Vec<CastleSide> {
        let mut options = Vec::new();
        let color = self.side_to_move();
        for side in [CastleSide::KingSide, CastleSide::QueenSide] {
            if self.castle_allowed(color, side) {
                options.push(side);
            }
        }
        options
    }

    fn castle_allowed(&self, color: Color, side: CastleSide) -> bool {
        if self.is_finished() || !self.history.at_live_position() {
            return false;
        }
        if color != self.side_to_move() || self.in_check {
            return false;
        }
        if !self.history.derived_rights().allows(color, side) {
            return false;
        }
        let row = color.back_row();
        let (rook_col, between, transit): (usize, &[usize], &[usize]) = match side {
            CastleSide::KingSide => (7, &[5, 6], &[5, 6]),
            CastleSide::QueenSide => (0, &[1, 2, 3], &[2, 3]),
        };
        let rook_ok = self
            .position
            .piece_at(Square::new(row, rook_col))
            .map_or(false, |p| p.kind == PieceKind::Rook && p.color == color);
        if !rook_ok {
            return false;
        }
        if between
            .iter()
            .any(|&col| !self.position.is_empty(Square::new(row, col)))
        {
            return false;
        }
        let king = self.position.king_id(color);
        !transit
            .iter()
            .any(|&col| self.position.square_attacked(Square::new(row, col), king))
    }

    /// Castles, moving king and rook in one recorded ply.
    pub fn apply_castle(&mut self, color: Color, side: CastleSide) -> Result<GameStatus, MoveError> {
        self.ensure_playable()?;
        if !self.castle_allowed(color, side) {
            return Err(MoveError::CastleUnavailable(color, side));
        }
        let row = color.back_row();
        let (king_to, rook_from, rook_to) = match side {
            CastleSide::KingSide => (6, 7, 5),
            CastleSide::QueenSide => (2, 0, 3),
        };
        let king_from = Square::new(row, 4);
        let king_dest = Square::new(row, king_to);
        self.position.move_piece(king_from, king_dest);
        self.position
            .move_piece(Square::new(row, rook_from), Square::new(row, rook_to));
        self.history.push(
            king_from,
            king_dest,
            None,
            false,
            Some(side),
            self.position.to_bytes(),
            Notation::castle(side),
        );
        self.post_move();
        Ok(self.status)
    }

    /// Shared tail of every apply operation: reevaluate for the new side to
    /// move, then settle the state machine and annotate the move text.
    fn post_move(&mut self) {
        self.status = GameStatus::InProgress;
        self.result_line = None;
        self.evaluate();
        self.detect_terminal(true);
    }

    fn detect_terminal(&mut self, annotate: bool) {
        if self.in_check {
            if !self.has_legal_moves() {
                self.status = GameStatus::Checkmate;
                self.result_line = Some(match self.side_to_move() {
                    Color::White => "Checkmate : 0-1".to_string(),
                    Color::Black => "Checkmate : 1-0".to_string(),
                });
                if annotate {
                    self.history.set_recent_checkmate();
                }
            } else if annotate {
                self.history.set_recent_check();
            }
        } else if !self.has_legal_moves() {
            self.status = GameStatus::Stalemate;
            self.result_line = Some("Stalemate : Draw".to_string());
            if annotate {
                self.history.set_recent_stalemate();
            }
        }
    }

    // --- History Navigation ---
    // Boundary requests do nothing. Viewing an earlier position blocks the
    // apply operations until the cursor returns to the live move.

    pub fn go_left(&mut self) {
        if self.history.go_left() {
            self.rebuild();
        }
    }

    pub fn go_right(&mut self) {
        if self.history.go_right() {
            self.rebuild();
        }
    }

    pub fn go_far_left(&mut self) {
        if self.history.go_far_left() {
            self.rebuild();
        }
    }

    pub fn go_far_right(&mut self) {
        if self.history.go_far_right() {
            self.rebuild();
        }
    }

    pub fn go_to(&mut self, index: usize) {
        if self.history.go_to(index) {
            self.rebuild();
        }
    }

    /// Deletes the latest move. A finished game reopens; annotations vanish
    /// with the record that carried them.
    pub fn take_back(&mut self) {
        if self.history.take_back() {
            self.status = if self.history.is_empty() {
                GameStatus::Initial
            } else {
                GameStatus::InProgress
            };
            self.result_line = None;
            self.rebuild();
        }
    }

    // --- Export ---

    pub fn save_summary_to_file(&self, path: &str) -> Result<(), SaveError> {
        let summary = GameSummary {
            status: self.status,
            result: self.result_line.clone(),
            plies: self.history.plies(),
            final_fen: self.fen.clone(),
        };
        let json = serde_json::to_string_pretty(&summary).map_err(SaveError::Serialization)?;
        fs::write(path, json).map_err(|e| SaveError::Io(path.to_string(), e))?;
        Ok(())
    }

    pub fn save_pgn_to_file(&self, path: &str) -> Result<(), SaveError> {
        let pgn = self.game_pgn(&self.pgn_result_tag());
        fs::write(path, pgn).map_err(|e| SaveError::Io(path.to_string(), e))?;
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Captured by White: ")?;
        let mut taken = self.position.captured_of(Color::Black);
        taken.sort_by_key(|kind| kind.value());
        for kind in taken {
            write!(f, "{} ", kind.fen_char(Color::Black))?;
        }
        writeln!(f)?;
        write!(f, "Captured by Black: ")?;
        let mut taken = self.position.captured_of(Color::White);
        taken.sort_by_key(|kind| kind.value());
        for kind in taken {
            write!(f, "{} ", kind.fen_char(Color::White))?;
        }
        writeln!(f)?;
        writeln!(f, "---------------------")?;

        let checked_king = if self.in_check {
            Some(self.position.piece(self.position.king_id(self.side_to_move())).square)
        } else {
            None
        };
        let rows: Vec<usize> = match self.orientation {
            Orientation::WhiteBottom => (0..8).rev().collect(),
            Orientation::BlackBottom => (0..8).collect(),
        };
        writeln!(f, "  +-----------------+")?;
        for row in rows {
            write!(f, "{} | ", row + 1)?;
            let cols: Vec<usize> = match self.orientation {
                Orientation::WhiteBottom => (0..8).collect(),
                Orientation::BlackBottom => (0..8).rev().collect(),
            };
            for col in cols {
                let sq = Square::new(row, col);
                match self.position.piece_at(sq) {
                    Some(piece) => {
                        let mark = if checked_king == Some(sq) { '*' } else { ' ' };
                        write!(f, "{}{}", piece.kind.fen_char(piece.color), mark)?;
                    }
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +-----------------+")?;
        match self.orientation {
            Orientation::WhiteBottom => writeln!(f, "    a b c d e f g h")?,
            Orientation::BlackBottom => writeln!(f, "    h g f e d c b a")?,
        }

        writeln!(f, "Turn: {:?}", self.side_to_move())?;
        let rights = self.history.rights_at_cursor();
        writeln!(
            f,
            "Castling: W:{}{}, B:{}{}",
            if rights.white_kingside { "K" } else { "-" },
            if rights.white_queenside { "Q" } else { "-" },
            if rights.black_kingside { "k" } else { "-" },
            if rights.black_queenside { "q" } else { "-" }
        )?;
        if !self.history.at_live_position() {
            let shown = match self.history.cursor() {
                Some(i) => i + 1,
                None => 0,
            };
            writeln!(f, "Viewing move {} of {}", shown, self.history.len())?;
        }
        if self.in_check && !self.is_finished() {
            writeln!(f, "{:?} is in check!", self.side_to_move())?;
        }
        if let Some(line) = &self.result_line {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn play(game: &mut Game, moves: &[(&str, &str)]) {
        for &(from, to) in moves {
            game.apply_move(sq(from), sq(to)).unwrap();
        }
    }

    fn board_with(entries: &[(&str, PieceKind, Color)]) -> ByteBoard {
        let mut board = [[0u8; 8]; 8];
        for &(at, kind, color) in entries {
            let s = sq(at);
            board[s.row][s.col] = kind.code(color);
        }
        board
    }

    #[test]
    fn fresh_game_has_twenty_legal_moves() {
        let game = Game::new();
        assert_eq!(game.status(), GameStatus::Initial);
        assert_eq!(game.current_fen(), notation::INITIAL_FEN);
        let mut count = 0;
        for row in 0..8 {
            for col in 0..8 {
                count += game.legal_moves(Square::new(row, col)).len();
            }
        }
        assert_eq!(count, 20);
        // The defender's pieces report no moves.
        assert!(game.legal_moves(sq("e7")).is_empty());
    }

    #[test]
    fn turn_order_is_enforced() {
        let mut game = Game::new();
        assert!(matches!(
            game.apply_move(sq("e7"), sq("e5")),
            Err(MoveError::NotYourTurn)
        ));
        assert!(matches!(
            game.apply_move(sq("e3"), sq("e4")),
            Err(MoveError::NoPieceAt(_))
        ));
        assert!(matches!(
            game.apply_move(sq("e2"), sq("e5")),
            Err(MoveError::IllegalMove { .. })
        ));
    }

    #[test]
    fn viewing_history_blocks_play() {
        let mut game = Game::new();
        play(&mut game, &[("e2", "e4"), ("e7", "e5")]);
        game.go_left();
        assert!(matches!(
            game.apply_move(sq("g1"), sq("f3")),
            Err(MoveError::HistoryDetached)
        ));
        game.go_far_right();
        game.apply_move(sq("g1"), sq("f3")).unwrap();
    }

    #[test]
    fn evaluation_is_idempotent_across_navigation() {
        let mut game = Game::new();
        play(&mut game, &[("e2", "e4"), ("e7", "e5"), ("g1", "f3")]);
        let before = game.legal_moves(sq("b8"));
        let fen_before = game.current_fen().to_string();
        game.go_far_left();
        game.go_far_right();
        assert_eq!(game.legal_moves(sq("b8")), before);
        assert_eq!(game.current_fen(), fen_before);
    }

    #[test]
    fn pinned_piece_slides_only_along_the_pin_ray() {
        // Knight on e3 pinned by the e8 rook: none of its jumps stay on
        // the e-file.
        let board = board_with(&[
            ("e1", PieceKind::King, Color::White),
            ("e3", PieceKind::Knight, Color::White),
            ("e8", PieceKind::Rook, Color::Black),
            ("h8", PieceKind::King, Color::Black),
        ]);
        let game = Game::from_bytes(&board).unwrap();
        assert!(game.legal_moves(sq("e3")).is_empty());
    }

    #[test]
    fn pinned_while_checked_piece_sits_out() {
        // The e2 queen is pinned by the e8 rook while the d3 knight gives
        // check: its move set is empty, it never gets the capture on d3.
        let board = board_with(&[
            ("e1", PieceKind::King, Color::White),
            ("e2", PieceKind::Queen, Color::White),
            ("e8", PieceKind::Rook, Color::Black),
            ("d3", PieceKind::Knight, Color::Black),
            ("h8", PieceKind::King, Color::Black),
        ]);
        let game = Game::from_bytes(&board).unwrap();
        assert!(game.in_check());
        assert!(game.legal_moves(sq("e2")).is_empty());
        // The game is not over: the king itself can step away.
        assert!(game.has_legal_moves());
        assert_eq!(game.status(), GameStatus::Initial);
    }

    #[test]
    fn stalemate_is_detected_and_marked() {
        let board = board_with(&[
            ("g6", PieceKind::King, Color::White),
            ("c7", PieceKind::Queen, Color::White),
            ("h8", PieceKind::King, Color::Black),
        ]);
        let mut game = Game::from_bytes(&board).unwrap();
        let status = game.apply_move(sq("c7"), sq("f7")).unwrap();
        assert_eq!(status, GameStatus::Stalemate);
        assert_eq!(game.result_line(), Some("Stalemate : Draw"));
        assert_eq!(game.history().plies(), vec!["Qf7$".to_string()]);
        // The stalemating side still exports its win tag.
        assert_eq!(game.pgn_result_tag(), "[Result 1-0]");
        assert!(matches!(
            game.apply_move(sq("f7"), sq("f8")),
            Err(MoveError::GameOver)
        ));
    }

    #[test]
    fn promotion_requires_the_dedicated_operation() {
        let board = board_with(&[
            ("e1", PieceKind::King, Color::White),
            ("g7", PieceKind::Pawn, Color::White),
            ("h8", PieceKind::Knight, Color::Black),
            ("e8", PieceKind::King, Color::Black),
        ]);
        let mut game = Game::from_bytes(&board).unwrap();
        assert!(matches!(
            game.apply_move(sq("g7"), sq("g8")),
            Err(MoveError::PromotionRequired)
        ));
        assert!(matches!(
            game.apply_promotion(sq("g7"), sq("h8"), PieceKind::King),
            Err(MoveError::InvalidPromotion(PieceKind::King))
        ));
        game.apply_promotion(sq("g7"), sq("h8"), PieceKind::Queen)
            .unwrap();
        assert_eq!(game.position().piece_at(sq("h8")).unwrap().kind, PieceKind::Queen);
        assert_eq!(game.history().plies(), vec!["gxh8Q+".to_string()]);
        assert!(game.in_check());
    }

    #[test]
    fn en_passant_offer_carries_the_capture_offset() {
        let mut game = Game::new();
        play(
            &mut game,
            &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")],
        );
        let offer = game.en_passant_option(sq("e5")).unwrap();
        assert_eq!(offer.dest, sq("d6"));
        assert_eq!(offer.captured, sq("d5"));
        assert_eq!(offer.offset, -1);
        // A pawn on the wrong file gets nothing.
        assert!(game.en_passant_option(sq("a2")).is_none());

        game.apply_en_passant(sq("e5"), sq("d6"), -1).unwrap();
        assert!(game.position().is_empty(sq("d5")));
        assert_eq!(game.position().piece_at(sq("d6")).unwrap().kind, PieceKind::Pawn);
        assert_eq!(game.history().last().unwrap().notation.to_string(), "exd6e.p.");
    }

    #[test]
    fn en_passant_requests_must_match_the_offer() {
        let mut game = Game::new();
        play(
            &mut game,
            &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")],
        );
        assert!(matches!(
            game.apply_en_passant(sq("e5"), sq("d6"), 1),
            Err(MoveError::EnPassantUnavailable)
        ));
        assert!(matches!(
            game.apply_en_passant(sq("e5"), sq("f6"), -1),
            Err(MoveError::EnPassantUnavailable)
        ));
    }

    #[test]
    fn castle_moves_both_pieces_and_notates() {
        let mut game = Game::new();
        play(
            &mut game,
            &[
                ("e2", "e4"),
                ("e7", "e5"),
                ("g1", "f3"),
                ("g8", "f6"),
                ("f1", "c4"),
                ("f8", "c5"),
            ],
        );
        assert_eq!(game.castle_options(), vec![CastleSide::KingSide]);
        game.apply_castle(Color::White, CastleSide::KingSide).unwrap();
        assert_eq!(game.position().piece_at(sq("g1")).unwrap().kind, PieceKind::King);
        assert_eq!(game.position().piece_at(sq("f1")).unwrap().kind, PieceKind::Rook);
        assert_eq!(game.history().last().unwrap().notation.to_string(), "0-0");
        let rights = game.history().derived_rights();
        assert!(!rights.white_kingside);
        assert!(!rights.white_queenside);
        assert!(rights.black_kingside);
    }

    #[test]
    fn castle_is_refused_through_an_attacked_transit_square() {
        // The open g-file rook covers g1, so kingside castling is off even
        // though the squares between are empty.
        let board = board_with(&[
            ("e1", PieceKind::King, Color::White),
            ("h1", PieceKind::Rook, Color::White),
            ("g8", PieceKind::Rook, Color::Black),
            ("a8", PieceKind::King, Color::Black),
        ]);
        let game = Game::from_bytes(&board).unwrap();
        assert!(game.castle_options().is_empty());
    }

    #[test]
    fn saved_summary_reflects_the_game() {
        let mut game = Game::new();
        play(&mut game, &[("e2", "e4"), ("e7", "e5")]);
        let path = std::env::temp_dir().join("chess_core_summary_test.json");
        let path = path.to_str().unwrap();
        game.save_summary_to_file(path).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("\"e4\""));
        assert!(written.contains("InProgress"));
        std::fs::remove_file(path).ok();
    }
}
