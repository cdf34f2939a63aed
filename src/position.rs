// src/position.rs
//
// The 8x8 grid and the attack/check/pin queries the legality engine is built
// on. Pieces live in an arena; the grid holds handles into it, so piece
// identity survives moves and is plain id equality.

use crate::errors::BoardError;
use crate::pieces::{
    ByteBoard, Color, PieceKind, Square, BOARD_SIZE, DIAGONAL_DIRS, EMPTY_CODE, INITIAL_BOARD,
    KNIGHT_TARGETS, ORTHOGONAL_DIRS,
};

/// Handle into the position's piece arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PieceId(usize);

#[derive(Debug, Copy, Clone)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
    pub alive: bool,
}

// Adjacent-enemy-king probes for king move candidates. For each candidate
// direction, the probe offsets (relative to the king's own square) that an
// enemy king would occupy to control the candidate square.
const DIAGONAL_KING_PROBES: [(i8, i8); 5] = [(2, 2), (1, 2), (2, 1), (0, 2), (2, 0)];
const ORTHOGONAL_KING_PROBES: [[(i8, i8); 3]; 4] = [
    [(2, 1), (2, 0), (2, -1)],   // (1, 0)
    [(1, 2), (0, 2), (-1, 2)],   // (0, 1)
    [(-2, 1), (-2, 0), (-2, -1)], // (-1, 0)
    [(1, -2), (0, -2), (-1, -2)], // (0, -1)
];

pub struct Position {
    grid: [[Option<PieceId>; 8]; 8],
    pieces: Vec<Piece>,
    kings: [PieceId; 2],
}

impl Position {
    /// Builds a position from a raw byte board, validating every code and
    /// requiring exactly one king per color.
    pub fn from_bytes(board: &ByteBoard) -> Result<Position, BoardError> {
        let mut grid = [[None; 8]; 8];
        let mut pieces = Vec::new();
        let mut kings: [Option<PieceId>; 2] = [None, None];
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let code = board[row][col];
                if code == EMPTY_CODE {
                    continue;
                }
                let square = Square::new(row, col);
                let (kind, color) = PieceKind::from_code(code)
                    .ok_or(BoardError::InvalidCode { code, at: square })?;
                let id = PieceId(pieces.len());
                if kind == PieceKind::King {
                    if kings[color.index()].is_some() {
                        return Err(BoardError::ExtraKing(color));
                    }
                    kings[color.index()] = Some(id);
                }
                pieces.push(Piece { kind, color, square, alive: true });
                grid[row][col] = Some(id);
            }
        }
        let white_king = kings[0].ok_or(BoardError::MissingKing(Color::White))?;
        let black_king = kings[1].ok_or(BoardError::MissingKing(Color::Black))?;
        Ok(Position { grid, pieces, kings: [white_king, black_king] })
    }

    pub fn initial() -> Position {
        match Position::from_bytes(&INITIAL_BOARD) {
            Ok(pos) => pos,
            Err(_) => unreachable!("the initial layout is a valid board"),
        }
    }

    pub fn to_bytes(&self) -> ByteBoard {
        let mut board = [[EMPTY_CODE; 8]; 8];
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if let Some(id) = self.grid[row][col] {
                    let piece = &self.pieces[id.0];
                    board[row][col] = piece.kind.code(piece.color);
                }
            }
        }
        board
    }

    // --- Lookup ---

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    pub fn id_at(&self, sq: Square) -> Option<PieceId> {
        self.grid[sq.row][sq.col]
    }

    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.id_at(sq).map(|id| self.piece(id))
    }

    pub fn king_id(&self, color: Color) -> PieceId {
        self.kings[color.index()]
    }

    pub fn is_empty(&self, sq: Square) -> bool {
        self.id_at(sq).is_none()
    }

    pub fn has_enemy(&self, sq: Square, color: Color) -> bool {
        self.piece_at(sq).map_or(false, |p| p.color != color)
    }

    /// Ids of the living pieces of one color, in arena order.
    pub fn ids_of(&self, color: Color) -> Vec<PieceId> {
        self.pieces
            .iter()
            .enumerate()
            .filter(|(_, p)| p.alive && p.color == color)
            .map(|(i, _)| PieceId(i))
            .collect()
    }

    /// Kinds of the captured pieces of one color.
    pub fn captured_of(&self, color: Color) -> Vec<PieceKind> {
        self.pieces
            .iter()
            .filter(|p| !p.alive && p.color == color)
            .map(|p| p.kind)
            .collect()
    }

    // --- Mutation ---

    /// Moves the piece at `from` to `to`, returning the captured piece id if
    /// the destination was occupied. The caller has validated the move.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<PieceId> {
        let id = match self.grid[from.row][from.col].take() {
            Some(id) => id,
            None => return None,
        };
        let captured = self.grid[to.row][to.col].take();
        if let Some(victim) = captured {
            self.pieces[victim.0].alive = false;
        }
        self.grid[to.row][to.col] = Some(id);
        self.pieces[id.0].square = to;
        captured
    }

    /// Removes the piece at `sq` (the en passant victim).
    pub fn remove_piece(&mut self, sq: Square) -> Option<PieceId> {
        let removed = self.grid[sq.row][sq.col].take();
        if let Some(id) = removed {
            self.pieces[id.0].alive = false;
        }
        removed
    }

    /// Rewrites a piece's kind in place (promotion).
    pub fn set_kind(&mut self, id: PieceId, kind: PieceKind) {
        self.pieces[id.0].kind = kind;
    }

    // --- Attack and Check Queries ---

    /// Whether any enemy of `king`'s color attacks `sq`. The king's own
    /// square is transparent to sliders, so squares "behind" a checked king
    /// along the checking ray still read as attacked.
    pub fn square_attacked(&self, sq: Square, king: PieceId) -> bool {
        let king_color = self.piece(king).color;
        for &(dr, dc) in &DIAGONAL_DIRS {
            if self.ray_threat(sq, king, dr, dc, true) {
                return true;
            }
        }
        for &(dr, dc) in &ORTHOGONAL_DIRS {
            if self.ray_threat(sq, king, dr, dc, false) {
                return true;
            }
        }
        for &target in &KNIGHT_TARGETS[sq.index()] {
            if let Some(piece) = self.piece_at(target) {
                if piece.color != king_color && piece.kind == PieceKind::Knight {
                    return true;
                }
            }
        }
        false
    }

    fn ray_threat(&self, sq: Square, king: PieceId, dr: i8, dc: i8, diagonal: bool) -> bool {
        let king_color = self.piece(king).color;
        let mut cur = sq;
        let mut dist = 0;
        while let Some(next) = cur.offset(dr, dc) {
            cur = next;
            dist += 1;
            let id = match self.id_at(cur) {
                Some(id) => id,
                None => continue,
            };
            if id == king {
                continue;
            }
            let piece = self.piece(id);
            if piece.color != king_color {
                match piece.kind {
                    PieceKind::Bishop | PieceKind::Queen if diagonal => return true,
                    PieceKind::Rook | PieceKind::Queen if !diagonal => return true,
                    // A pawn one step out threatens back along its own
                    // advance direction only.
                    PieceKind::Pawn if diagonal && dist == 1 && dr == -piece.color.forward() => {
                        return true
                    }
                    _ => {}
                }
            }
            return false;
        }
        false
    }

    /// Squares of every enemy piece currently giving check to `king`.
    pub fn attackers_of(&self, king: PieceId) -> Vec<Square> {
        let ksq = self.piece(king).square;
        let king_color = self.piece(king).color;
        let mut attackers = Vec::new();
        for &(dr, dc) in &DIAGONAL_DIRS {
            if let Some(sq) = self.ray_attacker(ksq, king_color, dr, dc, true) {
                attackers.push(sq);
            }
        }
        for &(dr, dc) in &ORTHOGONAL_DIRS {
            if let Some(sq) = self.ray_attacker(ksq, king_color, dr, dc, false) {
                attackers.push(sq);
            }
        }
        for &target in &KNIGHT_TARGETS[ksq.index()] {
            if let Some(piece) = self.piece_at(target) {
                if piece.color != king_color && piece.kind == PieceKind::Knight {
                    attackers.push(target);
                }
            }
        }
        attackers
    }

    fn ray_attacker(
        &self,
        from: Square,
        king_color: Color,
        dr: i8,
        dc: i8,
        diagonal: bool,
    ) -> Option<Square> {
        let mut cur = from;
        let mut dist = 0;
        while let Some(next) = cur.offset(dr, dc) {
            cur = next;
            dist += 1;
            let piece = match self.piece_at(cur) {
                Some(piece) => piece,
                None => continue,
            };
            if piece.color != king_color {
                let threat = match piece.kind {
                    PieceKind::Queen => true,
                    PieceKind::Bishop => diagonal,
                    PieceKind::Rook => !diagonal,
                    PieceKind::Pawn => {
                        diagonal && dist == 1 && dr == -piece.color.forward()
                    }
                    _ => false,
                };
                if threat {
                    return Some(cur);
                }
            }
            return None;
        }
        None
    }

    /// The king's legal destinations: adjacent squares that are empty or
    /// enemy-held, not attacked, and not adjacent to the enemy king (checked
    /// through the probe tables rather than a full scan).
    pub fn king_safe_squares(&self, king: PieceId) -> Vec<Square> {
        let ksq = self.piece(king).square;
        let color = self.piece(king).color;
        let mut safe = Vec::new();
        for &(dr, dc) in &DIAGONAL_DIRS {
            let candidate = match ksq.offset(dr, dc) {
                Some(sq) => sq,
                None => continue,
            };
            if !(self.is_empty(candidate) || self.has_enemy(candidate, color)) {
                continue;
            }
            let probes = DIAGONAL_KING_PROBES
                .iter()
                .map(|&(pr, pc)| (pr * dr, pc * dc));
            if self.enemy_king_probed(ksq, king, probes) {
                continue;
            }
            if !self.square_attacked(candidate, king) {
                safe.push(candidate);
            }
        }
        for (i, &(dr, dc)) in ORTHOGONAL_DIRS.iter().enumerate() {
            let candidate = match ksq.offset(dr, dc) {
                Some(sq) => sq,
                None => continue,
            };
            if !(self.is_empty(candidate) || self.has_enemy(candidate, color)) {
                continue;
            }
            let probes = ORTHOGONAL_KING_PROBES[i].iter().copied();
            if self.enemy_king_probed(ksq, king, probes) {
                continue;
            }
            if !self.square_attacked(candidate, king) {
                safe.push(candidate);
            }
        }
        safe
    }

    fn enemy_king_probed(
        &self,
        ksq: Square,
        king: PieceId,
        probes: impl Iterator<Item = (i8, i8)>,
    ) -> bool {
        for (dr, dc) in probes {
            if let Some(sq) = ksq.offset(dr, dc) {
                if let Some(id) = self.id_at(sq) {
                    if id != king && self.piece(id).kind == PieceKind::King {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Squares a non-king piece may use to resolve a single check: the lone
    /// knight's square, or the king-to-attacker ray inclusive. Empty when the
    /// check is double (only the king can resolve those).
    pub fn check_whitelist(&self, attackers: &[Square], king: PieceId) -> Vec<Square> {
        if attackers.len() != 1 {
            return Vec::new();
        }
        let attacker = attackers[0];
        if let Some(piece) = self.piece_at(attacker) {
            if piece.kind == PieceKind::Knight {
                return vec![attacker];
            }
        }
        let ksq = self.piece(king).square;
        let (dr, dc) = match normalize_direction(ksq, attacker) {
            Some(dir) => dir,
            None => return Vec::new(),
        };
        let mut whitelist = Vec::new();
        let mut cur = ksq;
        while let Some(next) = cur.offset(dr, dc) {
            cur = next;
            whitelist.push(cur);
            if cur == attacker {
                break;
            }
        }
        whitelist
    }

    /// Pin detection for a non-king piece: walks the king-to-piece ray out to
    /// the first enemy piece. Pinned iff that piece is a slider matching the
    /// ray direction and the candidate is the only piece in between. Returns
    /// the ray (through the pinner, inclusive) as the movement whitelist.
    pub fn pin_ray(&self, id: PieceId, king: PieceId) -> Option<Vec<Square>> {
        let piece = *self.piece(id);
        if piece.kind == PieceKind::King {
            return None;
        }
        let ksq = self.piece(king).square;
        let king_color = self.piece(king).color;
        let (dr, dc) = normalize_direction(ksq, piece.square)?;
        let diagonal = dr != 0 && dc != 0;
        let mut ray = Vec::new();
        let mut seen = 0u32;
        let mut passed_self = false;
        let mut cur = ksq;
        while let Some(next) = cur.offset(dr, dc) {
            cur = next;
            ray.push(cur);
            let occupant = match self.id_at(cur) {
                Some(occ) => occ,
                None => continue,
            };
            seen += 1;
            if occupant == id {
                passed_self = true;
                continue;
            }
            let other = self.piece(occupant);
            if other.color != king_color {
                let slider = match other.kind {
                    PieceKind::Queen => true,
                    PieceKind::Bishop => diagonal,
                    PieceKind::Rook => !diagonal,
                    _ => false,
                };
                if passed_self && slider && seen == 2 {
                    return Some(ray);
                }
                return None;
            }
            // A second friendly piece shields the candidate; keep walking so
            // the piece count rules the pin out.
        }
        None
    }
}

/// Unit direction from `from` to `to` when they share a rank, file or
/// diagonal. `None` otherwise, and for identical squares.
pub(crate) fn normalize_direction(from: Square, to: Square) -> Option<(i8, i8)> {
    let dr = to.row as i8 - from.row as i8;
    let dc = to.col as i8 - from.col as i8;
    if dr == 0 && dc == 0 {
        return None;
    }
    if dr != 0 && dc != 0 && dr.abs() != dc.abs() {
        return None;
    }
    Some((dr.signum(), dc.signum()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(entries: &[(usize, usize, PieceKind, Color)]) -> ByteBoard {
        let mut board = [[0u8; 8]; 8];
        for &(row, col, kind, color) in entries {
            board[row][col] = kind.code(color);
        }
        board
    }

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn initial_board_round_trips() {
        let pos = Position::initial();
        assert_eq!(pos.to_bytes(), INITIAL_BOARD);
        assert_eq!(pos.piece(pos.king_id(Color::White)).square, sq("e1"));
        assert_eq!(pos.piece(pos.king_id(Color::Black)).square, sq("e8"));
    }

    #[test]
    fn from_bytes_rejects_bad_codes_and_king_counts() {
        let mut board = INITIAL_BOARD;
        board[4][4] = 13;
        assert!(matches!(
            Position::from_bytes(&board),
            Err(BoardError::InvalidCode { code: 13, .. })
        ));

        let board = board_with(&[(0, 4, PieceKind::King, Color::White)]);
        assert!(matches!(
            Position::from_bytes(&board),
            Err(BoardError::MissingKing(Color::Black))
        ));

        let board = board_with(&[
            (0, 4, PieceKind::King, Color::White),
            (0, 0, PieceKind::King, Color::White),
            (7, 4, PieceKind::King, Color::Black),
        ]);
        assert!(matches!(
            Position::from_bytes(&board),
            Err(BoardError::ExtraKing(Color::White))
        ));
    }

    #[test]
    fn rook_checks_along_open_file() {
        let board = board_with(&[
            (0, 4, PieceKind::King, Color::White),
            (7, 7, PieceKind::King, Color::Black),
            (5, 4, PieceKind::Rook, Color::Black),
        ]);
        let pos = Position::from_bytes(&board).unwrap();
        let king = pos.king_id(Color::White);
        assert_eq!(pos.attackers_of(king), vec![sq("e6")]);
        let whitelist = pos.check_whitelist(&[sq("e6")], king);
        assert_eq!(whitelist, vec![sq("e2"), sq("e3"), sq("e4"), sq("e5"), sq("e6")]);
    }

    #[test]
    fn pawn_checks_only_from_its_own_attack_direction() {
        // Black pawn diagonally above the white king gives check; a black
        // pawn diagonally below it does not.
        let board = board_with(&[
            (3, 4, PieceKind::King, Color::White),
            (7, 7, PieceKind::King, Color::Black),
            (4, 5, PieceKind::Pawn, Color::Black),
            (2, 3, PieceKind::Pawn, Color::Black),
        ]);
        let pos = Position::from_bytes(&board).unwrap();
        let king = pos.king_id(Color::White);
        assert_eq!(pos.attackers_of(king), vec![sq("f5")]);
    }

    #[test]
    fn knight_check_whitelist_is_just_the_knight() {
        let board = board_with(&[
            (0, 4, PieceKind::King, Color::White),
            (7, 7, PieceKind::King, Color::Black),
            (2, 5, PieceKind::Knight, Color::Black),
        ]);
        let pos = Position::from_bytes(&board).unwrap();
        let king = pos.king_id(Color::White);
        let attackers = pos.attackers_of(king);
        assert_eq!(attackers, vec![sq("f3")]);
        assert_eq!(pos.check_whitelist(&attackers, king), vec![sq("f3")]);
    }

    #[test]
    fn double_check_whitelist_is_empty() {
        let board = board_with(&[
            (0, 4, PieceKind::King, Color::White),
            (7, 7, PieceKind::King, Color::Black),
            (5, 4, PieceKind::Rook, Color::Black),
            (2, 5, PieceKind::Knight, Color::Black),
        ]);
        let pos = Position::from_bytes(&board).unwrap();
        let king = pos.king_id(Color::White);
        let attackers = pos.attackers_of(king);
        assert_eq!(attackers.len(), 2);
        assert!(pos.check_whitelist(&attackers, king).is_empty());
    }

    #[test]
    fn checked_king_cannot_step_back_along_the_ray() {
        // Rook on e6 checks the king on e4: e3 lies behind the king on the
        // same ray and must still read as attacked.
        let board = board_with(&[
            (3, 4, PieceKind::King, Color::White),
            (7, 7, PieceKind::King, Color::Black),
            (5, 4, PieceKind::Rook, Color::Black),
        ]);
        let pos = Position::from_bytes(&board).unwrap();
        let king = pos.king_id(Color::White);
        let safe = pos.king_safe_squares(king);
        assert!(!safe.contains(&sq("e3")));
        assert!(!safe.contains(&sq("e5")));
        assert!(safe.contains(&sq("d3")));
        assert!(safe.contains(&sq("f3")));
    }

    #[test]
    fn kings_never_become_adjacent() {
        let board = board_with(&[
            (3, 3, PieceKind::King, Color::White),
            (3, 5, PieceKind::King, Color::Black),
        ]);
        let pos = Position::from_bytes(&board).unwrap();
        let king = pos.king_id(Color::White);
        let safe = pos.king_safe_squares(king);
        // e3/e4/e5 all touch the black king on f4.
        assert!(!safe.contains(&sq("e3")));
        assert!(!safe.contains(&sq("e4")));
        assert!(!safe.contains(&sq("e5")));
        assert!(safe.contains(&sq("c3")));
        assert!(safe.contains(&sq("c4")));
    }

    #[test]
    fn bishop_pins_a_knight_to_the_king() {
        let board = board_with(&[
            (0, 4, PieceKind::King, Color::White),
            (7, 7, PieceKind::King, Color::Black),
            (2, 6, PieceKind::Knight, Color::White),
            (3, 7, PieceKind::Bishop, Color::Black), // h4, on the e1 diagonal
        ]);
        let pos = Position::from_bytes(&board).unwrap();
        let king = pos.king_id(Color::White);
        let knight = pos.id_at(sq("g3")).unwrap();
        let ray = pos.pin_ray(knight, king).unwrap();
        assert_eq!(ray, vec![sq("f2"), sq("g3"), sq("h4")]);
    }

    #[test]
    fn no_pin_when_a_second_piece_shields_the_ray() {
        let board = board_with(&[
            (0, 4, PieceKind::King, Color::White),
            (7, 7, PieceKind::King, Color::Black),
            (1, 5, PieceKind::Pawn, Color::White),  // f2
            (2, 6, PieceKind::Knight, Color::White), // g3
            (3, 7, PieceKind::Bishop, Color::Black), // h4
        ]);
        let pos = Position::from_bytes(&board).unwrap();
        let king = pos.king_id(Color::White);
        let knight = pos.id_at(sq("g3")).unwrap();
        assert!(pos.pin_ray(knight, king).is_none());
        let pawn = pos.id_at(sq("f2")).unwrap();
        assert!(pos.pin_ray(pawn, king).is_none());
    }

    #[test]
    fn no_pin_from_a_mismatched_slider() {
        // A rook on the diagonal does not pin.
        let board = board_with(&[
            (0, 4, PieceKind::King, Color::White),
            (7, 7, PieceKind::King, Color::Black),
            (1, 5, PieceKind::Pawn, Color::White),
            (3, 7, PieceKind::Rook, Color::Black),
        ]);
        let pos = Position::from_bytes(&board).unwrap();
        let king = pos.king_id(Color::White);
        let pawn = pos.id_at(sq("f2")).unwrap();
        assert!(pos.pin_ray(pawn, king).is_none());
    }

    #[test]
    fn capture_marks_the_victim_dead() {
        let board = board_with(&[
            (0, 4, PieceKind::King, Color::White),
            (7, 7, PieceKind::King, Color::Black),
            (3, 3, PieceKind::Rook, Color::White),
            (3, 6, PieceKind::Bishop, Color::Black),
        ]);
        let mut pos = Position::from_bytes(&board).unwrap();
        let victim = pos.move_piece(sq("d4"), sq("g4"));
        assert!(victim.is_some());
        assert_eq!(pos.captured_of(Color::Black), vec![PieceKind::Bishop]);
        assert_eq!(pos.piece_at(sq("g4")).unwrap().kind, PieceKind::Rook);
        assert!(pos.is_empty(sq("d4")));
    }
}
