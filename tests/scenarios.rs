// tests/scenarios.rs
//
// End-to-end games exercised through the public API only.

use chess_core::{CastleSide, Color, Game, GameStatus, Square, INITIAL_FEN};

fn sq(s: &str) -> Square {
    Square::from_algebraic(s).unwrap()
}

fn play(game: &mut Game, moves: &[(&str, &str)]) {
    for &(from, to) in moves {
        game.apply_move(sq(from), sq(to)).unwrap();
    }
}

#[test]
fn open_game_produces_the_expected_fen() {
    let mut game = Game::new();
    assert_eq!(game.current_fen(), INITIAL_FEN);
    play(&mut game, &[("e2", "e4"), ("e7", "e5")]);
    assert_eq!(
        game.current_fen(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq -"
    );
    assert_eq!(game.side_to_move(), Color::White);
}

#[test]
fn fools_mate_ends_in_checkmate() {
    let mut game = Game::new();
    play(&mut game, &[("f2", "f3"), ("e7", "e5"), ("g2", "g4")]);
    let status = game.apply_move(sq("d8"), sq("h4")).unwrap();
    assert_eq!(status, GameStatus::Checkmate);
    assert!(game.in_check());
    assert!(!game.has_legal_moves());
    assert_eq!(game.result_line(), Some("Checkmate : 0-1"));
    let last = game.history().plies().last().unwrap().clone();
    assert_eq!(last, "Qh4#");
    assert!(game.game_pgn(&game.pgn_result_tag()).contains("[Result 0-1]"));
}

#[test]
fn castling_rights_stay_forfeited_at_every_history_index() {
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

    // Both of White's rights read false from any cursor position.
    game.go_far_left();
    assert!(game.current_fen().ends_with(" w kq -"));
    game.go_to(1);
    assert!(game.current_fen().contains(" kq"));
    game.go_far_right();
    assert!(!game.history().derived_rights().white_kingside);
    assert!(!game.history().derived_rights().white_queenside);

    // Taking the castle back removes the record that forfeited them.
    game.take_back();
    assert!(game.history().derived_rights().white_kingside);
    assert!(game.history().derived_rights().white_queenside);
    assert_eq!(game.castle_options(), vec![CastleSide::KingSide]);
}

#[test]
fn en_passant_window_lasts_exactly_one_ply() {
    let mut game = Game::new();
    play(
        &mut game,
        &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")],
    );
    let offer = game.en_passant_option(sq("e5")).unwrap();
    assert_eq!(offer.dest, sq("d6"));
    assert_eq!(offer.captured, sq("d5"));

    // Play something else: the window closes and never reopens.
    play(&mut game, &[("b1", "c3"), ("b8", "c6")]);
    assert!(game.en_passant_option(sq("e5")).is_none());
}

#[test]
fn take_back_reopens_a_checkmated_game() {
    let mut game = Game::new();
    play(
        &mut game,
        &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")],
    );
    assert_eq!(game.status(), GameStatus::Checkmate);

    game.take_back();
    assert_eq!(game.status(), GameStatus::InProgress);
    assert!(game.result_line().is_none());
    assert!(game.has_legal_moves());
    assert_eq!(game.side_to_move(), Color::Black);
    // The mate annotation left with its record.
    assert_eq!(game.history().plies().last().unwrap(), "g4");

    // The same mate can be replayed.
    let status = game.apply_move(sq("d8"), sq("h4")).unwrap();
    assert_eq!(status, GameStatus::Checkmate);
}

#[test]
fn take_back_restores_the_board_bytes_exactly() {
    let mut game = Game::new();
    play(&mut game, &[("e2", "e4"), ("d7", "d5")]);
    let before = game.position().to_bytes();
    let rights_before = game.history().derived_rights();
    let fen_before = game.current_fen().to_string();

    // A capture and its take-back: the victim comes back too.
    game.apply_move(sq("e4"), sq("d5")).unwrap();
    game.take_back();
    assert_eq!(game.position().to_bytes(), before);
    assert_eq!(game.history().derived_rights(), rights_before);
    assert_eq!(game.current_fen(), fen_before);

    // Same for a rights-forfeiting king move.
    game.apply_move(sq("e1"), sq("e2")).unwrap();
    game.take_back();
    assert_eq!(game.position().to_bytes(), before);
    assert_eq!(game.history().derived_rights(), rights_before);
}

#[test]
fn navigation_round_trip_preserves_the_live_position() {
    let mut game = Game::new();
    play(
        &mut game,
        &[("e2", "e4"), ("e7", "e5"), ("g1", "f3"), ("b8", "c6")],
    );
    let live_fen = game.current_fen().to_string();

    game.go_far_left();
    assert_eq!(game.current_fen(), INITIAL_FEN);
    game.go_right();
    game.go_right();
    assert!(game.current_fen().starts_with("rnbqkbnr/pppp1ppp"));
    game.go_far_right();
    assert_eq!(game.current_fen(), live_fen);

    // Boundary no-ops leave everything alone.
    game.go_right();
    game.go_far_right();
    assert_eq!(game.current_fen(), live_fen);
}
