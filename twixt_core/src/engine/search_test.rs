use crate::engine::config::EngineConfig;
use crate::engine::search::AlphaBetaEngine;
use crate::engine::{Move, SearchLimit, Searcher};
use crate::logic::board::Player;
use crate::logic::game::Match;
use std::sync::Arc;

fn engine_with_seed(seed: u64) -> AlphaBetaEngine {
    let config = EngineConfig {
        random_seed: Some(seed),
        tt_size_mb: 1,
        ..EngineConfig::default()
    };
    AlphaBetaEngine::new(Arc::new(config))
}

/// Y chain from the top edge down to row 21; (6,23) or (8,23) finishes it.
fn nearly_won_for_y(game: &mut Match) {
    for k in 0..11 {
        game.make_move(Move::new(5 + k % 2, 2 * k), Player::Y).unwrap();
    }
    game.make_move(Move::new(7, 21), Player::Y).unwrap();
}

#[test]
fn test_finds_winning_move_for_y() {
    let mut game = Match::new(24, 24).unwrap();
    nearly_won_for_y(&mut game);

    let mut engine = engine_with_seed(1);
    let (mv, stats) = engine
        .compute_move(&mut game, Player::Y, SearchLimit::Depth(3))
        .unwrap();
    assert!(
        mv == Move::new(6, 23) || mv == Move::new(8, 23),
        "expected a winning move, got {mv}"
    );
    assert!(stats.value >= 1000);
}

#[test]
fn test_finds_winning_move_for_x() {
    let mut game = Match::new(24, 24).unwrap();
    for k in 0..11 {
        game.make_move(Move::new(2 * k, 5 + k % 2), Player::X).unwrap();
    }
    game.make_move(Move::new(21, 7), Player::X).unwrap();

    let mut engine = engine_with_seed(1);
    let (mv, stats) = engine
        .compute_move(&mut game, Player::X, SearchLimit::Depth(3))
        .unwrap();
    assert!(
        mv == Move::new(23, 6) || mv == Move::new(23, 8),
        "expected a winning move, got {mv}"
    );
    assert!(stats.value <= -1000);
}

#[test]
fn test_shallow_depth_still_sees_the_win() {
    let mut game = Match::new(24, 24).unwrap();
    nearly_won_for_y(&mut game);

    let mut engine = engine_with_seed(2);
    let (mv, stats) = engine
        .compute_move(&mut game, Player::Y, SearchLimit::Depth(1))
        .unwrap();
    assert!(mv.y == 23, "expected a move on the last row, got {mv}");
    assert_eq!(stats.depth, 1);
    assert_eq!(stats.value, 1000);
}

#[test]
fn test_search_restores_the_match() {
    let mut game = Match::new(12, 12).unwrap();
    game.make_move(Move::new(5, 5), Player::Y).unwrap();
    game.make_move(Move::new(6, 7), Player::X).unwrap();

    let hash = game.zobrist_value();
    let history = game.history().to_vec();
    let y_value = game.value_for(Player::Y);
    let x_value = game.value_for(Player::X);

    let mut engine = engine_with_seed(3);
    let (mv, _) = engine
        .compute_move(&mut game, Player::Y, SearchLimit::Depth(4))
        .unwrap();

    assert_eq!(game.zobrist_value(), hash);
    assert_eq!(game.history(), history.as_slice());
    assert_eq!(game.value_for(Player::Y), y_value);
    assert_eq!(game.value_for(Player::X), x_value);
    assert_eq!(game.turn(), Player::Y);
    assert!(game.check_move(mv, Player::Y).is_ok());
}

#[test]
fn test_final_ply_is_searched_even_when_skipped() {
    let mut game = Match::new(12, 12).unwrap();
    game.make_move(Move::new(5, 5), Player::Y).unwrap();
    game.make_move(Move::new(6, 7), Player::X).unwrap();

    let mut engine = engine_with_seed(4);
    assert_eq!(engine.config().skipped_ply, Some(4));
    let (_, stats) = engine
        .compute_move(&mut game, Player::Y, SearchLimit::Depth(4))
        .unwrap();
    assert_eq!(stats.depth, 4);
    assert!(stats.nodes > 0);
}

#[test]
fn test_empty_board_gets_a_move() {
    let mut game = Match::new(12, 12).unwrap();
    let mut engine = engine_with_seed(5);
    let (mv, _) = engine
        .compute_move(&mut game, Player::Y, SearchLimit::Depth(3))
        .unwrap();
    assert!(game.check_move(mv, Player::Y).is_ok());
    assert_eq!(game.move_count(), 0);
}

#[test]
fn test_same_seed_same_move() {
    let first = {
        let mut game = Match::new(12, 12).unwrap();
        engine_with_seed(9).compute_move(&mut game, Player::Y, SearchLimit::Depth(3))
    };
    let second = {
        let mut game = Match::new(12, 12).unwrap();
        engine_with_seed(9).compute_move(&mut game, Player::Y, SearchLimit::Depth(3))
    };
    assert_eq!(first.map(|(mv, _)| mv), second.map(|(mv, _)| mv));
}

#[test]
fn test_time_limit_returns_a_move() {
    let mut game = Match::new(24, 24).unwrap();
    game.make_move(Move::new(10, 10), Player::Y).unwrap();
    game.make_move(Move::new(12, 12), Player::X).unwrap();

    let mut engine = engine_with_seed(6);
    let (mv, _) = engine
        .compute_move(&mut game, Player::Y, SearchLimit::Time(50))
        .unwrap();
    assert!(game.check_move(mv, Player::Y).is_ok());
    assert_eq!(game.move_count(), 2);
}

#[test]
fn test_no_move_once_opponent_has_won() {
    let mut game = Match::new(24, 24).unwrap();
    nearly_won_for_y(&mut game);
    game.make_move(Move::new(6, 23), Player::Y).unwrap();

    let mut engine = engine_with_seed(7);
    assert!(engine
        .compute_move(&mut game, Player::X, SearchLimit::Depth(3))
        .is_none());
}

/// Seven plies of an opening, X to move.
fn young_game() -> Match {
    let mut game = Match::new(24, 24).unwrap();
    for (mv, player) in [
        (Move::new(10, 4), Player::Y),
        (Move::new(3, 12), Player::X),
        (Move::new(11, 6), Player::Y),
        (Move::new(5, 13), Player::X),
        (Move::new(10, 8), Player::Y),
        (Move::new(7, 12), Player::X),
        (Move::new(11, 10), Player::Y),
    ] {
        game.make_move(mv, player).unwrap();
    }
    game
}

#[test]
fn test_defensive_opening_counts_played_moves_only() {
    let mut game = young_game();
    assert_eq!(game.move_count(), 7);

    // seven real plies: X ignores its own distance even though the leaf is ply 8
    let mut engine = engine_with_seed(8);
    let (mv, stats) = engine
        .compute_move(&mut game, Player::X, SearchLimit::Depth(1))
        .unwrap();
    game.make_move(mv, Player::X).unwrap();
    let dist_y = game.value_for(Player::Y);
    assert!(game.value_for(Player::X) > 0);
    assert_eq!(stats.value, -dist_y);
}

#[test]
fn test_full_evaluation_after_defensive_opening() {
    let mut game = young_game();
    let config = EngineConfig {
        random_seed: Some(8),
        tt_size_mb: 1,
        defensive_plies: 7,
        ..EngineConfig::default()
    };
    let mut engine = AlphaBetaEngine::new(Arc::new(config));
    let (mv, stats) = engine
        .compute_move(&mut game, Player::X, SearchLimit::Depth(1))
        .unwrap();
    game.make_move(mv, Player::X).unwrap();
    let dist_x = game.value_for(Player::X);
    let dist_y = game.value_for(Player::Y);
    assert_eq!(stats.value, dist_x - dist_y);
}

#[test]
fn test_skipped_ply_is_not_searched_before_the_last_one() {
    let search = |skipped_ply: Option<u8>| {
        let mut game = Match::new(24, 24).unwrap();
        nearly_won_for_y(&mut game);
        let config = EngineConfig {
            random_seed: Some(12),
            tt_size_mb: 1,
            skipped_ply,
            ..EngineConfig::default()
        };
        AlphaBetaEngine::new(Arc::new(config))
            .compute_move(&mut game, Player::Y, SearchLimit::Depth(5))
            .unwrap()
    };

    // the win ends deepening in the first pass that runs
    let (_, plain) = search(None);
    assert_eq!(plain.depth, 3);
    assert_eq!(plain.value, 1002);

    let (mv, skipped) = search(Some(3));
    assert_eq!(skipped.depth, 4);
    assert_eq!(skipped.value, 1003);
    assert_eq!(mv.y, 23);
}
