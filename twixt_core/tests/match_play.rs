use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use twixt_core::engine::config::EngineConfig;
use twixt_core::engine::search::AlphaBetaEngine;
use twixt_core::engine::{Move, SearchLimit, Searcher};
use twixt_core::logic::board::{BoardState, BridgeDir, Player};
use twixt_core::logic::game::{Match, MatchRecord, MatchStatus};

type Cell = (Option<Player>, [u8; 4]);

fn snapshot(board: &BoardState) -> Vec<Cell> {
    let mut cells = Vec::new();
    for y in 0..board.ysize() {
        for x in 0..board.xsize() {
            let slots = BridgeDir::ALL.map(|dir| board.bridge_slot(x, y, dir));
            cells.push((board.get_pin(x, y), slots));
        }
    }
    cells
}

struct Observed {
    y_board: Vec<Cell>,
    x_board: Vec<Cell>,
    hash: u64,
    y_value: i32,
    x_value: i32,
}

fn observe(game: &mut Match) -> Observed {
    Observed {
        y_board: snapshot(game.board(Player::Y).board()),
        x_board: snapshot(game.board(Player::X).board()),
        hash: game.zobrist_value(),
        y_value: game.value_for(Player::Y),
        x_value: game.value_for(Player::X),
    }
}

fn test_engine(seed: u64) -> AlphaBetaEngine {
    AlphaBetaEngine::new(Arc::new(EngineConfig {
        random_seed: Some(seed),
        tt_size_mb: 1,
        ..EngineConfig::default()
    }))
}

#[test]
fn test_straight_connection_has_zero_distance() {
    let mut game = Match::new(24, 24).unwrap();
    let pins = [
        (5, 0),
        (7, 1),
        (5, 2),
        (7, 3),
        (6, 5),
        (5, 7),
        (6, 9),
        (5, 11),
        (6, 13),
        (5, 15),
        (6, 17),
        (5, 19),
        (6, 21),
        (5, 23),
    ];
    for (i, &(x, y)) in pins.iter().enumerate() {
        assert_eq!(game.status(), MatchStatus::Playing, "won early at pin {i}");
        game.make_move(Move::new(x, y), Player::Y).unwrap();
    }

    assert_eq!(game.value_for(Player::Y), 0);
    assert_eq!(game.status(), MatchStatus::Won(Player::Y));
    assert!(game.make_move(Move::new(12, 12), Player::X).is_err());
}

#[test]
fn test_winning_move_found_at_every_depth() {
    for depth in 1..=4 {
        let mut game = Match::new(24, 24).unwrap();
        for k in 0..11 {
            game.make_move(Move::new(5 + k % 2, 2 * k), Player::Y).unwrap();
        }
        game.make_move(Move::new(7, 21), Player::Y).unwrap();

        let (mv, stats) = test_engine(u64::from(depth))
            .compute_move(&mut game, Player::Y, SearchLimit::Depth(depth))
            .unwrap();
        assert!(
            mv == Move::new(6, 23) || mv == Move::new(8, 23),
            "depth {depth} picked {mv}"
        );
        assert!(stats.value >= 1000, "depth {depth} valued {}", stats.value);

        game.make_move(mv, Player::Y).unwrap();
        assert_eq!(game.status(), MatchStatus::Won(Player::Y));
    }
}

#[test]
fn test_make_and_undo_are_exact_inverses() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut game = Match::new(24, 24).unwrap();
    let mut trail = vec![observe(&mut game)];

    let mut player = Player::Y;
    while trail.len() <= 60 && game.status() == MatchStatus::Playing {
        let mv = Move::new(rng.gen_range(0..24), rng.gen_range(0..24));
        if game.make_move(mv, player).is_err() {
            continue;
        }
        trail.push(observe(&mut game));
        player = player.opposite();
    }

    trail.pop();
    while let Some(expected) = trail.pop() {
        game.undo_move().unwrap();
        let now = observe(&mut game);
        assert!(now.y_board == expected.y_board, "Y board differs at {}", trail.len());
        assert!(now.x_board == expected.x_board, "X board differs at {}", trail.len());
        assert_eq!(now.hash, expected.hash);
        assert_eq!(now.y_value, expected.y_value);
        assert_eq!(now.x_value, expected.x_value);
    }
    assert_eq!(game.move_count(), 0);
    assert_eq!(game.zobrist_value(), 0);
}

#[test]
fn test_record_survives_json() {
    let mut game = Match::new(16, 20).unwrap();
    game.make_move(Move::new(4, 4), Player::Y).unwrap();
    game.make_move(Move::new(8, 9), Player::X).unwrap();
    game.make_move(Move::new(5, 6), Player::Y).unwrap();

    let json = serde_json::to_string(&game.record()).unwrap();
    let record: MatchRecord = serde_json::from_str(&json).unwrap();
    let mut rebuilt = Match::from_record(&record).unwrap();

    assert_eq!(rebuilt.zobrist_value(), game.zobrist_value());
    assert_eq!(rebuilt.history(), game.history());
    assert_eq!(rebuilt.value_for(Player::Y), game.value_for(Player::Y));
    assert!(rebuilt.board(Player::Y).board().is_connected(4, 4, 5, 6));
}

#[test]
fn test_short_self_play_stays_legal() {
    let mut game = Match::new(12, 12).unwrap();
    let mut engines = [test_engine(1), test_engine(2)];
    let mut player = Player::Y;

    for _ in 0..16 {
        if game.status() != MatchStatus::Playing {
            break;
        }
        let engine = &mut engines[player.index()];
        let Some((mv, _)) = engine.compute_move(&mut game, player, SearchLimit::Depth(3)) else {
            break;
        };
        game.make_move(mv, player).unwrap();
        player = player.opposite();
    }

    assert!(game.move_count() > 0);
    let y_pins = game.board(Player::Y).board().pin_count(Player::Y);
    let x_pins = game.board(Player::Y).board().pin_count(Player::X);
    assert_eq!(y_pins + x_pins, game.move_count());
}
