use crate::engine::config::EngineConfig;
use crate::engine::move_list::MoveList;
use crate::engine::movegen::{EngineMoveGen, Generated, MoveGenContext};
use crate::engine::patterns::PatternLibrary;
use crate::engine::tt::TranspositionTable;
use crate::engine::{now, Move, SearchLimit, SearchStats, Searcher};
use crate::logic::board::Player;
use crate::logic::game::Match;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;

const INFINITY: i32 = i32::MAX / 2;
/// First iterative-deepening pass.
const START_PLY: u8 = 3;

pub struct AlphaBetaEngine {
    config: Arc<EngineConfig>,
    patterns: Arc<PatternLibrary>,
}

/// Per-call search state; nothing survives between `compute_move` calls.
struct SearchContext {
    root_player: Player,
    /// Moves actually played before the search started.
    root_ply: usize,
    killers: HashMap<Move, u32>,
    valued_moves: Vec<(Move, i32)>,
    root_moves: MoveList,
    pass_best: Option<(Move, i32)>,
    rng: StdRng,
    tt: TranspositionTable,
    nodes: u32,
    start_time: f64,
    time_limit: Option<f64>,
    timed_out: bool,
}

impl SearchContext {
    fn new(
        config: &EngineConfig,
        root_player: Player,
        root_ply: usize,
        time_limit: Option<f64>,
    ) -> Self {
        let rng = config
            .random_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            root_player,
            root_ply,
            killers: HashMap::new(),
            valued_moves: Vec::new(),
            root_moves: MoveList::new(),
            pass_best: None,
            rng,
            tt: TranspositionTable::new(config.tt_size_mb),
            nodes: 0,
            start_time: now(),
            time_limit,
            timed_out: false,
        }
    }

    fn check_time(&mut self) -> bool {
        if let Some(limit) = self.time_limit {
            if now() - self.start_time > limit {
                self.timed_out = true;
            }
        }
        self.timed_out
    }

    fn elapsed_ms(&self) -> u64 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ms = (now() - self.start_time).max(0.0) as u64;
        ms
    }
}

/// Whether `a` is a better result than `b` for `player` (Y maximises, X minimises).
fn better(player: Player, a: i32, b: i32) -> bool {
    match player {
        Player::Y => a > b,
        Player::X => a < b,
    }
}

impl AlphaBetaEngine {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self::with_patterns(config, Arc::new(PatternLibrary::builtin()))
    }

    pub const fn with_patterns(config: Arc<EngineConfig>, patterns: Arc<PatternLibrary>) -> Self {
        Self { config, patterns }
    }

    pub fn update_config(&mut self, config: Arc<EngineConfig>) {
        self.config = config;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn game_over_value(&self, to_move: Player, remaining: u8) -> i32 {
        let score = self.config.game_over_score + i32::from(remaining);
        // the side that just moved has won
        match to_move {
            Player::X => score,
            Player::Y => -score,
        }
    }

    fn leaf(&self, game: &mut Match, ctx: &mut SearchContext, next: Player) -> i32 {
        let key = game.zobrist_value();
        if let Some(score) = ctx.tt.probe(key) {
            return score;
        }

        let mut dist_y = game.board_mut(Player::Y).distance(false, next);
        let mut dist_x = game.board_mut(Player::X).distance(false, next);
        let score = if dist_y == 0 {
            self.config.game_over_score
        } else if dist_x == 0 {
            -self.config.game_over_score
        } else {
            // early on only keep the opponent away
            if ctx.root_ply < self.config.defensive_plies {
                match ctx.root_player {
                    Player::Y => dist_y = 0,
                    Player::X => dist_x = 0,
                }
            }
            dist_x - dist_y
        };

        ctx.tt.store(key, score);
        score
    }

    #[allow(clippy::too_many_arguments)]
    fn alpha_beta(
        &self,
        game: &mut Match,
        ctx: &mut SearchContext,
        player: Player,
        remaining: u8,
        mut alpha: i32,
        mut beta: i32,
        is_root: bool,
    ) -> i32 {
        ctx.nodes += 1;
        if ctx.check_time() {
            return 0;
        }
        if remaining == 0 {
            return self.leaf(game, ctx, player);
        }

        let replay = if is_root {
            std::mem::take(&mut ctx.valued_moves)
        } else {
            Vec::new()
        };
        let generated = {
            let gen = EngineMoveGen::new(&self.patterns);
            let mut gen_ctx = MoveGenContext {
                killers: &ctx.killers,
                rng: &mut ctx.rng,
                replay: is_root.then_some(replay.as_slice()),
            };
            gen.generate(game, player, &mut gen_ctx)
        };
        let moves = match generated {
            Generated::GameOver => return self.game_over_value(player, remaining),
            Generated::Moves(moves) => moves,
        };
        if is_root && ctx.root_moves.is_empty() {
            ctx.root_moves = moves.clone();
        }

        let mut best: Option<i32> = None;
        for mv in moves {
            if !game.place(mv, player) {
                continue;
            }
            let value = self.alpha_beta(
                game,
                ctx,
                player.opposite(),
                remaining - 1,
                alpha,
                beta,
                false,
            );
            game.lift(mv, player);
            if ctx.timed_out {
                return 0;
            }

            if is_root {
                ctx.valued_moves.push((mv, value));
                if ctx.pass_best.map_or(true, |(_, b)| better(player, value, b)) {
                    ctx.pass_best = Some((mv, value));
                }
            }

            if best.map_or(true, |b| better(player, value, b)) {
                best = Some(value);
            }
            match player {
                Player::Y => alpha = alpha.max(value),
                Player::X => beta = beta.min(value),
            }
            if alpha >= beta {
                if !is_root {
                    *ctx.killers.entry(mv).or_insert(0) += 1;
                }
                break;
            }
        }

        // no moves at all counts as a draw
        best.unwrap_or(0)
    }
}

impl Searcher for AlphaBetaEngine {
    fn compute_move(
        &mut self,
        game: &mut Match,
        player: Player,
        limit: SearchLimit,
    ) -> Option<(Move, SearchStats)> {
        game.configure(&self.config);

        let (max_ply, time_limit) = match limit {
            SearchLimit::Depth(d) => (d.max(1), None),
            #[allow(clippy::cast_precision_loss)]
            SearchLimit::Time(t) => (self.config.max_ply.max(1), Some(t as f64)),
        };
        let mut ctx = SearchContext::new(&self.config, player, game.move_count(), time_limit);

        let mut best: Option<(Move, i32, u8)> = None;
        for ply in START_PLY.min(max_ply)..=max_ply {
            if self.config.skipped_ply == Some(ply) && ply != max_ply {
                continue;
            }
            ctx.tt.clear();
            ctx.pass_best = None;

            let value = self.alpha_beta(game, &mut ctx, player, ply, -INFINITY, INFINITY, true);
            if ctx.timed_out {
                log::debug!("ply {ply} interrupted after {} nodes", ctx.nodes);
                break;
            }
            let Some((mv, _)) = ctx.pass_best else {
                // game over or nothing to play
                break;
            };
            log::debug!("ply {ply}: {mv} value {value} ({} nodes)", ctx.nodes);
            best = Some((mv, value, ply));

            if value.abs() >= self.config.game_over_score {
                break;
            }
        }

        let chosen = best.or_else(|| {
            let fallback = ctx
                .pass_best
                .map(|(mv, v)| (mv, v, 0))
                .or_else(|| ctx.root_moves.first().map(|mv| (mv, 0, 0)));
            if let Some((mv, _, _)) = fallback {
                log::warn!("no completed pass, falling back to {mv}");
            }
            fallback
        });

        chosen.map(|(mv, value, depth)| {
            let stats = SearchStats {
                depth,
                nodes: ctx.nodes,
                time_ms: ctx.elapsed_ms(),
                value,
            };
            log::info!(
                "{player:?} plays {mv} (depth {depth}, value {value}, {} nodes, {} ms)",
                stats.nodes,
                stats.time_ms
            );
            (mv, stats)
        })
    }
}
