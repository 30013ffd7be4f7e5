use crate::engine::config::EngineConfig;
use crate::engine::patterns::PatternLibrary;
use crate::engine::search::AlphaBetaEngine;
use crate::engine::{Move, SearchLimit, SearchStats, Searcher};
use crate::logic::board::Player;
use crate::logic::game::{Match, MatchRecord};
use gloo_worker::{HandlerId, Worker, WorkerScope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
pub enum Input {
    ComputeMove(MatchRecord, Player, SearchLimit, EngineConfig),
}

#[derive(Serialize, Deserialize)]
pub enum Output {
    MoveFound(Move, SearchStats),
    NoMove,
}

/// Rebuild the match from its record and search it.
fn compute(
    engine: &mut AlphaBetaEngine,
    record: &MatchRecord,
    player: Player,
    limit: SearchLimit,
) -> Option<(Move, SearchStats)> {
    match Match::from_record(record) {
        Ok(mut game) => engine.compute_move(&mut game, player, limit),
        Err(err) => {
            log::warn!("cannot rebuild match: {err}");
            None
        }
    }
}

pub struct SearchWorker {
    engine: Option<AlphaBetaEngine>,
}

impl Worker for SearchWorker {
    type Input = Input;
    type Message = ();
    type Output = Output;

    fn create(_scope: &WorkerScope<Self>) -> Self {
        Self { engine: None }
    }

    fn update(&mut self, _scope: &WorkerScope<Self>, _msg: Self::Message) {}

    fn received(&mut self, scope: &WorkerScope<Self>, msg: Self::Input, id: HandlerId) {
        match msg {
            Input::ComputeMove(record, player, limit, config) => {
                let config = Arc::new(config);
                let engine = match &mut self.engine {
                    Some(engine) => {
                        engine.update_config(config);
                        engine
                    }
                    slot @ None => slot.insert(AlphaBetaEngine::new(config)),
                };

                // always answer so the caller never waits forever
                let output = compute(engine, &record, player, limit)
                    .map_or(Output::NoMove, |(mv, stats)| Output::MoveFound(mv, stats));
                scope.respond(id, output);
            }
        }
    }
}

/// Native counterpart of [`SearchWorker`]: searches on a background thread.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_compute(
    record: MatchRecord,
    player: Player,
    limit: SearchLimit,
    config: EngineConfig,
    patterns: Arc<PatternLibrary>,
) -> std::thread::JoinHandle<Option<(Move, SearchStats)>> {
    std::thread::spawn(move || {
        let mut engine = AlphaBetaEngine::with_patterns(Arc::new(config), patterns);
        compute(&mut engine, &record, player, limit)
    })
}
