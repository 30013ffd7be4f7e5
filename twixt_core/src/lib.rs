pub mod engine;
pub mod logic;
pub mod worker;

pub use engine::config::EngineConfig;
pub use engine::search::AlphaBetaEngine;
pub use engine::{Move, SearchLimit, SearchStats, Searcher};
pub use logic::board::Player;
pub use logic::game::{Match, MatchRecord, MatchStatus};
