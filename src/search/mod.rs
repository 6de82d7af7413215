//! Search engine: iterative deepening alpha-beta, difficulty presets and a
//! background worker

pub mod params;
pub mod search;
pub mod stats;
pub mod worker;

pub use self::params::{Difficulty, Perturbation, SearchParams};
pub use self::search::{
    best_move, choose_move, decide, Decision, MoveSource, Search, SearchResult, MATE,
    MATE_THRESHOLD,
};
pub use self::stats::SearchStats;
pub use self::worker::{SearchJob, SearchOutcome, SearchWorker};
