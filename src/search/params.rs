//! Search parameters and difficulty tiers
//!
//! Controls how deep and how long a search runs and how much randomness is
//! allowed when picking among near-equal root moves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hard ceiling on iterative deepening when only a time limit is given.
pub const MAX_PLY: u8 = 64;

/// Random choice among root moves scoring within `margin` centipawns of the
/// best, limited to the `top_k` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perturbation {
    pub margin: i32,
    pub top_k: usize,
}

/// Search parameters for the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum search depth in plies (0 = bounded by time only)
    pub max_depth: u8,

    /// Time limit in milliseconds (0 = unlimited)
    pub time_limit_ms: u64,

    /// Root move randomisation; `None` plays the best move deterministically
    pub perturbation: Option<Perturbation>,

    /// Seed for the perturbation RNG; `None` seeds from the OS
    pub seed: Option<u64>,

    /// Consult the opening book before searching
    pub use_book: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_depth: 4,
            time_limit_ms: 0,
            perturbation: None,
            seed: None,
            use_book: false,
        }
    }
}

impl SearchParams {
    /// Create new search params with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum depth in plies
    pub fn max_depth(mut self, depth: u8) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set time limit in milliseconds
    pub fn time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn perturbation(mut self, perturbation: Option<Perturbation>) -> Self {
        self.perturbation = perturbation;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn use_book(mut self, enable: bool) -> Self {
        self.use_book = enable;
        self
    }

    /// Deepest iteration to run. A zero depth without a time limit would
    /// never produce a move, so it degrades to depth 1.
    pub fn depth_limit(&self) -> u8 {
        match (self.max_depth, self.time_limit_ms) {
            (0, 0) => 1,
            (0, _) => MAX_PLY,
            (depth, _) => depth.min(MAX_PLY),
        }
    }
}

/// Playing strength presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Master,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Master,
    ];

    /// (depth, milliseconds)
    pub fn budget(self) -> (u8, u64) {
        match self {
            Difficulty::Beginner => (3, 300),
            Difficulty::Intermediate => (4, 600),
            Difficulty::Advanced => (5, 1000),
            Difficulty::Master => (6, 1500),
        }
    }

    pub fn perturbation(self) -> Perturbation {
        let (margin, top_k) = match self {
            Difficulty::Beginner => (30, 6),
            Difficulty::Intermediate => (12, 4),
            Difficulty::Advanced => (6, 3),
            Difficulty::Master => (2, 2),
        };
        Perturbation { margin, top_k }
    }

    pub fn params(self) -> SearchParams {
        let (depth, ms) = self.budget();
        SearchParams::new()
            .max_depth(depth)
            .time_limit(ms)
            .perturbation(Some(self.perturbation()))
            .use_book(true)
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
            Difficulty::Master => "master",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name() == wanted)
            .ok_or_else(|| format!("unknown difficulty '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_depth_degrades() {
        assert_eq!(SearchParams::new().max_depth(0).depth_limit(), 1);
        assert_eq!(
            SearchParams::new().max_depth(0).time_limit(100).depth_limit(),
            MAX_PLY
        );
        assert_eq!(SearchParams::new().max_depth(3).depth_limit(), 3);
    }

    #[test]
    fn tiers_parse_and_scale() {
        assert_eq!("Master".parse::<Difficulty>(), Ok(Difficulty::Master));
        assert!("grandmaster".parse::<Difficulty>().is_err());
        let params = Difficulty::Beginner.params();
        assert_eq!((params.max_depth, params.time_limit_ms), (3, 300));
        assert_eq!(params.perturbation.map(|p| p.top_k), Some(6));
    }
}
