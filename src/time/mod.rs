//! Time management helper

use crate::board::Color;

/// Clock fields of a `go` command, all in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockInfo {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movetime: Option<u64>,
    pub movestogo: Option<u64>,
}

impl ClockInfo {
    pub fn is_empty(&self) -> bool {
        self.movetime.is_none() && self.wtime.is_none() && self.btime.is_none()
    }
}

pub struct TimeManager;

impl TimeManager {
    /// Milliseconds to spend on this move, or `None` when the command names
    /// no clock for the side to move.
    pub fn allocate_time(clock: &ClockInfo, side: Color) -> Option<u64> {
        if let Some(mt) = clock.movetime {
            return Some(mt);
        }

        // default 40, min 2 to avoid huge allocations
        let moves_to_go = clock.movestogo.unwrap_or(40).max(2);

        let (remaining, increment) = match side {
            Color::White => (clock.wtime?, clock.winc),
            Color::Black => (clock.btime?, clock.binc),
        };
        let base_time = (remaining / moves_to_go).max(10);
        let increment_bonus = increment.map(|inc| (inc * 8) / 10).unwrap_or(0);
        // never plan past what is left on the clock
        Some((base_time + increment_bonus).min(remaining.saturating_sub(5).max(10)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movetime_wins() {
        let clock = ClockInfo {
            movetime: Some(250),
            wtime: Some(60_000),
            ..ClockInfo::default()
        };
        assert_eq!(TimeManager::allocate_time(&clock, Color::White), Some(250));
    }

    #[test]
    fn splits_remaining_time() {
        let clock = ClockInfo {
            wtime: Some(40_000),
            btime: Some(20_000),
            binc: Some(1000),
            ..ClockInfo::default()
        };
        assert_eq!(TimeManager::allocate_time(&clock, Color::White), Some(1000));
        assert_eq!(TimeManager::allocate_time(&clock, Color::Black), Some(1300));
    }

    #[test]
    fn no_clock_for_side() {
        let clock = ClockInfo {
            wtime: Some(1000),
            ..ClockInfo::default()
        };
        assert_eq!(TimeManager::allocate_time(&clock, Color::Black), None);
        assert!(ClockInfo::default().is_empty());
    }
}
