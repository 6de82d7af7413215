//! Search statistics and performance metrics

use std::time::{Duration, Instant};

/// Search statistics
#[derive(Debug, Default, Clone)]
pub struct SearchStats {
    /// Total nodes searched
    pub nodes: u64,

    /// Alpha-beta cutoffs
    pub cutoffs: u64,

    /// Deepest iteration that finished
    pub completed_depth: u8,

    /// Search start time
    pub start_time: Option<Instant>,

    /// Time spent searching
    pub search_time: Duration,

    /// Nodes per second rate
    pub nps: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_timing(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Refresh elapsed time and NPS.
    pub fn update_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.search_time = start.elapsed();
            let elapsed_ms = self.search_time.as_millis() as u64;
            if elapsed_ms > 0 {
                self.nps = (self.nodes * 1000) / elapsed_ms;
            }
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map_or(0, |start| start.elapsed().as_millis() as u64)
    }

    #[inline]
    pub fn inc_node(&mut self) {
        self.nodes += 1;
    }

    #[inline]
    pub fn inc_cutoff(&mut self) {
        self.cutoffs += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "depth {} nodes {} cutoffs {} time {}ms nps {}",
            self.completed_depth,
            self.nodes,
            self.cutoffs,
            self.search_time.as_millis(),
            self.nps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_and_reset() {
        let mut stats = SearchStats::new();
        stats.start_timing();
        stats.inc_node();
        stats.inc_node();
        stats.inc_cutoff();
        stats.update_timing();
        assert_eq!(stats.nodes, 2);
        assert!(stats.summary().contains("nodes 2"));
        stats.reset();
        assert_eq!(stats.nodes, 0);
        assert!(stats.start_time.is_none());
    }
}
