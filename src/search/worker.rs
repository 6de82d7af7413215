//! Background search worker
//!
//! One search in flight per worker. Submitting a new job stops and joins the
//! previous one first, so a stale result never races a fresh request.

use super::params::SearchParams;
use super::search::{decide, Decision};
use crate::error::Result;
use crate::game::Game;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Position and budget for one request
#[derive(Debug, Clone)]
pub struct SearchJob {
    pub game: Game,
    pub params: SearchParams,
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub job_id: u64,
    pub result: Result<Decision>,
}

struct RunningJob {
    id: u64,
    stop_flag: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

#[derive(Default)]
pub struct SearchWorker {
    current: Option<RunningJob>,
    next_id: u64,
}

impl SearchWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start searching `job` on a new thread. Any earlier job is cancelled.
    /// The outcome arrives once on the returned channel.
    pub fn submit(&mut self, job: SearchJob) -> Receiver<SearchOutcome> {
        self.cancel();

        let id = self.next_id;
        self.next_id += 1;
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let job_stop = stop_flag.clone();
        let handle = thread::spawn(move || {
            let result = decide(&job.game, &job.params, Some(job_stop));
            // receiver may be gone if the caller lost interest
            let _ = tx.send(SearchOutcome { job_id: id, result });
        });
        debug!(job_id = id, "search job started");

        self.current = Some(RunningJob {
            id,
            stop_flag,
            handle,
        });
        rx
    }

    /// Ask the running job to finish now. It still reports the move from its
    /// last completed depth.
    pub fn stop(&self) {
        if let Some(job) = &self.current {
            job.stop_flag.store(true, Ordering::Release);
        }
    }

    /// Stop the running job and wait for its thread to exit.
    pub fn cancel(&mut self) {
        if let Some(job) = self.current.take() {
            job.stop_flag.store(true, Ordering::Release);
            let _ = job.handle.join();
            debug!(job_id = job.id, "search job joined");
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|job| !job.handle.is_finished())
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.cancel();
    }
}
