//! UCI event loop and state machine

use super::parser::{parse_uci_command, UciCommand};
use crate::game::Game;
use crate::search::params::MAX_PLY;
use crate::search::{
    Decision, Difficulty, MoveSource, SearchJob, SearchOutcome, SearchParams, SearchWorker,
    MATE, MATE_THRESHOLD,
};
use crate::time::{ClockInfo, TimeManager};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UciState {
    Init,
    Ready,
    Thinking,
}

/// How often the loop checks a running search while stdin is quiet.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

// A search started by `go`. Infinite ones only answer after `stop`.
struct PendingSearch {
    rx: Receiver<SearchOutcome>,
    started: Instant,
    infinite: bool,
}

pub struct UciEngine {
    state: UciState,
    game: Game,
    difficulty: Difficulty,
    own_book: bool,
    seed: Option<u64>,
    worker: SearchWorker,
    pending: Option<PendingSearch>,
    running: bool,
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl UciEngine {
    pub fn new() -> Self {
        Self {
            state: UciState::Init,
            game: Game::new(),
            difficulty: Difficulty::default(),
            own_book: true,
            seed: None,
            worker: SearchWorker::new(),
            pending: None,
            running: true,
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Fix the perturbation seed so replies are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn state(&self) -> UciState {
        self.state
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn handle_command(&mut self, cmd: UciCommand) -> Vec<String> {
        let mut res = Vec::new();
        match cmd {
            UciCommand::Uci => {
                res.push("id name Scacco".to_string());
                res.push("id author the Scacco developers".to_string());
                let tiers: Vec<String> = Difficulty::ALL
                    .iter()
                    .map(|d| format!("var {}", d))
                    .collect();
                res.push(format!(
                    "option name Difficulty type combo default {} {}",
                    self.difficulty,
                    tiers.join(" ")
                ));
                res.push("option name OwnBook type check default true".to_string());
                res.push("uciok".to_string());
                self.state = UciState::Ready;
            }
            UciCommand::IsReady => {
                res.push("readyok".to_string());
            }
            UciCommand::UciNewGame => {
                self.abandon_pending();
                self.game.reset();
                self.state = UciState::Ready;
            }
            UciCommand::SetOption { name, value } => {
                res.extend(self.set_option(&name, value.as_deref()));
            }
            UciCommand::Position { fen, moves } => {
                res.extend(self.set_position(fen.as_deref(), &moves));
                self.state = UciState::Ready;
            }
            UciCommand::Go {
                depth,
                clock,
                infinite,
            } => {
                self.abandon_pending();
                if self.game.status().is_terminal() {
                    res.push(format!("info string game over: {}", self.game.status()));
                    res.push("bestmove 0000".to_string());
                    return res;
                }
                let params = self.go_params(depth, &clock, infinite);
                let started = Instant::now();
                let rx = self.worker.submit(SearchJob {
                    game: self.game.clone(),
                    params,
                });
                // bestmove arrives through `poll`, `wait` or `stop`
                self.pending = Some(PendingSearch {
                    rx,
                    started,
                    infinite,
                });
                self.state = UciState::Thinking;
            }
            UciCommand::Stop => {
                if self.pending.is_some() {
                    self.worker.stop();
                    res.extend(self.wait());
                }
                self.state = UciState::Ready;
            }
            UciCommand::Display => {
                res.extend(self.game.board().to_string().lines().map(str::to_string));
                res.push(format!("Fen: {}", self.game.fen()));
                res.push(format!("Status: {}", self.game.status()));
            }
            UciCommand::Quit => {
                self.worker.cancel();
                self.pending = None;
                self.running = false;
            }
            UciCommand::Unknown(s) => {
                res.push(format!("info string unknown command: {}", s));
            }
        }
        res
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) -> Vec<String> {
        let mut res = Vec::new();
        match (name.to_ascii_lowercase().as_str(), value) {
            ("difficulty", Some(v)) => match v.parse::<Difficulty>() {
                Ok(d) => {
                    self.difficulty = d;
                    res.push(format!("info string Difficulty set to {}", d));
                }
                Err(e) => res.push(format!("info string error: {}", e)),
            },
            ("ownbook", Some(v)) => match v.trim().to_ascii_lowercase().as_str() {
                "true" => self.own_book = true,
                "false" => self.own_book = false,
                other => res.push(format!("info string error: invalid OwnBook value '{}'", other)),
            },
            (_, None) => res.push(format!("info string error: option {} needs a value", name)),
            _ => res.push(format!("info string unknown option: {}", name)),
        }
        res
    }

    /// Build the new position on a scratch game and only swap it in when
    /// every move was legal.
    fn set_position(&mut self, fen: Option<&str>, moves: &[String]) -> Vec<String> {
        let mut temp = match fen {
            Some(text) => match Game::from_fen(text) {
                Ok(game) => game,
                Err(e) => return vec![format!("info string FEN parse error: {}", e)],
            },
            None => Game::new(),
        };
        for text in moves {
            if let Err(e) = temp.commit_text(text) {
                warn!(mv = %text, error = %e, "rejected position update");
                return vec![format!("info string invalid move {}: {}", text, e)];
            }
        }
        self.abandon_pending();
        self.game = temp;
        Vec::new()
    }

    fn go_params(&self, depth: Option<u8>, clock: &ClockInfo, infinite: bool) -> SearchParams {
        let mut params = self.difficulty.params().use_book(self.own_book);
        if let Some(seed) = self.seed {
            params = params.seed(seed);
        }
        if infinite {
            return params
                .max_depth(MAX_PLY)
                .time_limit(0)
                .perturbation(None)
                .use_book(false);
        }
        let allocated = TimeManager::allocate_time(clock, self.game.side_to_move());
        match (depth, allocated) {
            (Some(d), None) => params.max_depth(d.max(1)).time_limit(0),
            (Some(d), Some(ms)) => params.max_depth(d.max(1)).time_limit(ms),
            (None, Some(ms)) => params.max_depth(0).time_limit(ms),
            // neither: difficulty budget as configured
            (None, None) => params,
        }
    }

    // A superseded infinite search is dropped without a bestmove.
    fn abandon_pending(&mut self) {
        if self.pending.take().is_some() {
            self.worker.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Report a finished search without blocking. Infinite searches keep
    /// their answer until `stop`.
    pub fn poll(&mut self) -> Vec<String> {
        let outcome = match &self.pending {
            Some(pending) if !pending.infinite => match pending.rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(TryRecvError::Empty) => return Vec::new(),
                Err(TryRecvError::Disconnected) => None,
            },
            _ => return Vec::new(),
        };
        match self.pending.take() {
            Some(pending) => {
                self.state = UciState::Ready;
                report(outcome, pending.started)
            }
            None => Vec::new(),
        }
    }

    /// Block until the pending search answers. An infinite search is told to
    /// stop first.
    pub fn wait(&mut self) -> Vec<String> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };
        if pending.infinite {
            self.worker.stop();
        }
        self.state = UciState::Ready;
        report(pending.rx.recv().ok(), pending.started)
    }
}

fn score_text(score: i32) -> String {
    if score >= MATE_THRESHOLD {
        format!("mate {}", (MATE - score + 1) / 2)
    } else if score <= -MATE_THRESHOLD {
        format!("mate -{}", (MATE + score) / 2)
    } else {
        format!("cp {}", score)
    }
}

fn report(outcome: Option<SearchOutcome>, started: Instant) -> Vec<String> {
    let elapsed = started.elapsed().as_millis();
    match outcome.map(|o| o.result) {
        Some(Ok(Decision {
            mv,
            source: MoveSource::Book,
        })) => vec!["info string book move".to_string(), format!("bestmove {}", mv)],
        Some(Ok(Decision {
            mv,
            source: MoveSource::Search(result),
        })) => vec![
            format!(
                "info depth {} score {} nodes {} time {}",
                result.depth,
                score_text(result.score),
                result.nodes,
                elapsed
            ),
            format!("bestmove {}", mv),
        ],
        Some(Err(e)) => vec![format!("info string {}", e), "bestmove 0000".to_string()],
        None => vec![
            "info string search worker vanished".to_string(),
            "bestmove 0000".to_string(),
        ],
    }
}

// Lines arrive on their own thread so a running search never blocks `stop`.
fn spawn_stdin_reader() -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

fn emit(writer: &mut impl Write, lines: Vec<String>) -> io::Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    for r in lines {
        writeln!(writer, "{}", r)?;
    }
    // flush after each batch so the GUI sees replies immediately
    writer.flush()
}

pub fn run_uci_loop(mut engine: UciEngine) -> io::Result<()> {
    let lines = spawn_stdin_reader();
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    while engine.is_running() {
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                let line = line?;
                let line = line.trim();
                if !line.is_empty() {
                    debug!(command = line, "received");
                    emit(&mut writer, process_uci_line(line, &mut engine))?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // EOF: answer the last search before leaving
                emit(&mut writer, engine.wait())?;
                break;
            }
        }
        emit(&mut writer, engine.poll())?;
    }

    Ok(())
}

pub fn process_uci_line(line: &str, engine: &mut UciEngine) -> Vec<String> {
    let cmd = parse_uci_command(line);
    engine.handle_command(cmd)
}
