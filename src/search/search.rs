//! Main search engine implementation
//!
//! Iterative deepening negamax with alpha-beta pruning over copied boards.
//! Every node polls the stop flag and the deadline; an interrupted depth is
//! thrown away and the last completed one answers.

use super::params::SearchParams;
use super::stats::SearchStats;
use crate::board::{AuxState, Board, Move, PieceKind};
use crate::book;
use crate::error::{ChessError, Result};
use crate::eval::score_for;
use crate::game::{is_insufficient_material, Game, MOVE_RULE_PLIES};
use crate::movegen::{all_legal_moves, apply_move, has_legal_move, in_check};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Search engine configurations
pub const INFINITE: i32 = 1_000_000;
pub const MATE: i32 = 100_000;
pub const MATE_THRESHOLD: i32 = MATE - 1000;

/// Outcome of one search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    /// Centipawns from the mover's side; mate scores lie beyond `MATE_THRESHOLD`.
    pub score: i32,
    /// Deepest completed iteration
    pub depth: u8,
    pub nodes: u64,
}

#[derive(Debug, Clone, Copy)]
struct RootScore {
    /// Position in the move generator's order, used to break ties.
    index: usize,
    mv: Move,
    score: i32,
}

/// Main search engine
pub struct Search {
    board: Board,
    aux: AuxState,
    params: SearchParams,
    stats: SearchStats,
    stop_flag: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
    enforce_deadline: bool,
    rng: StdRng,
}

impl Search {
    pub fn new(board: Board, aux: AuxState, params: SearchParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            board,
            aux,
            params,
            stats: SearchStats::new(),
            stop_flag: None,
            deadline: None,
            enforce_deadline: false,
            rng,
        }
    }

    /// Share a flag that aborts the search when set.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Run iterative deepening up to the configured depth or deadline.
    pub fn search(&mut self) -> SearchResult {
        self.stats.reset();
        self.stats.start_timing();
        self.deadline = (self.params.time_limit_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(self.params.time_limit_ms));

        let canonical = all_legal_moves(&self.board, &self.aux, self.aux.side);
        if canonical.is_empty() {
            let score = if in_check(&self.board, self.aux.side) {
                -MATE
            } else {
                0
            };
            return SearchResult {
                best_move: None,
                score,
                depth: 0,
                nodes: 0,
            };
        }

        let limit = self.params.depth_limit();
        let mut completed: Option<(Vec<RootScore>, u8)> = None;
        let mut previous_best: Option<Move> = None;

        for depth in 1..=limit {
            // depth 1 always finishes unless stopped from outside
            self.enforce_deadline = depth > 1;
            if self.enforce_deadline && self.deadline_passed() {
                break;
            }
            let ordered = order_root(&self.board, &self.aux, &canonical, previous_best);
            let Some(scores) = self.search_root(&ordered, depth) else {
                debug!(depth, nodes = self.stats.nodes, "iteration aborted");
                break;
            };
            let best = pick_best(&scores);
            previous_best = Some(best.mv);
            self.stats.completed_depth = depth;
            self.stats.update_timing();
            debug!(
                depth,
                score = best.score,
                nodes = self.stats.nodes,
                best = %best.mv,
                "iteration complete"
            );
            let mate_found = best.score >= MATE_THRESHOLD;
            completed = Some((scores, depth));
            if mate_found {
                break;
            }
        }
        self.stats.update_timing();

        let Some((scores, depth)) = completed else {
            // stopped before the first iteration finished
            let fallback = order_root(&self.board, &self.aux, &canonical, None)[0].1;
            return SearchResult {
                best_move: Some(fallback),
                score: 0,
                depth: 0,
                nodes: self.stats.nodes,
            };
        };

        let chosen = self.select(&scores);
        info!(
            best = %chosen.mv,
            score = chosen.score,
            "{}",
            self.stats.summary()
        );
        SearchResult {
            best_move: Some(chosen.mv),
            score: chosen.score,
            depth,
            nodes: self.stats.nodes,
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn should_stop(&self) -> bool {
        if self
            .stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return true;
        }
        self.enforce_deadline && self.deadline_passed()
    }

    /// Score every root move. Moves that could matter for the final choice
    /// (within the perturbation margin of the best, ties included) get exact
    /// scores; the rest only need to be shown worse.
    fn search_root(&mut self, ordered: &[(usize, Move)], depth: u8) -> Option<Vec<RootScore>> {
        let margin = self.params.perturbation.map_or(0, |p| p.margin.max(0));
        let mut best = -INFINITE;
        let mut scores = Vec::with_capacity(ordered.len());
        for &(index, mv) in ordered {
            let child = apply_move(&self.board, &self.aux, mv);
            let alpha = if best == -INFINITE {
                -INFINITE
            } else {
                best - margin - 1
            };
            let score = -self.negamax(&child.board, &child.aux, depth - 1, 1, -INFINITE, -alpha)?;
            trace!(depth, %mv, score, "root move");
            best = best.max(score);
            scores.push(RootScore { index, mv, score });
        }
        Some(scores)
    }

    /// Fail-soft negamax. `None` means the search was stopped.
    fn negamax(
        &mut self,
        board: &Board,
        aux: &AuxState,
        depth: u8,
        ply: u8,
        mut alpha: i32,
        beta: i32,
    ) -> Option<i32> {
        self.stats.inc_node();
        if self.should_stop() {
            return None;
        }
        let side = aux.side;

        if depth == 0 {
            if !has_legal_move(board, aux, side) {
                return Some(no_moves_score(board, aux, ply));
            }
            if drawn_by_rule(board, aux) {
                return Some(0);
            }
            return Some(score_for(board, side));
        }

        let mut moves = all_legal_moves(board, aux, side);
        if moves.is_empty() {
            return Some(no_moves_score(board, aux, ply));
        }
        if drawn_by_rule(board, aux) {
            return Some(0);
        }
        order_moves(board, aux, &mut moves);

        let mut best = -INFINITE;
        for mv in moves {
            let child = apply_move(board, aux, mv);
            let score = -self.negamax(&child.board, &child.aux, depth - 1, ply + 1, -beta, -alpha)?;
            if score > best {
                best = score;
                if score > alpha {
                    alpha = score;
                }
                if alpha >= beta {
                    self.stats.inc_cutoff();
                    break;
                }
            }
        }
        Some(best)
    }

    /// Final pick: the best root move, or with perturbation enabled a random
    /// one among the top candidates within the margin. A found mate is
    /// always played.
    fn select(&mut self, scores: &[RootScore]) -> RootScore {
        let best = pick_best(scores);
        let Some(perturbation) = self.params.perturbation else {
            return best;
        };
        if best.score >= MATE_THRESHOLD || perturbation.top_k <= 1 {
            return best;
        }
        let mut near: Vec<RootScore> = scores
            .iter()
            .copied()
            .filter(|r| r.score >= best.score - perturbation.margin)
            .collect();
        near.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
        near.truncate(perturbation.top_k);
        if near.is_empty() {
            return best;
        }
        near[self.rng.random_range(0..near.len())]
    }
}

/// Terminal score for a side with no legal moves: mated (nearer is worse)
/// or stalemate.
pub(crate) fn no_moves_score(board: &Board, aux: &AuxState, ply: u8) -> i32 {
    if in_check(board, aux.side) {
        -MATE + ply as i32
    } else {
        0
    }
}

/// Draws the search can see without game history.
pub(crate) fn drawn_by_rule(board: &Board, aux: &AuxState) -> bool {
    aux.halfmove >= MOVE_RULE_PLIES || is_insufficient_material(board)
}

// Highest score, earliest generated move on ties.
fn pick_best(scores: &[RootScore]) -> RootScore {
    let mut best = scores[0];
    for &r in &scores[1..] {
        if r.score > best.score || (r.score == best.score && r.index < best.index) {
            best = r;
        }
    }
    best
}

/// Value of the piece a move takes, en passant included.
fn victim_value(board: &Board, aux: &AuxState, mv: Move) -> i32 {
    match board.get(mv.to) {
        Some(victim) => victim.kind.value(),
        None if aux.en_passant == Some(mv.to)
            && board.get(mv.from).is_some_and(|p| p.kind == PieceKind::Pawn) =>
        {
            PieceKind::Pawn.value()
        }
        None => 0,
    }
}

// MVV-LVA: big victims first, cheap attackers first among equals.
fn mvv_lva(board: &Board, aux: &AuxState, mv: Move) -> i32 {
    let victim = victim_value(board, aux, mv);
    if victim == 0 {
        return 0;
    }
    let attacker = board.get(mv.from).map_or(0, |p| p.kind.value());
    victim * 10 - attacker
}

/// Captures first by MVV-LVA; quiet moves keep generation order.
fn order_moves(board: &Board, aux: &AuxState, moves: &mut [Move]) {
    moves.sort_by_cached_key(|&mv| std::cmp::Reverse(mvv_lva(board, aux, mv)));
}

fn order_root(
    board: &Board,
    aux: &AuxState,
    canonical: &[Move],
    previous_best: Option<Move>,
) -> Vec<(usize, Move)> {
    let mut ordered: Vec<(usize, Move)> = canonical.iter().copied().enumerate().collect();
    ordered.sort_by_cached_key(|&(_, mv)| {
        let first = previous_best == Some(mv);
        (std::cmp::Reverse(first), std::cmp::Reverse(mvv_lva(board, aux, mv)))
    });
    ordered
}

/// Best move for a bare position, or `None` when there is none.
pub fn best_move(board: &Board, aux: &AuxState, params: &SearchParams) -> Option<Move> {
    Search::new(*board, *aux, params.clone()).search().best_move
}

/// How the engine arrived at its move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    Book,
    Search(SearchResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub mv: Move,
    pub source: MoveSource,
}

/// Move for the side to move in `game`: a book move when allowed and
/// available, otherwise a search result.
pub fn choose_move(game: &Game, params: &SearchParams) -> Result<Move> {
    decide(game, params, None).map(|decision| decision.mv)
}

/// `choose_move` with the search details kept and an optional stop flag.
pub fn decide(
    game: &Game,
    params: &SearchParams,
    stop: Option<Arc<AtomicBool>>,
) -> Result<Decision> {
    let status = game.status();
    if status.is_terminal() {
        if !has_legal_move(game.board(), game.aux(), game.side_to_move()) {
            return Err(ChessError::NoLegalMoves);
        }
        return Err(ChessError::GameOver(status));
    }
    if params.use_book {
        if let Some(mv) = book::book_move(game) {
            info!(%mv, "book move");
            return Ok(Decision {
                mv,
                source: MoveSource::Book,
            });
        }
    }
    let mut search = Search::new(*game.board(), *game.aux(), params.clone());
    if let Some(flag) = stop {
        search = search.with_stop_flag(flag);
    }
    let result = search.search();
    let mv = result.best_move.ok_or(ChessError::NoLegalMoves)?;
    Ok(Decision {
        mv,
        source: MoveSource::Search(result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::decode;
    use crate::search::params::Perturbation;

    /// Unpruned full-width reference with the same leaf rules.
    fn minimax(board: &Board, aux: &AuxState, depth: u8, ply: u8) -> i32 {
        let side = aux.side;
        if depth == 0 {
            if !has_legal_move(board, aux, side) {
                return no_moves_score(board, aux, ply);
            }
            if drawn_by_rule(board, aux) {
                return 0;
            }
            return score_for(board, side);
        }
        let moves = all_legal_moves(board, aux, side);
        if moves.is_empty() {
            return no_moves_score(board, aux, ply);
        }
        if drawn_by_rule(board, aux) {
            return 0;
        }
        moves
            .into_iter()
            .map(|mv| {
                let child = apply_move(board, aux, mv);
                -minimax(&child.board, &child.aux, depth - 1, ply + 1)
            })
            .max()
            .unwrap_or(-INFINITE)
    }

    fn minimax_root(board: &Board, aux: &AuxState, depth: u8) -> (Move, i32) {
        let mut best: Option<(Move, i32)> = None;
        for mv in all_legal_moves(board, aux, aux.side) {
            let child = apply_move(board, aux, mv);
            let score = -minimax(&child.board, &child.aux, depth - 1, 1);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mv, score));
            }
        }
        best.unwrap()
    }

    const SAMPLES: [&str; 5] = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
        "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1",
        "4k3/8/8/3q4/8/2N5/8/4K3 w - - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ];

    #[test]
    fn alpha_beta_matches_minimax() {
        for text in SAMPLES {
            let (board, aux) = decode(text).unwrap();
            for depth in 1..=2 {
                let params = SearchParams::new().max_depth(depth);
                let result = Search::new(board, aux, params).search();
                let (mv, score) = minimax_root(&board, &aux, depth);
                assert_eq!(result.score, score, "{} depth {}", text, depth);
                assert_eq!(result.best_move, Some(mv), "{} depth {}", text, depth);
            }
        }
    }

    #[test]
    fn alpha_beta_matches_minimax_depth_three() {
        let (board, aux) = decode(SAMPLES[3]).unwrap();
        let result = Search::new(board, aux, SearchParams::new().max_depth(3)).search();
        let (mv, score) = minimax_root(&board, &aux, 3);
        assert_eq!((result.best_move, result.score), (Some(mv), score));
    }

    #[test]
    fn finds_back_rank_mate() {
        let (board, aux) = decode(SAMPLES[2]).unwrap();
        let result = Search::new(board, aux, SearchParams::new().max_depth(3)).search();
        assert_eq!(result.best_move.map(|m| m.to_string()), Some("a1a8".to_string()));
        assert!(result.score >= MATE_THRESHOLD);
        // mate in one ends deepening early
        assert_eq!(result.depth, 1);
    }

    #[test]
    fn perturbation_still_mates() {
        let (board, aux) = decode(SAMPLES[2]).unwrap();
        for seed in 0..8 {
            let params = SearchParams::new()
                .max_depth(2)
                .perturbation(Some(Perturbation {
                    margin: 1000,
                    top_k: 10,
                }))
                .seed(seed);
            let mv = best_move(&board, &aux, &params).unwrap();
            assert_eq!(mv.to_string(), "a1a8");
        }
    }

    #[test]
    fn perturbation_stays_within_margin() {
        let (board, aux) = decode(SAMPLES[1]).unwrap();
        let exact = Search::new(board, aux, SearchParams::new().max_depth(2)).search();
        let params = SearchParams::new()
            .max_depth(2)
            .perturbation(Some(Perturbation { margin: 20, top_k: 4 }))
            .seed(7);
        let mut search = Search::new(board, aux, params);
        let result = search.search();
        assert!(result.score >= exact.score - 20);
    }

    #[test]
    fn preset_stop_flag_falls_back_to_a_legal_move() {
        let (board, aux) = decode(SAMPLES[0]).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let result = Search::new(board, aux, SearchParams::new().max_depth(5))
            .with_stop_flag(flag)
            .search();
        let mv = result.best_move.unwrap();
        assert!(all_legal_moves(&board, &aux, aux.side).contains(&mv));
        assert_eq!(result.depth, 0);
    }

    #[test]
    fn no_moves_gives_none() {
        let (board, aux) = decode("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(best_move(&board, &aux, &SearchParams::new()), None);
    }
}
