//! Iterative-deepening principal-variation search.
//!
//! Single thread, depth-first, make/unmake only: the board handed in is
//! mutated in place and every unwind path leaves it with balanced makes
//! and undos. Cancellation is polled, never preemptive; a stopped search
//! returns the best result of the last completed iteration.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::board::{Board, Move, MoveKind};
use crate::eval::{self, Nnue};

use super::moveorder::{bump_history, HistoryTable, MovePicker};
use super::timeman::{SearchLimits, TimeManager};
use super::tt::{Bound, Tt, TtEntry};

pub const MATE_SCORE: i32 = 1_000_000;
pub const DRAW_SCORE: i32 = 0;
pub const MAX_PLY: usize = 128;

const NULL_MOVE_REDUCTION: i32 = 3;
const STOP_POLL_MASK: u64 = 2047;
const SCORE_STABILITY_WINDOW: i32 = 15;

#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_SCORE - MAX_PLY as i32
}

/// Plies from the root to the mate a score encodes.
#[inline]
pub fn mate_distance(score: i32) -> i32 {
    MATE_SCORE - score.abs()
}

#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
    pub elapsed: Duration,
}

pub struct Searcher {
    pub tt: Tt,
    pub timeman: TimeManager,
    nnue: Option<Arc<Nnue>>,
    nodes: u64,
    killers: Vec<[Option<Move>; 2]>,
    history: Box<HistoryTable>,
    root_move_nodes: Vec<(Move, u64)>,
    /// Emit `info` lines per iteration (the UCI loop turns this on).
    pub report_info: bool,
}

impl Default for Searcher {
    fn default() -> Searcher {
        Searcher::new(super::tt::DEFAULT_TT_MB)
    }
}

impl Searcher {
    pub fn new(hash_mb: usize) -> Searcher {
        Searcher {
            tt: Tt::with_capacity_mb(hash_mb),
            timeman: TimeManager::default(),
            nnue: None,
            nodes: 0,
            killers: vec![[None; 2]; MAX_PLY],
            history: Box::new([[[0; 64]; 64]; 2]),
            root_move_nodes: Vec::new(),
            report_info: false,
        }
    }

    pub fn set_evaluator(&mut self, net: Arc<Nnue>) {
        self.nnue = Some(net);
    }

    pub fn evaluator(&self) -> Option<&Arc<Nnue>> {
        self.nnue.as_ref()
    }

    /// Long-lived state reset between games: table, killers, history.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.killers = vec![[None; 2]; MAX_PLY];
        self.history = Box::new([[[0; 64]; 64]; 2]);
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Iterative deepening from depth 1. Stops between iterations on the
    /// scaled soft limit, a forced mate, or the depth/node cap; inside an
    /// iteration the polled hard limit unwinds cooperatively.
    pub fn search(&mut self, board: &mut Board, limits: &SearchLimits) -> SearchReport {
        self.nodes = 0;
        self.timeman.start_search(limits, board.turn());

        let mut report = SearchReport::default();
        let mut best_move_stability = 0usize;
        let mut score_stability = 0usize;
        let mut last_best: Option<Move> = None;
        let mut last_score = 0i32;

        for depth in 1..MAX_PLY as i32 {
            self.root_move_nodes.clear();
            let mut pv = Vec::new();
            let score =
                self.pvs(board, depth, -MATE_SCORE, MATE_SCORE, 0, last_best, true, &mut pv);

            if self.timeman.stopped() && depth > 1 {
                // Partial iteration: keep the last completed result.
                break;
            }

            report = SearchReport {
                best_move: pv.first().copied().or(last_best),
                score,
                depth,
                nodes: self.nodes,
                pv: pv.clone(),
                elapsed: self.timeman.elapsed(),
            };
            self.print_info(&report);

            if report.best_move.is_some() && report.best_move == last_best {
                best_move_stability = (best_move_stability + 1).min(4);
            } else {
                best_move_stability = 0;
            }
            if (score - last_score).abs() <= SCORE_STABILITY_WINDOW {
                score_stability = (score_stability + 1).min(4);
            } else {
                score_stability = 0;
            }
            last_best = report.best_move;
            last_score = score;

            if is_mate_score(score) {
                debug!("stopping at depth {depth}: forced mate found");
                break;
            }
            let frac = self.best_move_node_fraction(report.best_move);
            if self.timeman.should_stop_iterating(
                depth,
                self.nodes,
                best_move_stability,
                score_stability,
                frac,
            ) {
                break;
            }
        }
        report
    }

    fn best_move_node_fraction(&self, best: Option<Move>) -> Option<f64> {
        let best = best?;
        let total: u64 = self.root_move_nodes.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return None;
        }
        let best_nodes =
            self.root_move_nodes.iter().find(|(m, _)| *m == best).map(|(_, n)| *n)?;
        Some(best_nodes as f64 / total as f64)
    }

    fn print_info(&self, report: &SearchReport) {
        if !self.report_info {
            return;
        }
        let score = if is_mate_score(report.score) {
            let plies = mate_distance(report.score);
            let mate_in = (plies + 1) / 2;
            format!("score mate {}", if report.score > 0 { mate_in } else { -mate_in })
        } else {
            format!("score cp {}", report.score)
        };
        let pv: Vec<String> = report.pv.iter().map(|m| m.to_uci()).collect();
        println!(
            "info depth {} {} nodes {} time {} pv {}",
            report.depth,
            score,
            report.nodes,
            report.elapsed.as_millis(),
            pv.join(" ")
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn pvs(
        &mut self,
        board: &mut Board,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        ply: usize,
        root_pv_move: Option<Move>,
        allow_null: bool,
        pv: &mut Vec<Move>,
    ) -> i32 {
        if self.nodes & STOP_POLL_MASK == 0 {
            self.timeman.check_hard(self.nodes);
        }
        if self.timeman.stopped() {
            return 0;
        }
        self.nodes += 1;

        if ply > 0 && (board.is_threefold() || board.is_insufficient_material()) {
            return DRAW_SCORE;
        }

        let mut tt_move = None;
        if let Some(entry) = self.tt.probe(board.zobrist()) {
            tt_move = entry.best;
            if ply > 0 && entry.depth >= depth {
                match entry.bound {
                    Bound::Exact => return entry.score,
                    Bound::Lower if entry.score >= beta => return entry.score,
                    Bound::Upper if entry.score <= alpha => return entry.score,
                    _ => {}
                }
            }
        }

        if depth <= 0 {
            return self.qsearch(board, alpha, beta, ply);
        }

        let us = board.turn();
        let in_check = board.is_check(us);

        // Null move: hand the opponent a free tempo; a refutation at
        // reduced depth proves this node fails high. Skipped in check, at
        // the root, in pawn endings, and right after another null.
        if allow_null
            && !in_check
            && ply > 0
            && depth > NULL_MOVE_REDUCTION
            && board.has_non_pawn_material(us)
            && !is_mate_score(beta)
        {
            board.make_null_move();
            let mut null_pv = Vec::new();
            let score = -self.pvs(
                board,
                depth - 1 - NULL_MOVE_REDUCTION,
                -beta,
                -beta + 1,
                ply + 1,
                None,
                false,
                &mut null_pv,
            );
            board.undo();
            if self.timeman.stopped() {
                return 0;
            }
            if score >= beta {
                return beta;
            }
        }

        let moves = board.generate_legal_moves();
        if moves.is_empty() {
            // Mate scores are biased by distance from the root so the
            // search prefers the shortest mate.
            return if in_check { -(MATE_SCORE - ply as i32) } else { DRAW_SCORE };
        }

        let pv_move = root_pv_move.or(tt_move);
        let killers = self.killers[ply.min(MAX_PLY - 1)];
        let mut picker = MovePicker::new(board, moves, pv_move, killers, &self.history);

        let orig_alpha = alpha;
        let mut best = -MATE_SCORE;
        let mut best_move = None;
        let mut searched = 0u32;
        let mut child_pv = Vec::new();

        while let Some(mv) = picker.next() {
            let nodes_before = self.nodes;
            board.make_move(mv);
            child_pv.clear();
            let score = if searched == 0 {
                -self.pvs(board, depth - 1, -beta, -alpha, ply + 1, None, true, &mut child_pv)
            } else {
                // Null window first; re-search wide only on improvement.
                let mut s = -self.pvs(
                    board,
                    depth - 1,
                    -alpha - 1,
                    -alpha,
                    ply + 1,
                    None,
                    true,
                    &mut child_pv,
                );
                if s > alpha && s < beta {
                    child_pv.clear();
                    s = -self.pvs(board, depth - 1, -beta, -alpha, ply + 1, None, true, &mut child_pv);
                }
                s
            };
            board.undo();
            searched += 1;

            if self.timeman.stopped() {
                // Cooperative unwind: the board is already restored.
                return best;
            }
            if ply == 0 {
                self.root_move_nodes.push((mv, self.nodes - nodes_before));
            }

            if score > best {
                best = score;
                best_move = Some(mv);
                if score > alpha {
                    alpha = score;
                    pv.clear();
                    pv.push(mv);
                    pv.extend_from_slice(&child_pv);
                    if alpha >= beta {
                        if !mv.is_capture() && mv.kind != MoveKind::Promotion {
                            self.store_killer(ply, mv);
                            bump_history(&mut self.history, us, mv.from, mv.to, depth);
                        }
                        break;
                    }
                }
            }
        }

        if !self.timeman.stopped() {
            let bound = if best <= orig_alpha {
                Bound::Upper
            } else if best >= beta {
                Bound::Lower
            } else {
                Bound::Exact
            };
            self.tt.store(TtEntry { key: board.zobrist(), best: best_move, score: best, depth, bound });
        }
        best
    }

    /// Quiescence: stand pat, then captures only, ordered by MVV-LVA with
    /// SEE-losing captures pruned outright.
    fn qsearch(&mut self, board: &mut Board, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        if self.nodes & STOP_POLL_MASK == 0 {
            self.timeman.check_hard(self.nodes);
        }
        if self.timeman.stopped() {
            return 0;
        }
        self.nodes += 1;

        let stand = eval::evaluate(board, self.nnue.as_deref());
        if stand >= beta {
            return beta;
        }
        if stand > alpha {
            alpha = stand;
        }
        if ply >= MAX_PLY - 1 {
            return alpha;
        }

        let captures = board.generate_captures();
        let mut picker = MovePicker::new_captures(board, captures);
        while let Some(mv) = picker.next() {
            if !super::see::see_ge(board, mv, 0) {
                continue;
            }
            board.make_move(mv);
            let score = -self.qsearch(board, -beta, -alpha, ply + 1);
            board.undo();
            if self.timeman.stopped() {
                return alpha;
            }
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
        alpha
    }

    fn store_killer(&mut self, ply: usize, mv: Move) {
        let slot = &mut self.killers[ply.min(MAX_PLY - 1)];
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
    }
}
