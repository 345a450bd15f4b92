//! Search time budgeting: a soft limit checked between iterative-deepening
//! iterations and a hard limit polled inside the search loop, both derived
//! from the clock state. The soft limit shrinks as the best move and score
//! stabilize across iterations and stretches when the best move absorbed
//! only a small share of the nodes.

use std::time::{Duration, Instant};

use crate::board::Color;

pub const MAX_STABILITY: usize = 4;

// Indexed by stability counters clamped to 0..=4: an unstable iteration
// buys more time, a long-stable one gives most of it back.
const BEST_MOVE_STABILITY_MULT: [f64; 5] = [2.50, 1.20, 0.90, 0.80, 0.75];
const SCORE_STABILITY_MULT: [f64; 5] = [1.25, 1.15, 1.00, 0.94, 0.88];

const HARD_LIMIT_MULT: u64 = 4;
const MOVES_TO_GO_DEFAULT: u64 = 40;
const INCREMENT_FRACTION: u64 = 2;
const FLAG_MARGIN_MS: u64 = 50;

/// Raw `go` parameters, all in milliseconds where applicable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub moves_to_go: Option<u64>,
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub movetime: Option<u64>,
    pub infinite: bool,
}

impl SearchLimits {
    pub fn depth(depth: i32) -> SearchLimits {
        SearchLimits { depth: Some(depth), ..SearchLimits::default() }
    }

    pub fn movetime(ms: u64) -> SearchLimits {
        SearchLimits { movetime: Some(ms), ..SearchLimits::default() }
    }
}

pub struct TimeManager {
    soft_limit: Option<Duration>,
    hard_limit: Option<Duration>,
    start: Instant,
    max_depth: Option<i32>,
    max_nodes: Option<u64>,
    stop: bool,
}

impl Default for TimeManager {
    fn default() -> TimeManager {
        TimeManager {
            soft_limit: None,
            hard_limit: None,
            start: Instant::now(),
            max_depth: None,
            max_nodes: None,
            stop: false,
        }
    }
}

impl TimeManager {
    /// Computes the budgets for one search and starts the clock.
    pub fn start_search(&mut self, limits: &SearchLimits, stm: Color) {
        self.start = Instant::now();
        self.stop = false;
        self.max_depth = limits.depth;
        self.max_nodes = limits.nodes;
        self.soft_limit = None;
        self.hard_limit = None;

        if limits.infinite || limits.depth.is_some() || limits.nodes.is_some() {
            return;
        }

        if let Some(movetime) = limits.movetime {
            let d = Duration::from_millis(movetime);
            self.soft_limit = Some(d);
            self.hard_limit = Some(d);
            return;
        }

        let (remaining, increment) = match stm {
            Color::White => (limits.wtime, limits.winc.unwrap_or(0)),
            Color::Black => (limits.btime, limits.binc.unwrap_or(0)),
        };
        let Some(remaining) = remaining else {
            // No clock at all: search until told to stop.
            return;
        };

        let moves_to_go = limits.moves_to_go.filter(|&m| m > 0).unwrap_or(MOVES_TO_GO_DEFAULT);
        let mut soft = remaining / moves_to_go + increment / INCREMENT_FRACTION;
        let mut hard = soft * HARD_LIMIT_MULT;

        // Never budget into the flag.
        let ceiling = remaining.saturating_sub(FLAG_MARGIN_MS).max(1);
        soft = soft.clamp(1, ceiling);
        hard = hard.clamp(1, ceiling);

        self.soft_limit = Some(Duration::from_millis(soft));
        self.hard_limit = Some(Duration::from_millis(hard));
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    pub fn stopped(&self) -> bool {
        self.stop
    }

    /// Cooperative stop request (UCI `stop`, or a poll that tripped).
    pub fn request_stop(&mut self) {
        self.stop = true;
    }

    /// Polled inside the search loop: hard time limit and node cap.
    pub fn check_hard(&mut self, nodes: u64) {
        if let Some(hard) = self.hard_limit {
            if self.elapsed() >= hard {
                self.stop = true;
            }
        }
        if let Some(max) = self.max_nodes {
            if nodes >= max {
                self.stop = true;
            }
        }
    }

    /// The soft limit scaled by the iteration-stability signals. `None`
    /// when the search has no clock.
    pub fn scaled_soft_limit(
        &self,
        best_move_stability: usize,
        score_stability: usize,
        best_move_node_frac: Option<f64>,
    ) -> Option<Duration> {
        let soft = self.soft_limit?;
        let mut scaled = soft.as_secs_f64();
        scaled *= BEST_MOVE_STABILITY_MULT[best_move_stability.min(MAX_STABILITY)];
        scaled *= SCORE_STABILITY_MULT[score_stability.min(MAX_STABILITY)];
        if let Some(frac) = best_move_node_frac {
            // Concentrated effort on the best move reads as an easy move.
            scaled *= (1.5 - frac) * 1.35;
        }
        Some(Duration::from_secs_f64(scaled))
    }

    /// Checked between iterative-deepening iterations.
    pub fn should_stop_iterating(
        &mut self,
        completed_depth: i32,
        nodes: u64,
        best_move_stability: usize,
        score_stability: usize,
        best_move_node_frac: Option<f64>,
    ) -> bool {
        if self.stop {
            return true;
        }
        if let Some(soft) =
            self.scaled_soft_limit(best_move_stability, score_stability, best_move_node_frac)
        {
            if self.elapsed() >= soft {
                self.stop = true;
            }
        }
        if let Some(max_depth) = self.max_depth {
            if completed_depth >= max_depth {
                self.stop = true;
            }
        }
        if let Some(max_nodes) = self.max_nodes {
            if nodes >= max_nodes {
                self.stop = true;
            }
        }
        self.stop
    }
}
