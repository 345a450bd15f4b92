//! Tree search: the PVS driver and its supporting heuristics.

pub mod alphabeta;
pub mod moveorder;
pub mod see;
pub mod timeman;
pub mod tt;

pub use alphabeta::{is_mate_score, SearchReport, Searcher, DRAW_SCORE, MATE_SCORE};
pub use timeman::{SearchLimits, TimeManager};
