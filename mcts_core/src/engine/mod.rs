use crate::logic::sim_board::{Side, SimBoard};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod config;
pub mod eval;
pub mod node;
pub mod rollout;
pub mod search;


/// Snapshot published when a search completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchDiagnostics {
    pub last_completed_depth: u32,
    pub move_val: String,
    #[serde(rename = "move")]
    pub move_: String,
    pub eval: i32,
    pub is_book: bool,
    pub num_positions_evaluated: u64,
    pub num_playouts: u32,
    pub tree_size: usize,
}

/// Outcome of one rollout, one share per side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimResult {
    pub value_for_white: f32,
    pub value_for_black: f32,
}

impl SimResult {
    /// Hard 1/0 split after `winner` took the enemy king.
    pub const fn king_captured(winner: Side) -> Self {
        match winner {
            Side::White => Self {
                value_for_white: 1.0,
                value_for_black: 0.0,
            },
            Side::Black => Self {
                value_for_white: 0.0,
                value_for_black: 1.0,
            },
        }
    }

    /// Rollout cut short; `white_score` is the evaluator's view for White.
    pub fn from_evaluation(white_score: f32) -> Self {
        let value_for_white = white_score.clamp(0.0, 1.0);
        Self {
            value_for_white,
            value_for_black: 1.0 - value_for_white,
        }
    }

    pub const fn value_for(&self, side: Side) -> f32 {
        match side {
            Side::White => self.value_for_white,
            Side::Black => self.value_for_black,
        }
    }
}

/// One-shot, cross-thread stop request for a running search.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub trait Evaluator {
    /// Score in `[0, 1]` from `side`'s point of view.
    fn evaluate_sim_board(&self, board: &SimBoard, side: Side) -> f32;
}

/// Move-selection contract shared by the search strategies.
pub trait Searcher {
    type Move;

    /// Runs until the budget is spent or [`Self::end_search`] is called.
    /// `None` only when the position has no legal moves.
    fn start_search(&mut self) -> Option<Self::Move>;

    fn end_search(&self);

    fn diagnostics(&self) -> &SearchDiagnostics;
}
