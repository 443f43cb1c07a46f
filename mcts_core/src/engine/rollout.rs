use crate::engine::{Evaluator, SimResult};
use crate::logic::move_list::SimMoveList;
use crate::logic::sim_board::{Side, SimBoard, SimMove};
use rand::Rng;

/// Below this many candidates the best-scoring move is always taken.
const GREEDY_POOL: usize = 4;

/// Plays a position out on the lightweight board.
pub struct Rollout<'a, E: Evaluator, R: Rng> {
    evaluator: &'a E,
    rng: &'a mut R,
    depth_limit: u32,
    evaluations: u64,
}

impl<'a, E: Evaluator, R: Rng> Rollout<'a, E, R> {
    pub fn new(evaluator: &'a E, rng: &'a mut R, depth_limit: u32) -> Self {
        Self {
            evaluator,
            rng,
            depth_limit,
            evaluations: 0,
        }
    }

    /// Evaluator calls made so far, candidate scoring included.
    pub const fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Alternates moves starting with `side_to_move` until a king falls, the
    /// side to move has no moves, or `depth_limit` plies have been played.
    pub fn simulate(&mut self, mut board: SimBoard, mut side_to_move: Side) -> SimResult {
        for _ in 0..self.depth_limit {
            let moves = board.generate_moves(side_to_move);
            if moves.is_empty() {
                break;
            }

            let mv = self.choose_move(&mut board, side_to_move, &moves);
            let captured = board.apply_move(mv);
            if captured.is_some_and(|p| p.is_king()) {
                return SimResult::king_captured(side_to_move);
            }
            side_to_move = side_to_move.opposite();
        }

        self.evaluations += 1;
        SimResult::from_evaluation(self.evaluator.evaluate_sim_board(&board, Side::White))
    }

    /// Biased pick: the best-scoring move with probability
    /// `min(1, 4 / candidates)`, otherwise a uniformly random candidate.
    pub fn choose_move(&mut self, board: &mut SimBoard, side: Side, moves: &SimMoveList) -> SimMove {
        let best = self.best_move(board, side, moves);

        let count = moves.len();
        #[allow(clippy::cast_precision_loss)]
        let take_best = count <= GREEDY_POOL || self.rng.gen_bool(GREEDY_POOL as f64 / count as f64);
        if take_best {
            return best;
        }
        moves
            .get(self.rng.gen_range(0..count))
            .copied()
            .unwrap_or(best)
    }

    /// Highest-scoring candidate from `side`'s point of view. The board is
    /// restored after each trial move.
    fn best_move(&mut self, board: &mut SimBoard, side: Side, moves: &SimMoveList) -> SimMove {
        let mut best = moves.get(0).copied().unwrap_or_default();
        let mut best_score = f32::NEG_INFINITY;

        for &mv in moves {
            let captured = board.apply_move(mv);
            let score = if captured.is_some_and(|p| p.is_king()) {
                f32::INFINITY
            } else {
                self.evaluations += 1;
                self.evaluator.evaluate_sim_board(board, side)
            };
            board.undo_move(mv, captured);

            if score > best_score {
                best = mv;
                best_score = score;
            }
        }
        best
    }
}
