use crate::engine::Evaluator;
use crate::logic::eval_constants::get_pst_value;
use crate::logic::sim_board::{Side, SimBoard, SimPieceType};

/// Material plus piece-square bonuses, squashed into `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimEvaluator;

impl SimEvaluator {
    pub const fn new() -> Self {
        Self
    }

    /// Raw material + PST per side, kings excluded. Index with [`Side::index`].
    pub fn side_scores(board: &SimBoard) -> [i32; 2] {
        let mut scores = [0; 2];
        for (sq, piece) in board.pieces() {
            if piece.piece_type == SimPieceType::King {
                continue;
            }
            let pst = get_pst_value(
                piece.piece_type,
                piece.side,
                usize::from(sq.rank),
                usize::from(sq.file),
            );
            if let Some(score) = scores.get_mut(piece.side.index()) {
                *score += piece.value + pst;
            }
        }
        scores
    }
}

impl Evaluator for SimEvaluator {
    #[allow(clippy::cast_precision_loss)]
    fn evaluate_sim_board(&self, board: &SimBoard, side: Side) -> f32 {
        // A missing king settles it regardless of material.
        if !board.has_king(side) {
            return 0.0;
        }
        if !board.has_king(side.opposite()) {
            return 1.0;
        }

        let scores = Self::side_scores(board);
        let own = scores.get(side.index()).copied().unwrap_or(0).max(0);
        let enemy = scores
            .get(side.opposite().index())
            .copied()
            .unwrap_or(0)
            .max(0);

        let total = own + enemy;
        if total == 0 {
            return 0.5;
        }
        own as f32 / total as f32
    }
}
