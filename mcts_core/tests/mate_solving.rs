use chess::ChessMove;
use mcts_core::engine::config::MctsSettings;
use mcts_core::engine::search::MctsEngine;
use mcts_core::engine::Searcher;
use mcts_core::logic::board::{ChessBoard, GameStatus, SearchBoard};
use std::sync::Arc;

pub fn solve_mate(fen: &str, name: &str) -> ChessMove {
    let board = ChessBoard::from_fen(fen).expect("Invalid FEN");
    let settings = MctsSettings {
        seed: Some(31),
        ..MctsSettings::with_playouts(400, 3)
    };
    let mut engine = MctsEngine::new(board, Arc::new(settings));

    let mv = engine.start_search().expect("No move found");
    println!("{name}: {mv} {:?}", engine.diagnostics());

    let mut after = board;
    after.make_move(mv);
    assert!(
        matches!(after.status(), GameStatus::Checkmate(_)),
        "{name}: {mv} does not mate"
    );
    mv
}

#[test]
fn test_back_rank_rook() {
    solve_mate("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", "back rank rook");
}

#[test]
fn test_back_rank_rook_black() {
    solve_mate("r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1", "back rank rook (black)");
}

#[test]
fn test_smothered_mate() {
    let mv = solve_mate("6rk/6pp/8/6N1/8/8/8/6K1 w - - 0 1", "smothered mate");
    assert_eq!(mv.to_string(), "g5f7");
}
