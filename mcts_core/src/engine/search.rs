use crate::engine::config::MctsSettings;
use crate::engine::eval::SimEvaluator;
use crate::engine::node::{NodeId, SearchTree};
use crate::engine::rollout::Rollout;
use crate::engine::{AbortHandle, SearchDiagnostics, Searcher, SimResult};
use crate::logic::board::{ChessBoard, SearchBoard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Called once per search with the chosen move.
pub type SearchCompleteCallback<M> = Box<dyn FnMut(M) + Send>;

pub struct MctsEngine<B: SearchBoard = ChessBoard> {
    board: B,
    settings: Arc<MctsSettings>,
    evaluator: SimEvaluator,
    rng: StdRng,
    abort: AbortHandle,
    tree: Option<SearchTree<B>>,
    best_move: Option<B::Move>,
    diagnostics: SearchDiagnostics,
    on_search_complete: Option<SearchCompleteCallback<B::Move>>,
    positions_evaluated: u64,
    deepest: u32,
}

impl<B: SearchBoard> MctsEngine<B> {
    pub fn new(board: B, settings: Arc<MctsSettings>) -> Self {
        Self {
            board,
            rng: Self::make_rng(&settings),
            settings,
            evaluator: SimEvaluator::new(),
            abort: AbortHandle::new(),
            tree: None,
            best_move: None,
            diagnostics: SearchDiagnostics::default(),
            on_search_complete: None,
            positions_evaluated: 0,
            deepest: 0,
        }
    }

    fn make_rng(settings: &MctsSettings) -> StdRng {
        settings
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }

    pub fn update_settings(&mut self, settings: Arc<MctsSettings>) {
        if settings.seed != self.settings.seed {
            self.rng = Self::make_rng(&settings);
        }
        self.settings = settings;
    }

    pub fn settings(&self) -> &MctsSettings {
        &self.settings
    }

    /// Replaces the position the next search starts from.
    pub fn set_board(&mut self, board: B) {
        self.board = board;
    }

    pub const fn board(&self) -> &B {
        &self.board
    }

    pub fn set_on_search_complete(&mut self, callback: SearchCompleteCallback<B::Move>) {
        self.on_search_complete = Some(callback);
    }

    /// Handle another thread can use to stop the running search.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Tree of the last search, kept until the next one starts.
    pub const fn tree(&self) -> Option<&SearchTree<B>> {
        self.tree.as_ref()
    }

    pub const fn best_move(&self) -> Option<B::Move> {
        self.best_move
    }

    fn aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    fn budget_spent(&self, playouts: u32) -> bool {
        self.settings.limit_num_of_playouts && playouts >= self.settings.max_num_of_playouts
    }

    /// Runs the search loop and returns the move it settled on.
    fn search_moves(&mut self) -> Option<B::Move> {
        let tree = SearchTree::new(
            self.board.clone(),
            self.settings.promotions_to_search,
            self.settings.exploration_constant,
        );
        let root_moves = tree.root_node().map(|n| n.legal_moves.clone()).unwrap_or_default();
        self.tree = Some(tree);

        let Some(&first) = root_moves.first() else {
            log::warn!("MCTS search started on a position with no legal moves");
            return None;
        };
        self.best_move = Some(first);

        if root_moves.len() == 1 {
            log::debug!("MCTS: single legal move {first}, skipping search");
            return self.best_move;
        }

        let mut playouts = 0;
        while !self.aborted() && !self.budget_spent(playouts) {
            if !self.run_iteration() {
                break;
            }
            playouts += 1;
        }

        log::debug!(
            "MCTS: {playouts} playouts, {} nodes, aborted: {}",
            self.tree.as_ref().map_or(0, SearchTree::len),
            self.aborted()
        );
        self.best_move
    }

    /// One select / expand / simulate / backpropagate cycle. Returns `false`
    /// when the abort flag stopped it before a result existed.
    fn run_iteration(&mut self) -> bool {
        let Some(tree) = self.tree.as_mut() else {
            return false;
        };

        // Selection
        let mut node = tree.root();
        loop {
            let next = tree.select_best_child(node);
            if next == node {
                break;
            }
            node = next;
        }
        if self.abort.is_aborted() {
            return false;
        }

        // Expansion
        let leaf: NodeId = tree.expand(node).unwrap_or(node);
        if self.abort.is_aborted() {
            return false;
        }

        // Simulation
        let Some(leaf_node) = tree.get(leaf) else {
            return false;
        };
        let sim_board = leaf_node.state.lightweight_clone();
        let side_to_move = leaf_node.side_to_move;
        let mut rollout = Rollout::new(
            &self.evaluator,
            &mut self.rng,
            self.settings.playout_depth_limit,
        );
        let result: SimResult = rollout.simulate(sim_board, side_to_move);
        self.positions_evaluated += rollout.evaluations();

        // Backpropagation always completes once a result exists.
        tree.backpropagate(leaf, &result, self.settings.value_convention);
        self.deepest = self.deepest.max(tree.depth(leaf));
        if let Some(mv) = tree.select_best_move() {
            self.best_move = Some(mv);
        }
        log::trace!("MCTS: simulated node at depth {}: {result:?}", tree.depth(leaf));
        true
    }

    #[allow(clippy::cast_possible_truncation)]
    fn refresh_diagnostics(&mut self) {
        let tree = self.tree.as_ref();
        let chosen = tree
            .and_then(SearchTree::best_root_child)
            .and_then(|id| tree.and_then(|t| t.get(id)));
        let mean = chosen.map_or(0.0, |n| n.mean_value());

        self.diagnostics = SearchDiagnostics {
            last_completed_depth: self.deepest,
            move_val: format!("{mean:.3}"),
            move_: self.best_move.map(|mv| mv.to_string()).unwrap_or_default(),
            eval: (mean * 1000.0).round() as i32,
            is_book: false,
            num_positions_evaluated: self.positions_evaluated,
            num_playouts: tree
                .and_then(SearchTree::root_node)
                .map_or(0, |n| n.visit_count),
            tree_size: tree.map_or(0, SearchTree::len),
        };
    }
}

impl<B: SearchBoard> Searcher for MctsEngine<B> {
    type Move = B::Move;

    /// Builds a fresh tree from a clone of the search board and runs until
    /// the playout budget is spent or [`Searcher::end_search`] is called.
    /// An abort requested before the loop starts is honoured; the flag is
    /// cleared when the search returns.
    fn start_search(&mut self) -> Option<B::Move> {
        self.tree = None;
        self.best_move = None;
        self.positions_evaluated = 0;
        self.deepest = 0;
        if let Some(seed) = self.settings.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        let chosen = self.search_moves();
        self.abort.reset();
        self.refresh_diagnostics();

        if let Some(mv) = chosen {
            log::debug!(
                "MCTS: chose {mv} ({} playouts, eval {})",
                self.diagnostics.num_playouts,
                self.diagnostics.move_val
            );
            if let Some(callback) = self.on_search_complete.as_mut() {
                callback(mv);
            }
        }
        chosen
    }

    fn end_search(&self) {
        self.abort.abort();
    }

    fn diagnostics(&self) -> &SearchDiagnostics {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::PromotionMode;
    use chess::{ChessMove, Square};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn seeded(max_playouts: u32, depth: u32) -> Arc<MctsSettings> {
        Arc::new(MctsSettings {
            seed: Some(7),
            ..MctsSettings::with_playouts(max_playouts, depth)
        })
    }

    #[test]
    fn test_playout_budget_is_respected() {
        let mut engine = MctsEngine::new(ChessBoard::new(), seeded(50, 4));
        let mv = engine.start_search().unwrap();

        let legal = ChessBoard::new().legal_moves(PromotionMode::All);
        assert!(legal.contains(&mv));

        let tree = engine.tree().unwrap();
        assert_eq!(tree.root_node().unwrap().visit_count, 50);
        // Root plus one new node per playout.
        assert_eq!(tree.len(), 51);
        assert_eq!(engine.diagnostics().num_playouts, 50);
        assert_eq!(engine.diagnostics().move_, mv.to_string());
        assert!(!engine.diagnostics().is_book);
        assert!(engine.diagnostics().num_positions_evaluated > 0);
    }

    #[test]
    fn test_root_visits_equal_child_visits() {
        let mut engine = MctsEngine::new(ChessBoard::new(), seeded(120, 3));
        engine.start_search().unwrap();

        let tree = engine.tree().unwrap();
        let root = tree.root_node().unwrap();
        let child_visits: u32 = tree
            .children(tree.root())
            .iter()
            .map(|&id| tree.get(id).unwrap().visit_count)
            .sum();
        assert_eq!(root.visit_count, child_visits);
        assert_eq!(root.children.len() + root.unexpanded, root.legal_moves.len());
    }

    #[test]
    fn test_root_visits_increase_every_iteration() {
        let mut engine = MctsEngine::new(ChessBoard::new(), seeded(0, 4));
        engine.tree = Some(SearchTree::new(ChessBoard::new(), PromotionMode::All, 1.0));

        let mut previous = 0;
        for _ in 0..50 {
            assert!(engine.run_iteration());
            let visits = engine.tree().unwrap().root_node().unwrap().visit_count;
            assert_eq!(visits, previous + 1);
            previous = visits;
        }

        engine.end_search();
        assert!(!engine.run_iteration());
        assert_eq!(engine.tree().unwrap().root_node().unwrap().visit_count, 50);
    }

    #[test]
    fn test_seeded_engine_repeats_itself() {
        let board = ChessBoard::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        )
        .unwrap();
        let mut engine = MctsEngine::new(board, seeded(60, 3));

        let first = engine.start_search();
        let first_diag = engine.diagnostics().clone();
        let second = engine.start_search();
        assert_eq!(first, second);
        assert_eq!(&first_diag, engine.diagnostics());
    }

    #[test]
    fn test_zero_budget_returns_first_legal_move() {
        let mut engine = MctsEngine::new(ChessBoard::new(), seeded(0, 4));
        let mv = engine.start_search().unwrap();
        let first = ChessBoard::new().legal_moves(PromotionMode::All)[0];
        assert_eq!(mv, first);
        assert_eq!(engine.tree().unwrap().root_node().unwrap().visit_count, 0);
    }

    #[test]
    fn test_single_legal_move_short_circuits() {
        // White king on h1 in check along the first rank; only Kxg2 escapes.
        let board = ChessBoard::from_fen("6k1/8/8/8/8/8/6r1/r6K w - - 0 1");
        let board = board.unwrap();
        let legal = board.legal_moves(PromotionMode::All);
        assert_eq!(legal.len(), 1);

        let mut engine = MctsEngine::new(board, seeded(500, 4));
        let mv = engine.start_search().unwrap();
        assert_eq!(mv, legal[0]);
        assert_eq!(engine.tree().unwrap().len(), 1);
        assert_eq!(engine.diagnostics().num_positions_evaluated, 0);
    }

    #[test]
    fn test_abort_before_start_yields_default_move() {
        let settings = Arc::new(MctsSettings {
            use_time_limit: false,
            limit_num_of_playouts: false,
            seed: Some(1),
            ..MctsSettings::default()
        });
        let mut engine = MctsEngine::new(ChessBoard::new(), settings);
        engine.end_search();

        let mv = engine.start_search().unwrap();
        assert_eq!(mv, ChessBoard::new().legal_moves(PromotionMode::All)[0]);
        // The flag is one-shot.
        assert!(!engine.abort_handle().is_aborted());
    }

    #[test]
    fn test_callback_fires_once_per_search() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut engine = MctsEngine::new(ChessBoard::new(), seeded(10, 2));
        engine.set_on_search_complete(Box::new(move |_mv: ChessMove| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        engine.start_search().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        engine.start_search().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_legal_moves_returns_none() {
        // Fool's mate: White is checkmated.
        let board =
            ChessBoard::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        let mut engine = MctsEngine::new(board, seeded(10, 2));
        assert!(engine.start_search().is_none());
        assert!(engine.diagnostics().move_.is_empty());
    }

    #[test]
    fn test_set_board_changes_search_root() {
        let mut engine = MctsEngine::new(ChessBoard::new(), seeded(30, 2));
        let mut board = ChessBoard::new();
        board.make_move(ChessMove::new(Square::E2, Square::E4, None));
        engine.set_board(board);

        let mv = engine.start_search().unwrap();
        assert!(board.legal_moves(PromotionMode::All).contains(&mv));
        assert_eq!(
            engine.tree().unwrap().root_node().unwrap().side_to_move,
            crate::logic::sim_board::Side::Black
        );
    }
}
