//! Search tree with arena allocation.
//!
//! Nodes live in a contiguous `Vec` and refer to each other by [`NodeId`].
//! Children are owned by the arena; the parent link is a plain index used only
//! for backpropagation and for the parent-visit term of UCT.

use crate::engine::config::ValueConvention;
use crate::engine::SimResult;
use crate::logic::board::{PromotionMode, SearchBoard};
use crate::logic::sim_board::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone)]
pub struct SearchNode<B: SearchBoard> {
    pub state: B,
    pub parent: Option<NodeId>,
    /// Expansion order, not move order.
    pub children: Vec<NodeId>,
    pub legal_moves: Vec<B::Move>,
    /// Moves in `legal_moves[..unexpanded]` have not produced a child yet.
    pub unexpanded: usize,
    /// `None` for the root.
    pub initiating_move: Option<B::Move>,
    pub side_to_move: Side,
    pub visit_count: u32,
    pub value_sum: f32,
}

impl<B: SearchBoard> SearchNode<B> {
    fn new(
        state: B,
        parent: Option<NodeId>,
        initiating_move: Option<B::Move>,
        promotions: PromotionMode,
    ) -> Self {
        let legal_moves = state.legal_moves(promotions);
        Self {
            side_to_move: state.side_to_move(),
            unexpanded: legal_moves.len(),
            legal_moves,
            state,
            parent,
            children: Vec::new(),
            initiating_move,
            visit_count: 0,
            value_sum: 0.0,
        }
    }

    pub const fn has_unexpanded_moves(&self) -> bool {
        self.unexpanded > 0
    }

    /// The side whose move led here; the one this node's value is credited to.
    pub const fn mover(&self) -> Side {
        self.side_to_move.opposite()
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn mean_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }

    fn credit(&mut self, result: &SimResult, convention: ValueConvention) {
        self.visit_count += 1;
        self.value_sum += match convention {
            ValueConvention::PerSide => result.value_for(self.mover()),
            ValueConvention::ZeroSumNegated => {
                let margin = result.value_for_white - result.value_for_black;
                match self.mover() {
                    Side::White => margin,
                    Side::Black => -margin,
                }
            }
        };
    }
}

#[derive(Debug)]
pub struct SearchTree<B: SearchBoard> {
    nodes: Vec<SearchNode<B>>,
    promotions: PromotionMode,
    exploration_constant: f32,
}

impl<B: SearchBoard> SearchTree<B> {
    /// Builds the root from `state` and caches its legal moves.
    pub fn new(state: B, promotions: PromotionMode, exploration_constant: f32) -> Self {
        Self {
            nodes: vec![SearchNode::new(state, None, None, promotions)],
            promotions,
            exploration_constant,
        }
    }

    #[inline]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&SearchNode<B>> {
        self.nodes.get(id.0 as usize)
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> Option<&mut SearchNode<B>> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn root_node(&self) -> Option<&SearchNode<B>> {
        self.get(self.root())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> u32 {
        let mut depth = 0;
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.get(parent).and_then(|n| n.parent);
        }
        depth
    }

    /// Selection score. The root is never compared against peers and scores 0;
    /// an unvisited child scores `+inf` so every child is tried once before
    /// any is revisited.
    #[allow(clippy::cast_precision_loss)]
    pub fn uct_value(&self, id: NodeId) -> f32 {
        let Some(node) = self.get(id) else {
            return 0.0;
        };
        let Some(parent) = node.parent.and_then(|p| self.get(p)) else {
            return 0.0;
        };
        if node.visit_count == 0 {
            return f32::INFINITY;
        }

        let visits = node.visit_count as f32;
        let parent_visits = (parent.visit_count.max(1)) as f32;
        node.value_sum / visits + self.exploration_constant * (parent_visits.ln() / visits).sqrt()
    }

    /// `id` itself while it is a leaf or still has unexpanded moves, otherwise
    /// the child with the highest UCT value (first one wins ties).
    pub fn select_best_child(&self, id: NodeId) -> NodeId {
        let Some(node) = self.get(id) else {
            return id;
        };
        if node.children.is_empty() || node.has_unexpanded_moves() {
            return id;
        }

        let mut best = id;
        let mut best_score = f32::NEG_INFINITY;
        for &child in &node.children {
            let score = self.uct_value(child);
            if best == id || score > best_score {
                best = child;
                best_score = score;
            }
        }
        best
    }

    /// Creates one child from the next unexpanded move of `id`.
    /// Returns `None` when every move already has a child.
    pub fn expand(&mut self, id: NodeId) -> Option<NodeId> {
        let promotions = self.promotions;
        let child_id = NodeId(u32::try_from(self.nodes.len()).ok()?);

        let parent = self.get_mut(id)?;
        if !parent.has_unexpanded_moves() {
            return None;
        }
        let mv = *parent.legal_moves.get(parent.unexpanded - 1)?;
        let mut state = parent.state.clone();
        state.make_move(mv);

        // Build the child completely before linking it so no half-made node is visible.
        let child = SearchNode::new(state, Some(id), Some(mv), promotions);
        self.nodes.push(child);
        if let Some(parent) = self.get_mut(id) {
            parent.unexpanded -= 1;
            parent.children.push(child_id);
        }
        Some(child_id)
    }

    /// Credits `result` to `id` and every ancestor up to the root.
    pub fn backpropagate(&mut self, id: NodeId, result: &SimResult, convention: ValueConvention) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.get_mut(node_id) else {
                break;
            };
            node.credit(result, convention);
            current = node.parent;
        }
    }

    /// Initiating move of the root child with the largest cumulative value.
    /// Uses `value_sum`, not UCT, so well-visited good moves win.
    pub fn select_best_move(&self) -> Option<B::Move> {
        self.best_root_child()
            .and_then(|id| self.get(id))
            .and_then(|n| n.initiating_move)
    }

    pub fn best_root_child(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for &child in self.children(self.root()) {
            let Some(node) = self.get(child) else {
                continue;
            };
            if best.map_or(true, |(_, value)| node.value_sum > value) {
                best = Some((child, node.value_sum));
            }
        }
        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::ChessBoard;

    fn tree() -> SearchTree<ChessBoard> {
        SearchTree::new(ChessBoard::new(), PromotionMode::All, 1.0)
    }

    #[test]
    fn test_root_is_selected_until_fully_expanded() {
        let mut tree = tree();
        let root = tree.root();
        assert_eq!(tree.select_best_child(root), root);

        let legal = tree.root_node().unwrap().legal_moves.len();
        for expanded in 1..legal {
            tree.expand(root).unwrap();
            let node = tree.root_node().unwrap();
            assert_eq!(node.children.len(), expanded);
            assert_eq!(node.children.len() + node.unexpanded, legal);
            assert_eq!(tree.select_best_child(root), root);
        }

        tree.expand(root).unwrap();
        assert!(tree.expand(root).is_none());
        assert_ne!(tree.select_best_child(root), root);
    }

    #[test]
    fn test_expansion_walks_moves_from_the_back() {
        let mut tree = tree();
        let root = tree.root();
        let last = *tree.root_node().unwrap().legal_moves.last().unwrap();

        let child = tree.expand(root).unwrap();
        let node = tree.get(child).unwrap();
        assert_eq!(node.initiating_move, Some(last));
        assert_eq!(node.parent, Some(root));
        assert_eq!(node.side_to_move, Side::Black);
        assert_eq!(node.legal_moves.len(), 20);
        assert_eq!(tree.depth(child), 1);
    }

    #[test]
    fn test_uct_values() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.expand(root).unwrap();
        let b = tree.expand(root).unwrap();

        assert!(tree.uct_value(root).abs() < f32::EPSILON);
        assert!(tree.uct_value(a).is_infinite());

        tree.backpropagate(a, &SimResult::king_captured(Side::White), ValueConvention::PerSide);
        assert!(tree.uct_value(a).is_finite());
        assert!(tree.uct_value(b).is_infinite());

        tree.backpropagate(b, &SimResult::king_captured(Side::Black), ValueConvention::PerSide);
        // a: mean 1 + sqrt(ln 2 / 1); b: mean 0 + sqrt(ln 2 / 1)
        let bonus = 2f32.ln().sqrt();
        assert!((tree.uct_value(a) - (1.0 + bonus)).abs() < 1e-5);
        assert!((tree.uct_value(b) - bonus).abs() < 1e-5);
    }

    #[test]
    fn test_unvisited_child_beats_visited_ones() {
        let mut tree = tree();
        let root = tree.root();
        let mut children = Vec::new();
        while let Some(child) = tree.expand(root) {
            children.push(child);
        }
        let fresh = children[7];
        for &child in &children {
            if child != fresh {
                tree.backpropagate(
                    child,
                    &SimResult::king_captured(Side::White),
                    ValueConvention::PerSide,
                );
            }
        }
        assert_eq!(tree.select_best_child(root), fresh);
    }

    #[test]
    fn test_ties_go_to_first_child() {
        let mut tree = tree();
        let root = tree.root();
        let mut children = Vec::new();
        while let Some(child) = tree.expand(root) {
            children.push(child);
        }
        assert_eq!(tree.select_best_child(root), children[0]);
    }

    #[test]
    fn test_backpropagate_counts_every_ancestor() {
        let mut tree = tree();
        let root = tree.root();
        let child = tree.expand(root).unwrap();
        let grandchild = tree.expand(child).unwrap();

        let draw = SimResult::from_evaluation(0.5);
        tree.backpropagate(grandchild, &draw, ValueConvention::PerSide);
        tree.backpropagate(child, &draw, ValueConvention::PerSide);

        assert_eq!(tree.get(grandchild).unwrap().visit_count, 1);
        assert_eq!(tree.get(child).unwrap().visit_count, 2);
        assert_eq!(tree.root_node().unwrap().visit_count, 2);
    }

    #[test]
    fn test_value_credited_to_mover() {
        let mut tree = tree();
        let root = tree.root();
        let white_move = tree.expand(root).unwrap();
        let black_move = tree.expand(white_move).unwrap();

        let white_wins = SimResult::king_captured(Side::White);
        tree.backpropagate(black_move, &white_wins, ValueConvention::PerSide);
        assert!((tree.get(white_move).unwrap().value_sum - 1.0).abs() < f32::EPSILON);
        assert!(tree.get(black_move).unwrap().value_sum.abs() < f32::EPSILON);

        tree.backpropagate(black_move, &white_wins, ValueConvention::ZeroSumNegated);
        assert!((tree.get(white_move).unwrap().value_sum - 2.0).abs() < f32::EPSILON);
        assert!((tree.get(black_move).unwrap().value_sum + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_best_move_uses_value_sum() {
        let mut tree = tree();
        let root = tree.root();
        assert!(tree.select_best_move().is_none());

        let a = tree.expand(root).unwrap();
        let b = tree.expand(root).unwrap();
        let half = SimResult::from_evaluation(0.6);
        // a: one visit worth 0.6 (mean 0.6); b: three visits worth 0.6 each (sum 1.8).
        tree.backpropagate(a, &half, ValueConvention::PerSide);
        for _ in 0..3 {
            tree.backpropagate(b, &half, ValueConvention::PerSide);
        }
        assert_eq!(tree.best_root_child(), Some(b));
        assert_eq!(
            tree.select_best_move(),
            tree.get(b).unwrap().initiating_move
        );
    }
}
