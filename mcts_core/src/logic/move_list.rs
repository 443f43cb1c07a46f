use crate::logic::sim_board::{SimMove, SimSquare};
use std::ops::Index;

// Legal chess positions never exceed 218 moves; pseudo-legal ones stay well below 256.
const MAX_MOVES: usize = 256;

#[derive(Clone)]
pub struct SimMoveList {
    moves: [SimMove; MAX_MOVES],
    count: usize,
}

impl Default for SimMoveList {
    fn default() -> Self {
        Self {
            moves: [SimMove::default(); MAX_MOVES],
            count: 0,
        }
    }
}

impl SimMoveList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mv: SimMove) {
        if let Some(slot) = self.moves.get_mut(self.count) {
            *slot = mv;
            self.count += 1;
        } else {
            debug_assert!(false, "SimMoveList overflow! Max moves: {MAX_MOVES}");
        }
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Drops everything and keeps only `mv`.
    pub fn replace_with(&mut self, mv: SimMove) {
        self.clear();
        self.push(mv);
    }

    pub const fn len(&self) -> usize {
        self.count
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> Option<&SimMove> {
        self.as_slice().get(index)
    }

    pub fn as_slice(&self) -> &[SimMove] {
        self.moves.get(0..self.count).unwrap_or(&[])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimMove> {
        self.as_slice().iter()
    }

    pub fn contains(&self, mv: &SimMove) -> bool {
        self.as_slice().contains(mv)
    }
}

impl<'a> IntoIterator for &'a SimMoveList {
    type Item = &'a SimMove;
    type IntoIter = std::slice::Iter<'a, SimMove>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Returned for out-of-range indices; stale slots past `count` are never exposed.
static NULL_MOVE: SimMove = SimMove::new(SimSquare::new(0, 0), SimSquare::new(0, 0));

impl Index<usize> for SimMoveList {
    type Output = SimMove;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).unwrap_or(&NULL_MOVE)
    }
}
