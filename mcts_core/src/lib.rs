//! Monte Carlo tree search for chess.
//!
//! [`engine`] holds the tree, the rollout policy and the search loop;
//! [`logic`] holds the full-rules board adapter and the lightweight board
//! rollouts are played on; [`worker`] runs searches on a background thread.

pub mod engine;
pub mod logic;
pub mod worker;
