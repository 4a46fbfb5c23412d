//! Combo-space indexing, combo assignment and first-move filtering (§4.2).
//!
//! ## Core Types
//!
//! - [`Order`] — which combo dimension varies fastest
//! - [`Assignment`] — the strided/simple combo predicate a worker owns
//! - [`FirstMoveFilter`] — the ply-1 static/rotation move filter
//! - [`Partitioner`] — bundles the three into the worker-facing API
mod assignment;
mod error;
mod first_move;
mod order;
mod partitioner;

pub use assignment::Assignment;
pub use error::PartitionError;
pub use first_move::FirstMoveFilter;
pub use order::{Dim, Order, DEFAULT_ORDER};
pub use partitioner::Partitioner;
