//! Shared work-queue file: the inter-process mutex plus two 32-bit cells
//! backing first-move-queue mode (§4.3).
//!
//! ## Core Types
//!
//! - [`WorkQueue`] — the raw file-backed counter/total pair
//! - [`CachingQueueHandle`] — the per-process caching wrapper workers use
mod error;
mod queue;

pub use error::QueueError;
pub use queue::{CachingQueueHandle, WorkQueue};
