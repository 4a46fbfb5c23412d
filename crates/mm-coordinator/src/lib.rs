//! Forks the worker pool, multiplexes its pipes, aggregates progress, and
//! runs the probe/rebalance/queue phases on top of the same loop (§4.5).
//!
//! ## Core Types
//!
//! - [`CoordinatorConfig`] / [`Mode`] — what to run and how
//! - [`run`] — dispatches to the configured mode
//! - [`status::HeavyComboTable`] — probe-mode heavy-combo accumulation
mod aggregate;
mod coordinator;
mod error;
mod signals;
mod status;
mod worker;

pub use aggregate::{Aggregator, DispatchEffect};
pub use coordinator::{run, run_normal, run_probe, run_queue_mode, run_rebalance, CoordinatorConfig, Mode};
pub use error::SpawnError;
pub use status::{HeavyCombo, HeavyComboTable};
pub use worker::{spawn_worker, WorkerHandle, WorkerRecord};
