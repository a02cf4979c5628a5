pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod reconcile;
pub mod sinks;
pub mod sources;
pub mod transform;

#[cfg(test)]
mod testing;

pub use reconcile::{Cadence, ReconcileError, Reconciler};
