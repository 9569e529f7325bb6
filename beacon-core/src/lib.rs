//! Status message lifecycle and edit coalescing for Beacon.
//!
//! A session owns one [`StatusMessageRecord`]. Every state change goes
//! through the [`Dispatcher`], which either recreates a stale message or hands
//! the new embed to the [`EditCoalescer`] so that bursts of updates turn into
//! a single platform edit per debounce window.

mod coalescer;
mod dispatch;
mod metrics;
mod policy;
mod record;
mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use coalescer::EditCoalescer;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use metrics::{CountingMetrics, MetricKind, MetricsSink, TracingMetrics};
pub use policy::{DEFAULT_DEBOUNCE, DEFAULT_STALE_AFTER_SECS, StatusPolicy};
pub use record::StatusMessageRecord;
pub use validate::{ContentError, is_valid, validate};
