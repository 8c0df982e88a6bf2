//! Core polling machinery for the order tracker.
//!
//! This crate contains the per-order state machine: code resolution,
//! retention tracking, the detail cache, payload merging and sanitization,
//! the poll orchestrator that sequences them on every tick, and the scheduler
//! task that drives the orchestrator on a fixed interval.

/// The ticking poll orchestrator and its per-order state.
pub mod coordinator;
/// Typed overlay of detail and status documents, plus sanitization.
pub mod merge;
/// In-process store of entity values with change notification.
pub mod registry;
/// Code resolution from the configured source.
pub mod resolver;
/// Terminal-status retention tracking.
pub mod retention;
/// Interval-driven poll scheduling with failure-state tracking.
pub mod scheduler;

pub use coordinator::{Coordinator, PollError};
pub use registry::EntityRegistry;
pub use resolver::{resolve_code, EntityLookup};
pub use retention::RetentionTracker;
pub use scheduler::{PollHandle, PollOutput, PollScheduler};
