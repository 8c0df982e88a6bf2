//! Common types module for the order tracker.
//!
//! This module defines the core data types and structures shared by the
//! tracker components. It provides a centralized location for the tracking
//! code, order document, and output record types to ensure consistency
//! across all crates.

/// Tracking code extraction and code source types.
pub mod code;
/// Status label lookup tables for display surfaces.
pub mod labels;
/// Order detail, order status, and merged record documents.
pub mod order;
/// The externally visible output record produced on every tick.
pub mod output;

// Re-export all types for convenient access
pub use code::{CodeSource, EntityId, TrackingCode};
pub use order::{AgentInfo, MergedRecord, OrderDetail, OrderStatus, QuestInfo, VehicleInfo};
pub use output::{InactiveReason, OutputRecord};
