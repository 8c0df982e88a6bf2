//! Terminal-status retention tracking.
//!
//! Once an order reaches a terminal status, its record stays visible for a
//! configured number of hours and is then suppressed. The tracker remembers
//! the finish timestamp reported by the remote API, not the time the poll
//! observed it, so retention survives restarts of the poll loop within one
//! tracked code.

use chrono::{DateTime, Duration, Utc};

/// Status values after which the order will not change further.
const TERMINAL_STATUSES: [&str; 2] = ["FINISHED", "DELIVERED"];

/// Remembers when the tracked order last reached a terminal status.
#[derive(Debug, Default)]
pub struct RetentionTracker {
	finished_at: Option<DateTime<Utc>>,
}

impl RetentionTracker {
	/// Creates an empty tracker.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a terminal finish timestamp.
	///
	/// The status comparison is case-insensitive. The last observed terminal
	/// timestamp always overwrites a previously stored one.
	pub fn observe(&mut self, status: &str, finished_at: Option<DateTime<Utc>>) {
		let terminal = TERMINAL_STATUSES
			.iter()
			.any(|t| status.eq_ignore_ascii_case(t));
		if terminal {
			if let Some(timestamp) = finished_at {
				self.finished_at = Some(timestamp);
			}
		}
	}

	/// Whether the retention window has elapsed.
	///
	/// True iff a finish timestamp is recorded and `now` is at or past the
	/// end of the window.
	pub fn is_expired(&self, now: DateTime<Utc>, retention_hours: i64) -> bool {
		match self.finished_at {
			Some(finished_at) => now >= finished_at + Duration::hours(retention_hours),
			None => false,
		}
	}

	/// Clears the recorded finish timestamp. Invoked whenever the tracking
	/// code changes.
	pub fn reset(&mut self) {
		self.finished_at = None;
	}

	/// Returns the recorded finish timestamp, if any.
	pub fn finished_at(&self) -> Option<DateTime<Utc>> {
		self.finished_at
	}
}
