//! The externally visible output record.
//!
//! One [`OutputRecord`] is produced fresh on every successful poll tick; it is
//! never partially mutated. Inactive records carry a reason so display and
//! automation consumers can distinguish "no order configured" from "order
//! finished and aged out" from "unknown code".

use crate::code::TrackingCode;
use crate::order::MergedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an output record is inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InactiveReason {
	/// No tracking code could be resolved from the configured source.
	NoTrackingCode,
	/// The order reached a terminal status longer than the retention window
	/// ago.
	ExpiredAfterFinished,
	/// The remote service does not know the resolved code.
	NotFound,
}

/// The single structured record republished for one tracked order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
	/// Whether the order is actively tracked this tick.
	pub active: bool,
	/// Set iff `active` is false.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<InactiveReason>,
	/// The resolved tracking code, when one exists.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_code: Option<TrackingCode>,
	/// When this record was produced.
	pub last_update: DateTime<Utc>,
	/// The most recently seen raw status string, kept across inactive ticks
	/// for display continuity.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_seen_status: Option<String>,
	/// The merged and sanitized order document, for active records.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail: Option<MergedRecord>,
}

impl OutputRecord {
	/// Creates an inactive record with the given reason.
	pub fn inactive(
		reason: InactiveReason,
		tracking_code: Option<TrackingCode>,
		last_update: DateTime<Utc>,
		last_seen_status: Option<String>,
	) -> Self {
		Self {
			active: false,
			reason: Some(reason),
			tracking_code,
			last_update,
			last_seen_status,
			detail: None,
		}
	}

	/// Creates an active record carrying the merged document.
	pub fn active(
		tracking_code: TrackingCode,
		last_update: DateTime<Utc>,
		last_seen_status: String,
		detail: MergedRecord,
	) -> Self {
		Self {
			active: true,
			reason: None,
			tracking_code: Some(tracking_code),
			last_update,
			last_seen_status: Some(last_seen_status),
			detail: Some(detail),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_inactive_reason_serializes_snake_case() {
		let json = serde_json::to_string(&InactiveReason::NoTrackingCode).unwrap();
		assert_eq!(json, "\"no_tracking_code\"");
		let json = serde_json::to_string(&InactiveReason::ExpiredAfterFinished).unwrap();
		assert_eq!(json, "\"expired_after_finished\"");
		let json = serde_json::to_string(&InactiveReason::NotFound).unwrap();
		assert_eq!(json, "\"not_found\"");
	}

	#[test]
	fn test_inactive_record_has_no_detail() {
		let record = OutputRecord::inactive(InactiveReason::NotFound, None, Utc::now(), None);
		assert!(!record.active);
		assert_eq!(record.reason, Some(InactiveReason::NotFound));
		assert!(record.detail.is_none());
	}
}
