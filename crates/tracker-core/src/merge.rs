//! Typed overlay of the detail and status documents.
//!
//! The merge rule is explicit rather than an implicit map union: the status
//! document wins on every field it carries and on every extra key it shares
//! with the detail document. Sanitization removes the drop-location
//! coordinates unless destination exposure is enabled; all other
//! drop-location fields stay intact.

use tracker_types::{MergedRecord, OrderDetail, OrderStatus};

/// Overlays the status document onto the detail document.
///
/// Starts from a copy of the detail (or an empty record when no detail is
/// available) and overwrites with each field the status document carries.
pub fn overlay(detail: Option<&OrderDetail>, status: &OrderStatus) -> MergedRecord {
	let mut merged = MergedRecord::from(detail.cloned().unwrap_or_default());

	if let Some(value) = &status.status {
		merged.status = Some(value.clone());
	}
	if let Some(value) = status.agent_latitude {
		merged.agent_latitude = Some(value);
	}
	if let Some(value) = status.agent_longitude {
		merged.agent_longitude = Some(value);
	}
	if let Some(value) = &status.finished {
		merged.finished = Some(value.clone());
	}
	if let Some(value) = &status.delivered {
		merged.delivered = Some(value.clone());
	}
	for (key, value) in &status.extra {
		merged.extra.insert(key.clone(), value.clone());
	}

	merged
}

/// Removes destination coordinates from the merged record unless destination
/// exposure is enabled.
pub fn sanitize(record: &mut MergedRecord, include_destination: bool) {
	if include_destination {
		return;
	}
	if let Some(drop) = record.drop_quest_info.as_mut() {
		drop.latitude = None;
		drop.longitude = None;
		// Coordinates the API emitted under unmodeled spellings would land
		// in the extras; strip those too.
		drop.extra.remove("latitude");
		drop.extra.remove("longitude");
	}
}
