//! Display projection of the latest poll output.
//!
//! Turns the raw output record into the compact attribute set and localized
//! status strings that display and automation consumers read. Empty values
//! are skipped entirely rather than rendered as nulls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracker_core::PollOutput;
use tracker_types::{labels, InactiveReason, MergedRecord};

/// One order as exposed over the read API and in log lines.
#[derive(Debug, Serialize)]
pub struct OrderView {
	/// The configured order id.
	pub id: String,
	/// Whether the order is actively tracked.
	pub active: bool,
	/// The raw status code from the remote API, when one has been seen.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status_code: Option<String>,
	/// Short localized status label.
	pub status_text: String,
	/// Longer localized status description.
	pub status_description: String,
	/// Why the order is inactive, when it is.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<InactiveReason>,
	/// When the underlying record was produced.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_update: Option<DateTime<Utc>>,
	/// The failure of the most recent poll tick, if it failed.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_error: Option<String>,
	/// Compact attribute set projected from the merged order document.
	pub attributes: Map<String, Value>,
}

impl OrderView {
	/// Projects the latest scheduler output for one order.
	pub fn from_output(id: &str, output: &PollOutput) -> Self {
		let Some(record) = &output.record else {
			return Self {
				id: id.to_string(),
				active: false,
				status_code: None,
				status_text: labels::INACTIVE_LABEL.to_string(),
				status_description: labels::INACTIVE_LABEL.to_string(),
				reason: None,
				last_update: None,
				last_error: output.last_error.clone(),
				attributes: Map::new(),
			};
		};

		let status_code = record.last_seen_status.clone();
		let (status_text, status_description) = if record.active {
			let raw = status_code.as_deref().unwrap_or_default();
			(
				labels::short_label(raw).to_string(),
				labels::description(raw).to_string(),
			)
		} else {
			(
				labels::INACTIVE_LABEL.to_string(),
				labels::INACTIVE_LABEL.to_string(),
			)
		};

		Self {
			id: id.to_string(),
			active: record.active,
			status_code,
			status_text,
			status_description,
			reason: record.reason,
			last_update: Some(record.last_update),
			last_error: output.last_error.clone(),
			attributes: record
				.detail
				.as_ref()
				.map(display_attributes)
				.unwrap_or_default(),
		}
	}
}

/// Projects the merged order document into flat display attributes.
///
/// Nested blocks are flattened to the handful of fields consumers actually
/// read; everything absent or empty is left out.
pub fn display_attributes(merged: &MergedRecord) -> Map<String, Value> {
	let mut attributes = Map::new();

	insert_text(&mut attributes, "short_code", merged.short_code.as_deref());
	insert_text(
		&mut attributes,
		"partner_identifier",
		merged.partner_identifier.as_deref(),
	);
	insert_text(
		&mut attributes,
		"required_start",
		merged.required_start.as_deref(),
	);
	insert_text(&mut attributes, "required_end", merged.required_end.as_deref());
	insert_text(
		&mut attributes,
		"expected_start",
		merged.expected_start.as_deref(),
	);
	insert_text(&mut attributes, "started", merged.started.as_deref());
	insert_text(&mut attributes, "finished", merged.finished.as_deref());
	insert_text(&mut attributes, "delivered", merged.delivered.as_deref());

	if let Some(agent) = &merged.agent {
		insert_text(&mut attributes, "agent_name", agent.name.as_deref());
	}
	if let Some(vehicle) = &merged.vehicle {
		insert_text(&mut attributes, "vehicle", vehicle.name.as_deref());
	}
	if let Some(pickup) = &merged.pickup_quest_info {
		insert_text(&mut attributes, "pickup_name", pickup.name.as_deref());
	}
	if let Some(drop) = &merged.drop_quest_info {
		insert_text(&mut attributes, "destination_name", drop.name.as_deref());
		insert_number(&mut attributes, "destination_latitude", drop.latitude);
		insert_number(&mut attributes, "destination_longitude", drop.longitude);
	}

	insert_number(&mut attributes, "agent_latitude", merged.agent_latitude);
	insert_number(&mut attributes, "agent_longitude", merged.agent_longitude);

	attributes
}

fn insert_text(attributes: &mut Map<String, Value>, key: &str, value: Option<&str>) {
	if let Some(value) = value {
		if !value.is_empty() {
			attributes.insert(key.to_string(), Value::from(value));
		}
	}
}

fn insert_number(attributes: &mut Map<String, Value>, key: &str, value: Option<f64>) {
	if let Some(value) = value {
		attributes.insert(key.to_string(), Value::from(value));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use tracker_types::{OutputRecord, TrackingCode};

	fn merged() -> MergedRecord {
		serde_json::from_value(serde_json::json!({
			"shortCode": "X1",
			"status": "OnWay",
			"agent": {"name": "Bence"},
			"vehicle": {"name": "bike"},
			"dropQuestInfo": {"name": "Home"},
			"agentLatitude": 47.1,
			"started": ""
		}))
		.unwrap()
	}

	fn code() -> TrackingCode {
		TrackingCode::extract("AB12CD34").unwrap()
	}

	#[test]
	fn test_active_record_renders_localized_labels() {
		let output = PollOutput {
			record: Some(OutputRecord::active(
				code(),
				Utc::now(),
				"OnWay".to_string(),
				merged(),
			)),
			last_error: None,
		};

		let view = OrderView::from_output("front-door", &output);
		assert!(view.active);
		assert_eq!(view.status_code.as_deref(), Some("OnWay"));
		assert_eq!(view.status_text, "Úton");
		assert_eq!(view.status_description, "A futár úton van Önhöz.");
		assert_eq!(view.attributes.get("short_code"), Some(&Value::from("X1")));
		assert_eq!(
			view.attributes.get("agent_name"),
			Some(&Value::from("Bence"))
		);
		assert_eq!(
			view.attributes.get("agent_latitude"),
			Some(&Value::from(47.1))
		);
		// Empty strings are skipped, sanitized coordinates never appear.
		assert!(view.attributes.get("started").is_none());
		assert!(view.attributes.get("destination_latitude").is_none());
	}

	#[test]
	fn test_empty_output_renders_inactive_label() {
		let view = OrderView::from_output("front-door", &PollOutput::default());
		assert!(!view.active);
		assert_eq!(view.status_text, labels::INACTIVE_LABEL);
		assert!(view.attributes.is_empty());
		assert!(view.last_update.is_none());
	}

	#[test]
	fn test_unknown_status_passes_through() {
		let output = PollOutput {
			record: Some(OutputRecord::active(
				code(),
				Utc::now(),
				"BrandNewStatus".to_string(),
				MergedRecord::default(),
			)),
			last_error: None,
		};

		let view = OrderView::from_output("front-door", &output);
		assert_eq!(view.status_text, "BrandNewStatus");
	}
}
