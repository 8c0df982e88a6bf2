//! The ticking poll orchestrator.
//!
//! One [`Coordinator`] owns the full per-order state (current code, detail
//! cache, retention tracker, last-seen status) and sequences one poll tick:
//! resolve the code, handle code changes and retention expiry, fetch the
//! remote documents, merge and sanitize, and emit a fresh output record.
//! Fetch failures other than 404 propagate to the caller unchanged so the
//! scheduler can surface them; no state is mutated on a failed or cancelled
//! tick.

use crate::merge;
use crate::resolver::{resolve_code, EntityLookup};
use crate::retention::RetentionTracker;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracker_remote::{FetchError, RemoteApi};
use tracker_types::{CodeSource, InactiveReason, MergedRecord, OrderDetail, OutputRecord, TrackingCode};

/// Errors that fail one poll tick.
#[derive(Debug, Error)]
pub enum PollError {
	/// A remote fetch failed in a way that is not a normal inactive outcome.
	#[error("update failed: {0}")]
	Fetch(#[from] FetchError),
}

/// Per-order state owned exclusively by one coordinator.
///
/// Reset in full whenever the resolved tracking code differs from the
/// previously resolved one.
#[derive(Default)]
struct CoordinatorState {
	current_code: Option<TrackingCode>,
	last_status: Option<String>,
	retention: RetentionTracker,
	detail_cache: Option<OrderDetail>,
}

/// The poll orchestrator for one configured order.
pub struct Coordinator {
	source: CodeSource,
	lookup: Arc<dyn EntityLookup>,
	remote: Arc<dyn RemoteApi>,
	retention_hours: i64,
	include_destination: bool,
	state: CoordinatorState,
}

impl Coordinator {
	/// Creates a coordinator with empty state.
	pub fn new(
		source: CodeSource,
		lookup: Arc<dyn EntityLookup>,
		remote: Arc<dyn RemoteApi>,
		retention_hours: i64,
		include_destination: bool,
	) -> Self {
		Self {
			source,
			lookup,
			remote,
			retention_hours,
			include_destination,
			state: CoordinatorState::default(),
		}
	}

	/// Runs one poll tick at the current time.
	pub async fn poll(&mut self) -> Result<OutputRecord, PollError> {
		self.poll_at(Utc::now()).await
	}

	/// Runs one poll tick at the given time.
	pub async fn poll_at(&mut self, now: DateTime<Utc>) -> Result<OutputRecord, PollError> {
		let Some(code) = resolve_code(&self.source, self.lookup.as_ref()) else {
			return Ok(OutputRecord::inactive(
				InactiveReason::NoTrackingCode,
				None,
				now,
				self.state.last_status.clone(),
			));
		};

		if self.state.current_code.as_ref() != Some(&code) {
			tracing::info!(code = %code, "tracking code changed, resetting order state");
			self.state.retention.reset();
			self.state.detail_cache = None;
			self.state.last_status = None;
			self.state.current_code = Some(code.clone());
		}

		if self.state.retention.is_expired(now, self.retention_hours) {
			return Ok(OutputRecord::inactive(
				InactiveReason::ExpiredAfterFinished,
				Some(code),
				now,
				self.state.last_status.clone(),
			));
		}

		// The detail document is fetched at most once per tracking code. The
		// cache write is deferred until the status fetch also landed, so a
		// tick cancelled between the two awaits leaves no partial state.
		let (detail, detail_was_fetched) = match self.state.detail_cache.clone() {
			Some(cached) => (cached, false),
			None => match self.remote.fetch_detail(&code).await {
				Ok(detail) => (detail, true),
				Err(FetchError::NotFound) => {
					return Ok(OutputRecord::inactive(
						InactiveReason::NotFound,
						Some(code),
						now,
						self.state.last_status.clone(),
					));
				}
				Err(err) => return Err(err.into()),
			},
		};

		let status = match self.remote.fetch_status(&code).await {
			Ok(status) => status,
			Err(FetchError::NotFound) => {
				return Ok(OutputRecord::inactive(
					InactiveReason::NotFound,
					Some(code),
					now,
					self.state.last_status.clone(),
				));
			}
			Err(err) => return Err(err.into()),
		};

		if detail_was_fetched {
			self.state.detail_cache = Some(detail.clone());
		}

		let mut merged = merge::overlay(Some(&detail), &status);
		merge::sanitize(&mut merged, self.include_destination);

		let raw_status = merged
			.status
			.as_deref()
			.unwrap_or_default()
			.trim()
			.to_string();
		let normalized = if raw_status.is_empty() {
			"UNKNOWN".to_string()
		} else {
			raw_status.to_ascii_uppercase()
		};
		self.state.last_status = if raw_status.is_empty() {
			None
		} else {
			Some(raw_status.clone())
		};

		self.state
			.retention
			.observe(&normalized, finished_timestamp(&merged));

		let shown_status = if raw_status.is_empty() {
			normalized
		} else {
			raw_status
		};
		Ok(OutputRecord::active(code, now, shown_status, merged))
	}
}

/// Extracts the terminal finish timestamp from the merged payload.
///
/// The remote API has been observed emitting the timestamp under `finished`
/// or `delivered`; both are probed, in that order.
fn finished_timestamp(merged: &MergedRecord) -> Option<DateTime<Utc>> {
	merged
		.finished
		.as_deref()
		.filter(|value| !value.is_empty())
		.or(merged
			.delivered
			.as_deref()
			.filter(|value| !value.is_empty()))
		.and_then(parse_timestamp)
}

fn parse_timestamp(iso: &str) -> Option<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(iso)
		.ok()
		.map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;
	use tracker_types::{EntityId, OrderStatus};

	/// One scripted remote response, rebuilt into a `Result` on every call.
	#[derive(Clone)]
	enum Scripted {
		Json(serde_json::Value),
		NotFound,
		Upstream(u16),
	}

	struct ScriptedApi {
		detail: Mutex<Scripted>,
		status: Mutex<Scripted>,
		detail_calls: AtomicUsize,
		status_calls: AtomicUsize,
	}

	impl ScriptedApi {
		fn new(detail: Scripted, status: Scripted) -> Arc<Self> {
			Arc::new(Self {
				detail: Mutex::new(detail),
				status: Mutex::new(status),
				detail_calls: AtomicUsize::new(0),
				status_calls: AtomicUsize::new(0),
			})
		}

		fn set_status(&self, status: Scripted) {
			*self.status.lock().unwrap() = status;
		}

		fn detail_calls(&self) -> usize {
			self.detail_calls.load(Ordering::SeqCst)
		}

		fn status_calls(&self) -> usize {
			self.status_calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl RemoteApi for ScriptedApi {
		async fn fetch_detail(&self, _code: &TrackingCode) -> Result<OrderDetail, FetchError> {
			self.detail_calls.fetch_add(1, Ordering::SeqCst);
			match self.detail.lock().unwrap().clone() {
				Scripted::Json(value) => Ok(serde_json::from_value(value).unwrap()),
				Scripted::NotFound => Err(FetchError::NotFound),
				Scripted::Upstream(code) => Err(FetchError::Upstream(code)),
			}
		}

		async fn fetch_status(&self, _code: &TrackingCode) -> Result<OrderStatus, FetchError> {
			self.status_calls.fetch_add(1, Ordering::SeqCst);
			match self.status.lock().unwrap().clone() {
				Scripted::Json(value) => Ok(serde_json::from_value(value).unwrap()),
				Scripted::NotFound => Err(FetchError::NotFound),
				Scripted::Upstream(code) => Err(FetchError::Upstream(code)),
			}
		}
	}

	struct SwitchableLookup {
		value: Mutex<Option<String>>,
	}

	impl SwitchableLookup {
		fn new(value: Option<&str>) -> Arc<Self> {
			Arc::new(Self {
				value: Mutex::new(value.map(str::to_string)),
			})
		}

		fn set(&self, value: Option<&str>) {
			*self.value.lock().unwrap() = value.map(str::to_string);
		}
	}

	impl EntityLookup for SwitchableLookup {
		fn current_value(&self, _entity: &EntityId) -> Option<String> {
			self.value.lock().unwrap().clone()
		}
	}

	fn manual_source(code: &str) -> CodeSource {
		CodeSource::Manual(TrackingCode::extract(code).unwrap())
	}

	fn entity_source() -> CodeSource {
		CodeSource::EntityLinked(EntityId::new("input_text.code"))
	}

	fn at(iso: &str) -> DateTime<Utc> {
		iso.parse().unwrap()
	}

	fn detail_json() -> serde_json::Value {
		json!({
			"shortCode": "X1",
			"status": "PickupStarted",
			"dropQuestInfo": {"name": "Home", "latitude": 47.5, "longitude": 19.0}
		})
	}

	fn on_way_status() -> serde_json::Value {
		json!({"status": "OnWay", "agentLatitude": 47.1, "agentLongitude": 19.1})
	}

	#[tokio::test]
	async fn test_no_code_emits_inactive_without_touching_remote() {
		let api = ScriptedApi::new(
			Scripted::Json(detail_json()),
			Scripted::Json(on_way_status()),
		);
		let lookup = SwitchableLookup::new(None);
		let mut coordinator =
			Coordinator::new(entity_source(), lookup, api.clone(), 12, false);

		let record = coordinator.poll_at(at("2024-05-01T10:00:00Z")).await.unwrap();
		assert!(!record.active);
		assert_eq!(record.reason, Some(InactiveReason::NoTrackingCode));
		assert!(record.tracking_code.is_none());
		assert!(record.detail.is_none());
		assert_eq!(api.detail_calls(), 0);
		assert_eq!(api.status_calls(), 0);
	}

	#[tokio::test]
	async fn test_active_tick_merges_and_sanitizes() {
		let api = ScriptedApi::new(
			Scripted::Json(detail_json()),
			Scripted::Json(on_way_status()),
		);
		let lookup = SwitchableLookup::new(None);
		let mut coordinator =
			Coordinator::new(manual_source("AB12CD34"), lookup, api, 12, false);

		let record = coordinator.poll_at(at("2024-05-01T10:00:00Z")).await.unwrap();
		assert!(record.active);
		assert!(record.reason.is_none());
		assert_eq!(record.tracking_code.unwrap().as_str(), "AB12CD34");
		assert_eq!(record.last_seen_status.as_deref(), Some("OnWay"));

		let detail = record.detail.unwrap();
		assert_eq!(detail.status.as_deref(), Some("OnWay"));
		assert_eq!(detail.agent_latitude, Some(47.1));
		let drop = detail.drop_quest_info.unwrap();
		assert_eq!(drop.name.as_deref(), Some("Home"));
		assert!(drop.latitude.is_none());
		assert!(drop.longitude.is_none());
	}

	#[tokio::test]
	async fn test_detail_fetched_once_status_every_tick() {
		let api = ScriptedApi::new(
			Scripted::Json(detail_json()),
			Scripted::Json(on_way_status()),
		);
		let lookup = SwitchableLookup::new(None);
		let mut coordinator =
			Coordinator::new(manual_source("AB12CD34"), lookup, api.clone(), 12, false);

		coordinator.poll_at(at("2024-05-01T10:00:00Z")).await.unwrap();
		coordinator.poll_at(at("2024-05-01T10:00:20Z")).await.unwrap();

		assert_eq!(api.detail_calls(), 1);
		assert_eq!(api.status_calls(), 2);
	}

	#[tokio::test]
	async fn test_idempotent_ticks_differ_only_in_last_update() {
		let api = ScriptedApi::new(
			Scripted::Json(detail_json()),
			Scripted::Json(on_way_status()),
		);
		let lookup = SwitchableLookup::new(None);
		let mut coordinator =
			Coordinator::new(manual_source("AB12CD34"), lookup, api, 12, false);

		let first = coordinator.poll_at(at("2024-05-01T10:00:00Z")).await.unwrap();
		let mut second = coordinator.poll_at(at("2024-05-01T10:00:20Z")).await.unwrap();
		assert_ne!(first.last_update, second.last_update);
		second.last_update = first.last_update;
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn test_detail_not_found_emits_inactive_and_does_not_cache() {
		let api = ScriptedApi::new(Scripted::NotFound, Scripted::Json(on_way_status()));
		let lookup = SwitchableLookup::new(None);
		let mut coordinator =
			Coordinator::new(manual_source("AB12CD34"), lookup, api.clone(), 12, false);

		let record = coordinator.poll_at(at("2024-05-01T10:00:00Z")).await.unwrap();
		assert!(!record.active);
		assert_eq!(record.reason, Some(InactiveReason::NotFound));
		assert_eq!(record.tracking_code.unwrap().as_str(), "AB12CD34");

		// The next tick fetches the detail again: nothing was cached.
		let record = coordinator.poll_at(at("2024-05-01T10:00:20Z")).await.unwrap();
		assert_eq!(record.reason, Some(InactiveReason::NotFound));
		assert_eq!(api.detail_calls(), 2);
	}

	#[tokio::test]
	async fn test_upstream_error_fails_tick_without_state_change() {
		let api = ScriptedApi::new(
			Scripted::Json(detail_json()),
			Scripted::Upstream(503),
		);
		let lookup = SwitchableLookup::new(None);
		let mut coordinator =
			Coordinator::new(manual_source("AB12CD34"), lookup, api.clone(), 12, false);

		let err = coordinator.poll_at(at("2024-05-01T10:00:00Z")).await.unwrap_err();
		assert!(matches!(err, PollError::Fetch(FetchError::Upstream(503))));

		// Recovery on the next tick; the detail cache was not populated by
		// the failed tick.
		api.set_status(Scripted::Json(on_way_status()));
		let record = coordinator.poll_at(at("2024-05-01T10:00:20Z")).await.unwrap();
		assert!(record.active);
		assert_eq!(api.detail_calls(), 2);
	}

	#[tokio::test]
	async fn test_code_change_resets_state_and_continues_same_tick() {
		let api = ScriptedApi::new(
			Scripted::Json(detail_json()),
			Scripted::Json(json!({
				"status": "Finished",
				"finished": "2024-05-01T10:00:00Z"
			})),
		);
		let lookup = SwitchableLookup::new(Some("AB12CD34"));
		let mut coordinator =
			Coordinator::new(entity_source(), lookup.clone(), api.clone(), 12, false);

		// Finish order A, then move past its retention window.
		coordinator.poll_at(at("2024-05-01T10:00:00Z")).await.unwrap();
		let record = coordinator.poll_at(at("2024-05-02T10:00:00Z")).await.unwrap();
		assert_eq!(record.reason, Some(InactiveReason::ExpiredAfterFinished));

		// A new code must shed A's finished state and detail cache in the
		// same tick and come up active.
		lookup.set(Some("CD34AB12"));
		api.set_status(Scripted::Json(on_way_status()));
		let record = coordinator.poll_at(at("2024-05-02T10:00:20Z")).await.unwrap();
		assert!(record.active);
		assert_eq!(record.tracking_code.unwrap().as_str(), "CD34AB12");
		assert_eq!(api.detail_calls(), 2);
	}

	#[tokio::test]
	async fn test_retention_suppresses_after_window() {
		let api = ScriptedApi::new(
			Scripted::Json(detail_json()),
			Scripted::Json(json!({
				"status": "Delivered",
				"delivered": "2024-05-01T10:00:00Z"
			})),
		);
		let lookup = SwitchableLookup::new(None);
		let mut coordinator =
			Coordinator::new(manual_source("AB12CD34"), lookup, api.clone(), 12, false);

		let record = coordinator.poll_at(at("2024-05-01T10:05:00Z")).await.unwrap();
		assert!(record.active);
		assert_eq!(record.last_seen_status.as_deref(), Some("Delivered"));

		// One second before the boundary the record is still emitted.
		let record = coordinator.poll_at(at("2024-05-01T21:59:59Z")).await.unwrap();
		assert!(record.active);

		let record = coordinator.poll_at(at("2024-05-01T22:00:00Z")).await.unwrap();
		assert!(!record.active);
		assert_eq!(record.reason, Some(InactiveReason::ExpiredAfterFinished));
		assert_eq!(record.last_seen_status.as_deref(), Some("Delivered"));
		assert!(record.detail.is_none());
	}

	#[tokio::test]
	async fn test_include_destination_keeps_coordinates() {
		let api = ScriptedApi::new(
			Scripted::Json(detail_json()),
			Scripted::Json(on_way_status()),
		);
		let lookup = SwitchableLookup::new(None);
		let mut coordinator =
			Coordinator::new(manual_source("AB12CD34"), lookup, api, 12, true);

		let record = coordinator.poll_at(at("2024-05-01T10:00:00Z")).await.unwrap();
		let drop = record.detail.unwrap().drop_quest_info.unwrap();
		assert_eq!(drop.latitude, Some(47.5));
		assert_eq!(drop.longitude, Some(19.0));
	}

	#[tokio::test]
	async fn test_missing_status_field_reports_unknown() {
		let api = ScriptedApi::new(
			Scripted::Json(json!({"shortCode": "X1"})),
			Scripted::Json(json!({"agentLatitude": 47.1})),
		);
		let lookup = SwitchableLookup::new(None);
		let mut coordinator =
			Coordinator::new(manual_source("AB12CD34"), lookup, api, 12, false);

		let record = coordinator.poll_at(at("2024-05-01T10:00:00Z")).await.unwrap();
		assert!(record.active);
		assert_eq!(record.last_seen_status.as_deref(), Some("UNKNOWN"));
	}
}
