//! Interval-driven poll scheduling.
//!
//! A [`PollScheduler`] owns one coordinator and calls it on a fixed interval,
//! catching propagated poll failures and publishing the latest outcome
//! through a watch channel. Consumers keep reading the last successful
//! record until a new one is produced; a failed tick only updates the
//! failure state. An out-of-band poll can be requested at any time, and a
//! subscription to entity-value changes triggers one automatically.

use crate::coordinator::Coordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tracker_types::OutputRecord;

/// The published state of one scheduled order.
#[derive(Debug, Clone, Default)]
pub struct PollOutput {
	/// The most recent successful record.
	pub record: Option<OutputRecord>,
	/// The failure of the most recent tick, cleared on the next success.
	pub last_error: Option<String>,
}

/// Read side of a running scheduler.
#[derive(Clone)]
pub struct PollHandle {
	output: watch::Receiver<PollOutput>,
	refresh: Arc<Notify>,
}

impl PollHandle {
	/// Returns the latest published state.
	pub fn latest(&self) -> PollOutput {
		self.output.borrow().clone()
	}

	/// Subscribes to published state changes.
	pub fn subscribe(&self) -> watch::Receiver<PollOutput> {
		self.output.clone()
	}

	/// Requests one out-of-band poll in addition to the fixed interval.
	pub fn request_refresh(&self) {
		self.refresh.notify_one();
	}
}

/// Drives one coordinator on a fixed interval.
pub struct PollScheduler {
	coordinator: Coordinator,
	interval: Duration,
	entity_changes: Option<watch::Receiver<u64>>,
	refresh: Arc<Notify>,
	output_tx: watch::Sender<PollOutput>,
}

impl PollScheduler {
	/// Creates a scheduler and the handle observers use to read its output.
	pub fn new(coordinator: Coordinator, interval: Duration) -> (Self, PollHandle) {
		let (output_tx, output_rx) = watch::channel(PollOutput::default());
		let refresh = Arc::new(Notify::new());
		let scheduler = Self {
			coordinator,
			interval,
			entity_changes: None,
			refresh: refresh.clone(),
			output_tx,
		};
		let handle = PollHandle {
			output: output_rx,
			refresh,
		};
		(scheduler, handle)
	}

	/// Polls out-of-band whenever the given entity-change channel fires.
	pub fn with_entity_changes(mut self, changes: watch::Receiver<u64>) -> Self {
		self.entity_changes = Some(changes);
		self
	}

	/// Runs until the shutdown flag flips to true.
	///
	/// At most one poll is in flight at any time: a tick runs to completion
	/// before the next trigger is considered.
	pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
		let mut ticker = tokio::time::interval(self.interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = ticker.tick() => {}
				_ = self.refresh.notified() => {
					tracing::debug!("out-of-band poll requested");
				}
				_ = changed(&mut self.entity_changes) => {
					tracing::debug!("linked entity changed, polling out of band");
				}
				result = shutdown.changed() => {
					if result.is_err() || *shutdown.borrow() {
						break;
					}
					continue;
				}
			}

			match self.coordinator.poll().await {
				Ok(record) => {
					self.output_tx.send_modify(|output| {
						output.record = Some(record);
						output.last_error = None;
					});
				}
				Err(err) => {
					tracing::warn!(error = %err, "poll tick failed, keeping last record");
					self.output_tx.send_modify(|output| {
						output.last_error = Some(err.to_string());
					});
				}
			}
		}
	}
}

/// Resolves when the optional entity-change channel fires; pends forever
/// when there is no subscription or the sender is gone.
async fn changed(changes: &mut Option<watch::Receiver<u64>>) {
	match changes {
		Some(receiver) => {
			if receiver.changed().await.is_err() {
				std::future::pending::<()>().await;
			}
		}
		None => std::future::pending().await,
	}
}
