//! Remote fetch module for the order tracker.
//!
//! This module performs the two read-only HTTP calls against the public
//! tracking API (order detail and order status) and classifies every outcome
//! into the fetch error taxonomy the poll orchestrator acts on. It never
//! retries internally; retry is the scheduler's responsibility via the next
//! poll tick, and cancellation propagates by dropping the in-flight future.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracker_types::{OrderDetail, OrderStatus, TrackingCode};

/// Path template of the order detail endpoint.
pub const DETAIL_PATH: &str = "/order-tracking/orders/{code}/detail";
/// Path template of the order status endpoint.
pub const STATUS_PATH: &str = "/order-tracking/orders/{code}/status";

/// Errors that can occur during remote fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
	/// The remote service does not know the requested order (HTTP 404).
	#[error("order not found")]
	NotFound,
	/// The remote service answered with a non-404 error status.
	#[error("upstream returned HTTP {0}")]
	Upstream(u16),
	/// The request failed below HTTP: connection failure or timeout.
	#[error("transport error: {0}")]
	Transport(String),
	/// The response body was not the expected JSON document.
	#[error("invalid response body: {0}")]
	Decode(String),
}

/// Trait defining the interface to the remote tracking API.
///
/// The poll orchestrator talks to the remote service exclusively through this
/// trait, which keeps the orchestrator testable with scripted responses.
#[async_trait]
pub trait RemoteApi: Send + Sync {
	/// Fetches the slow-changing detail document for an order.
	async fn fetch_detail(&self, code: &TrackingCode) -> Result<OrderDetail, FetchError>;

	/// Fetches the dynamic status document for an order.
	async fn fetch_status(&self, code: &TrackingCode) -> Result<OrderStatus, FetchError>;
}

/// HTTP implementation of [`RemoteApi`] backed by reqwest.
///
/// The underlying `reqwest::Client` carries the connection pool and the
/// bounded total timeout; cloning the client is cheap, so one pool can be
/// shared across all coordinators of a service instance.
pub struct HttpRemoteApi {
	client: reqwest::Client,
	base_url: String,
}

impl HttpRemoteApi {
	/// Creates a client with its own connection pool and the given total
	/// request timeout.
	pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| FetchError::Transport(e.to_string()))?;
		Ok(Self::with_client(client, base_url))
	}

	/// Creates a client on top of an existing connection pool.
	pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
		Self {
			client,
			base_url: base_url.into(),
		}
	}

	async fn fetch<T: DeserializeOwned>(
		&self,
		path_template: &str,
		code: &TrackingCode,
	) -> Result<T, FetchError> {
		let url = endpoint_url(&self.base_url, path_template, code);
		tracing::debug!(%url, "fetching remote document");

		let response = self.client.get(&url).send().await.map_err(|e| {
			if e.is_timeout() {
				FetchError::Transport("request timed out".to_string())
			} else {
				FetchError::Transport(e.to_string())
			}
		})?;

		let status = response.status();
		if status == reqwest::StatusCode::NOT_FOUND {
			return Err(FetchError::NotFound);
		}
		if status.is_client_error() || status.is_server_error() {
			return Err(FetchError::Upstream(status.as_u16()));
		}

		response.json::<T>().await.map_err(|e| {
			if e.is_decode() {
				FetchError::Decode(e.to_string())
			} else {
				FetchError::Transport(e.to_string())
			}
		})
	}
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
	async fn fetch_detail(&self, code: &TrackingCode) -> Result<OrderDetail, FetchError> {
		self.fetch(DETAIL_PATH, code).await
	}

	async fn fetch_status(&self, code: &TrackingCode) -> Result<OrderStatus, FetchError> {
		self.fetch(STATUS_PATH, code).await
	}
}

/// Builds the full endpoint URL from a base, a path template, and a code.
pub fn endpoint_url(base_url: &str, path_template: &str, code: &TrackingCode) -> String {
	format!(
		"{}{}",
		base_url.trim_end_matches('/'),
		path_template.replace("{code}", code.as_str())
	)
}
