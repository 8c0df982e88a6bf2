//! HTTP read API for the tracker service.
//!
//! Exposes the latest record of every configured order and accepts text
//! updates for entity-linked tracking codes. The server is optional; the
//! poll loops run the same with or without it.

use crate::output::OrderView;
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::{get, put},
	Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracker_config::ServerConfig;
use tracker_core::{EntityRegistry, PollHandle};
use tracker_types::EntityId;

/// Errors that can occur while running the HTTP server.
#[derive(Debug, Error)]
pub enum ServeError {
	/// Error that occurs when binding the listen address.
	#[error("failed to bind {addr}: {source}")]
	Bind {
		addr: String,
		source: std::io::Error,
	},
	/// Error that occurs while serving requests.
	#[error("server error: {0}")]
	Serve(#[from] std::io::Error),
}

/// One configured order as the server sees it.
pub struct OrderSlot {
	/// Read side of the order's scheduler.
	pub handle: PollHandle,
	/// The linked entity, for orders in entity mode.
	pub entity: Option<EntityId>,
}

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Configured orders by id.
	pub orders: Arc<HashMap<String, OrderSlot>>,
	/// Entity store backing entity-linked orders.
	pub registry: Arc<EntityRegistry>,
}

/// Starts the HTTP server for the read API.
pub async fn start_server(server_config: ServerConfig, state: AppState) -> Result<(), ServeError> {
	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", get(handle_list_orders))
				.route("/orders/{id}", get(handle_get_order))
				.route("/orders/{id}/code", put(handle_set_code)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(state);

	let bind_address = format!("{}:{}", server_config.host, server_config.port);
	let listener = TcpListener::bind(&bind_address)
		.await
		.map_err(|source| ServeError::Bind {
			addr: bind_address.clone(),
			source,
		})?;

	tracing::info!("Tracker API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles GET /api/orders requests.
async fn handle_list_orders(State(state): State<AppState>) -> Json<Vec<String>> {
	let mut ids: Vec<String> = state.orders.keys().cloned().collect();
	ids.sort();
	Json(ids)
}

/// Handles GET /api/orders/{id} requests.
///
/// Returns the latest record of the order together with the derived
/// localized labels and display attributes.
async fn handle_get_order(Path(id): Path<String>, State(state): State<AppState>) -> Response {
	match state.orders.get(&id) {
		Some(slot) => Json(OrderView::from_output(&id, &slot.handle.latest())).into_response(),
		None => not_found(&id),
	}
}

/// Body of PUT /api/orders/{id}/code requests.
#[derive(Debug, Deserialize)]
struct SetCodeRequest {
	/// Raw text the tracking code will be extracted from; a share link is
	/// accepted as well.
	code: String,
}

/// Handles PUT /api/orders/{id}/code requests.
///
/// Updates the linked entity's text value and triggers an out-of-band poll.
/// Orders with a fixed configured code reject the update.
async fn handle_set_code(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<SetCodeRequest>,
) -> Response {
	let Some(slot) = state.orders.get(&id) else {
		return not_found(&id);
	};
	let Some(entity) = &slot.entity else {
		return (
			StatusCode::CONFLICT,
			Json(serde_json::json!({
				"error": format!("Order '{}' has a fixed tracking code", id)
			})),
		)
			.into_response();
	};

	tracing::info!(order = %id, entity = %entity, "tracking code updated via API");
	state.registry.set(entity, request.code);
	slot.handle.request_refresh();

	StatusCode::NO_CONTENT.into_response()
}

fn not_found(id: &str) -> Response {
	(
		StatusCode::NOT_FOUND,
		Json(serde_json::json!({
			"error": format!("Unknown order '{}'", id)
		})),
	)
		.into_response()
}
