//! Main entry point for the order tracker service.
//!
//! This binary loads the configuration, builds one poll coordinator and
//! scheduler per configured order on top of a shared HTTP connection pool,
//! logs every fresh record, and optionally serves the read API until
//! interrupted.

use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracker_config::{Config, TrackingMode};
use tracker_core::{Coordinator, EntityRegistry, PollHandle, PollScheduler};
use tracker_remote::HttpRemoteApi;
use tracker_types::CodeSource;

mod output;
mod server;

use output::OrderView;
use server::{AppState, OrderSlot};

/// Command-line arguments for the tracker service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the tracker service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Spawns one poll scheduler per configured order
/// 5. Runs until interrupted, serving the read API when enabled
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started tracker");

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{} orders]", config.orders.len());

	// One connection pool shared by every coordinator.
	let http_client = reqwest::Client::builder()
		.pool_idle_timeout(Duration::from_secs(90))
		.pool_max_idle_per_host(10)
		.timeout(Duration::from_secs(config.api.timeout_seconds))
		.build()?;

	let registry = Arc::new(EntityRegistry::new());
	let (shutdown_tx, shutdown_rx) = watch::channel(false);

	let mut orders = HashMap::new();
	for entry in &config.orders {
		let source = entry.code_source()?;
		let entity = match &source {
			CodeSource::EntityLinked(entity) => Some(entity.clone()),
			CodeSource::Manual(_) => None,
		};

		let remote = Arc::new(HttpRemoteApi::with_client(
			http_client.clone(),
			config.api.base_url.clone(),
		));
		let coordinator = Coordinator::new(
			source,
			registry.clone(),
			remote,
			entry.retention_hours,
			entry.include_destination,
		);

		let (scheduler, handle) = PollScheduler::new(
			coordinator,
			Duration::from_secs(entry.poll_interval_seconds),
		);
		let scheduler = match (&entry.mode, &entity) {
			(TrackingMode::Entity, Some(entity)) => {
				scheduler.with_entity_changes(registry.subscribe(entity))
			}
			_ => scheduler,
		};

		tracing::info!(
			order = %entry.id,
			interval = entry.poll_interval_seconds,
			"starting poll scheduler"
		);
		tokio::spawn(scheduler.run(shutdown_rx.clone()));
		tokio::spawn(log_records(entry.id.clone(), handle.clone()));

		orders.insert(entry.id.clone(), OrderSlot { handle, entity });
	}

	let state = AppState {
		orders: Arc::new(orders),
		registry,
	};

	let server_config = config.server.clone().filter(|server| server.enabled);
	if let Some(server_config) = server_config {
		tokio::select! {
			result = server::start_server(server_config, state) => {
				tracing::info!("API server finished");
				result?;
			}
			_ = tokio::signal::ctrl_c() => {
				tracing::info!("Shutdown signal received");
			}
		}
	} else {
		tokio::signal::ctrl_c().await?;
		tracing::info!("Shutdown signal received");
	}

	// Stop the poll loops; the log tasks end when their schedulers do.
	let _ = shutdown_tx.send(true);

	tracing::info!("Stopped tracker");
	Ok(())
}

/// Logs every fresh record published by one scheduler.
async fn log_records(id: String, handle: PollHandle) {
	let mut output = handle.subscribe();
	while output.changed().await.is_ok() {
		let latest = output.borrow_and_update().clone();
		let view = OrderView::from_output(&id, &latest);
		if view.active {
			tracing::info!(
				order = %id,
				status = %view.status_text,
				code = view.status_code.as_deref().unwrap_or_default(),
				"order updated"
			);
		} else {
			tracing::info!(order = %id, status = %view.status_text, "order inactive");
		}
		if tracing::enabled!(tracing::Level::DEBUG) {
			match serde_json::to_string(&view.attributes) {
				Ok(attributes) => tracing::debug!(order = %id, %attributes, "order attributes"),
				Err(err) => tracing::debug!(order = %id, error = %err, "attributes not serializable"),
			}
		}
	}
}
