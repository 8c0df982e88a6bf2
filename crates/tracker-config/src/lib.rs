//! Configuration module for the order tracker.
//!
//! Configuration is loaded from a TOML file. Environment variables referenced
//! as `${VAR}` or `${VAR:-default}` are resolved before parsing, and the
//! parsed configuration is validated so every bound the poll machinery relies
//! on (interval, retention window, code shape) is enforced up front.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracker_types::{CodeSource, EntityId, TrackingCode};

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 20;
/// Default retention window in hours.
pub const DEFAULT_RETENTION_HOURS: i64 = 12;
/// Base URL of the public tracking API.
pub const DEFAULT_BASE_URL: &str = "https://api.gaia.delivery";
/// Default total timeout for one remote request, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the tracker service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Remote API settings shared by all orders.
	#[serde(default)]
	pub api: ApiConfig,
	/// The orders to track; each entry owns one coordinator.
	#[serde(default)]
	pub orders: Vec<OrderEntry>,
	/// Optional HTTP read API.
	pub server: Option<ServerConfig>,
}

/// Remote API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Base URL of the tracking API.
	#[serde(default = "default_base_url")]
	pub base_url: String,
	/// Total timeout for one request, in seconds.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			base_url: default_base_url(),
			timeout_seconds: default_timeout_seconds(),
		}
	}
}

/// How the tracking code of an order is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
	/// A fixed code (or tracking link) given in the configuration.
	Manual,
	/// The code is read from a referenced external text state on every tick.
	Entity,
}

/// Configuration for one tracked order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderEntry {
	/// Unique identifier for this order within the service.
	pub id: String,
	/// Code source mode.
	pub mode: TrackingMode,
	/// Tracking code or tracking link, for manual mode.
	pub tracking_code: Option<String>,
	/// Referenced entity identifier, for entity mode.
	pub code_entity: Option<String>,
	/// Poll interval in seconds, bounded to [10, 300].
	#[serde(default = "default_poll_interval_seconds")]
	pub poll_interval_seconds: u64,
	/// Hours the last record stays visible after a terminal status, [1, 48].
	#[serde(default = "default_retention_hours")]
	pub retention_hours: i64,
	/// Whether destination coordinates are kept in the merged record.
	#[serde(default)]
	pub include_destination: bool,
}

impl OrderEntry {
	/// Builds the code source for this entry.
	///
	/// Returns a validation error when the entry is inconsistent; `validate`
	/// performs the same checks at load time, so on a validated config this
	/// cannot fail.
	pub fn code_source(&self) -> Result<CodeSource, ConfigError> {
		match self.mode {
			TrackingMode::Manual => {
				let raw = self.tracking_code.as_deref().unwrap_or_default();
				TrackingCode::extract(raw)
					.map(CodeSource::Manual)
					.ok_or_else(|| {
						ConfigError::Validation(format!(
							"Order '{}' has no extractable tracking code",
							self.id
						))
					})
			}
			TrackingMode::Entity => {
				let entity = self.code_entity.as_deref().unwrap_or_default();
				if entity.is_empty() {
					return Err(ConfigError::Validation(format!(
						"Order '{}' is in entity mode but has no code_entity",
						self.id
					)));
				}
				Ok(CodeSource::EntityLinked(EntityId::new(entity)))
			}
		}
	}
}

/// Configuration for the HTTP read API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
	/// Whether the server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_server_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_server_port")]
	pub port: u16,
}

fn default_base_url() -> String {
	DEFAULT_BASE_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
	DEFAULT_TIMEOUT_SECONDS
}

fn default_poll_interval_seconds() -> u64 {
	DEFAULT_POLL_INTERVAL_SECONDS
}

fn default_retention_hours() -> i64 {
	DEFAULT_RETENTION_HOURS
}

fn default_server_host() -> String {
	"127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
	3000
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).ok_or_else(|| {
			ConfigError::Parse("Environment variable pattern matched without capture".into())
		})?;
		let var_name = &cap[1];
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)))
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await?;
		raw.parse()
	}

	/// Validates the configuration.
	///
	/// Checks that at least one order is configured with a unique id, that the
	/// poll interval and retention window are within bounds, that each order's
	/// code source is complete for its mode, and that the API settings are
	/// usable.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.api.base_url.is_empty() {
			return Err(ConfigError::Validation("api.base_url cannot be empty".into()));
		}
		if self.api.timeout_seconds == 0 || self.api.timeout_seconds > 60 {
			return Err(ConfigError::Validation(
				"api.timeout_seconds must be within [1, 60]".into(),
			));
		}

		if self.orders.is_empty() {
			return Err(ConfigError::Validation(
				"At least one [[orders]] entry must be configured".into(),
			));
		}

		let mut seen_ids = std::collections::HashSet::new();
		for order in &self.orders {
			if order.id.is_empty() {
				return Err(ConfigError::Validation("Order id cannot be empty".into()));
			}
			if !seen_ids.insert(order.id.as_str()) {
				return Err(ConfigError::Validation(format!(
					"Duplicate order id '{}'",
					order.id
				)));
			}
			if !(10..=300).contains(&order.poll_interval_seconds) {
				return Err(ConfigError::Validation(format!(
					"Order '{}': poll_interval_seconds must be within [10, 300]",
					order.id
				)));
			}
			if !(1..=48).contains(&order.retention_hours) {
				return Err(ConfigError::Validation(format!(
					"Order '{}': retention_hours must be within [1, 48]",
					order.id
				)));
			}
			// Mode-specific completeness, including code extraction for
			// manual entries.
			order.code_source()?;
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
