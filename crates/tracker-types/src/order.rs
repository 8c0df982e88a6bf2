//! Order document types for the remote tracking API.
//!
//! The remote service exposes two documents per order: the largely static
//! `detail` document (identifiers, scheduled timestamps, locations, agent and
//! vehicle info) and the fast-changing `status` document (current status code
//! and live courier coordinates). Both are camelCase JSON; fields this crate
//! does not model are preserved through flattened extras so nothing the API
//! emits is silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Location info for a pickup or drop quest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestInfo {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub latitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub longitude: Option<f64>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Courier (agent) info attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentInfo {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_identifier: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Vehicle info attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleInfo {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// The slow-changing descriptive document for an order.
///
/// Fetched once per tracking code and cached for the lifetime of that code.
/// Timestamps are kept as the ISO strings the API emits; parsing happens only
/// where a timestamp is actually interpreted (retention tracking).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderDetail {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub short_code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub partner_identifier: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub required_start: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub required_end: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expected_start: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub started: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub finished: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivered: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pickup_quest_info: Option<QuestInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub drop_quest_info: Option<QuestInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent: Option<AgentInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vehicle: Option<VehicleInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_latitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_longitude: Option<f64>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// The dynamic document for an order, fetched on every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderStatus {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_latitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_longitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub finished: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivered: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// The detail document overlaid by the status document.
///
/// Same shape as [`OrderDetail`]; status fields win on collision. Produced by
/// the merge step of the poll orchestrator and optionally redacted before it
/// is emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergedRecord {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub short_code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub partner_identifier: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub required_start: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub required_end: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expected_start: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub started: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub finished: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivered: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pickup_quest_info: Option<QuestInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub drop_quest_info: Option<QuestInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent: Option<AgentInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vehicle: Option<VehicleInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_latitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_longitude: Option<f64>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl From<OrderDetail> for MergedRecord {
	fn from(detail: OrderDetail) -> Self {
		Self {
			short_code: detail.short_code,
			partner_identifier: detail.partner_identifier,
			status: detail.status,
			required_start: detail.required_start,
			required_end: detail.required_end,
			expected_start: detail.expected_start,
			started: detail.started,
			finished: detail.finished,
			delivered: detail.delivered,
			pickup_quest_info: detail.pickup_quest_info,
			drop_quest_info: detail.drop_quest_info,
			agent: detail.agent,
			vehicle: detail.vehicle,
			agent_latitude: detail.agent_latitude,
			agent_longitude: detail.agent_longitude,
			extra: detail.extra,
		}
	}
}
