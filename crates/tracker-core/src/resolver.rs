//! Code resolution from the configured source.
//!
//! Manual sources carry an already normalized code; entity-linked sources are
//! re-read on every tick through the host-supplied lookup so the tracked
//! order follows the external state's current value.

use tracker_types::{CodeSource, EntityId, TrackingCode};

/// Read access to the current text value of an external state.
///
/// Supplied by whoever hosts the coordinator; the in-process
/// [`EntityRegistry`](crate::registry::EntityRegistry) is the default
/// implementation.
pub trait EntityLookup: Send + Sync {
	/// Returns the current text value of the referenced state, if any.
	fn current_value(&self, entity: &EntityId) -> Option<String>;
}

/// Resolves the tracking code for one tick.
///
/// Deterministic and infallible: an unresolvable code is a normal absent
/// outcome, not an error.
pub fn resolve_code(source: &CodeSource, lookup: &dyn EntityLookup) -> Option<TrackingCode> {
	match source {
		CodeSource::Manual(code) => Some(code.clone()),
		CodeSource::EntityLinked(entity) => lookup
			.current_value(entity)
			.as_deref()
			.and_then(TrackingCode::extract),
	}
}
