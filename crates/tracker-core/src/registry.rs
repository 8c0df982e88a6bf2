//! In-process store of entity values.
//!
//! Each configured order that reads its tracking code from an external state
//! resolves that state through an [`EntityRegistry`]. The registry is owned
//! explicitly by the service instance and handed to whatever needs it; there
//! is no process-wide lookup. Writers bump a per-entity version channel so
//! schedulers can poll out-of-band when the referenced value changes.

use crate::resolver::EntityLookup;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;
use tracker_types::EntityId;

struct EntitySlot {
	value: Option<String>,
	version: u64,
	tx: watch::Sender<u64>,
}

impl EntitySlot {
	fn new() -> Self {
		let (tx, _rx) = watch::channel(0);
		Self {
			value: None,
			version: 0,
			tx,
		}
	}
}

/// Entity id to current text value, with change notification.
#[derive(Default)]
pub struct EntityRegistry {
	slots: Mutex<HashMap<String, EntitySlot>>,
}

impl EntityRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the current value of an entity and notifies subscribers.
	pub fn set(&self, entity: &EntityId, value: impl Into<String>) {
		let mut slots = self.slots.lock().expect("entity registry lock poisoned");
		let slot = slots
			.entry(entity.as_str().to_string())
			.or_insert_with(EntitySlot::new);
		slot.value = Some(value.into());
		slot.version += 1;
		// No receivers is fine; the value is still readable via the lookup.
		let _ = slot.tx.send(slot.version);
	}

	/// Subscribes to change notifications for one entity.
	pub fn subscribe(&self, entity: &EntityId) -> watch::Receiver<u64> {
		let mut slots = self.slots.lock().expect("entity registry lock poisoned");
		slots
			.entry(entity.as_str().to_string())
			.or_insert_with(EntitySlot::new)
			.tx
			.subscribe()
	}
}

impl EntityLookup for EntityRegistry {
	fn current_value(&self, entity: &EntityId) -> Option<String> {
		let slots = self.slots.lock().expect("entity registry lock poisoned");
		slots.get(entity.as_str()).and_then(|slot| slot.value.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entity() -> EntityId {
		EntityId::new("input_text.code")
	}

	#[test]
	fn test_unset_entity_has_no_value() {
		let registry = EntityRegistry::new();
		assert!(registry.current_value(&entity()).is_none());
	}

	#[test]
	fn test_set_then_read() {
		let registry = EntityRegistry::new();
		registry.set(&entity(), "AB12CD34");
		assert_eq!(registry.current_value(&entity()).as_deref(), Some("AB12CD34"));
	}

	#[tokio::test]
	async fn test_subscribers_see_changes() {
		let registry = EntityRegistry::new();
		let mut rx = registry.subscribe(&entity());

		registry.set(&entity(), "AB12CD34");
		rx.changed().await.unwrap();
		assert_eq!(*rx.borrow_and_update(), 1);

		registry.set(&entity(), "CD34AB12");
		rx.changed().await.unwrap();
		assert_eq!(*rx.borrow_and_update(), 2);
	}
}
