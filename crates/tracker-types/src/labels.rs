//! Status label lookup tables.
//!
//! Maps the raw status codes the remote API emits to a short display string
//! and a longer localized description. Unknown codes pass through verbatim so
//! new upstream statuses stay visible instead of disappearing.

/// Label shown when no order is actively tracked.
pub const INACTIVE_LABEL: &str = "Nincs aktív rendelés";

/// Returns the short display label for a raw status code.
pub fn short_label(status: &str) -> &str {
	match status {
		"PickupStarted" => "Feldolgozás",
		"PickupCompleted" => "Átvéve",
		"OnWay" => "Úton",
		"Arrived" => "Megérkezett",
		"NearDestination" => "Hamarosan",
		"Finished" | "Delivered" => "Kézbesítve",
		"Cancelled" => "Törölve",
		"Failed" => "Sikertelen",
		other => other,
	}
}

/// Returns the longer localized description for a raw status code.
pub fn description(status: &str) -> &str {
	match status {
		"PickupStarted" => "A megrendelés feldolgozása folyamatban van.",
		"PickupCompleted" => "A futár átvette a megrendelését.",
		"OnWay" => "A futár úton van Önhöz.",
		"Arrived" => "A futár megérkezett.",
		"NearDestination" => "A futár hamarosan érkezik.",
		"Finished" | "Delivered" => "A megrendelését sikeresen kézbesítettük.",
		"Cancelled" => "A rendelést törölték.",
		"Failed" => "A kézbesítés sikertelen.",
		other => other,
	}
}
