//! Tracking code types and extraction.
//!
//! A tracking code is the 8-character alphanumeric identifier of a single
//! delivery order. Codes arrive either as bare text (possibly surrounded by
//! other words) or embedded in a tracking link, and are always normalized to
//! upper case. Extraction is a pure function: absence is a valid outcome,
//! never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Matches a tracking code embedded in a tracking link. Takes priority over
/// the bare token pattern when both appear in the same text.
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?i)t\.idodo\.group/([A-Za-z0-9]{8})").expect("link pattern is valid")
});

/// Matches a standalone 8-character alphanumeric token bounded by word
/// boundaries.
static BARE_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\b([A-Za-z0-9]{8})\b").expect("bare pattern is valid"));

/// An 8-character alphanumeric tracking code, always upper-cased.
///
/// Construction goes through [`TrackingCode::extract`], which guarantees the
/// invariant; there is no public constructor accepting arbitrary strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingCode(String);

impl TrackingCode {
	/// Extracts a tracking code from free-form text.
	///
	/// The tracking-link pattern is searched first; if no link is present,
	/// any standalone 8-character alphanumeric token is accepted. Returns
	/// `None` when the text is empty or contains no candidate token.
	pub fn extract(text: &str) -> Option<Self> {
		if text.is_empty() {
			return None;
		}
		if let Some(captures) = LINK_RE.captures(text) {
			return Some(Self(captures[1].to_ascii_uppercase()));
		}
		BARE_RE
			.captures(text)
			.map(|captures| Self(captures[1].to_ascii_uppercase()))
	}

	/// Returns the code as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TrackingCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Identifier of an external text-bearing state a tracking code can be read
/// from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
	/// Creates an entity identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the identifier as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for EntityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Where the tracking code of a configured order comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
	/// A fixed code supplied at configuration time.
	Manual(TrackingCode),
	/// A code resolved on every tick from the referenced external state.
	EntityLinked(EntityId),
}
