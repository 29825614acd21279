//! Collision-free `id` values shared by all nodes of a tree.
//!
//! Each tree resolves one [`IdRegistrar`] at its root. Trees that never get
//! an explicit registrar share the process-wide default returned by
//! [`IdRegistrar::global`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::error::{HtmlError, HtmlResult};

/// Process-wide default registrar, created on first use.
static GLOBAL_REGISTRAR: Lazy<RwLock<IdRegistrar>> =
	Lazy::new(|| RwLock::new(IdRegistrar::new()));

/// Issues identifiers that are unique within its scope.
///
/// Clones share the same set of issued identifiers.
#[derive(Clone, Default)]
pub struct IdRegistrar {
	issued: Arc<Mutex<HashSet<String>>>,
}

impl IdRegistrar {
	/// Creates an empty registrar.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the process-wide default registrar.
	pub fn global() -> Self {
		GLOBAL_REGISTRAR.read().clone()
	}

	/// Substitutes the process-wide default registrar, returning the previous one.
	///
	/// Trees that already resolved the previous default keep using it.
	pub fn replace_global(registrar: IdRegistrar) -> IdRegistrar {
		std::mem::replace(&mut *GLOBAL_REGISTRAR.write(), registrar)
	}

	/// Registers `desired`, or the first free variant of it, and returns it.
	///
	/// A taken identifier has its trailing number incremented (`a` becomes
	/// `a2`, `a2` becomes `a3`, `a1a` becomes `a1a2`) until a free one is found.
	///
	/// # Errors
	///
	/// Returns [`HtmlError::InvalidArgument`] if `desired` is empty.
	pub fn unique(&self, desired: &str) -> HtmlResult<String> {
		if desired.is_empty() {
			return Err(HtmlError::invalid_argument(
				"an id can't be registered from an empty string",
			));
		}

		let mut issued = self.issued.lock();
		let mut candidate = desired.to_owned();
		while issued.contains(&candidate) {
			let next = next_candidate(&candidate);
			trace!(taken = %candidate, next = %next, "id already issued");
			candidate = next;
		}
		issued.insert(candidate.clone());
		Ok(candidate)
	}

	/// Returns `true` if `id` has been issued.
	pub fn exists(&self, id: &str) -> bool {
		self.issued.lock().contains(id)
	}

	/// Number of issued identifiers.
	pub fn len(&self) -> usize {
		self.issued.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns `true` if both handles share the same registrar.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.issued, &other.issued)
	}
}

impl fmt::Debug for IdRegistrar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("IdRegistrar")
			.field("issued", &self.len())
			.finish()
	}
}

/// Splits `id` into a base and its trailing digits and increments the number.
///
/// The base keeps at least one character, so `"5"` continues as `"52"`.
fn next_candidate(id: &str) -> String {
	let split = id
		.char_indices()
		.rev()
		.find(|(_, c)| !c.is_ascii_digit())
		.map_or(1, |(index, c)| index + c.len_utf8());
	let (base, digits) = id.split_at(split.min(id.len()));
	let number = digits.parse::<u64>().unwrap_or(0);
	format!("{base}{}", number.max(1).saturating_add(1))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	fn test_unique_sequence() {
		// Arrange
		let registrar = IdRegistrar::new();

		// Act
		let issued: Vec<String> = ["a", "a", "a1", "a", "a3", "a11", "a11"]
			.into_iter()
			.map(|desired| registrar.unique(desired))
			.collect::<HtmlResult<_>>()
			.unwrap();

		// Assert
		assert_eq!(issued, vec!["a", "a2", "a1", "a3", "a4", "a11", "a12"]);
	}

	#[rstest]
	fn test_only_trailing_digits_count() {
		// Arrange
		let registrar = IdRegistrar::new();

		// Act
		let first = registrar.unique("a1a").unwrap();
		let second = registrar.unique("a1a").unwrap();
		let third = registrar.unique("a1a2").unwrap();

		// Assert
		assert_eq!((first.as_str(), second.as_str(), third.as_str()), ("a1a", "a1a2", "a1a3"));
	}

	#[rstest]
	fn test_empty_id_is_rejected() {
		// Arrange
		let registrar = IdRegistrar::new();

		// Act
		let result = registrar.unique("");

		// Assert
		assert!(matches!(result, Err(HtmlError::InvalidArgument(_))));
		assert!(registrar.is_empty());
	}

	#[rstest]
	fn test_exists_only_after_issue() {
		// Arrange
		let registrar = IdRegistrar::new();

		// Act
		registrar.unique("b").unwrap();
		registrar.unique("b").unwrap();

		// Assert
		assert!(registrar.exists("b"));
		assert!(registrar.exists("b2"));
		assert!(!registrar.exists("b3"));
		assert_eq!(registrar.len(), 2);
	}

	#[rstest]
	#[case("a", "a2")]
	#[case("a1", "a2")]
	#[case("a9", "a10")]
	#[case("a01", "a2")]
	#[case("5", "52")]
	#[case("123", "124")]
	#[case("é", "é2")]
	fn test_next_candidate(#[case] id: &str, #[case] expected: &str) {
		// Act & Assert
		assert_eq!(next_candidate(id), expected);
	}

	#[rstest]
	fn test_clones_share_issued_ids() {
		// Arrange
		let registrar = IdRegistrar::new();
		let shared = registrar.clone();

		// Act
		registrar.unique("x").unwrap();

		// Assert
		assert!(shared.exists("x"));
		assert!(shared.ptr_eq(&registrar));
		assert!(!shared.ptr_eq(&IdRegistrar::new()));
	}

	#[rstest]
	#[serial(global_registrar)]
	fn test_replace_global() {
		// Arrange
		let replacement = IdRegistrar::new();

		// Act
		let previous = IdRegistrar::replace_global(replacement.clone());
		let current = IdRegistrar::global();
		IdRegistrar::replace_global(previous);

		// Assert
		assert!(current.ptr_eq(&replacement));
	}
}
