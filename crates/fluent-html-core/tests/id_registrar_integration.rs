//! Id Registrar Integration Tests
//!
//! Trees without their own registrar share the process-wide default. Every
//! test here swaps in a fresh default and runs serially.

use fluent_html_core::{IdRegistrar, Node};
use rstest::*;
use serial_test::serial;

/// Installs a fresh default registrar and restores the previous one on drop.
struct FreshGlobal {
	previous: Option<IdRegistrar>,
	current: IdRegistrar,
}

impl FreshGlobal {
	fn install() -> Self {
		let current = IdRegistrar::new();
		let previous = IdRegistrar::replace_global(current.clone());
		Self {
			previous: Some(previous),
			current,
		}
	}
}

impl Drop for FreshGlobal {
	fn drop(&mut self) {
		if let Some(previous) = self.previous.take() {
			IdRegistrar::replace_global(previous);
		}
	}
}

#[fixture]
fn fresh_global() -> FreshGlobal {
	FreshGlobal::install()
}

#[rstest]
#[serial(global_registrar)]
fn test_separate_trees_share_default(fresh_global: FreshGlobal) {
	// Arrange
	let first = Node::element("div");
	let second = Node::element("div");

	// Act
	let first_id = first.get_id(Some("panel")).unwrap();
	let second_id = second.get_id(Some("panel")).unwrap();

	// Assert
	assert_eq!(first_id, "panel");
	assert_eq!(second_id, "panel2");
	assert!(first.id_registrar(None).ptr_eq(&fresh_global.current));
	assert!(fresh_global.current.exists("panel2"));
}

#[rstest]
#[serial(global_registrar)]
fn test_explicit_registrar_is_isolated(fresh_global: FreshGlobal) {
	// Arrange
	let shared = Node::element("div");
	let isolated = Node::element("div");
	isolated.id_registrar(Some(IdRegistrar::new()));

	// Act
	shared.get_id(Some("item")).unwrap();
	let id = isolated.get_id(Some("item")).unwrap();

	// Assert
	assert_eq!(id, "item");
	assert_eq!(fresh_global.current.len(), 1);
}

#[rstest]
#[serial(global_registrar)]
fn test_default_ids_use_kind(fresh_global: FreshGlobal) {
	// Arrange
	let plain = Node::element("p");
	let panel = Node::element("div").with_kind("Panel");

	// Act
	let plain_ids = [plain.get_id(None).unwrap(), Node::element("p").get_id(None).unwrap()];
	let panel_id = panel.get_id(None).unwrap();

	// Assert
	assert_eq!(plain_ids, ["Node1".to_owned(), "Node2".to_owned()]);
	assert_eq!(panel_id, "Panel1");
	assert_eq!(fresh_global.current.len(), 3);
}

#[rstest]
#[serial(global_registrar)]
fn test_replaced_default_only_affects_new_trees(fresh_global: FreshGlobal) {
	// Arrange
	let early = Node::element("div");
	early.get_id(Some("a")).unwrap();

	// Act
	let next = IdRegistrar::new();
	IdRegistrar::replace_global(next.clone());
	let late = Node::element("div");
	let late_id = late.get_id(Some("a")).unwrap();
	let early_child = early.append_child("p", (), ());
	let early_child_id = early_child.get_id(Some("a")).unwrap();

	// Assert
	assert_eq!(late_id, "a");
	assert_eq!(early_child_id, "a2");
	assert!(early.id_registrar(None).ptr_eq(&fresh_global.current));
	assert!(next.exists("a"));
	assert!(!next.exists("a2"));
}
