//! Named element constructors shared by a tree.
//!
//! A factory attached to a node with [`Node::with_factory`] is inherited by
//! every descendant, so custom elements can create their companion elements
//! by name through [`Node::create_instance_of`] without knowing their types.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{HtmlError, HtmlResult};
use crate::node::Node;

/// Constructor registered in an [`ElementFactory`].
///
/// Receives the node that requested the new element.
pub type ElementConstructor = dyn Fn(&Node) -> HtmlResult<Node>;

/// Registry of element constructors by logical name.
#[derive(Clone, Default)]
pub struct ElementFactory {
	constructors: Rc<HashMap<String, Rc<ElementConstructor>>>,
}

impl ElementFactory {
	/// Creates an empty factory.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a constructor, replacing any previous one with the same name.
	///
	/// ```ignore
	/// let factory = ElementFactory::new()
	/// 	.register("Panel", |_| Ok(Node::element("div").with_class("panel")))
	/// 	.register("PanelBody", |_| Ok(Node::element("div").with_class("panel-body")));
	/// ```
	pub fn register<F>(mut self, name: impl Into<String>, constructor: F) -> Self
	where
		F: Fn(&Node) -> HtmlResult<Node> + 'static,
	{
		Rc::make_mut(&mut self.constructors).insert(name.into(), Rc::new(constructor));
		self
	}

	/// Returns `true` if `name` is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.constructors.contains_key(name)
	}

	/// Registered names, in no particular order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.constructors.keys().map(String::as_str)
	}

	/// Runs the constructor registered under `name`.
	///
	/// # Errors
	///
	/// Returns [`HtmlError::UnknownElement`] if `name` isn't registered, or
	/// the constructor's own error.
	pub fn create(&self, name: &str, requester: &Node) -> HtmlResult<Node> {
		let constructor = self
			.constructors
			.get(name)
			.ok_or_else(|| HtmlError::UnknownElement(name.to_owned()))?;
		constructor(requester)
	}
}

impl fmt::Debug for ElementFactory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.names().collect();
		names.sort_unstable();
		f.debug_struct("ElementFactory")
			.field("names", &names)
			.finish()
	}
}
