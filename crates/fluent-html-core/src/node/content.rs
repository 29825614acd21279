//! Content, attribute and tree-shape mutations.

use std::rc::Rc;

use tracing::debug;

use super::{Node, NodeData};
use crate::value::{Key, Value, ValueMap, flatten};

impl Node {
	// ------------------------------------------------------------------
	// Contents
	// ------------------------------------------------------------------

	/// Appends contents.
	///
	/// Nested lists are flattened, null, boolean and empty-string items are
	/// dropped, and nodes that already have a parent are copied before they
	/// are attached.
	pub fn with_content(&self, items: impl Into<Value>) -> Self {
		let prepared = self.prepare(items.into());
		self.0.borrow_mut().contents.merge(prepared);
		self.clone()
	}

	/// Alias of [`Node::with_content`].
	pub fn with_appended_content(&self, items: impl Into<Value>) -> Self {
		self.with_content(items)
	}

	/// Inserts contents before the existing ones.
	pub fn with_prepended_content(&self, items: impl Into<Value>) -> Self {
		let mut prepared = self.prepare(items.into());
		let mut data = self.0.borrow_mut();
		prepared.merge(data.contents.take());
		data.contents = prepared;
		drop(data);
		self.clone()
	}

	/// Replaces the contents rendered when the regular contents resolve empty.
	pub fn with_default_content(&self, items: impl Into<Value>) -> Self {
		let prepared = self.prepare(items.into());
		self.0.borrow_mut().default_contents = prepared;
		self.clone()
	}

	/// Appends markup that is not escaped.
	pub fn with_raw_html_content(&self, html: impl Into<String>) -> Self {
		self.with_content(Value::raw(html))
	}

	/// Appends each item wrapped in its own element.
	///
	/// Wrappers only render while their item has content.
	pub fn with_content_wrapped_in(
		&self,
		items: impl Into<Value>,
		tag: impl Into<Value>,
		attributes: impl Into<Value>,
	) -> Self {
		let tag = tag.into();
		let attributes = attributes.into();
		for (_, item) in flatten(&items.into()) {
			let wrapper =
				Node::create(tag.clone(), item, attributes.clone()).only_displayed_if_has_content();
			self.with_content(wrapper);
		}
		self.clone()
	}

	pub(crate) fn clear_contents(&self) -> Self {
		self.0.borrow_mut().contents = ValueMap::new();
		self.clone()
	}

	// ------------------------------------------------------------------
	// Attributes
	// ------------------------------------------------------------------

	/// Sets one attribute, replacing any previous value.
	///
	/// `true` renders a bare attribute; `false` and null omit it.
	pub fn with_attribute(&self, name: &str, value: impl Into<Value>) -> Self {
		self.0.borrow_mut().attributes.put(name, value);
		self.clone()
	}

	/// Merges attributes.
	///
	/// A string sets a flag attribute of that name, a list is merged (named
	/// entries override, positional entries become flags at render), and a
	/// producer is stored to be merged when resolved.
	pub fn with_attributes(&self, attributes: impl Into<Value>) -> Self {
		{
			let mut data = self.0.borrow_mut();
			match attributes.into() {
				Value::Null => {}
				Value::Str(name) => data.attributes.put(name, true),
				Value::List(map) => data.attributes.merge(map),
				other => data.attributes.push(other),
			}
		}
		self.clone()
	}

	/// Omits the named attributes from rendering.
	pub fn without_attribute(&self, names: impl Into<Value>) -> Self {
		let names = flatten(&names.into());
		{
			let mut data = self.0.borrow_mut();
			for name in names.values() {
				data.attributes.put(name.to_text(), false);
			}
		}
		self.clone()
	}

	/// Adds class tokens after the existing ones.
	///
	/// Named entries are conditional: `"active" => flag` renders `active` only while `flag` is truthy.
	pub fn with_class(&self, tokens: impl Into<Value>) -> Self {
		let tokens = flatten(&tokens.into());
		{
			let mut data = self.0.borrow_mut();
			let mut classes = raw_classes(&data);
			classes.merge(tokens);
			data.attributes.put("class", classes);
		}
		self.clone()
	}

	/// Removes literal class tokens.
	pub fn without_class(&self, tokens: impl Into<Value>) -> Self {
		let tokens = flatten(&tokens.into());
		{
			let mut data = self.0.borrow_mut();
			let mut classes = raw_classes(&data);
			classes.remove_values(&tokens);
			data.attributes.put("class", classes);
		}
		self.clone()
	}

	// ------------------------------------------------------------------
	// Display conditions and callbacks
	// ------------------------------------------------------------------

	/// Adds a condition that must resolve truthy for the node to render.
	///
	/// A null condition never holds.
	pub fn only_displayed_if(&self, condition: impl Into<Value>) -> Self {
		let condition = match condition.into() {
			Value::Null => Value::Bool(false),
			condition => condition,
		};
		self.0.borrow_mut().conditions.push(condition);
		self.clone()
	}

	/// Renders the node only when it has content.
	pub fn only_displayed_if_has_content(&self) -> Self {
		self.only_displayed_if(Value::try_deferred(|node: &Node| node.has_content()))
	}

	/// Registers a callback run each time this node is attached under a parent.
	pub fn after_attach(&self, callback: impl Fn(&Node) + 'static) -> Self {
		self.0.borrow_mut().after_attach.push(Rc::new(callback));
		self.clone()
	}

	// ------------------------------------------------------------------
	// New elements relative to this one
	// ------------------------------------------------------------------

	/// Adds a new element last among this node's contents and returns it.
	pub fn append_child(
		&self,
		tag: impl Into<Value>,
		contents: impl Into<Value>,
		attributes: impl Into<Value>,
	) -> Node {
		let child = Node::create(tag, contents, attributes);
		self.with_content(&child);
		child
	}

	/// Alias of [`Node::append_child`].
	pub fn containing_element(
		&self,
		tag: impl Into<Value>,
		contents: impl Into<Value>,
		attributes: impl Into<Value>,
	) -> Node {
		self.append_child(tag, contents, attributes)
	}

	/// Adds a new element first among this node's contents and returns it.
	pub fn prepend_child(
		&self,
		tag: impl Into<Value>,
		contents: impl Into<Value>,
		attributes: impl Into<Value>,
	) -> Node {
		let child = Node::create(tag, contents, attributes);
		self.with_prepended_content(&child);
		child
	}

	/// Adds a new element right after this one and returns it.
	pub fn insert_after(
		&self,
		tag: impl Into<Value>,
		contents: impl Into<Value>,
		attributes: impl Into<Value>,
	) -> Node {
		let sibling = Node::create(tag, contents, attributes);
		self.insert_siblings_after(&sibling);
		sibling
	}

	/// Adds a new element right before this one and returns it.
	pub fn insert_before(
		&self,
		tag: impl Into<Value>,
		contents: impl Into<Value>,
		attributes: impl Into<Value>,
	) -> Node {
		let sibling = Node::create(tag, contents, attributes);
		self.insert_siblings_before(&sibling);
		sibling
	}

	/// Inserts contents right after this node in its parent.
	///
	/// A root gets a transparent parent first. If this node isn't stored in
	/// its parent's contents, the items are appended.
	pub fn insert_siblings_after(&self, items: impl Into<Value>) -> Self {
		let parent = self.get_or_create_parent();
		let prepared = parent.prepare(items.into());
		let offset = self
			.offset_in(&parent)
			.map_or_else(|| parent.content_count(), |offset| offset + 1);
		parent.0.borrow_mut().contents.splice(offset, prepared);
		self.clone()
	}

	/// Inserts contents right before this node in its parent.
	///
	/// If this node isn't stored in its parent's contents, the items are prepended.
	pub fn insert_siblings_before(&self, items: impl Into<Value>) -> Self {
		let parent = self.get_or_create_parent();
		let prepared = parent.prepare(items.into());
		let offset = self.offset_in(&parent).unwrap_or(0);
		parent.0.borrow_mut().contents.splice(offset, prepared);
		self.clone()
	}

	/// Wraps this node in a new element that takes its place, and returns the wrapper.
	///
	/// The node itself is moved, not copied. A node that its parent only
	/// reaches through a producer is moved under the wrapper, and the wrapper
	/// stays a root.
	pub fn wrap_self(&self, tag: impl Into<Value>, attributes: impl Into<Value>) -> Node {
		let wrapper = Node::create(tag, Value::Null, attributes);
		let parent = self.parent();
		let slot = parent.as_ref().and_then(|parent| self.offset_in(parent));
		self.detach();
		wrapper.with_content(self);
		if let (Some(parent), Some(slot)) = (parent, slot) {
			wrapper.join_tree_of(&parent);
			parent
				.0
				.borrow_mut()
				.contents
				.replace_at(slot, Value::Node(wrapper.stored()));
			wrapper.set_parent(&parent);
		}
		wrapper
	}

	/// Moves every item of the nearest named ancestor into a new element, and returns it.
	///
	/// The wrapper becomes the ancestor's only content. A root is first given
	/// a transparent parent.
	pub fn wrap_siblings(&self, tag: impl Into<Value>, attributes: impl Into<Value>) -> Node {
		let parent = self.siblings_common_parent();
		let siblings = parent.0.borrow_mut().contents.take();
		for sibling in siblings.values().filter_map(Value::as_node) {
			sibling.detach();
		}
		let wrapper = Node::create(tag, siblings, attributes);
		parent.clear_contents().with_content(&wrapper);
		wrapper
	}

	/// Returns a deep copy of this subtree without a parent.
	///
	/// Ids set on the copied nodes are issued again from this tree's
	/// registrar, which the copy keeps, so inserting the copy back into this
	/// tree never repeats an id.
	pub fn duplicate(&self) -> Node {
		let mut reissue = Vec::new();
		let copy = self.copy_detached(&mut reissue);
		if !reissue.is_empty() {
			let registrar = self.id_registrar(None);
			copy.0.borrow_mut().registrar.get_or_insert(registrar);
		}
		for (node, id) in reissue {
			node.reissue_id(&id);
		}
		copy
	}

	// ------------------------------------------------------------------
	// Insertion
	// ------------------------------------------------------------------

	/// Flattens `items` and attaches the nodes among them to this node.
	pub(crate) fn prepare(&self, items: Value) -> ValueMap {
		let mut prepared = ValueMap::new();
		for (key, item) in flatten(&items) {
			match item {
				Value::Null | Value::Bool(_) => {}
				Value::Str(ref text) if text.is_empty() => {}
				Value::Node(node) => prepared.insert(key, Value::Node(self.adopt(node).stored())),
				item => prepared.insert(key, item),
			}
		}
		prepared
	}

	/// Attaches `node` under this node, copying it if it is already in a tree
	/// or if attaching it would form a cycle.
	fn adopt(&self, node: Node) -> Node {
		if !node.has_parent() && !node.is_self_or_ancestor_of(self) {
			node.join_tree_of(self);
			node.set_parent(self);
			return node;
		}

		debug!(kind = %node.kind(), "copying a node that already has a parent");
		let mut reissue = Vec::new();
		let copy = node.copy_detached(&mut reissue);
		copy.join_tree_of(self);
		copy.set_parent(self);
		for (copied, id) in reissue {
			copied.reissue_id(&id);
		}
		copy
	}

	/// Copies this subtree, collecting `(copy, id)` pairs for ids to re-issue.
	///
	/// Copies keep their attach callbacks and display conditions but not the
	/// parent link or an explicit `id`.
	fn copy_detached(&self, reissue: &mut Vec<(Node, String)>) -> Node {
		let explicit_id = self.explicit_id();
		let (shell, contents, default_contents) = {
			let data = self.0.borrow();
			let mut attributes = data.attributes.clone();
			if attributes.get("id").is_some() {
				attributes.put("id", false);
			}
			let shell = NodeData {
				kind: data.kind.clone(),
				tag: data.tag.clone(),
				attributes,
				conditions: data.conditions.clone(),
				registrar: data.registrar.clone(),
				factory: data.factory.clone(),
				after_attach: data.after_attach.clone(),
				..NodeData::default()
			};
			(shell, data.contents.clone(), data.default_contents.clone())
		};

		let copy = Node::planted(shell);
		let contents = copy.adopt_copies(contents, reissue);
		let default_contents = copy.adopt_copies(default_contents, reissue);
		{
			let mut data = copy.0.borrow_mut();
			data.contents = contents;
			data.default_contents = default_contents;
		}
		if let Some(id) = explicit_id {
			reissue.push((copy.clone(), id));
		}
		copy
	}

	fn adopt_copies(&self, items: ValueMap, reissue: &mut Vec<(Node, String)>) -> ValueMap {
		let mut adopted = ValueMap::new();
		for (key, item) in items {
			let item = match item {
				Value::Node(child) => {
					let copy = child.copy_detached(reissue);
					copy.join_tree_of(self);
					copy.set_parent(self);
					Value::Node(copy.stored())
				}
				item => item,
			};
			adopted.push_entry(key, item);
		}
		adopted
	}
}

/// The stored `class` value as a list.
fn raw_classes(data: &NodeData) -> ValueMap {
	match data.attributes.get("class") {
		None | Some(Value::Null) => ValueMap::new(),
		Some(Value::List(classes)) => classes.clone(),
		Some(other) => ValueMap::from_entries([(Key::Pos, other.clone())]),
	}
}
