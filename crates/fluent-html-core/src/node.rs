//! Element tree nodes.
//!
//! A [`Node`] is a cheap handle to one element (or one transparent grouping
//! when it has no tag name). Every field holds a [`Value`] that may be
//! deferred, so the document is only resolved when it is read or rendered.
//!
//! ## Ownership
//!
//! A node's content list owns its children; the link from a child to its
//! parent is weak. Inserting a node that already has a parent inserts a deep
//! copy, so every node has at most one parent and the tree never shares
//! subtrees.
//!
//! Every handle also holds the tree it was taken from, and the tree holds its
//! root. Keeping any handle into a document keeps the whole document alive,
//! including a parent created on behalf of a root (by
//! [`Node::get_or_create_parent`] or by wrapping a root). When a tree's root is
//! attached under another tree, the old tree forwards to the new one. Nodes
//! and trees never point at each other strongly, so a document is freed once
//! its last handle is dropped.
//!
//! Nodes are not `Send`: a tree is built and rendered on one thread.
//!
//! ## Example
//!
//! ```ignore
//! use fluent_html_core::{Node, Value, items};
//!
//! let input = Node::create("input", (), items!["type" => "text", "name" => "email"]);
//! let group = input
//! 	.wrap_siblings("div", items!["class" => "form-group"])
//! 	.with_class(items!["has-error" => Value::deferred(|_| errors_present())]);
//! println!("{group}");
//! ```

mod content;
mod render;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::error::{HtmlError, HtmlResult};
use crate::eval::evaluate;
use crate::factory::ElementFactory;
use crate::markup::flatten_attribute_value;
use crate::registrar::IdRegistrar;
use crate::value::{Value, ValueMap};

/// Kind of a node that was not created through an [`ElementFactory`].
pub const DEFAULT_KIND: &str = "Node";

/// Callback run with the node each time it is attached under a parent.
pub type AttachCallback = Rc<dyn Fn(&Node)>;

pub(crate) struct NodeData {
	kind: String,
	tag: Value,
	attributes: ValueMap,
	contents: ValueMap,
	default_contents: ValueMap,
	conditions: Vec<Value>,
	parent: Weak<RefCell<NodeData>>,
	/// Tree this node currently belongs to.
	tree: Weak<Tree>,
	registrar: Option<IdRegistrar>,
	factory: Option<ElementFactory>,
	after_attach: Vec<AttachCallback>,
}

impl Default for NodeData {
	fn default() -> Self {
		Self {
			kind: DEFAULT_KIND.to_owned(),
			tag: Value::Null,
			attributes: ValueMap::new(),
			contents: ValueMap::new(),
			default_contents: ValueMap::new(),
			conditions: Vec::new(),
			parent: Weak::new(),
			tree: Weak::new(),
			registrar: None,
			factory: None,
			after_attach: Vec::new(),
		}
	}
}

/// Owner of a tree's root.
pub(crate) struct Tree {
	root: RefCell<TreeRoot>,
}

enum TreeRoot {
	Node(Rc<RefCell<NodeData>>),
	/// The root was attached under a node of this other tree.
	Joined(Rc<Tree>),
}

impl Tree {
	fn rooted_at(data: &Rc<RefCell<NodeData>>) -> Rc<Tree> {
		Rc::new(Tree {
			root: RefCell::new(TreeRoot::Node(Rc::clone(data))),
		})
	}

	fn joined(&self) -> Option<Rc<Tree>> {
		match &*self.root.borrow() {
			TreeRoot::Joined(next) => Some(Rc::clone(next)),
			TreeRoot::Node(_) => None,
		}
	}

	/// Follows forwards to the tree that owns the current root.
	fn resolve(self: &Rc<Self>) -> Rc<Tree> {
		let mut tree = Rc::clone(self);
		while let Some(next) = tree.joined() {
			tree = next;
		}
		tree
	}

	fn is_rooted_at(&self, data: &Rc<RefCell<NodeData>>) -> bool {
		matches!(&*self.root.borrow(), TreeRoot::Node(root) if Rc::ptr_eq(root, data))
	}
}

/// Handle to one element of a tree.
///
/// Cloning the handle does not copy the element; use [`Node::duplicate`] for
/// a deep copy. Two handles are equal when they point at the same element.
///
/// Handles stored in a content list leave the tree unset.
pub struct Node(Rc<RefCell<NodeData>>, Option<Rc<Tree>>);

impl Node {
	/// Creates a transparent node: no tag, no attributes, no contents.
	pub fn new() -> Self {
		Self::planted(NodeData::default())
	}

	/// Wraps `data` as the root of a new tree.
	pub(crate) fn planted(data: NodeData) -> Self {
		let data = Rc::new(RefCell::new(data));
		let tree = Tree::rooted_at(&data);
		data.borrow_mut().tree = Rc::downgrade(&tree);
		Self(data, Some(tree))
	}

	/// A handle to `data` that keeps its tree alive.
	fn from_data(data: Rc<RefCell<NodeData>>) -> Self {
		let tree = data.try_borrow().ok().and_then(|node| node.tree.upgrade());
		Self(data, tree)
	}

	/// Creates an empty element.
	pub fn element(tag: impl Into<Value>) -> Self {
		Self::new().with_tag(tag)
	}

	/// Creates an element with initial contents and attributes.
	///
	/// ```ignore
	/// let link = Node::create("a", "Home", items!["href" => "/"]);
	/// ```
	pub fn create(
		tag: impl Into<Value>,
		contents: impl Into<Value>,
		attributes: impl Into<Value>,
	) -> Self {
		Self::new()
			.with_tag(tag)
			.with_content(contents)
			.with_attributes(attributes)
	}

	/// Sets the tag name; a null, empty or `"0"` name makes the node transparent.
	pub fn with_tag(&self, tag: impl Into<Value>) -> Self {
		self.0.borrow_mut().tag = tag.into();
		self.clone()
	}

	/// Sets the logical kind, used for the default id.
	pub fn with_kind(&self, kind: impl Into<String>) -> Self {
		self.0.borrow_mut().kind = kind.into();
		self.clone()
	}

	/// Attaches an element factory, inherited by descendants.
	pub fn with_factory(&self, factory: ElementFactory) -> Self {
		self.0.borrow_mut().factory = Some(factory);
		self.clone()
	}

	pub fn kind(&self) -> String {
		self.0.borrow().kind.clone()
	}

	/// Returns `true` if a tag name (or a producer of one) is set.
	pub fn has_tag(&self) -> bool {
		self.0.borrow().tag.is_truthy()
	}

	/// Resolves the tag name; `None` for a transparent node.
	pub fn tag_name(&self) -> HtmlResult<Option<String>> {
		let tag = self.0.borrow().tag.clone();
		let tag = evaluate(&tag, self)?;
		Ok(tag.is_truthy().then(|| tag.to_text()))
	}

	// ------------------------------------------------------------------
	// Navigation
	// ------------------------------------------------------------------

	pub fn parent(&self) -> Option<Node> {
		self.0.borrow().parent.upgrade().map(Node::from_data)
	}

	pub fn has_parent(&self) -> bool {
		self.0.borrow().parent.strong_count() > 0
	}

	pub fn is_root(&self) -> bool {
		!self.has_parent()
	}

	/// Iterates from the parent up to the root.
	pub fn ancestors(&self) -> impl Iterator<Item = Node> {
		std::iter::successors(self.parent(), Node::parent)
	}

	/// Returns the top of this node's tree.
	pub fn root(&self) -> Node {
		self.ancestors().last().unwrap_or_else(|| self.clone())
	}

	/// Returns the parent, or a new transparent parent holding only this node.
	pub fn get_or_create_parent(&self) -> Node {
		if let Some(parent) = self.parent() {
			return parent;
		}
		Node::new().with_content(self)
	}

	/// Returns the nearest ancestor with a tag name.
	///
	/// Falls back to [`Node::get_or_create_parent`] when only transparent
	/// ancestors exist.
	pub fn siblings_common_parent(&self) -> Node {
		match self.parent() {
			Some(parent) if parent.has_tag() => parent,
			Some(parent) => parent.siblings_common_parent(),
			None => self.get_or_create_parent(),
		}
	}

	/// Returns the nearest ancestor matching `predicate`.
	pub fn ancestor_where(&self, predicate: impl Fn(&Node) -> bool) -> Option<Node> {
		self.ancestors().find(|ancestor| predicate(ancestor))
	}

	/// Returns the nearest ancestor of the given kind.
	pub fn ancestor_of_kind(&self, kind: &str) -> Option<Node> {
		self.ancestor_where(|ancestor| ancestor.0.borrow().kind == kind)
	}

	/// Returns the factory of this node or its nearest ancestor that has one.
	pub fn factory(&self) -> Option<ElementFactory> {
		std::iter::once(self.clone())
			.chain(self.ancestors())
			.find_map(|node| node.0.borrow().factory.clone())
	}

	/// Creates an element registered under `name` with a factory in this tree.
	///
	/// Factories are searched from this node upwards. The new element gets
	/// `name` as its kind, keeps the resolving factory and adopts the root's
	/// id registrar when the root has one.
	///
	/// # Errors
	///
	/// Returns [`HtmlError::UnknownElement`] if no factory provides `name`,
	/// or the constructor's own error.
	pub fn create_instance_of(&self, name: &str) -> HtmlResult<Node> {
		let factory = std::iter::once(self.clone())
			.chain(self.ancestors())
			.filter_map(|node| node.0.borrow().factory.clone())
			.find(|factory| factory.contains(name))
			.ok_or_else(|| HtmlError::UnknownElement(name.to_owned()))?;

		let instance = factory.create(name, self)?;
		{
			let mut data = instance.0.borrow_mut();
			if data.kind == DEFAULT_KIND {
				data.kind = name.to_owned();
			}
			if data.factory.is_none() {
				data.factory = Some(factory);
			}
		}

		let root = self.root();
		if root.has_id_registrar() {
			instance.id_registrar(Some(root.id_registrar(None)));
		}
		Ok(instance)
	}

	// ------------------------------------------------------------------
	// Queries
	// ------------------------------------------------------------------

	/// Resolves an attribute; [`Value::Null`] when it isn't set.
	pub fn get_attribute(&self, name: &str) -> HtmlResult<Value> {
		let raw = self.0.borrow().attributes.get(name).cloned();
		match raw {
			Some(value) => evaluate(&value, self),
			None => Ok(Value::Null),
		}
	}

	/// Returns `true` if the resolved `class` attribute contains `token`.
	pub fn has_class(&self, token: &str) -> HtmlResult<bool> {
		let classes = self.get_attribute("class")?;
		if !classes.is_truthy() {
			return Ok(false);
		}
		Ok(flatten_attribute_value("class", &classes)
			.split(' ')
			.any(|class| class == token))
	}

	/// Number of stored content items, unresolved.
	pub fn content_count(&self) -> usize {
		self.0.borrow().contents.len()
	}

	/// Returns `true` if every display condition resolves truthy.
	pub fn will_render(&self) -> HtmlResult<bool> {
		let conditions = self.0.borrow().conditions.clone();
		for condition in &conditions {
			if !evaluate(condition, self)?.is_truthy() {
				return Ok(false);
			}
		}
		Ok(true)
	}

	/// Returns the `id`, issuing one first if none is set.
	///
	/// A new id is derived from `desired`, or from the node's kind (`"{kind}1"`).
	pub fn get_id(&self, desired: Option<&str>) -> HtmlResult<String> {
		if !self.get_attribute("id")?.is_truthy() {
			let desired = match desired {
				Some(desired) if !desired.is_empty() => desired.to_owned(),
				_ => self.default_id(),
			};
			self.with_id(&desired)?;
		}
		Ok(self.get_attribute("id")?.to_text())
	}

	/// Sets the `id` to `desired`, or the first free variant in this tree's registrar.
	///
	/// # Errors
	///
	/// Returns [`HtmlError::InvalidArgument`] if `desired` is empty.
	pub fn with_id(&self, desired: &str) -> HtmlResult<Self> {
		let id = self.id_registrar(None).unique(desired)?;
		self.0.borrow_mut().attributes.put("id", id);
		Ok(self.clone())
	}

	fn default_id(&self) -> String {
		format!("{}1", self.0.borrow().kind)
	}

	/// Returns the tree's id registrar, initializing it at the root if needed.
	///
	/// An unset root adopts `adopt`, or the process-wide default when `None`.
	pub fn id_registrar(&self, adopt: Option<IdRegistrar>) -> IdRegistrar {
		let root = self.root();
		let mut data = root.0.borrow_mut();
		data.registrar
			.get_or_insert_with(|| adopt.unwrap_or_else(IdRegistrar::global))
			.clone()
	}

	/// Returns `true` if a registrar is set on this node itself.
	pub fn has_id_registrar(&self) -> bool {
		self.0.borrow().registrar.is_some()
	}

	// ------------------------------------------------------------------
	// Internals
	// ------------------------------------------------------------------

	/// Sets the parent link, moving this node's registrar up and running attach callbacks.
	pub(crate) fn set_parent(&self, parent: &Node) {
		let registrar = self.0.borrow_mut().registrar.take();
		if let Some(registrar) = registrar {
			debug!(kind = %self.kind(), "moving id registrar to the new parent's tree");
			parent.id_registrar(Some(registrar));
		}
		self.0.borrow_mut().parent = Rc::downgrade(&parent.0);

		let callbacks = self.0.borrow().after_attach.clone();
		for callback in &callbacks {
			callback(self);
		}
	}

	/// Moves this subtree into `parent`'s tree.
	///
	/// A tree rooted at this node is forwarded to `parent`'s tree, so handles
	/// taken before the move keep the new root alive.
	pub(crate) fn join_tree_of(&self, parent: &Node) {
		let target = parent.tree().resolve();
		let own = self.0.borrow().tree.upgrade();
		if let Some(own) = own {
			if own.is_rooted_at(&self.0) && !Rc::ptr_eq(&own, &target) {
				*own.root.borrow_mut() = TreeRoot::Joined(Rc::clone(&target));
			}
		}
		self.move_to_tree(&target);
	}

	fn move_to_tree(&self, tree: &Rc<Tree>) {
		let children: Vec<Node> = {
			let mut data = self.0.borrow_mut();
			data.tree = Rc::downgrade(tree);
			data.contents
				.values()
				.chain(data.default_contents.values())
				.filter_map(Value::as_node)
				.map(Node::stored)
				.collect()
		};
		for child in &children {
			child.move_to_tree(tree);
		}
	}

	/// The tree this handle keeps alive, falling back to the node's current tree.
	fn tree(&self) -> Rc<Tree> {
		if let Some(tree) = &self.1 {
			return Rc::clone(tree);
		}
		let current = self.0.borrow().tree.upgrade();
		current.unwrap_or_else(|| Tree::rooted_at(&self.0))
	}

	/// The form of this handle kept in a content list.
	pub(crate) fn stored(&self) -> Node {
		Node(Rc::clone(&self.0), None)
	}

	/// Clears the parent link without touching the parent's contents.
	pub(crate) fn detach(&self) {
		self.0.borrow_mut().parent = Weak::new();
	}

	/// Returns `true` if `self` is `other` or one of its ancestors.
	pub(crate) fn is_self_or_ancestor_of(&self, other: &Node) -> bool {
		self == other || other.ancestors().any(|ancestor| ancestor == *self)
	}

	/// The `id` set on this node, if it resolves truthy.
	pub(crate) fn explicit_id(&self) -> Option<String> {
		match self.get_attribute("id") {
			Ok(id) if id.is_truthy() => Some(id.to_text()),
			Ok(_) => None,
			Err(error) => {
				warn!(kind = %self.kind(), %error, "could not resolve id");
				None
			}
		}
	}

	/// Re-issues an id after a copy; failures are logged.
	pub(crate) fn reissue_id(&self, desired: &str) {
		if let Err(error) = self.with_id(desired) {
			warn!(kind = %self.kind(), %error, "could not re-issue id");
		}
	}

	pub(crate) fn offset_in(&self, parent: &Node) -> Option<usize> {
		parent
			.0
			.borrow()
			.contents
			.position(|item| item.as_node() == Some(self))
	}
}

impl Clone for Node {
	fn clone(&self) -> Self {
		match &self.1 {
			Some(tree) => Self(Rc::clone(&self.0), Some(Rc::clone(tree))),
			None => Self::from_data(Rc::clone(&self.0)),
		}
	}
}

impl Default for Node {
	fn default() -> Self {
		Self::new()
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for Node {}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let Ok(data) = self.0.try_borrow() else {
			return f.write_str("Node(<borrowed>)");
		};
		let attributes: Vec<_> = data.attributes.iter().map(|(key, _)| key.clone()).collect();
		let parent_tag = data
			.parent
			.upgrade()
			.and_then(|parent| parent.try_borrow().ok().map(|parent| parent.tag.clone()));
		let children = data.contents.values().filter(|item| item.as_node().is_some()).count();
		f.debug_struct("Node")
			.field("kind", &data.kind)
			.field("tag", &data.tag)
			.field("attributes", &attributes)
			.field("parent_tag", &parent_tag)
			.field("children", &children)
			.field("contents", &data.contents.len())
			.finish()
	}
}
