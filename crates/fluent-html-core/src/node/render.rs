//! Rendering a node and its subtree.

use std::fmt;

use tracing::warn;

use super::Node;
use crate::error::{HtmlError, HtmlResult};
use crate::eval::{evaluate, evaluate_map};
use crate::markup::{MarkupOptions, contents_markup, element_markup, flatten_attributes};
use crate::value::{ToHtml, Value, ValueMap, flatten};

impl Node {
	/// Renders this node's subtree with default options.
	///
	/// Never fails: a node whose producers fail renders as an HTML comment
	/// naming the error, and the rest of the document is unaffected.
	pub fn render(&self) -> String {
		self.render_with(&MarkupOptions::default())
	}

	/// Renders this node's subtree with `options`.
	pub fn render_with(&self, options: &MarkupOptions) -> String {
		match self.try_render_with(options) {
			Ok(html) => html,
			Err(error) => {
				warn!(kind = %self.kind(), %error, "element replaced by a diagnostic comment");
				format!("<!-- {} in Node::render: {} -->", error.kind(), error)
			}
		}
	}

	/// Renders this node's subtree, returning the first error instead of a comment.
	///
	/// Errors inside child nodes are still contained by those children.
	pub fn try_render_with(&self, options: &MarkupOptions) -> HtmlResult<String> {
		if !self.will_render()? {
			return Ok(String::new());
		}

		let contents = self.resolve_contents()?;
		for node in contents.values().filter_map(Value::as_node) {
			if node.is_self_or_ancestor_of(self) {
				return Err(HtmlError::producer(
					"a producer returned an element that contains the element being rendered",
				));
			}
			if !node.has_parent() {
				node.set_parent(self);
			}
		}

		let tag = self.0.borrow().tag.clone();
		let tag = evaluate(&tag, self)?;
		if !tag.is_truthy() {
			return Ok(contents_markup(&contents, options));
		}

		let attributes = self.0.borrow().attributes.clone();
		let attributes = flatten_attributes(&Value::List(evaluate_map(&attributes, self)?));
		Ok(element_markup(&tag.to_text(), &attributes, &contents, options))
	}

	/// Returns `true` if the contents that would be rendered (the default
	/// contents when the contents resolve to an empty list) produce markup.
	pub fn has_content(&self) -> HtmlResult<bool> {
		let contents = self.resolve_contents()?;
		Ok(!contents_markup(&contents, &MarkupOptions::default()).is_empty())
	}

	/// Resolved, flattened contents, falling back to the default contents.
	fn resolve_contents(&self) -> HtmlResult<ValueMap> {
		let contents = self.0.borrow().contents.clone();
		let mut resolved = evaluate_map(&contents, self)?;
		if resolved.is_empty() {
			let default_contents = self.0.borrow().default_contents.clone();
			resolved = evaluate_map(&default_contents, self)?;
		}
		Ok(flatten(&Value::List(resolved)))
	}
}

impl ToHtml for Node {
	fn to_html(&self) -> String {
		self.render()
	}
}

/// Renders the whole tree this node belongs to, from its root.
impl fmt::Display for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.root().render())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::items;
	use insta::assert_snapshot;
	use rstest::rstest;

	#[rstest]
	fn test_producer_error_becomes_comment() {
		// Arrange
		let root = Node::element("div");
		root.append_child("p", "ok", ());
		root.append_child(
			"p",
			Value::try_deferred(|_: &Node| -> HtmlResult<Value> { Err(HtmlError::producer("no data")) }),
			(),
		);

		// Act
		let html = root.render();

		// Assert
		assert_snapshot!(html, @r"
		<div>
		<p>ok</p>
		<!-- ProducerError in Node::render: no data -->
		</div>
		");
	}

	#[rstest]
	fn test_try_render_reports_own_error() {
		// Arrange
		let node = Node::element(Value::try_deferred(|_: &Node| -> HtmlResult<Value> {
			Err(HtmlError::invalid_argument("bad tag"))
		}));

		// Act
		let result = node.try_render_with(&MarkupOptions::default());

		// Assert
		assert_eq!(result, Err(HtmlError::invalid_argument("bad tag")));
	}

	#[rstest]
	fn test_produced_nodes_get_lazy_parent() {
		// Arrange
		let child = Node::element("span");
		let handle = child.clone();
		let root = Node::element("div").with_content(Value::deferred(move |_: &Node| handle.clone()));

		// Act
		let html = root.render();

		// Assert
		assert_eq!(html, "<div><span></span></div>");
		assert_eq!(child.parent(), Some(root.clone()));
		assert_eq!(root.content_count(), 1);
	}

	#[rstest]
	fn test_producer_returning_ancestor_is_contained() {
		// Arrange
		let root = Node::element("div");
		let handle = root.clone();
		root.append_child("p", Value::deferred(move |_: &Node| handle.clone()), ());

		// Act
		let html = root.render();

		// Assert
		assert!(html.starts_with("<div>\n<!-- ProducerError in Node::render:"));
		assert!(html.ends_with("-->\n</div>"));
	}

	#[rstest]
	fn test_default_contents_used_when_contents_resolve_empty() {
		// Arrange
		let node = Node::element("p")
			.with_content(Value::deferred(|_: &Node| Value::list(Vec::<Value>::new())))
			.with_default_content("fallback");

		// Act & Assert
		assert_eq!(node.render(), "<p>fallback</p>");
		assert!(node.has_content().unwrap());
	}

	#[rstest]
	fn test_default_contents_skipped_when_contents_resolve_blank_text() {
		// Arrange
		let node = Node::element("p")
			.with_content(Value::deferred(|_: &Node| ""))
			.with_default_content("fallback");

		// Act & Assert
		assert_eq!(node.render(), "<p></p>");
		assert!(!node.has_content().unwrap());
	}

	#[rstest]
	fn test_display_renders_from_root() {
		// Arrange
		let root = Node::element("div");
		let child = root.append_child("p", "x", items!["class" => "c"]);

		// Act & Assert
		assert_eq!(child.to_string(), "<div><p class=\"c\">x</p></div>");
		assert_eq!(child.render(), "<p class=\"c\">x</p>");
		assert_eq!(child.to_html(), child.render());
	}

	#[rstest]
	fn test_render_with_options_reaches_descendants() {
		// Arrange
		let root = Node::element("div").with_attribute("title", "t");
		root.append_child("p", "<b>", items!["title" => "u"]);
		let options = MarkupOptions::new().unescaped().quote('\'');

		// Act
		let html = root.render_with(&options);

		// Assert
		assert_eq!(html, "<div title='t'><p title='u'><b></p></div>");
	}
}
