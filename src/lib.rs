//! # fluent-html
//!
//! Build HTML element trees through chained calls, with tag names,
//! attributes, contents and display conditions resolved lazily at render time.
//!
//! ## Feature Flags
//!
//! - `testing` (default) - whitespace-insensitive markup assertions in [`testing`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use fluent_html::{Node, Value, items};
//!
//! let input = Node::create("input", (), items!["type" => "email", "name" => "email"]);
//! let group = input
//! 	.wrap_siblings("div", items!["class" => "form-group"])
//! 	.with_class(items!["has-error" => Value::deferred(|_: &Node| has_errors())]);
//! input.insert_before("label", "E-mail", items!["for" => Value::try_deferred({
//! 	let input = input.clone();
//! 	move |_: &Node| input.get_id(Some("email"))
//! })]);
//!
//! println!("{group}");
//! ```

pub use fluent_html_core::{
	AttachCallback, DEFAULT_KIND, ElementConstructor, ElementFactory, HtmlError, HtmlResult,
	IdRegistrar, Key, MarkupOptions, Node, Producer, RawHtml, ToHtml, Value, ValueMap,
	escape_html, evaluate, flatten, items,
};

/// Serialization of resolved values without a node tree.
pub mod markup {
	pub use fluent_html_core::markup::{
		VOID_ELEMENTS, build_attributes, build_contents, build_element, escape_html,
		flatten_attribute_value, flatten_attributes, is_void_element,
	};
}

#[cfg(feature = "testing")]
pub mod testing;
