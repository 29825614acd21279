//! Fluent HTML element trees with deferred evaluation.
//!
//! Build a tree of [`Node`]s through chained calls. Tag names, attributes,
//! contents and display conditions can all be [deferred](Value::deferred):
//! closures that receive the node and are resolved only when the tree is
//! read or rendered.
//!
//! ## Modules
//!
//! - [`value`]: the [`Value`] type stored in every node field
//! - [`eval`]: recursive resolution of deferred values
//! - [`registrar`]: collision-free `id` values per tree
//! - [`markup`]: HTML serialization and [`MarkupOptions`]
//! - [`factory`]: named element constructors shared by a tree
//!
//! ## Example
//!
//! ```ignore
//! use fluent_html_core::{Node, Value, items};
//!
//! let list = Node::element("ul");
//! list.with_content_wrapped_in(vec!["One", "", "Three"], "li", ());
//! list
//! 	.insert_after("p", "Nothing selected", ())
//! 	.only_displayed_if(Value::deferred(|node: &Node| node.parent().is_some()));
//!
//! assert_eq!(
//! 	list.to_string(),
//! 	"<ul>\n<li>One</li>\n<li>Three</li>\n</ul>\n<p>Nothing selected</p>"
//! );
//! ```

pub mod error;
pub mod eval;
pub mod factory;
pub mod markup;
pub mod node;
pub mod registrar;
pub mod value;

pub use error::{HtmlError, HtmlResult};
pub use eval::evaluate;
pub use factory::{ElementConstructor, ElementFactory};
pub use markup::{MarkupOptions, escape_html};
pub use node::{AttachCallback, DEFAULT_KIND, Node};
pub use registrar::IdRegistrar;
pub use value::{Key, Producer, RawHtml, ToHtml, Value, ValueMap, flatten};
