//! Markup assertions for tests of code built on fluent-html.
//!
//! ```rust,ignore
//! use fluent_html::testing::assert_html_eq;
//!
//! assert_html_eq!("<p> a b </p>", Node::create("p", ("a", "b"), ()));
//! ```

pub use fluent_html_testkit::{
	assert_html_content_eq, assert_html_eq, comparable_html, content_html, html_eq, tree_html,
};
