//! Markup comparison helpers for tests.
//!
//! Rendered markup puts elements on separate lines depending on their length,
//! so tests compare a normalized form instead: a space between adjacent tags
//! and every whitespace run collapsed to one space.
//!
//! ```ignore
//! use fluent_html_testkit::assert_html_eq;
//!
//! let list = Node::element("ul");
//! list.append_child("li", "One", ());
//! assert_html_eq!("<ul> <li>One</li> </ul>", list);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use fluent_html_core::Node;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Normalizes markup for comparison.
///
/// Inserts a space between `><` and collapses every whitespace run to a single space.
pub fn comparable_html(html: &str) -> String {
	let spaced = html.replace("><", "> <");
	WHITESPACE.replace_all(&spaced, " ").into_owned()
}

/// Returns `true` if both strings are equal after [`comparable_html`].
pub fn html_eq(expected: &str, actual: &str) -> bool {
	comparable_html(expected) == comparable_html(actual)
}

/// Markup of the whole tree `node` belongs to.
pub fn tree_html(node: &Node) -> String {
	node.to_string()
}

/// Markup of `node`'s contents, without its own tag.
///
/// Clears the node's tag name.
pub fn content_html(node: &Node) -> String {
	node.with_tag(()).render()
}

/// Asserts that the whole tree of a node renders as `expected`, ignoring layout whitespace.
#[macro_export]
macro_rules! assert_html_eq {
	($expected:expr, $node:expr $(,)?) => {{
		let expected = $crate::comparable_html(&$expected);
		let actual = $crate::comparable_html(&$crate::tree_html(&$node));
		assert_eq!(actual, expected, "rendered markup differs");
	}};
}

/// Asserts that a node's contents render as `expected`, ignoring layout whitespace.
///
/// The node's tag name is cleared first.
#[macro_export]
macro_rules! assert_html_content_eq {
	($expected:expr, $node:expr $(,)?) => {{
		let expected = $crate::comparable_html(&$expected);
		let actual = $crate::comparable_html(&$crate::content_html(&$node));
		assert_eq!(actual, expected, "rendered contents differ");
	}};
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("<p>\na\n</p>", "<p> a </p>")]
	#[case("<div><br></div>", "<div> <br> </div>")]
	#[case("a \t\n b", "a b")]
	#[case("", "")]
	fn test_comparable_html(#[case] html: &str, #[case] expected: &str) {
		// Act & Assert
		assert_eq!(comparable_html(html), expected);
	}

	#[rstest]
	fn test_html_eq_ignores_layout() {
		// Act & Assert
		assert!(!html_eq("<p>a</p>", "<p>\na\n</p>"));
		assert!(html_eq("<p> a </p>", "<p>\na\n</p>"));
	}

	#[rstest]
	fn test_assert_macros() {
		// Arrange
		let root = Node::element("div");
		let child = root.append_child("p", ("a", "b"), ());

		// Act & Assert
		assert_html_eq!("<div> <p> a b </p> </div>", child);
		assert_html_content_eq!("<p> a b </p>", root);
	}
}
