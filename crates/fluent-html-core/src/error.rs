//! Error types for building and rendering element trees.

use thiserror::Error;

/// Result type for element tree operations.
pub type HtmlResult<T> = Result<T, HtmlError>;

/// Errors raised while building or evaluating an element tree.
///
/// Errors raised inside [`Node::render`](crate::Node::render) never reach the
/// caller; they are turned into an HTML comment in place of the failing node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HtmlError {
	/// A caller supplied an argument that can't be used.
	#[error("{0}")]
	InvalidArgument(String),

	/// No element factory in the tree knows the requested element name.
	#[error("element '{0}' could not be created: no factory in the tree provides it")]
	UnknownElement(String),

	/// A deferred producer or callback failed.
	#[error("{0}")]
	Producer(String),
}

impl HtmlError {
	/// Creates an [`HtmlError::InvalidArgument`].
	pub fn invalid_argument(message: impl Into<String>) -> Self {
		Self::InvalidArgument(message.into())
	}

	/// Creates an [`HtmlError::Producer`].
	pub fn producer(message: impl Into<String>) -> Self {
		Self::Producer(message.into())
	}

	/// Short name of the error class, used in render diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::InvalidArgument(_) | Self::UnknownElement(_) => "InvalidArgument",
			Self::Producer(_) => "ProducerError",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(HtmlError::invalid_argument("empty id"), "InvalidArgument", "empty id")]
	#[case(
		HtmlError::UnknownElement("Panel".into()),
		"InvalidArgument",
		"element 'Panel' could not be created: no factory in the tree provides it"
	)]
	#[case(HtmlError::producer("boom"), "ProducerError", "boom")]
	fn test_kind_and_message(
		#[case] error: HtmlError,
		#[case] kind: &str,
		#[case] message: &str,
	) {
		// Act & Assert
		assert_eq!(error.kind(), kind);
		assert_eq!(error.to_string(), message);
	}
}
