//! Recursive resolution of deferred values.

use crate::error::HtmlResult;
use crate::node::Node;
use crate::value::{Value, ValueMap};

/// Resolves `value` against `context`.
///
/// Producers are called with `context` and their result is resolved again,
/// so a producer may return another producer or a container of them.
/// Containers are rebuilt with every entry resolved, keeping keys and order.
/// The input is never modified. A producer that keeps returning producers
/// recurses without bound.
pub fn evaluate(value: &Value, context: &Node) -> HtmlResult<Value> {
	match value {
		Value::Deferred(producer) => {
			let produced = producer.call(context)?;
			evaluate(&produced, context)
		}
		Value::List(map) => evaluate_map(map, context).map(Value::List),
		other => Ok(other.clone()),
	}
}

/// Resolves every entry of `map` against `context`.
pub fn evaluate_map(map: &ValueMap, context: &Node) -> HtmlResult<ValueMap> {
	let mut resolved = ValueMap::new();
	for (key, value) in map {
		resolved.push_entry(key.clone(), evaluate(value, context)?);
	}
	Ok(resolved)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::HtmlError;
	use crate::items;
	use rstest::rstest;
	use std::cell::Cell;
	use std::rc::Rc;

	#[rstest]
	fn test_plain_values_are_returned_unchanged() {
		// Arrange
		let context = Node::new();

		// Act & Assert
		assert_eq!(evaluate(&Value::from("a"), &context), Ok(Value::from("a")));
		assert_eq!(evaluate(&Value::Null, &context), Ok(Value::Null));
	}

	#[rstest]
	fn test_strings_are_never_called() {
		// Arrange
		let context = Node::new();

		// Act
		let resolved = evaluate(&Value::from("strlen"), &context);

		// Assert
		assert_eq!(resolved, Ok(Value::from("strlen")));
	}

	#[rstest]
	fn test_nested_producers_resolve_recursively() {
		// Arrange
		let context = Node::element("p");
		let value = Value::deferred(|_: &Node| {
			items![
				"a",
				"b" => Value::deferred(|_: &Node| Value::deferred(|node: &Node| node.content_count() == 0)),
				Value::deferred(|_: &Node| vec!["c", "d"]),
			]
		});

		// Act
		let resolved = evaluate(&value, &context);

		// Assert
		let expected = items!["a", "b" => true, vec!["c", "d"]];
		assert_eq!(resolved, Ok(expected));
	}

	#[rstest]
	fn test_input_is_left_untouched() {
		// Arrange
		let calls = Rc::new(Cell::new(0));
		let counter = Rc::clone(&calls);
		let value = Value::list([Value::deferred(move |_: &Node| {
			counter.set(counter.get() + 1);
			"x"
		})]);
		let context = Node::new();

		// Act
		let first = evaluate(&value, &context);
		let second = evaluate(&value, &context);

		// Assert
		assert_eq!(first, second);
		assert_eq!(calls.get(), 2);
		assert!(value.as_list().is_some_and(|map| map.values().all(Value::is_deferred)));
	}

	#[rstest]
	fn test_producer_error_propagates() {
		// Arrange
		let value = items![Value::try_deferred(|_: &Node| -> HtmlResult<Value> {
			Err(HtmlError::producer("failed"))
		})];

		// Act
		let resolved = evaluate(&value, &Node::new());

		// Assert
		assert_eq!(resolved, Err(HtmlError::producer("failed")));
	}
}
