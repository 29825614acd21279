//! Values accepted by a node's tag name, attributes, contents and display conditions.
//!
//! Every field of a [`Node`] holds a [`Value`]. A value may be concrete (text,
//! numbers, booleans, raw markup, other nodes), an ordered keyed container
//! ([`ValueMap`]), or a [`Producer`] that is called with the node as context
//! when the tree is read or rendered.
//!
//! Containers keep the distinction between positional and named entries:
//! named entries drive the conditional-token idiom where `"has-error" => flag`
//! contributes the text `has-error` only while `flag` is truthy.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::error::HtmlResult;
use crate::node::Node;

/// Capability of producing pre-built markup that is inlined without escaping.
pub trait ToHtml {
	/// Returns the markup for this value.
	fn to_html(&self) -> String;
}

/// A string of markup that is trusted and never escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHtml(String);

impl RawHtml {
	/// Wraps already-escaped markup.
	pub fn new(html: impl Into<String>) -> Self {
		Self(html.into())
	}

	/// Returns the wrapped markup.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl ToHtml for RawHtml {
	fn to_html(&self) -> String {
		self.0.clone()
	}
}

impl fmt::Display for RawHtml {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Closure type behind a [`Producer`].
pub type ProducerFn = dyn Fn(&Node) -> HtmlResult<Value>;

/// A deferred value, resolved with the node it belongs to as context.
///
/// Producers are expected to read the tree, not mutate it.
#[derive(Clone)]
pub struct Producer(Rc<ProducerFn>);

impl Producer {
	/// Wraps a fallible closure.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&Node) -> HtmlResult<Value> + 'static,
	{
		Self(Rc::new(f))
	}

	/// Invokes the producer once, without resolving its result.
	pub fn call(&self, context: &Node) -> HtmlResult<Value> {
		(self.0)(context)
	}

	/// Returns `true` if both producers wrap the same closure.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Producer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Producer(..)")
	}
}

/// Key of a [`ValueMap`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	/// Positional entry.
	Pos,
	/// Named entry; at most one per name in a map.
	Named(String),
}

impl Key {
	/// Creates a named key.
	pub fn named(name: impl Into<String>) -> Self {
		Self::Named(name.into())
	}

	/// Returns the name of a named key.
	pub fn name(&self) -> Option<&str> {
		match self {
			Self::Pos => None,
			Self::Named(name) => Some(name),
		}
	}

	/// Returns `true` for positional keys.
	pub fn is_positional(&self) -> bool {
		matches!(self, Self::Pos)
	}
}

/// Ordered container of positional and named entries.
///
/// Named entries are unique: [`ValueMap::put`] replaces an existing entry
/// in place, keeping its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
	entries: Vec<(Key, Value)>,
}

impl ValueMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a map from entries, applying [`ValueMap::insert`] to each.
	pub fn from_entries(entries: impl IntoIterator<Item = (Key, Value)>) -> Self {
		let mut map = Self::new();
		for (key, value) in entries {
			map.insert(key, value);
		}
		map
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, (Key, Value)> {
		self.entries.iter()
	}

	/// Iterates over the values, ignoring keys.
	pub fn values(&self) -> impl Iterator<Item = &Value> {
		self.entries.iter().map(|(_, value)| value)
	}

	/// Appends a positional entry.
	pub fn push(&mut self, value: impl Into<Value>) {
		self.entries.push((Key::Pos, value.into()));
	}

	/// Sets a named entry, replacing an existing one in place.
	pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		let name = name.into();
		let value = value.into();
		match self.position_of_name(&name) {
			Some(index) => self.entries[index].1 = value,
			None => self.entries.push((Key::Named(name), value)),
		}
	}

	/// Pushes positional keys and puts named ones.
	pub fn insert(&mut self, key: Key, value: Value) {
		match key {
			Key::Pos => self.entries.push((Key::Pos, value)),
			Key::Named(name) => self.put(name, value),
		}
	}

	/// Returns the value of a named entry.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.position_of_name(name).map(|index| &self.entries[index].1)
	}

	/// Appends positional entries of `other` and overrides named ones.
	pub fn merge(&mut self, other: ValueMap) {
		for (key, value) in other {
			self.insert(key, value);
		}
	}

	/// Drops every entry whose text is among the texts of `tokens`.
	pub fn remove_values(&mut self, tokens: &ValueMap) {
		let tokens: Vec<String> = tokens.values().map(Value::to_text).collect();
		self.entries
			.retain(|(_, value)| !tokens.contains(&value.to_text()));
	}

	/// Index of the first entry whose value satisfies `predicate`.
	pub fn position(&self, predicate: impl Fn(&Value) -> bool) -> Option<usize> {
		self.entries.iter().position(|(_, value)| predicate(value))
	}

	/// Inserts `items` as positional entries starting at `offset`.
	///
	/// An offset past the end appends.
	pub fn splice(&mut self, offset: usize, items: ValueMap) {
		let offset = offset.min(self.entries.len());
		let items = items.into_iter().map(|(_, value)| (Key::Pos, value));
		self.entries.splice(offset..offset, items);
	}

	/// Replaces the value at `index`, keeping its key.
	pub fn replace_at(&mut self, index: usize, value: Value) {
		if let Some(entry) = self.entries.get_mut(index) {
			entry.1 = value;
		}
	}

	/// Removes every entry and returns them.
	pub fn take(&mut self) -> ValueMap {
		std::mem::take(self)
	}

	/// Keeps only entries satisfying `predicate`.
	pub fn retain(&mut self, mut predicate: impl FnMut(&Key, &Value) -> bool) {
		self.entries.retain(|(key, value)| predicate(key, value));
	}

	/// Appends an entry without collapsing named duplicates.
	pub(crate) fn push_entry(&mut self, key: Key, value: Value) {
		self.entries.push((key, value));
	}

	fn position_of_name(&self, name: &str) -> Option<usize> {
		self.entries
			.iter()
			.position(|(key, _)| key.name() == Some(name))
	}
}

impl IntoIterator for ValueMap {
	type Item = (Key, Value);
	type IntoIter = std::vec::IntoIter<(Key, Value)>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

impl<'a> IntoIterator for &'a ValueMap {
	type Item = &'a (Key, Value);
	type IntoIter = std::slice::Iter<'a, (Key, Value)>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

impl FromIterator<(Key, Value)> for ValueMap {
	fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
		Self::from_entries(iter)
	}
}

/// Anything that can be stored in a node field.
#[derive(Clone, Default)]
pub enum Value {
	/// Absence; dropped from contents and attributes.
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
	/// Trusted markup inlined without escaping.
	Raw(Rc<dyn ToHtml>),
	/// An object rendered through its `Display` projection.
	Display(Rc<dyn fmt::Display>),
	/// A child element.
	Node(Node),
	/// A nested container.
	List(ValueMap),
	/// A value resolved at read or render time.
	Deferred(Producer),
}

impl Value {
	/// Creates a deferred value from an infallible closure.
	///
	/// ```ignore
	/// let title = Value::deferred(|node: &Node| node.content_count() > 0);
	/// ```
	pub fn deferred<F, V>(f: F) -> Self
	where
		F: Fn(&Node) -> V + 'static,
		V: Into<Value>,
	{
		Self::Deferred(Producer::new(move |node| Ok(f(node).into())))
	}

	/// Creates a deferred value from a fallible closure.
	///
	/// An error raised during render replaces the node's markup with a diagnostic comment.
	pub fn try_deferred<F, V>(f: F) -> Self
	where
		F: Fn(&Node) -> HtmlResult<V> + 'static,
		V: Into<Value>,
	{
		Self::Deferred(Producer::new(move |node| f(node).map(Into::into)))
	}

	/// Creates raw markup content.
	pub fn raw(html: impl Into<String>) -> Self {
		Self::Raw(Rc::new(RawHtml::new(html)))
	}

	/// Wraps any value that renders its own markup.
	pub fn html<T: ToHtml + 'static>(value: T) -> Self {
		Self::Raw(Rc::new(value))
	}

	/// Wraps any value rendered through `Display` and escaped like text.
	pub fn display<T: fmt::Display + 'static>(value: T) -> Self {
		Self::Display(Rc::new(value))
	}

	/// Creates a positional list.
	pub fn list<I, V>(items: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		let mut map = ValueMap::new();
		for item in items {
			map.push(item);
		}
		Self::List(map)
	}

	/// Creates a list of named entries.
	pub fn map<I, K, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		let mut map = ValueMap::new();
		for (name, value) in entries {
			map.put(name, value);
		}
		Self::List(map)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn is_deferred(&self) -> bool {
		matches!(self, Self::Deferred(_))
	}

	pub fn as_node(&self) -> Option<&Node> {
		match self {
			Self::Node(node) => Some(node),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&ValueMap> {
		match self {
			Self::List(map) => Some(map),
			_ => None,
		}
	}

	/// Loose truthiness: null, `false`, zero, `""`, `"0"` and empty lists are falsy.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Null => false,
			Self::Bool(flag) => *flag,
			Self::Int(number) => *number != 0,
			Self::Float(number) => *number != 0.0,
			Self::Str(text) => !text.is_empty() && text != "0",
			Self::List(map) => !map.is_empty(),
			Self::Raw(_) | Self::Display(_) | Self::Node(_) | Self::Deferred(_) => true,
		}
	}

	/// Text projection of a resolved value.
	///
	/// Nodes render their own subtree; lists and producers have no text.
	pub fn to_text(&self) -> String {
		match self {
			Self::Null | Self::Bool(false) | Self::List(_) | Self::Deferred(_) => String::new(),
			Self::Bool(true) => "1".to_owned(),
			Self::Int(number) => number.to_string(),
			Self::Float(number) => number.to_string(),
			Self::Str(text) => text.clone(),
			Self::Raw(html) => html.to_html(),
			Self::Display(object) => object.to_string(),
			Self::Node(node) => node.render(),
		}
	}

	/// Resolves producers and nested containers against `context`.
	pub fn evaluate(&self, context: &Node) -> HtmlResult<Value> {
		crate::eval::evaluate(self, context)
	}
}

/// Flattens nested lists to their leaves.
///
/// Positional leaves are appended, named leaves are put under their key, and
/// the keys of nested lists themselves are dropped. `Null` flattens to an
/// empty map and any other non-list value to a single positional entry.
pub fn flatten(value: &Value) -> ValueMap {
	let mut flat = ValueMap::new();
	match value {
		Value::Null => {}
		Value::List(map) => flatten_into(map, &mut flat),
		other => flat.push(other.clone()),
	}
	flat
}

fn flatten_into(map: &ValueMap, flat: &mut ValueMap) {
	for (key, value) in map {
		match value {
			Value::List(nested) => flatten_into(nested, flat),
			leaf => flat.insert(key.clone(), leaf.clone()),
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("Null"),
			Self::Bool(flag) => f.debug_tuple("Bool").field(flag).finish(),
			Self::Int(number) => f.debug_tuple("Int").field(number).finish(),
			Self::Float(number) => f.debug_tuple("Float").field(number).finish(),
			Self::Str(text) => f.debug_tuple("Str").field(text).finish(),
			Self::Raw(html) => f.debug_tuple("Raw").field(&html.to_html()).finish(),
			Self::Display(object) => f.debug_tuple("Display").field(&object.to_string()).finish(),
			Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Self::List(map) => f.debug_tuple("List").field(map).finish(),
			Self::Deferred(producer) => fmt::Debug::fmt(producer, f),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Raw(a), Self::Raw(b)) => a.to_html() == b.to_html(),
			(Self::Display(a), Self::Display(b)) => a.to_string() == b.to_string(),
			(Self::Node(a), Self::Node(b)) => a == b,
			(Self::List(a), Self::List(b)) => a == b,
			(Self::Deferred(a), Self::Deferred(b)) => a.ptr_eq(b),
			_ => false,
		}
	}
}

impl From<()> for Value {
	fn from(_: ()) -> Self {
		Self::Null
	}
}

impl From<bool> for Value {
	fn from(flag: bool) -> Self {
		Self::Bool(flag)
	}
}

macro_rules! impl_from_int {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for Value {
				fn from(number: $ty) -> Self {
					Self::Int(i64::from(number))
				}
			}
		)*
	};
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Value {
	fn from(number: usize) -> Self {
		i64::try_from(number).map_or_else(|_| Self::Str(number.to_string()), Self::Int)
	}
}

impl From<u64> for Value {
	fn from(number: u64) -> Self {
		i64::try_from(number).map_or_else(|_| Self::Str(number.to_string()), Self::Int)
	}
}

impl From<f32> for Value {
	fn from(number: f32) -> Self {
		Self::Float(f64::from(number))
	}
}

impl From<f64> for Value {
	fn from(number: f64) -> Self {
		Self::Float(number)
	}
}

impl From<&str> for Value {
	fn from(text: &str) -> Self {
		Self::Str(text.to_owned())
	}
}

impl From<String> for Value {
	fn from(text: String) -> Self {
		Self::Str(text)
	}
}

impl From<&String> for Value {
	fn from(text: &String) -> Self {
		Self::Str(text.clone())
	}
}

impl From<Cow<'_, str>> for Value {
	fn from(text: Cow<'_, str>) -> Self {
		Self::Str(text.into_owned())
	}
}

impl From<RawHtml> for Value {
	fn from(html: RawHtml) -> Self {
		Self::Raw(Rc::new(html))
	}
}

impl From<Producer> for Value {
	fn from(producer: Producer) -> Self {
		Self::Deferred(producer)
	}
}

impl From<Node> for Value {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}

impl From<&Node> for Value {
	fn from(node: &Node) -> Self {
		Self::Node(node.clone())
	}
}

impl From<ValueMap> for Value {
	fn from(map: ValueMap) -> Self {
		Self::List(map)
	}
}

impl From<&Value> for Value {
	fn from(value: &Value) -> Self {
		value.clone()
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(items: Vec<T>) -> Self {
		Self::list(items)
	}
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
	fn from(items: [T; N]) -> Self {
		Self::list(items)
	}
}

macro_rules! impl_from_tuple {
	($($name:ident),+) => {
		impl<$($name: Into<Value>),+> From<($($name,)+)> for Value {
			#[allow(non_snake_case)]
			fn from(($($name,)+): ($($name,)+)) -> Self {
				let mut map = ValueMap::new();
				$(map.push($name);)+
				Self::List(map)
			}
		}
	};
}

impl_from_tuple!(A, B);
impl_from_tuple!(A, B, C);
impl_from_tuple!(A, B, C, D);
impl_from_tuple!(A, B, C, D, E);
impl_from_tuple!(A, B, C, D, E, F);

/// Builds a [`Value::List`] from positional and `"key" => value` entries.
///
/// ```ignore
/// let classes = items!["btn", "active" => is_active, "disabled" => Value::deferred(|n| ...)];
/// ```
#[macro_export]
macro_rules! items {
	(@acc [$($out:tt)*]) => {
		$crate::Value::List($crate::ValueMap::from_entries(::std::vec![$($out)*]))
	};
	(@acc [$($out:tt)*] $key:literal => $value:expr, $($rest:tt)*) => {
		$crate::items!(@acc [$($out)* ($crate::Key::named($key), $crate::Value::from($value)),] $($rest)*)
	};
	(@acc [$($out:tt)*] $key:literal => $value:expr) => {
		$crate::items!(@acc [$($out)* ($crate::Key::named($key), $crate::Value::from($value)),])
	};
	(@acc [$($out:tt)*] $value:expr, $($rest:tt)*) => {
		$crate::items!(@acc [$($out)* ($crate::Key::Pos, $crate::Value::from($value)),] $($rest)*)
	};
	(@acc [$($out:tt)*] $value:expr) => {
		$crate::items!(@acc [$($out)* ($crate::Key::Pos, $crate::Value::from($value)),])
	};
	($($items:tt)*) => {
		$crate::items!(@acc [] $($items)*)
	};
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Value::Null, false)]
	#[case(Value::Bool(false), false)]
	#[case(Value::Int(0), false)]
	#[case(Value::Float(0.0), false)]
	#[case(Value::from(""), false)]
	#[case(Value::from("0"), false)]
	#[case(Value::List(ValueMap::new()), false)]
	#[case(Value::Bool(true), true)]
	#[case(Value::Int(-3), true)]
	#[case(Value::from("a"), true)]
	#[case(Value::from("00"), true)]
	#[case(Value::raw(""), true)]
	#[case(Value::from(vec![Value::Null]), true)]
	fn test_is_truthy(#[case] value: Value, #[case] expected: bool) {
		// Act & Assert
		assert_eq!(value.is_truthy(), expected);
	}

	#[rstest]
	#[case(Value::Null, "")]
	#[case(Value::Bool(true), "1")]
	#[case(Value::Bool(false), "")]
	#[case(Value::Int(42), "42")]
	#[case(Value::Float(1.5), "1.5")]
	#[case(Value::raw("<br>"), "<br>")]
	#[case(Value::display('x'), "x")]
	fn test_to_text(#[case] value: Value, #[case] expected: &str) {
		// Act & Assert
		assert_eq!(value.to_text(), expected);
	}

	#[rstest]
	fn test_put_replaces_named_entry_in_place() {
		// Arrange
		let mut map = ValueMap::new();
		map.put("type", "text");
		map.push("readonly");
		map.put("name", "a");

		// Act
		map.put("type", "email");

		// Assert
		let keys: Vec<_> = map.iter().map(|(key, _)| key.name()).collect();
		assert_eq!(keys, vec![Some("type"), None, Some("name")]);
		assert_eq!(map.get("type"), Some(&Value::from("email")));
	}

	#[rstest]
	fn test_merge_appends_positional_and_overrides_named() {
		// Arrange
		let mut map = ValueMap::from_entries([
			(Key::Pos, Value::from("a")),
			(Key::named("b"), Value::from(true)),
		]);
		let other = ValueMap::from_entries([
			(Key::named("b"), Value::from(false)),
			(Key::Pos, Value::from("c")),
		]);

		// Act
		map.merge(other);

		// Assert
		assert_eq!(map.len(), 3);
		assert_eq!(map.get("b"), Some(&Value::Bool(false)));
		let texts: Vec<_> = map.values().map(Value::to_text).collect();
		assert_eq!(texts, vec!["a", "", "c"]);
	}

	#[rstest]
	fn test_flatten_discards_nested_list_keys() {
		// Arrange
		let value = items![
			"a",
			"group" => items!["b", "c" => true],
			vec!["d", "e"],
		];

		// Act
		let flat = flatten(&value);

		// Assert
		let entries: Vec<_> = flat
			.iter()
			.map(|(key, value)| (key.name().map(str::to_owned), value.to_text()))
			.collect();
		assert_eq!(
			entries,
			vec![
				(None, "a".to_owned()),
				(None, "b".to_owned()),
				(Some("c".to_owned()), "1".to_owned()),
				(None, "d".to_owned()),
				(None, "e".to_owned()),
			]
		);
	}

	#[rstest]
	#[case(Value::Null, 0)]
	#[case(Value::from("a"), 1)]
	#[case(Value::from(("a", ("b", "c"))), 3)]
	fn test_flatten_len(#[case] value: Value, #[case] expected: usize) {
		// Act & Assert
		assert_eq!(flatten(&value).len(), expected);
	}

	#[rstest]
	fn test_remove_values_compares_text() {
		// Arrange
		let mut map = ValueMap::from_entries([
			(Key::Pos, Value::from("a")),
			(Key::Pos, Value::from("b")),
			(Key::Pos, Value::Int(3)),
		]);

		// Act
		map.remove_values(&flatten(&Value::from(("b", "3"))));

		// Assert
		assert_eq!(map, flatten(&Value::from("a")));
	}

	#[rstest]
	#[case(0, vec!["x", "a", "b"])]
	#[case(1, vec!["a", "x", "b"])]
	#[case(9, vec!["a", "b", "x"])]
	fn test_splice(#[case] offset: usize, #[case] expected: Vec<&str>) {
		// Arrange
		let mut map = flatten(&Value::from(("a", "b")));

		// Act
		map.splice(offset, flatten(&items!["k" => "x"]));

		// Assert
		let texts: Vec<_> = map.values().map(Value::to_text).collect();
		assert_eq!(texts, expected);
		assert!(map.iter().all(|(key, _)| key.is_positional()));
	}

	#[rstest]
	fn test_conversions() {
		// Act & Assert
		assert_eq!(Value::from(()), Value::Null);
		assert_eq!(Value::from(None::<&str>), Value::Null);
		assert_eq!(Value::from(Some("a")), Value::from("a"));
		assert_eq!(Value::from(7u8), Value::Int(7));
		assert_eq!(Value::from(["a", "b"]), Value::list(["a", "b"]));
		assert_eq!(
			Value::map([("a", 1)]),
			Value::List(ValueMap::from_entries([(Key::named("a"), Value::Int(1))]))
		);
	}
}
