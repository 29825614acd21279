//! Markup serialization.
//!
//! Turns a tag name, an attribute map and a content list into an HTML string.
//! The `build_*` functions accept values that may still hold producers and
//! resolve them against a fresh detached node first; [`Node`](crate::Node)
//! rendering resolves against itself and calls the serializer directly.

use std::borrow::Cow;

use crate::error::HtmlResult;
use crate::eval::evaluate;
use crate::node::Node;
use crate::value::{Key, Value, ValueMap, flatten};

/// Elements rendered without a closing tag unless they end up with content.
pub const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "menuitem",
	"meta", "param", "source", "track", "wbr",
];

/// Returns `true` if `tag` is a void element.
pub fn is_void_element(tag: &str) -> bool {
	VOID_ELEMENTS.contains(&tag)
}

/// Options applied while serializing a subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupOptions {
	/// Whether text content is HTML-escaped.
	pub escape_contents: bool,
	/// Quote around attribute values; only `"` and `'` are used, anything else falls back to `"`.
	pub quote: char,
	/// Elements longer than this put opening tag, content and closing tag on separate lines.
	pub line_width: usize,
}

impl Default for MarkupOptions {
	fn default() -> Self {
		Self {
			escape_contents: true,
			quote: '"',
			line_width: 80,
		}
	}
}

impl MarkupOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Passes text content through without escaping.
	pub fn unescaped(mut self) -> Self {
		self.escape_contents = false;
		self
	}

	/// Sets the attribute quote character.
	pub fn quote(mut self, quote: char) -> Self {
		self.quote = quote;
		self
	}

	/// Sets the width above which an element is split over several lines.
	pub fn line_width(mut self, width: usize) -> Self {
		self.line_width = width;
		self
	}

	/// The quote character actually used.
	pub fn quote_char(&self) -> char {
		if self.quote == '\'' { '\'' } else { '"' }
	}
}

/// Escapes `&`, `<`, `>`, `"` and `'`.
///
/// Borrows the input when nothing needs escaping.
pub fn escape_html(s: &str) -> Cow<'_, str> {
	let Some(first) = s.find(|c| entity(c).is_some()) else {
		return Cow::Borrowed(s);
	};
	let (clean, rest) = s.split_at(first);
	let mut escaped = String::with_capacity(s.len() + 8);
	escaped.push_str(clean);
	for c in rest.chars() {
		match entity(c) {
			Some(entity) => escaped.push_str(entity),
			None => escaped.push(c),
		}
	}
	Cow::Owned(escaped)
}

fn entity(c: char) -> Option<&'static str> {
	Some(match c {
		'&' => "&amp;",
		'<' => "&lt;",
		'>' => "&gt;",
		'"' => "&quot;",
		'\'' => "&#039;",
		_ => return None,
	})
}

/// Builds a complete element.
///
/// ```ignore
/// let html = build_element("p", &Value::map([("id", "a")]), &Value::from("text"), &MarkupOptions::default())?;
/// assert_eq!(html, r#"<p id="a">text</p>"#);
/// ```
pub fn build_element(
	tag: &str,
	attributes: &Value,
	contents: &Value,
	options: &MarkupOptions,
) -> HtmlResult<String> {
	let context = Node::new();
	let attributes = flatten_attributes(&evaluate(attributes, &context)?);
	let contents = flatten(&evaluate(contents, &context)?);
	Ok(element_markup(tag, &attributes, &contents, options))
}

/// Builds the attribute string, each attribute preceded by a space.
pub fn build_attributes(attributes: &Value, options: &MarkupOptions) -> HtmlResult<String> {
	let resolved = evaluate(attributes, &Node::new())?;
	Ok(attributes_markup(&flatten_attributes(&resolved), options))
}

/// Builds newline-separated content without a wrapping tag.
pub fn build_contents(contents: &Value, options: &MarkupOptions) -> HtmlResult<String> {
	let resolved = evaluate(contents, &Node::new())?;
	Ok(contents_markup(&flatten(&resolved), options))
}

/// Flattens a resolved attribute map.
///
/// Positional lists are merged in, and positional scalars become flag
/// attributes named by their text.
pub fn flatten_attributes(attributes: &Value) -> ValueMap {
	let mut flat = ValueMap::new();
	match attributes {
		Value::Null => {}
		Value::List(map) => flatten_attributes_into(map, &mut flat),
		flag => flatten_attributes_into(&ValueMap::from_entries([(Key::Pos, flag.clone())]), &mut flat),
	}
	flat
}

fn flatten_attributes_into(map: &ValueMap, flat: &mut ValueMap) {
	for (key, value) in map {
		match (key, value) {
			(Key::Named(name), value) => flat.put(name.clone(), value.clone()),
			(Key::Pos, Value::List(nested)) => flatten_attributes_into(nested, flat),
			(Key::Pos, Value::Null | Value::Bool(false)) => {}
			(Key::Pos, flag) => {
				let name = flag.to_text();
				if !name.is_empty() {
					flat.put(name, true);
				}
			}
		}
	}
}

/// Joins the truthy tokens of a list-valued attribute.
///
/// Positional entries contribute their value and named entries their key.
/// `class` is joined with spaces, every other attribute with commas.
/// Scalar values are returned as text.
pub fn flatten_attribute_value(name: &str, value: &Value) -> String {
	let Value::List(_) = value else {
		return value.to_text();
	};
	let separator = if name == "class" { " " } else { "," };
	flatten(value)
		.iter()
		.filter(|(_, token)| token.is_truthy())
		.map(|(key, token)| match key {
			Key::Named(name) => name.clone(),
			Key::Pos => token.to_text(),
		})
		.collect::<Vec<_>>()
		.join(separator)
}

pub(crate) fn element_markup(
	tag: &str,
	attributes: &ValueMap,
	contents: &ValueMap,
	options: &MarkupOptions,
) -> String {
	let tag = escape_html(tag);
	let opening = format!("<{tag}{}>", attributes_markup(attributes, options));
	let content = contents_markup(contents, options);
	let closing = (!content.is_empty() || !is_void_element(&tag)).then(|| format!("</{tag}>"));

	let length = opening.len() + content.len() + closing.as_ref().map_or(0, String::len);
	let separator = if length > options.line_width || content.contains('\n') {
		"\n"
	} else {
		""
	};

	let mut html = opening;
	html.push_str(separator);
	html.push_str(&content);
	if let Some(closing) = closing {
		html.push_str(separator);
		html.push_str(&closing);
	}
	html
}

pub(crate) fn attributes_markup(attributes: &ValueMap, options: &MarkupOptions) -> String {
	let quote = options.quote_char();
	let mut markup = String::new();
	for (key, value) in attributes {
		let Some(name) = key.name() else {
			continue;
		};
		match value {
			Value::Null | Value::Bool(false) => {}
			Value::Bool(true) => {
				markup.push(' ');
				markup.push_str(&escape_html(name));
			}
			value => {
				let text = flatten_attribute_value(name, value);
				markup.push(' ');
				markup.push_str(&escape_html(name));
				markup.push('=');
				markup.push(quote);
				markup.push_str(&escape_html(&text));
				markup.push(quote);
			}
		}
	}
	markup
}

pub(crate) fn contents_markup(contents: &ValueMap, options: &MarkupOptions) -> String {
	let mut items = Vec::with_capacity(contents.len());
	for (key, item) in contents {
		let text = match item {
			Value::Node(node) => node.render_with(options),
			Value::Raw(html) => html.to_html(),
			item => match content_text(key, item) {
				Some(text) if options.escape_contents => escape_html(&text).into_owned(),
				Some(text) => text,
				None => continue,
			},
		};
		if !text.is_empty() {
			items.push(text);
		}
	}
	items.join("\n")
}

/// Trimmed text of a content item, with a truthy named entry replaced by its key.
fn content_text(key: &Key, item: &Value) -> Option<String> {
	if let Key::Named(name) = key {
		if !trim(name).is_empty() && item.is_truthy() {
			return Some(trim(name).to_owned());
		}
	}
	match item {
		Value::Null | Value::Bool(_) | Value::List(_) | Value::Deferred(_) => None,
		item => Some(trim(&item.to_text()).to_owned()),
	}
}

fn trim(text: &str) -> &str {
	text.trim_matches([' ', '\t', '\n', '\r', '\0', '\x0B'])
}
