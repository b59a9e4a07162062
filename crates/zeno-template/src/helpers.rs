//! Markup helpers shared by directives and the view runtime
//!
//! - [`class_names`] builds a `class` attribute value from strings, lists and
//!   objects of flags.
//! - [`style_names`] builds a `style` attribute value from an object.
//! - [`escape_html`] escapes the five HTML special characters:
//!   `<` → `&lt;`, `>` → `&gt;`, `&` → `&amp;`, `"` → `&quot;`, `'` → `&#x27;`

use zeno_reactive::Value;

/// Class list from a string, a list or an object of flags.
///
/// Strings pass through. Lists keep their string items and the truthy keys
/// of their object items. Objects contribute their truthy keys.
///
/// # Examples
///
/// ```
/// use zeno_reactive::{ReactiveObject, Value};
/// use zeno_template::helpers::class_names;
///
/// let flags = ReactiveObject::from_entries([("active", Value::from(true)), ("hidden", Value::from(false))]);
/// let list = Value::from(vec![Value::from("btn"), Value::Object(flags)]);
/// assert_eq!(class_names(&list), "btn active");
/// ```
pub fn class_names(value: &Value) -> String {
	let mut classes = Vec::new();
	match value {
		Value::String(s) => return s.clone(),
		Value::List(list) => {
			for item in list.to_vec() {
				match &item {
					Value::String(s) => classes.push(s.clone()),
					Value::Object(_) => push_truthy_keys(&item, &mut classes),
					_ => {}
				}
			}
		}
		Value::Object(_) => push_truthy_keys(value, &mut classes),
		_ => {}
	}
	classes.join(" ")
}

fn push_truthy_keys(value: &Value, classes: &mut Vec<String>) {
	if let Value::Object(object) = value {
		classes.extend(
			object
				.entries()
				.into_iter()
				.filter(|(_, flag)| flag.is_truthy())
				.map(|(key, _)| key),
		);
	}
}

/// Inline style from an object; falsy entries are skipped.
///
/// ```
/// use zeno_reactive::{ReactiveObject, Value};
/// use zeno_template::helpers::style_names;
///
/// let style = ReactiveObject::from_entries([
/// 	("color", Value::from("red")),
/// 	("display", Value::Null),
/// 	("width", Value::from("10px")),
/// ]);
/// assert_eq!(style_names(&Value::Object(style)), "color: red; width: 10px");
/// ```
pub fn style_names(value: &Value) -> String {
	let Value::Object(object) = value else {
		return String::new();
	};
	object
		.entries()
		.into_iter()
		.filter(|(_, v)| v.is_truthy())
		.map(|(key, v)| format!("{key}: {}", v.to_display_string()))
		.collect::<Vec<_>>()
		.join("; ")
}

/// Escape HTML special characters
///
/// # Examples
///
/// ```
/// use zeno_template::helpers::escape_html;
///
/// assert_eq!(escape_html("<script>alert('XSS')</script>"),
/// 	"&lt;script&gt;alert(&#x27;XSS&#x27;)&lt;/script&gt;");
/// assert_eq!(escape_html("Hello & goodbye"), "Hello &amp; goodbye");
/// ```
pub fn escape_html(s: &str) -> String {
	let mut escaped = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'&' => escaped.push_str("&amp;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#x27;"),
			_ => escaped.push(c),
		}
	}
	escaped
}
