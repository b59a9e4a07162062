//! Fallthrough attributes
//!
//! Attributes passed to a component that are not declared props end up in
//! its `$attributes` bag. Printing the bag renders them as HTML attributes;
//! `$attributes.merge({...})` layers them over defaults.

use indexmap::IndexMap;
use zeno_reactive::{HostObject, Value, ValueError, ValueResult};
use zeno_template::helpers::escape_html;

/// Ordered attribute bag.
#[derive(Debug, Clone, Default)]
pub struct AttributeBag {
	attrs: IndexMap<String, Value>,
}

impl AttributeBag {
	pub fn new(attrs: IndexMap<String, Value>) -> Self {
		Self { attrs }
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.attrs.get(name)
	}

	pub fn is_empty(&self) -> bool {
		self.attrs.is_empty()
	}

	/// Bag of `defaults` overridden by these attributes. When both sides
	/// carry a `class`, the classes are joined, defaults first.
	///
	/// # Examples
	///
	/// ```
	/// use indexmap::IndexMap;
	/// use zeno_reactive::Value;
	/// use zeno_view::AttributeBag;
	///
	/// let mut attrs = IndexMap::new();
	/// attrs.insert("class".to_string(), Value::from("wide"));
	/// attrs.insert("id".to_string(), Value::from("main"));
	///
	/// let mut defaults = IndexMap::new();
	/// defaults.insert("class".to_string(), Value::from("btn"));
	/// defaults.insert("type".to_string(), Value::from("button"));
	///
	/// let merged = AttributeBag::new(attrs).merge(&defaults);
	/// assert_eq!(merged.to_html(), r#"class="btn wide" type="button" id="main""#);
	/// ```
	pub fn merge(&self, defaults: &IndexMap<String, Value>) -> Self {
		let mut merged = defaults.clone();
		for (name, value) in &self.attrs {
			merged.insert(name.clone(), value.clone());
		}
		if let (Some(default_class), Some(class)) = (defaults.get("class"), self.attrs.get("class")) {
			merged.insert(
				"class".to_string(),
				Value::String(format!(
					"{} {}",
					default_class.to_display_string(),
					class.to_display_string()
				)),
			);
		}
		Self { attrs: merged }
	}

	/// `true` renders the bare name, `false`/`null`/`undefined` are left
	/// out, everything else renders as `name="value"`.
	pub fn to_html(&self) -> String {
		self.attrs
			.iter()
			.filter_map(|(name, value)| match value {
				Value::Bool(true) => Some(name.clone()),
				Value::Bool(false) | Value::Null | Value::Undefined => None,
				other => Some(format!(
					r#"{name}="{}""#,
					escape_html(&other.to_display_string())
				)),
			})
			.collect::<Vec<_>>()
			.join(" ")
	}
}

impl HostObject for AttributeBag {
	fn type_name(&self) -> &str {
		"AttributeBag"
	}

	fn get(&self, key: &str) -> Value {
		self.attrs.get(key).cloned().unwrap_or_default()
	}

	fn call_method(&self, name: &str, args: &[Value]) -> ValueResult<Value> {
		match name {
			"merge" => {
				let defaults = match args.first() {
					Some(Value::Object(object)) => object.entries().into_iter().collect(),
					None | Some(Value::Undefined) => IndexMap::new(),
					Some(other) => {
						return Err(ValueError::InvalidArgument(format!(
							"merge expects an object, got {}",
							other.type_name()
						)));
					}
				};
				Ok(Value::host(self.merge(&defaults)))
			}
			"toString" => Ok(Value::String(self.to_html())),
			"has" => Ok(Value::Bool(
				args.first()
					.is_some_and(|name| self.attrs.contains_key(&name.to_display_string())),
			)),
			_ => Err(ValueError::NotAFunction(format!("$attributes.{name}"))),
		}
	}

	fn display(&self) -> String {
		self.to_html()
	}

	fn to_json(&self) -> serde_json::Value {
		serde_json::Value::Object(
			self.attrs
				.iter()
				.map(|(name, value)| (name.clone(), value.to_json()))
				.collect(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn bag(entries: &[(&str, Value)]) -> AttributeBag {
		AttributeBag::new(
			entries
				.iter()
				.map(|(name, value)| (name.to_string(), value.clone()))
				.collect(),
		)
	}

	#[rstest]
	#[case(vec![("disabled", Value::Bool(true))], "disabled")]
	#[case(vec![("hidden", Value::Bool(false)), ("title", Value::Null)], "")]
	#[case(vec![("data-id", Value::from(7)), ("title", Value::from("a \"b\""))], r#"data-id="7" title="a &quot;b&quot;""#)]
	fn test_to_html(#[case] entries: Vec<(&str, Value)>, #[case] expected: &str) {
		assert_eq!(bag(&entries).to_html(), expected);
	}

	#[test]
	fn test_merge_keeps_single_class() {
		let mut defaults = IndexMap::new();
		defaults.insert("class".to_string(), Value::from("btn"));
		let merged = bag(&[("id", Value::from("x"))]).merge(&defaults);
		assert_eq!(merged.to_html(), r#"class="btn" id="x""#);
	}

	#[test]
	fn test_merge_through_host_call() {
		let defaults = zeno_reactive::ReactiveObject::from_entries([("role", Value::from("alert"))]);
		let merged = bag(&[("id", Value::from("x"))])
			.call_method("merge", &[Value::Object(defaults)])
			.unwrap();
		assert_eq!(merged.to_display_string(), r#"role="alert" id="x""#);
		assert!(bag(&[]).call_method("merge", &[Value::from(1)]).is_err());
	}
}
