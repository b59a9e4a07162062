//! Value model
//!
//! Everything a template can read is a [`Value`]. Containers are always the
//! observable [`ReactiveObject`] / [`ReactiveList`] types, so there is no
//! separate "raw" representation to wrap or unwrap.
//!
//! The comparison, truthiness and string conversion rules follow the
//! scripting semantics templates are written against: `0`, `""`, `null`,
//! `undefined` and `false` are falsy, `===` compares containers by identity,
//! and integral numbers print without a fractional part.

use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Serializer};

use crate::object::{ReactiveList, ReactiveObject};
use crate::runtime::NodeId;

/// Errors raised by native functions and host objects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
	/// A call target was not callable
	#[error("{0} is not a function")]
	NotAFunction(String),

	/// Property access on `null` or `undefined`
	#[error("Cannot read properties of {target} (reading '{key}')")]
	NullAccess { target: String, key: String },

	/// An argument had the wrong shape
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// A container reached itself during JSON conversion
	#[error("Converting circular structure to JSON")]
	Circular,

	/// Free-form failure raised by application code
	#[error("{0}")]
	Custom(String),
}

/// Result type for native functions
pub type ValueResult<T> = Result<T, ValueError>;

type NativeFn = dyn Fn(&[Value]) -> ValueResult<Value>;

/// A named native callable.
#[derive(Clone)]
pub struct Function {
	name: Rc<str>,
	call: Rc<NativeFn>,
}

impl Function {
	pub fn new<F>(name: impl Into<Rc<str>>, f: F) -> Self
	where
		F: Fn(&[Value]) -> ValueResult<Value> + 'static,
	{
		Self {
			name: name.into(),
			call: Rc::new(f),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn call(&self, args: &[Value]) -> ValueResult<Value> {
		(self.call)(args)
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.call, &other.call)
	}
}

impl fmt::Debug for Function {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Function({})", self.name)
	}
}

/// An opaque value supplied by the host application.
///
/// Host objects are how helpers such as the attribute bag, the store handle
/// or injected services appear inside templates.
pub trait HostObject {
	/// Name used in diagnostics
	fn type_name(&self) -> &str;

	/// Property read; `Undefined` when absent
	fn get(&self, _key: &str) -> Value {
		Value::Undefined
	}

	/// Method call `object.name(args)`
	fn call_method(&self, name: &str, _args: &[Value]) -> ValueResult<Value> {
		Err(ValueError::NotAFunction(format!(
			"{}.{}",
			self.type_name(),
			name
		)))
	}

	/// String conversion used by interpolation
	fn display(&self) -> String {
		"[object Object]".to_string()
	}

	/// JSON form used by `@json`
	fn to_json(&self) -> serde_json::Value {
		serde_json::Value::Object(serde_json::Map::new())
	}
}

/// A template-visible value.
#[derive(Clone, Default)]
pub enum Value {
	#[default]
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
	List(ReactiveList),
	Object(ReactiveObject),
	Function(Function),
	Host(Rc<dyn HostObject>),
}

impl Value {
	/// Wrap a closure as a callable value.
	pub fn function<F>(name: &str, f: F) -> Self
	where
		F: Fn(&[Value]) -> ValueResult<Value> + 'static,
	{
		Self::Function(Function::new(name, f))
	}

	/// Wrap a host object.
	pub fn host(object: impl HostObject + 'static) -> Self {
		Self::Host(Rc::new(object))
	}

	pub fn is_undefined(&self) -> bool {
		matches!(self, Self::Undefined)
	}

	/// `null` or `undefined`
	pub fn is_nullish(&self) -> bool {
		matches!(self, Self::Undefined | Self::Null)
	}

	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Undefined | Self::Null => false,
			Self::Bool(b) => *b,
			Self::Number(n) => *n != 0.0 && !n.is_nan(),
			Self::String(s) => !s.is_empty(),
			Self::List(_) | Self::Object(_) | Self::Function(_) | Self::Host(_) => true,
		}
	}

	pub fn as_object(&self) -> Option<&ReactiveObject> {
		match self {
			Self::Object(object) => Some(object),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&ReactiveList> {
		match self {
			Self::List(list) => Some(list),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_function(&self) -> Option<&Function> {
		match self {
			Self::Function(function) => Some(function),
			_ => None,
		}
	}

	/// Result of the `typeof` operator
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Undefined => "undefined",
			Self::Null | Self::List(_) | Self::Object(_) | Self::Host(_) => "object",
			Self::Bool(_) => "boolean",
			Self::Number(_) => "number",
			Self::String(_) => "string",
			Self::Function(_) => "function",
		}
	}

	/// `===`: primitives by value, everything else by identity.
	pub fn strict_equals(&self, other: &Value) -> bool {
		match (self, other) {
			(Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => a == b,
			(Self::String(a), Self::String(b)) => a == b,
			(Self::List(a), Self::List(b)) => a.ptr_eq(b),
			(Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
			(Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
			(Self::Host(a), Self::Host(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
			_ => false,
		}
	}

	/// `==` with primitive coercion.
	pub fn loose_equals(&self, other: &Value) -> bool {
		match (self, other) {
			(a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
			(Self::Bool(b), other) | (other, Self::Bool(b)) => {
				Value::Number(if *b { 1.0 } else { 0.0 }).loose_equals(other)
			}
			(Self::Number(_), Self::String(_)) | (Self::String(_), Self::Number(_)) => {
				self.to_number() == other.to_number()
			}
			(Self::Number(_) | Self::String(_), Self::Number(_) | Self::String(_)) => {
				self.strict_equals(other)
			}
			(a, b) if a.is_primitive() && !b.is_primitive() => {
				a.loose_equals(&Value::String(b.to_display_string()))
			}
			(a, b) if !a.is_primitive() && b.is_primitive() => {
				Value::String(a.to_display_string()).loose_equals(b)
			}
			(a, b) => a.strict_equals(b),
		}
	}

	fn is_primitive(&self) -> bool {
		matches!(
			self,
			Self::Undefined | Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_)
		)
	}

	/// Numeric conversion (`NaN` when not numeric).
	pub fn to_number(&self) -> f64 {
		match self {
			Self::Undefined => f64::NAN,
			Self::Null => 0.0,
			Self::Bool(b) => {
				if *b {
					1.0
				} else {
					0.0
				}
			}
			Self::Number(n) => *n,
			Self::String(s) => parse_number(s),
			Self::List(_) => parse_number(&self.to_display_string()),
			Self::Object(_) | Self::Function(_) | Self::Host(_) => f64::NAN,
		}
	}

	/// String conversion used by interpolation and concatenation.
	///
	/// A list that contains itself prints the repeated element as an empty
	/// string.
	pub fn to_display_string(&self) -> String {
		self.display_within(&mut Vec::new())
	}

	fn display_within(&self, seen: &mut Vec<NodeId>) -> String {
		match self {
			Self::Undefined => "undefined".to_string(),
			Self::Null => "null".to_string(),
			Self::Bool(b) => b.to_string(),
			Self::Number(n) => format_number(*n),
			Self::String(s) => s.clone(),
			Self::List(list) => {
				if seen.contains(&list.id()) {
					return String::new();
				}
				seen.push(list.id());
				let text = list
					.to_vec()
					.iter()
					.map(|item| {
						if item.is_nullish() {
							String::new()
						} else {
							item.display_within(seen)
						}
					})
					.collect::<Vec<_>>()
					.join(",");
				seen.pop();
				text
			}
			Self::Object(_) => "[object Object]".to_string(),
			Self::Function(function) => format!("function {}() {{ [native code] }}", function.name()),
			Self::Host(host) => host.display(),
		}
	}

	/// JSON form. `undefined` and functions become `null`; object fields
	/// holding them are skipped. A circular structure becomes `null`; use
	/// [`Value::try_to_json`] to detect it.
	pub fn to_json(&self) -> serde_json::Value {
		self.try_to_json().unwrap_or(serde_json::Value::Null)
	}

	/// JSON form that fails with [`ValueError::Circular`] when a container
	/// is reachable from itself.
	pub fn try_to_json(&self) -> ValueResult<serde_json::Value> {
		self.json_within(&mut Vec::new())
	}

	fn json_within(&self, seen: &mut Vec<NodeId>) -> ValueResult<serde_json::Value> {
		let json = match self {
			Self::Undefined | Self::Null | Self::Function(_) => serde_json::Value::Null,
			Self::Bool(b) => serde_json::Value::Bool(*b),
			Self::Number(n) => number_to_json(*n),
			Self::String(s) => serde_json::Value::String(s.clone()),
			Self::List(list) => {
				enter(seen, list.id())?;
				let items = list
					.to_vec()
					.iter()
					.map(|item| item.json_within(seen))
					.collect::<ValueResult<Vec<_>>>()?;
				seen.pop();
				serde_json::Value::Array(items)
			}
			Self::Object(object) => {
				enter(seen, object.id())?;
				let mut map = serde_json::Map::new();
				for (key, value) in object.entries() {
					if matches!(value, Self::Undefined | Self::Function(_)) {
						continue;
					}
					map.insert(key, value.json_within(seen)?);
				}
				seen.pop();
				serde_json::Value::Object(map)
			}
			Self::Host(host) => host.to_json(),
		};
		Ok(json)
	}
}

fn enter(seen: &mut Vec<NodeId>, id: NodeId) -> ValueResult<()> {
	if seen.contains(&id) {
		return Err(ValueError::Circular);
	}
	seen.push(id);
	Ok(())
}

fn parse_number(s: &str) -> f64 {
	let trimmed = s.trim();
	if trimmed.is_empty() {
		return 0.0;
	}
	match trimmed {
		"Infinity" | "+Infinity" => return f64::INFINITY,
		"-Infinity" => return f64::NEG_INFINITY,
		_ => {}
	}
	// Rust accepts "inf" and "nan" spellings that scripts do not
	if trimmed
		.chars()
		.any(|c| !(c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')))
	{
		return f64::NAN;
	}
	trimmed.parse().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
	if n.is_nan() {
		"NaN".to_string()
	} else if n.is_infinite() {
		if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
	} else if n == 0.0 {
		"0".to_string()
	} else if n.fract() == 0.0 && n.abs() < 1e21 {
		format!("{n:.0}")
	} else {
		n.to_string()
	}
}

fn number_to_json(n: f64) -> serde_json::Value {
	if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
		serde_json::Value::Number((n as i64).into())
	} else {
		serde_json::Number::from_f64(n)
			.map(serde_json::Value::Number)
			.unwrap_or(serde_json::Value::Null)
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Undefined => write!(f, "Undefined"),
			Self::Null => write!(f, "Null"),
			Self::Bool(b) => write!(f, "Bool({b})"),
			Self::Number(n) => write!(f, "Number({n})"),
			Self::String(s) => write!(f, "String({s:?})"),
			Self::List(list) => write!(f, "{list:?}"),
			Self::Object(object) => write!(f, "{object:?}"),
			Self::Function(function) => write!(f, "{function:?}"),
			Self::Host(host) => write!(f, "Host({})", host.type_name()),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_display_string())
	}
}

/// Same as [`Value::strict_equals`].
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		self.strict_equals(other)
	}
}

impl Serialize for Value {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.try_to_json()
			.map_err(<S::Error as serde::ser::Error>::custom)?
			.serialize(serializer)
	}
}

impl From<serde_json::Value> for Value {
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Self::Null,
			serde_json::Value::Bool(b) => Self::Bool(b),
			serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
			serde_json::Value::String(s) => Self::String(s),
			serde_json::Value::Array(items) => Self::List(ReactiveList::from_values(
				items.into_iter().map(Value::from).collect(),
			)),
			serde_json::Value::Object(map) => Self::Object(ReactiveObject::from_entries(
				map.into_iter().map(|(key, value)| (key, Value::from(value))),
			)),
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

macro_rules! impl_from_integer {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for Value {
				fn from(value: $ty) -> Self {
					Self::Number(value as f64)
				}
			}
		)*
	};
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<ReactiveObject> for Value {
	fn from(value: ReactiveObject) -> Self {
		Self::Object(value)
	}
}

impl From<ReactiveList> for Value {
	fn from(value: ReactiveList) -> Self {
		Self::List(value)
	}
}

impl From<Function> for Value {
	fn from(value: Function) -> Self {
		Self::Function(value)
	}
}

impl From<Vec<Value>> for Value {
	fn from(value: Vec<Value>) -> Self {
		Self::List(ReactiveList::from_values(value))
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(Self::Null)
	}
}
