//! Expression evaluation

use zeno_reactive::{ReactiveList, ReactiveObject, Value, ValueError};

use super::{BinaryOp, Expr, Literal, LogicalOp, UnaryOp};

/// Name resolution for identifiers.
pub trait Environment {
	/// Resolve `name`; `None` means the name is not defined at all.
	fn lookup(&self, name: &str) -> Option<Value>;
}

/// Errors raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
	/// An identifier that resolves nowhere
	#[error("{0} is not defined")]
	Reference(String),

	/// An operation applied to a value of the wrong kind
	#[error("{0}")]
	Type(String),

	/// Failure raised by a native function or host object
	#[error(transparent)]
	Value(#[from] ValueError),
}

impl EvalError {
	pub fn is_reference(&self) -> bool {
		matches!(self, Self::Reference(_))
	}
}

/// Evaluate `expr` against `env`.
///
/// Reads of reactive containers are tracked as usual, so evaluating inside
/// an effect records the effect's dependencies.
pub fn evaluate(expr: &Expr, env: &dyn Environment) -> Result<Value, EvalError> {
	match expr {
		Expr::Literal(literal) => Ok(literal_value(literal)),
		Expr::Identifier(name) => env
			.lookup(name)
			.ok_or_else(|| EvalError::Reference(name.clone())),
		Expr::Array(items) => {
			let values = items
				.iter()
				.map(|item| evaluate(item, env))
				.collect::<Result<Vec<_>, _>>()?;
			Ok(Value::List(ReactiveList::from_values(values)))
		}
		Expr::Object(entries) => {
			let mut values = Vec::with_capacity(entries.len());
			for (key, value) in entries {
				values.push((key.clone(), evaluate(value, env)?));
			}
			Ok(Value::Object(ReactiveObject::from_entries(values)))
		}
		Expr::Member { object, property } => {
			let target = evaluate(object, env)?;
			get_property(&target, property)
		}
		Expr::Index { object, index } => {
			let target = evaluate(object, env)?;
			let index = evaluate(index, env)?;
			get_index(&target, &index)
		}
		Expr::Call { callee, args } => call(callee, args, env),
		Expr::Unary { op, operand } => unary(*op, operand, env),
		Expr::Binary { op, left, right } => {
			let left = evaluate(left, env)?;
			let right = evaluate(right, env)?;
			Ok(binary(*op, &left, &right))
		}
		Expr::Logical { op, left, right } => {
			let left = evaluate(left, env)?;
			let short_circuit = match op {
				LogicalOp::And => !left.is_truthy(),
				LogicalOp::Or => left.is_truthy(),
				LogicalOp::Nullish => !left.is_nullish(),
			};
			if short_circuit {
				Ok(left)
			} else {
				evaluate(right, env)
			}
		}
		Expr::Conditional {
			test,
			consequent,
			alternate,
		} => {
			if evaluate(test, env)?.is_truthy() {
				evaluate(consequent, env)
			} else {
				evaluate(alternate, env)
			}
		}
	}
}

fn literal_value(literal: &Literal) -> Value {
	match literal {
		Literal::Undefined => Value::Undefined,
		Literal::Null => Value::Null,
		Literal::Bool(b) => Value::Bool(*b),
		Literal::Number(n) => Value::Number(*n),
		Literal::String(s) => Value::String(s.clone()),
	}
}

fn null_access(target: &Value, key: &str) -> EvalError {
	EvalError::Value(ValueError::NullAccess {
		target: target.to_display_string(),
		key: key.to_string(),
	})
}

/// Property read with the usual scripting semantics.
pub(crate) fn get_property(target: &Value, key: &str) -> Result<Value, EvalError> {
	Ok(match target {
		Value::Undefined | Value::Null => return Err(null_access(target, key)),
		Value::Object(object) => object.get(key),
		Value::List(list) => match key {
			"length" => Value::from(list.len()),
			_ => match key.parse::<usize>() {
				Ok(index) => list.get(index),
				Err(_) => Value::Undefined,
			},
		},
		Value::String(s) => match key {
			"length" => Value::from(s.chars().count()),
			_ => key
				.parse::<usize>()
				.ok()
				.and_then(|index| s.chars().nth(index))
				.map(|c| Value::String(c.to_string()))
				.unwrap_or(Value::Undefined),
		},
		Value::Host(host) => host.get(key),
		Value::Function(function) => match key {
			"name" => Value::from(function.name()),
			_ => Value::Undefined,
		},
		Value::Bool(_) | Value::Number(_) => Value::Undefined,
	})
}

fn get_index(target: &Value, index: &Value) -> Result<Value, EvalError> {
	if let (Value::List(list), Value::Number(n)) = (target, index) {
		if *n >= 0.0 && n.fract() == 0.0 {
			return Ok(list.get(*n as usize));
		}
	}
	get_property(target, &index.to_display_string())
}

fn call(callee: &Expr, args: &[Expr], env: &dyn Environment) -> Result<Value, EvalError> {
	if let Expr::Member { object, property } = callee {
		let receiver = evaluate(object, env)?;
		let args = evaluate_args(args, env)?;
		return call_method(&receiver, property, &args, callee);
	}

	let target = evaluate(callee, env)?;
	let args = evaluate_args(args, env)?;
	match target {
		Value::Function(function) => Ok(function.call(&args)?),
		_ => Err(EvalError::Type(format!(
			"{} is not a function",
			callee.describe()
		))),
	}
}

fn evaluate_args(args: &[Expr], env: &dyn Environment) -> Result<Vec<Value>, EvalError> {
	args.iter().map(|arg| evaluate(arg, env)).collect()
}

fn not_a_function(callee: &Expr) -> EvalError {
	EvalError::Type(format!("{} is not a function", callee.describe()))
}

fn call_method(
	receiver: &Value,
	name: &str,
	args: &[Value],
	callee: &Expr,
) -> Result<Value, EvalError> {
	match receiver {
		Value::Undefined | Value::Null => Err(null_access(receiver, name)),
		Value::Object(object) => match object.get(name) {
			Value::Function(function) => Ok(function.call(args)?),
			_ => Err(not_a_function(callee)),
		},
		Value::Host(host) => Ok(host.call_method(name, args)?),
		Value::String(s) => string_method(s, name, args).ok_or_else(|| not_a_function(callee)),
		Value::List(list) => list_method(list, name, args).ok_or_else(|| not_a_function(callee)),
		Value::Number(n) => number_method(*n, name, args).ok_or_else(|| not_a_function(callee)),
		Value::Bool(_) | Value::Function(_) => match name {
			"toString" => Ok(Value::String(receiver.to_display_string())),
			_ => Err(not_a_function(callee)),
		},
	}
}

fn arg_string(args: &[Value], index: usize) -> String {
	args.get(index)
		.map(Value::to_display_string)
		.unwrap_or_else(|| "undefined".to_string())
}

/// Clamp a relative index the way `slice` does.
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
	let Some(value) = value.filter(|v| !v.is_undefined()) else {
		return default;
	};
	let n = value.to_number();
	if n.is_nan() {
		return 0;
	}
	let n = n.trunc();
	if n < 0.0 {
		(len as f64 + n).max(0.0) as usize
	} else {
		(n as usize).min(len)
	}
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Option<Value> {
	let value = match name {
		"toUpperCase" => Value::String(s.to_uppercase()),
		"toLowerCase" => Value::String(s.to_lowercase()),
		"trim" => Value::String(s.trim().to_string()),
		"toString" => Value::String(s.to_string()),
		"includes" => Value::Bool(s.contains(&arg_string(args, 0))),
		"startsWith" => Value::Bool(s.starts_with(&arg_string(args, 0))),
		"endsWith" => Value::Bool(s.ends_with(&arg_string(args, 0))),
		"indexOf" => {
			let needle = arg_string(args, 0);
			match s.find(&needle) {
				Some(byte_index) => Value::from(s[..byte_index].chars().count()),
				None => Value::Number(-1.0),
			}
		}
		"slice" => {
			let chars: Vec<char> = s.chars().collect();
			let start = relative_index(args.first(), chars.len(), 0);
			let end = relative_index(args.get(1), chars.len(), chars.len());
			Value::String(chars[start..end.max(start)].iter().collect())
		}
		"split" => {
			let separator = arg_string(args, 0);
			let pieces: Vec<Value> = if separator.is_empty() {
				s.chars().map(|c| Value::String(c.to_string())).collect()
			} else {
				s.split(separator.as_str()).map(Value::from).collect()
			};
			Value::List(ReactiveList::from_values(pieces))
		}
		_ => return None,
	};
	Some(value)
}

fn list_method(list: &ReactiveList, name: &str, args: &[Value]) -> Option<Value> {
	let value = match name {
		"join" => {
			let separator = match args.first() {
				None | Some(Value::Undefined) => ",".to_string(),
				Some(separator) => separator.to_display_string(),
			};
			let items: Vec<String> = list
				.to_vec()
				.iter()
				.map(|item| {
					if item.is_nullish() {
						String::new()
					} else {
						item.to_display_string()
					}
				})
				.collect();
			Value::String(items.join(&separator))
		}
		"includes" => {
			let needle = args.first().cloned().unwrap_or_default();
			Value::Bool(list.to_vec().iter().any(|item| item.strict_equals(&needle)))
		}
		"indexOf" => {
			let needle = args.first().cloned().unwrap_or_default();
			match list.to_vec().iter().position(|item| item.strict_equals(&needle)) {
				Some(index) => Value::from(index),
				None => Value::Number(-1.0),
			}
		}
		"slice" => {
			let items = list.to_vec();
			let start = relative_index(args.first(), items.len(), 0);
			let end = relative_index(args.get(1), items.len(), items.len());
			Value::List(ReactiveList::from_values(
				items[start..end.max(start)].to_vec(),
			))
		}
		"toString" => Value::String(Value::List(list.clone()).to_display_string()),
		_ => return None,
	};
	Some(value)
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Option<Value> {
	let value = match name {
		"toFixed" => {
			let digits = args
				.first()
				.map(Value::to_number)
				.filter(|d| d.is_finite())
				.unwrap_or(0.0)
				.clamp(0.0, 100.0) as usize;
			Value::String(format!("{n:.digits$}"))
		}
		"toString" => Value::String(Value::Number(n).to_display_string()),
		_ => return None,
	};
	Some(value)
}

fn unary(op: UnaryOp, operand: &Expr, env: &dyn Environment) -> Result<Value, EvalError> {
	if op == UnaryOp::Typeof {
		// `typeof` tolerates undeclared identifiers
		return match evaluate(operand, env) {
			Ok(value) => Ok(Value::from(value.type_name())),
			Err(EvalError::Reference(_)) if matches!(operand, Expr::Identifier(_)) => {
				Ok(Value::from("undefined"))
			}
			Err(err) => Err(err),
		};
	}

	let value = evaluate(operand, env)?;
	Ok(match op {
		UnaryOp::Not => Value::Bool(!value.is_truthy()),
		UnaryOp::Negate => Value::Number(-value.to_number()),
		UnaryOp::Plus => Value::Number(value.to_number()),
		UnaryOp::Typeof => Value::from(value.type_name()),
	})
}

fn is_numeric_primitive(value: &Value) -> bool {
	matches!(
		value,
		Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_)
	)
}

/// Containers, functions and host objects compare and add as their strings.
fn to_primitive(value: &Value) -> Value {
	match value {
		Value::List(_) | Value::Object(_) | Value::Function(_) | Value::Host(_) => {
			Value::String(value.to_display_string())
		}
		other => other.clone(),
	}
}

fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
	let left = to_primitive(left);
	let right = to_primitive(right);
	match (&left, &right) {
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		_ => left.to_number().partial_cmp(&right.to_number()),
	}
}

pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
	use std::cmp::Ordering;

	match op {
		BinaryOp::Add => {
			if is_numeric_primitive(left) && is_numeric_primitive(right) {
				Value::Number(left.to_number() + right.to_number())
			} else {
				let mut text = to_primitive(left).to_display_string();
				text.push_str(&to_primitive(right).to_display_string());
				Value::String(text)
			}
		}
		BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
		BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
		BinaryOp::Divide => Value::Number(left.to_number() / right.to_number()),
		BinaryOp::Remainder => Value::Number(left.to_number() % right.to_number()),
		BinaryOp::Less => Value::Bool(compare(left, right) == Some(Ordering::Less)),
		BinaryOp::LessEqual => Value::Bool(matches!(
			compare(left, right),
			Some(Ordering::Less | Ordering::Equal)
		)),
		BinaryOp::Greater => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
		BinaryOp::GreaterEqual => Value::Bool(matches!(
			compare(left, right),
			Some(Ordering::Greater | Ordering::Equal)
		)),
		BinaryOp::LooseEqual => Value::Bool(left.loose_equals(right)),
		BinaryOp::LooseNotEqual => Value::Bool(!left.loose_equals(right)),
		BinaryOp::StrictEqual => Value::Bool(left.strict_equals(right)),
		BinaryOp::StrictNotEqual => Value::Bool(!left.strict_equals(right)),
	}
}
