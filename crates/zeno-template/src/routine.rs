//! Compiled render routines
//!
//! A [`Routine`] is the executable form of a template: a tree of [`Op`]s
//! produced by [`crate::codegen`] and interpreted against a [`Scope`] on
//! every render. Everything that reaches outside the template (child
//! components, layouts, included views, sections, stacks and services) goes
//! through the [`RenderHost`] the routine is rendered with.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use zeno_reactive::{ReactiveObject, Value, ValueError};

use crate::expr::{Environment, EvalError, Expr, evaluate};
use crate::helpers::{class_names, escape_html, style_names};
use crate::markup::{Diagnostic, DiagnosticKind, Rendered};

/// Errors raised while rendering a routine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
	#[error(transparent)]
	Eval(#[from] EvalError),

	#[error("{0} is not iterable")]
	NotIterable(String),

	/// A section or slot body failed while rendering inside another template
	#[error("{0}")]
	Fragment(String),
}

/// A deferred piece of markup, such as a slot or a section body.
#[derive(Clone)]
pub struct Fragment(Rc<dyn Fn() -> Rendered>);

impl Fragment {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn() -> Rendered + 'static,
	{
		Self(Rc::new(f))
	}

	/// Fragment that always renders `html`.
	pub fn markup(html: impl Into<String>) -> Self {
		let html = html.into();
		Self::new(move || Rendered::Markup(html.clone()))
	}

	pub fn render(&self) -> Rendered {
		(self.0)()
	}
}

impl fmt::Debug for Fragment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Fragment")
	}
}

/// Named fragments: component slots or layout sections.
pub type SlotMap = IndexMap<String, Fragment>;

/// Everything a routine needs from the instance rendering it.
pub trait RenderHost {
	/// Render a registered component as a child of the host.
	fn render_component(&self, name: &str, attrs: IndexMap<String, Value>, slots: SlotMap) -> Rendered;

	/// Render a registered layout, filling its `@yield`s from `sections`.
	fn render_layout(&self, name: &str, sections: SlotMap) -> Rendered;

	/// Render a registered view with the host's data merged with `data`.
	fn render_include(&self, name: &str, data: Option<Value>) -> Rendered;

	/// Section provided by the template that extends this one.
	fn section(&self, name: &str) -> Option<Fragment>;

	/// Append `content` to the named stack.
	fn push(&self, stack: &str, content: String);

	/// Everything pushed to the named stack so far, concatenated.
	fn stack(&self, stack: &str) -> String;

	/// Resolve an injectable service.
	fn service(&self, name: &str) -> Option<Value>;
}

#[derive(Debug)]
struct Locals {
	vars: IndexMap<String, Value>,
	parent: Option<Rc<Locals>>,
}

/// Name resolution for a render: template locals first, then the
/// instance data, then the globals.
#[derive(Clone)]
pub struct Scope {
	data: ReactiveObject,
	globals: Rc<IndexMap<String, Value>>,
	locals: Option<Rc<Locals>>,
}

impl Scope {
	pub fn new(data: ReactiveObject, globals: Rc<IndexMap<String, Value>>) -> Self {
		Self {
			data,
			globals,
			locals: None,
		}
	}

	pub fn data(&self) -> &ReactiveObject {
		&self.data
	}

	/// A child scope with extra locals shadowing this one.
	pub fn with_locals(&self, vars: IndexMap<String, Value>) -> Self {
		Self {
			data: self.data.clone(),
			globals: Rc::clone(&self.globals),
			locals: Some(Rc::new(Locals {
				vars,
				parent: self.locals.clone(),
			})),
		}
	}

	pub fn with_local(&self, name: impl Into<String>, value: Value) -> Self {
		let mut vars = IndexMap::new();
		vars.insert(name.into(), value);
		self.with_locals(vars)
	}

	/// Look `name` up among the template locals only.
	pub fn local(&self, name: &str) -> Option<Value> {
		let mut frame = self.locals.as_deref();
		while let Some(locals) = frame {
			if let Some(value) = locals.vars.get(name) {
				return Some(value.clone());
			}
			frame = locals.parent.as_deref();
		}
		None
	}
}

impl Environment for Scope {
	fn lookup(&self, name: &str) -> Option<Value> {
		self.local(name)
			.or_else(|| self.data.lookup(name))
			.or_else(|| self.globals.get(name).cloned())
	}
}

impl fmt::Debug for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Scope")
			.field("data", &self.data.id())
			.field("globals", &self.globals.keys().collect::<Vec<_>>())
			.field("locals", &self.locals)
			.finish()
	}
}

/// Test of a conditional branch.
#[derive(Debug, Clone)]
pub(crate) enum Condition {
	Truthy(Expr),
	Falsy(Expr),
	/// Defined and not null; an unresolvable expression is not set
	Isset(Expr),
	/// Falsy or an empty list; an unresolvable expression is empty
	Empty(Expr),
}

impl Condition {
	fn holds(&self, scope: &Scope) -> Result<bool, RenderError> {
		let (expr, unset) = match self {
			Self::Truthy(expr) => return Ok(evaluate(expr, scope)?.is_truthy()),
			Self::Falsy(expr) => return Ok(!evaluate(expr, scope)?.is_truthy()),
			Self::Isset(expr) => (expr, false),
			Self::Empty(expr) => (expr, true),
		};
		let value = match evaluate(expr, scope) {
			Ok(value) => value,
			Err(err) if is_unresolvable(&err) => return Ok(unset),
			Err(err) => return Err(err.into()),
		};
		Ok(match self {
			Self::Isset(_) => !value.is_nullish(),
			_ => !value.is_truthy() || value.as_list().is_some_and(|list| list.is_empty()),
		})
	}
}

fn is_unresolvable(err: &EvalError) -> bool {
	err.is_reference() || matches!(err, EvalError::Value(ValueError::NullAccess { .. }))
}

/// Component attribute value.
#[derive(Debug, Clone)]
pub(crate) enum AttrValue {
	Literal(String),
	Dynamic(Expr),
}

/// One instruction of a routine.
#[derive(Debug, Clone)]
pub(crate) enum Op {
	Text(String),
	Echo(Expr),
	If {
		branches: Vec<(Condition, Vec<Op>)>,
		otherwise: Vec<Op>,
	},
	/// `labels` point into `body`; `None` is the default label
	Switch {
		subject: Expr,
		labels: Vec<(Option<Expr>, usize)>,
		body: Vec<Op>,
	},
	Foreach {
		source: Expr,
		key: Option<String>,
		item: String,
		body: Vec<Op>,
	},
	Break,
	Json(Expr),
	Class(Expr),
	Style(Expr),
	BoolAttr {
		name: String,
		condition: Expr,
	},
	Click(String),
	Model {
		path: String,
		value: Expr,
	},
	Yield {
		section: String,
		default: Option<Expr>,
	},
	Push {
		stack: String,
		body: Vec<Op>,
	},
	Stack(String),
	Include {
		view: Expr,
		data: Option<Expr>,
	},
	Inject {
		local: String,
		service: String,
	},
	Component {
		name: String,
		attrs: Vec<(String, AttrValue)>,
		slots: Vec<(String, Rc<Vec<Op>>)>,
	},
	LegacyComponent {
		name: Expr,
		data: Option<Expr>,
		body: Option<Rc<Vec<Op>>>,
	},
	Extends {
		layout: String,
		sections: Vec<(String, Rc<Vec<Op>>)>,
	},
}

enum Flow {
	Normal,
	Break,
}

/// An executable template.
#[derive(Debug, Clone)]
pub struct Routine {
	ops: Rc<Vec<Op>>,
}

impl Routine {
	pub(crate) fn new(ops: Vec<Op>) -> Self {
		Self { ops: Rc::new(ops) }
	}

	/// A routine that always renders `text`.
	pub fn fixed(text: impl Into<String>) -> Self {
		Self::new(vec![Op::Text(text.into())])
	}

	#[cfg(test)]
	pub(crate) fn ops(&self) -> &[Op] {
		&self.ops
	}

	/// Layout named by `@extends`, if this template extends one.
	pub fn layout(&self) -> Option<&str> {
		self.ops.iter().find_map(|op| match op {
			Op::Extends { layout, .. } => Some(layout.as_str()),
			_ => None,
		})
	}

	/// Render against `scope`.
	///
	/// Reads go through the reactive containers, so rendering inside an
	/// effect subscribes it to everything the template touched.
	///
	/// # Example
	///
	/// ```ignore
	/// let routine = compile("Hello {{ name }}")?;
	/// let scope = Scope::new(data, globals);
	/// assert_eq!(routine.render(&scope, &host)?, "Hello Ada");
	/// ```
	pub fn render(&self, scope: &Scope, host: &Rc<dyn RenderHost>) -> Result<String, RenderError> {
		Renderer { host }.render_ops(&self.ops, scope)
	}
}

struct Renderer<'h> {
	host: &'h Rc<dyn RenderHost>,
}

impl Renderer<'_> {
	fn render_ops(&self, ops: &[Op], scope: &Scope) -> Result<String, RenderError> {
		let mut out = String::new();
		self.run(ops, scope, &mut out)?;
		Ok(out)
	}

	fn run(&self, ops: &[Op], scope: &Scope, out: &mut String) -> Result<Flow, RenderError> {
		// `@inject` rebinds the scope for the remaining ops
		let mut scope = scope.clone();
		for op in ops {
			match op {
				Op::Text(text) => out.push_str(text),
				Op::Echo(expr) => out.push_str(&evaluate(expr, &scope)?.to_display_string()),
				Op::If {
					branches,
					otherwise,
				} => {
					let mut chosen = otherwise;
					for (condition, body) in branches {
						if condition.holds(&scope)? {
							chosen = body;
							break;
						}
					}
					if let Flow::Break = self.run(chosen, &scope, out)? {
						return Ok(Flow::Break);
					}
				}
				Op::Switch {
					subject,
					labels,
					body,
				} => {
					if let Some(start) = self.switch_entry(subject, labels, &scope)? {
						self.run(&body[start..], &scope, out)?;
					}
				}
				Op::Foreach {
					source,
					key,
					item,
					body,
				} => self.foreach(source, key.as_deref(), item, body, &scope, out)?,
				Op::Break => return Ok(Flow::Break),
				Op::Json(expr) => {
					let json = match evaluate(expr, &scope)? {
						Value::Undefined | Value::Function(_) => "undefined".to_string(),
						value => value.try_to_json().map_err(EvalError::from)?.to_string(),
					};
					out.push_str(&json);
				}
				Op::Class(expr) => {
					let classes = class_names(&evaluate(expr, &scope)?);
					out.push_str(&format!(r#"class="{classes}""#));
				}
				Op::Style(expr) => {
					let style = style_names(&evaluate(expr, &scope)?);
					out.push_str(&format!(r#"style="{style}""#));
				}
				Op::BoolAttr { name, condition } => {
					if evaluate(condition, &scope)?.is_truthy() {
						out.push_str(name);
					}
				}
				Op::Click(handler) => out.push_str(&format!(r#"data-z-click="{handler}""#)),
				Op::Model { path, value } => {
					let current = evaluate(value, &scope)?;
					let current = if current.is_nullish() {
						String::new()
					} else {
						escape_html(&current.to_display_string())
					};
					out.push_str(&format!(r#"value="{current}" data-z-model="{path}""#));
				}
				Op::Yield { section, default } => match self.host.section(section) {
					Some(fragment) => match fragment.render() {
						Rendered::Markup(html) => out.push_str(&html),
						Rendered::Diagnostic(diagnostic) => {
							return Err(RenderError::Fragment(diagnostic.message));
						}
					},
					None => {
						if let Some(default) = default {
							let value = evaluate(default, &scope)?;
							if !value.is_nullish() {
								out.push_str(&value.to_display_string());
							}
						}
					}
				},
				Op::Push { stack, body } => {
					let content = self.render_ops(body, &scope)?;
					self.host.push(stack, content);
				}
				Op::Stack(stack) => out.push_str(&self.host.stack(stack)),
				Op::Include { view, data } => {
					let view = evaluate(view, &scope)?.to_display_string();
					let data = data
						.as_ref()
						.map(|data| evaluate(data, &scope))
						.transpose()?;
					out.push_str(self.host.render_include(&view, data).as_html());
				}
				Op::Inject { local, service } => {
					let value = self.host.service(service).unwrap_or_else(|| {
						tracing::warn!(service = %service, "Injected service is not registered");
						Value::Undefined
					});
					scope = scope.with_local(local.clone(), value);
				}
				Op::Component { name, attrs, slots } => {
					let mut values = IndexMap::new();
					for (attr, value) in attrs {
						let value = match value {
							AttrValue::Literal(text) => Value::String(text.clone()),
							AttrValue::Dynamic(expr) => evaluate(expr, &scope)?,
						};
						values.insert(attr.clone(), value);
					}
					let slots = slots
						.iter()
						.map(|(slot, body)| (slot.clone(), self.fragment(body, &scope)))
						.collect();
					out.push_str(self.host.render_component(name, values, slots).as_html());
				}
				Op::LegacyComponent { name, data, body } => {
					let name = evaluate(name, &scope)?.to_display_string();
					let mut attrs = IndexMap::new();
					if let Some(data) = data {
						if let Value::Object(object) = evaluate(data, &scope)? {
							attrs.extend(object.entries());
						}
					}
					let mut slots = SlotMap::new();
					if let Some(body) = body {
						slots.insert("default".to_string(), self.fragment(body, &scope));
					}
					out.push_str(self.host.render_component(&name, attrs, slots).as_html());
				}
				Op::Extends { layout, sections } => {
					let sections = sections
						.iter()
						.map(|(section, body)| (section.clone(), self.fragment(body, &scope)))
						.collect();
					out.push_str(self.host.render_layout(layout, sections).as_html());
				}
			}
		}
		Ok(Flow::Normal)
	}

	/// Position in the switch body where execution starts. Case labels are
	/// tested in order with strict equality; the default label is the
	/// fallback wherever it appears.
	fn switch_entry(
		&self,
		subject: &Expr,
		labels: &[(Option<Expr>, usize)],
		scope: &Scope,
	) -> Result<Option<usize>, RenderError> {
		let subject = evaluate(subject, scope)?;
		for (test, position) in labels {
			if let Some(test) = test {
				if evaluate(test, scope)?.strict_equals(&subject) {
					return Ok(Some(*position));
				}
			}
		}
		Ok(labels
			.iter()
			.find(|(test, _)| test.is_none())
			.map(|(_, position)| *position))
	}

	fn foreach(
		&self,
		source: &Expr,
		key: Option<&str>,
		item: &str,
		body: &[Op],
		scope: &Scope,
		out: &mut String,
	) -> Result<(), RenderError> {
		let entries = iteration_entries(source, &evaluate(source, scope)?)?;
		let count = entries.len();
		let parent = scope.local("loop");
		let depth = parent
			.as_ref()
			.and_then(Value::as_object)
			.map_or(1, |outer| outer.get_untracked("depth").to_number() as usize + 1);

		for (index, (entry_key, entry_value)) in entries.into_iter().enumerate() {
			let mut vars = IndexMap::new();
			vars.insert(
				"loop".to_string(),
				Value::Object(loop_record(index, count, depth, parent.clone())),
			);
			if let Some(key) = key {
				vars.insert(key.to_string(), entry_key);
			}
			vars.insert(item.to_string(), entry_value);
			if let Flow::Break = self.run(body, &scope.with_locals(vars), out)? {
				break;
			}
		}
		Ok(())
	}

	fn fragment(&self, body: &Rc<Vec<Op>>, scope: &Scope) -> Fragment {
		let body = Rc::clone(body);
		let scope = scope.clone();
		let host = Rc::clone(self.host);
		Fragment::new(move || match (Renderer { host: &host }).render_ops(&body, &scope) {
			Ok(html) => Rendered::Markup(html),
			Err(err) => Rendered::Diagnostic(Diagnostic::nested(DiagnosticKind::Render, err.to_string())),
		})
	}
}

/// `(key, value)` pairs visited by `@foreach`. Falsy sources iterate
/// nothing, lists and strings iterate by position, objects by key.
fn iteration_entries(source: &Expr, value: &Value) -> Result<Vec<(Value, Value)>, RenderError> {
	if !value.is_truthy() {
		return Ok(Vec::new());
	}
	match value {
		Value::List(list) => Ok(list
			.to_vec()
			.into_iter()
			.enumerate()
			.map(|(index, item)| (Value::from(index), item))
			.collect()),
		Value::String(s) => Ok(s
			.chars()
			.enumerate()
			.map(|(index, c)| (Value::from(index), Value::String(c.to_string())))
			.collect()),
		Value::Object(object) => Ok(object
			.entries()
			.into_iter()
			.map(|(key, item)| (Value::String(key), item))
			.collect()),
		_ => Err(RenderError::NotIterable(source.describe())),
	}
}

/// The `loop` variable of one iteration.
fn loop_record(index: usize, count: usize, depth: usize, parent: Option<Value>) -> ReactiveObject {
	let mut entries = vec![
		("index", Value::from(index)),
		("iteration", Value::from(index + 1)),
		("remaining", Value::from(count - index - 1)),
		("count", Value::from(count)),
		("first", Value::Bool(index == 0)),
		("last", Value::Bool(index + 1 == count)),
		("even", Value::Bool((index + 1) % 2 == 0)),
		("odd", Value::Bool((index + 1) % 2 == 1)),
		("depth", Value::from(depth)),
	];
	if let Some(parent) = parent {
		entries.push(("parent", parent));
	}
	ReactiveObject::from_entries(entries)
}
