//! Code generation
//!
//! Lowers a parsed [`Node`] tree into a [`Routine`]. Expressions are parsed
//! here, once per template, so a malformed expression is a compile error
//! rather than a render error.
//!
//! A template whose root contains `@extends('layout')` compiles in layout
//! mode: only its root-level `@section`, `@push` and `@inject` directives
//! are kept, and rendering it renders the layout with those sections.

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::args::{split_arguments, unquote};
use crate::ast::Node;
use crate::expr::{Expr, ExprError, parse_expression};
use crate::parser::parse;
use crate::routine::{AttrValue, Condition, Op, Routine};

static FOREACH_CLAUSE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^(?s)\s*(.+?)\s+as\s+(?:([A-Za-z_$][\w$]*)\s*=>\s*)?([A-Za-z_$][\w$]*)\s*$")
		.expect("Invalid regex pattern")
});

static COMPONENT_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"(:)?([a-zA-Z0-9_-]+)=["'](.*?)["']"#).expect("Invalid regex pattern")
});

static SLOT_NAME: Lazy<Regex> =
	Lazy::new(|| Regex::new(r#"name=["'](.*?)["']"#).expect("Invalid regex pattern"));

static PROPERTY_PATH: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*$").expect("Invalid regex pattern")
});

const BOOLEAN_ATTRIBUTES: &[&str] = &["checked", "selected", "disabled", "readonly", "required"];

/// Errors raised while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
	#[error("Invalid expression `{expr}` in {context}: {error}")]
	Expression {
		context: String,
		expr: String,
		#[source]
		error: ExprError,
	},

	#[error("@{directive} requires an argument")]
	MissingArgument { directive: String },

	#[error("@{directive} is only allowed {allowed}")]
	MisplacedDirective {
		directive: String,
		allowed: &'static str,
	},

	#[error("Invalid @foreach clause `{0}`, expected `items as item` or `items as key => item`")]
	InvalidForeach(String),

	#[error("@model expects a property path, got `{0}`")]
	InvalidModelPath(String),

	#[error("@inject expects a variable name, got `{0}`")]
	InvalidInjectName(String),

	#[error("Only whitespace may appear before the first @case")]
	ContentBeforeCase,

	#[error("@switch has more than one @default")]
	DuplicateDefault,
}

/// Parse and compile template source.
///
/// # Examples
///
/// ```
/// use zeno_template::compile;
///
/// assert!(compile("@foreach(items as item){{ item }}@endforeach").is_ok());
/// assert!(compile("{{ a + }}").is_err());
/// ```
pub fn compile(source: &str) -> Result<Routine, CompileError> {
	generate(&parse(source))
}

/// Compile an already parsed template.
pub fn generate(root: &Node) -> Result<Routine, CompileError> {
	let children = root.children();
	let mut generator = Generator::default();
	let extends = children.iter().find_map(|node| match node {
		Node::Directive { name, args, .. } if name == "extends" => Some(args.as_deref()),
		_ => None,
	});
	let ops = match extends {
		Some(args) => generator.layout_child(args, children)?,
		None => generator.nodes(children)?,
	};
	Ok(Routine::new(ops))
}

fn expression(context: &str, source: &str) -> Result<Expr, CompileError> {
	parse_expression(source).map_err(|error| CompileError::Expression {
		context: context.to_string(),
		expr: source.to_string(),
		error,
	})
}

/// Arguments of `@directive(...)`; at least one non-blank is required.
fn arguments(directive: &str, args: Option<&str>) -> Result<Vec<String>, CompileError> {
	let parts = args.map(split_arguments).unwrap_or_default();
	if parts.first().is_none_or(|first| first.is_empty()) {
		return Err(CompileError::MissingArgument {
			directive: directive.to_string(),
		});
	}
	Ok(parts)
}

fn argument_expression(directive: &str, args: Option<&str>) -> Result<Expr, CompileError> {
	let source = args.unwrap_or_default();
	if source.trim().is_empty() {
		return Err(CompileError::MissingArgument {
			directive: directive.to_string(),
		});
	}
	expression(&format!("@{directive}"), source)
}

fn misplaced(directive: &str, allowed: &'static str) -> CompileError {
	CompileError::MisplacedDirective {
		directive: directive.to_string(),
		allowed,
	}
}

#[derive(Default)]
struct Generator {
	/// Enclosing `@switch`/`@foreach` blocks a `@break` can leave
	breakable: usize,
}

impl Generator {
	fn nodes(&mut self, nodes: &[Node]) -> Result<Vec<Op>, CompileError> {
		let mut ops = Vec::new();
		for node in nodes {
			self.node(node, &mut ops)?;
		}
		Ok(ops)
	}

	/// Body rendered on its own (slot, section, push), outside any loop.
	fn detached(&mut self, nodes: &[Node]) -> Result<Vec<Op>, CompileError> {
		let saved = std::mem::take(&mut self.breakable);
		let ops = self.nodes(nodes);
		self.breakable = saved;
		ops
	}

	fn breakable_body(&mut self, nodes: &[Node]) -> Result<Vec<Op>, CompileError> {
		self.breakable += 1;
		let ops = self.nodes(nodes);
		self.breakable -= 1;
		ops
	}

	fn node(&mut self, node: &Node, ops: &mut Vec<Op>) -> Result<(), CompileError> {
		match node {
			Node::Root { children } => ops.extend(self.nodes(children)?),
			Node::Text { value } => ops.push(Op::Text(value.clone())),
			Node::Echo { expr } => ops.push(Op::Echo(expression("{{ }}", expr)?)),
			Node::Directive {
				name,
				args,
				children,
			} => self.directive(name, args.as_deref(), children, ops)?,
			Node::Component {
				tag_name,
				attrs,
				children,
			} => ops.push(self.component(tag_name, attrs, children)?),
		}
		Ok(())
	}

	fn directive(
		&mut self,
		name: &str,
		args: Option<&str>,
		children: &[Node],
		ops: &mut Vec<Op>,
	) -> Result<(), CompileError> {
		let op = match name {
			"if" => self.conditional(Condition::Truthy(argument_expression(name, args)?), children)?,
			"unless" => self.conditional(Condition::Falsy(argument_expression(name, args)?), children)?,
			"isset" => self.conditional(Condition::Isset(argument_expression(name, args)?), children)?,
			"empty" => self.conditional(Condition::Empty(argument_expression(name, args)?), children)?,
			"else" | "elseif" => return Err(misplaced(name, "inside @if, @unless, @isset or @empty")),
			"case" | "default" => return Err(misplaced(name, "inside @switch")),
			"break" if self.breakable == 0 => return Err(misplaced(name, "inside @switch or @foreach")),
			"break" => Op::Break,
			"switch" => self.switch(args, children)?,
			"foreach" => self.foreach(args, children)?,
			"json" => Op::Json(argument_expression(name, args)?),
			"class" => Op::Class(argument_expression(name, args)?),
			"style" => Op::Style(argument_expression(name, args)?),
			_ if BOOLEAN_ATTRIBUTES.contains(&name) => Op::BoolAttr {
				name: name.to_string(),
				condition: argument_expression(name, args)?,
			},
			"click" => Op::Click(unquote(&arguments(name, args)?[0]).to_string()),
			"model" => model(args)?,
			"yield" => {
				let parts = arguments(name, args)?;
				Op::Yield {
					section: unquote(&parts[0]).to_string(),
					default: parts
						.get(1)
						.map(|default| expression("@yield", default))
						.transpose()?,
				}
			}
			"section" => {
				let parts = arguments(name, args)?;
				match parts.get(1) {
					Some(value) => Op::Echo(expression("@section", value)?),
					None => {
						ops.extend(self.nodes(children)?);
						return Ok(());
					}
				}
			}
			"push" => Op::Push {
				stack: unquote(&arguments(name, args)?[0]).to_string(),
				body: self.detached(children)?,
			},
			"stack" => Op::Stack(unquote(&arguments(name, args)?[0]).to_string()),
			"include" => {
				let parts = arguments(name, args)?;
				Op::Include {
					view: expression("@include", &parts[0])?,
					data: parts
						.get(1)
						.map(|data| expression("@include", data))
						.transpose()?,
				}
			}
			"inject" => inject(args)?,
			"component" => {
				let parts = arguments(name, args)?;
				let body = if children.is_empty() {
					None
				} else {
					Some(Rc::new(self.detached(children)?))
				};
				Op::LegacyComponent {
					name: expression("@component", &parts[0])?,
					data: parts
						.get(1)
						.map(|data| expression("@component", data))
						.transpose()?,
					body,
				}
			}
			_ => {
				let literal = match args {
					Some(args) => format!("@{name}({args})"),
					None => format!("@{name}"),
				};
				Op::Text(literal)
			}
		};
		ops.push(op);
		Ok(())
	}

	/// `@if`-style block with optional `@elseif`/`@else` siblings.
	fn conditional(&mut self, first: Condition, children: &[Node]) -> Result<Op, CompileError> {
		let mut branches = Vec::new();
		let mut condition = Some(first);
		let mut body = Vec::new();

		for child in children {
			match child {
				Node::Directive { name, args, .. } if name == "else" || name == "elseif" => {
					let Some(finished) = condition.take() else {
						return Err(misplaced(name, "before @else"));
					};
					branches.push((finished, std::mem::take(&mut body)));
					if name == "elseif" {
						condition = Some(Condition::Truthy(argument_expression(name, args.as_deref())?));
					}
				}
				other => self.node(other, &mut body)?,
			}
		}

		Ok(match condition {
			Some(last) => {
				branches.push((last, body));
				Op::If {
					branches,
					otherwise: Vec::new(),
				}
			}
			None => Op::If {
				branches,
				otherwise: body,
			},
		})
	}

	fn switch(&mut self, args: Option<&str>, children: &[Node]) -> Result<Op, CompileError> {
		let subject = argument_expression("switch", args)?;
		let mut labels: Vec<(Option<Expr>, usize)> = Vec::new();
		let mut body = Vec::new();

		self.breakable += 1;
		let filled = self.switch_body(children, &mut labels, &mut body);
		self.breakable -= 1;
		filled?;

		Ok(Op::Switch {
			subject,
			labels,
			body,
		})
	}

	fn switch_body(
		&mut self,
		children: &[Node],
		labels: &mut Vec<(Option<Expr>, usize)>,
		body: &mut Vec<Op>,
	) -> Result<(), CompileError> {
		for child in children {
			match child {
				Node::Directive { name, args, .. } if name == "case" => {
					let test = argument_expression(name, args.as_deref())?;
					labels.push((Some(test), body.len()));
				}
				Node::Directive { name, .. } if name == "default" => {
					if labels.iter().any(|(test, _)| test.is_none()) {
						return Err(CompileError::DuplicateDefault);
					}
					labels.push((None, body.len()));
				}
				other if labels.is_empty() => {
					if !other.is_blank_text() {
						return Err(CompileError::ContentBeforeCase);
					}
				}
				other => self.node(other, body)?,
			}
		}
		Ok(())
	}

	fn foreach(&mut self, args: Option<&str>, children: &[Node]) -> Result<Op, CompileError> {
		let clause = args.unwrap_or_default();
		if clause.trim().is_empty() {
			return Err(CompileError::MissingArgument {
				directive: "foreach".to_string(),
			});
		}
		let captures = FOREACH_CLAUSE
			.captures(clause)
			.ok_or_else(|| CompileError::InvalidForeach(clause.trim().to_string()))?;
		let source = expression("@foreach", &captures[1])?;
		let key = captures.get(2).map(|key| key.as_str().to_string());
		let item = captures[3].to_string();
		let body = self.breakable_body(children)?;

		Ok(Op::Foreach {
			source,
			key,
			item,
			body,
		})
	}

	fn component(&mut self, tag_name: &str, attrs: &str, children: &[Node]) -> Result<Op, CompileError> {
		let name = tag_name.strip_prefix("x-").unwrap_or(tag_name).to_string();

		let mut values = Vec::new();
		for captures in COMPONENT_ATTRIBUTE.captures_iter(attrs) {
			let attr = captures[2].to_string();
			let raw = &captures[3];
			let value = if captures.get(1).is_some() {
				AttrValue::Dynamic(expression(&format!(":{attr} on <{tag_name}>"), raw)?)
			} else {
				AttrValue::Literal(raw.to_string())
			};
			values.push((attr, value));
		}

		let mut slots = Vec::new();
		let mut default_slot = Vec::new();
		let mut has_default_slot = false;
		for child in children {
			match child {
				Node::Component {
					tag_name,
					attrs,
					children,
				} if tag_name == "x-slot" => {
					let slot = SLOT_NAME
						.captures(attrs)
						.and_then(|captures| captures.get(1))
						.map_or("default", |slot| slot.as_str());
					slots.push((slot.to_string(), Rc::new(self.detached(children)?)));
				}
				other => {
					has_default_slot = true;
					let saved = std::mem::take(&mut self.breakable);
					let generated = self.node(other, &mut default_slot);
					self.breakable = saved;
					generated?;
				}
			}
		}
		if has_default_slot {
			slots.push(("default".to_string(), Rc::new(default_slot)));
		}

		Ok(Op::Component {
			name,
			attrs: values,
			slots,
		})
	}

	/// Layout mode: collect sections, keep pushes and injections, drop the rest.
	fn layout_child(&mut self, extends: Option<&str>, children: &[Node]) -> Result<Vec<Op>, CompileError> {
		let layout = unquote(&arguments("extends", extends)?[0]).to_string();
		let mut ops = Vec::new();
		let mut sections = Vec::new();

		for node in children {
			let Node::Directive {
				name,
				args,
				children,
			} = node
			else {
				continue;
			};
			match name.as_str() {
				"section" => {
					let parts = arguments(name, args.as_deref())?;
					let section = unquote(&parts[0]).to_string();
					let body = match parts.get(1) {
						Some(value) => vec![Op::Echo(expression("@section", value)?)],
						None => self.detached(children)?,
					};
					sections.push((section, Rc::new(body)));
				}
				"push" | "inject" => self.node(node, &mut ops)?,
				_ => {}
			}
		}

		ops.push(Op::Extends { layout, sections });
		Ok(ops)
	}
}

fn model(args: Option<&str>) -> Result<Op, CompileError> {
	let path = unquote(&arguments("model", args)?[0]).to_string();
	if !PROPERTY_PATH.is_match(&path) {
		return Err(CompileError::InvalidModelPath(path));
	}
	let value = expression("@model", &path)?;
	Ok(Op::Model { path, value })
}

fn inject(args: Option<&str>) -> Result<Op, CompileError> {
	let parts = arguments("inject", args)?;
	let local = unquote(&parts[0]).to_string();
	if local.contains('.') || !PROPERTY_PATH.is_match(&local) {
		return Err(CompileError::InvalidInjectName(local));
	}
	let Some(service) = parts.get(1) else {
		return Err(CompileError::MissingArgument {
			directive: "inject".to_string(),
		});
	};
	Ok(Op::Inject {
		local,
		service: unquote(service).to_string(),
	})
}
