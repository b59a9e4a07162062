//! Expression language
//!
//! Echoes, directive arguments and dynamic attributes hold expressions in a
//! small scripting subset: literals, identifiers, member/index access,
//! calls, unary and binary operators, `&&`/`||`/`??`, the ternary, and
//! array/object literals. Expressions are parsed once when a template is
//! compiled and evaluated against an [`Environment`] on every render.

mod eval;
mod lexer;
mod parser;
mod precedence;

pub use eval::{Environment, EvalError, evaluate};
pub use parser::parse_expression;

/// Errors raised while parsing an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
	#[error("Unexpected character '{ch}' at offset {offset}")]
	UnexpectedChar { ch: char, offset: usize },

	#[error("Unterminated string literal")]
	UnterminatedString,

	#[error("Unexpected token '{found}', expected {expected}")]
	UnexpectedToken { found: String, expected: String },

	#[error("Unexpected end of expression")]
	UnexpectedEnd,

	#[error("Empty expression")]
	Empty,
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Not,
	Negate,
	Plus,
	Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	Add,
	Subtract,
	Multiply,
	Divide,
	Remainder,
	Less,
	LessEqual,
	Greater,
	GreaterEqual,
	LooseEqual,
	LooseNotEqual,
	StrictEqual,
	StrictNotEqual,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
	And,
	Or,
	Nullish,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Literal(Literal),
	Identifier(String),
	Array(Vec<Expr>),
	Object(Vec<(String, Expr)>),
	Member {
		object: Box<Expr>,
		property: String,
	},
	Index {
		object: Box<Expr>,
		index: Box<Expr>,
	},
	Call {
		callee: Box<Expr>,
		args: Vec<Expr>,
	},
	Unary {
		op: UnaryOp,
		operand: Box<Expr>,
	},
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Logical {
		op: LogicalOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Conditional {
		test: Box<Expr>,
		consequent: Box<Expr>,
		alternate: Box<Expr>,
	},
}

impl Expr {
	/// Short description used in error messages (`user.name`, `items[...]`).
	pub fn describe(&self) -> String {
		match self {
			Self::Identifier(name) => name.clone(),
			Self::Member { object, property } => format!("{}.{}", object.describe(), property),
			Self::Index { object, .. } => format!("{}[...]", object.describe()),
			Self::Call { callee, .. } => format!("{}(...)", callee.describe()),
			_ => "(intermediate value)".to_string(),
		}
	}

	/// Dotted path for plain identifier/member chains (`form.email`).
	pub fn as_path(&self) -> Option<String> {
		match self {
			Self::Identifier(name) => Some(name.clone()),
			Self::Member { object, property } => {
				object.as_path().map(|path| format!("{path}.{property}"))
			}
			_ => None,
		}
	}
}
