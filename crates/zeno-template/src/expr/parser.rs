//! Pratt parser for template expressions.

use super::lexer::{ExprToken, tokenize};
use super::precedence::{BindingPower, prec};
use zeno_reactive::Value;

use super::{BinaryOp, Expr, ExprError, Literal, LogicalOp, UnaryOp};

/// Parse an expression.
///
/// # Examples
///
/// ```
/// use zeno_template::expr::{Expr, parse_expression};
///
/// let expr = parse_expression("user.name").unwrap();
/// assert_eq!(expr.as_path().as_deref(), Some("user.name"));
/// assert!(parse_expression("a +").is_err());
/// ```
pub fn parse_expression(source: &str) -> Result<Expr, ExprError> {
	let tokens = tokenize(source)?;
	if matches!(tokens.first(), Some(ExprToken::Eof) | None) {
		return Err(ExprError::Empty);
	}
	let mut parser = ExprParser { tokens, pos: 0 };
	let expr = parser.expression(0)?;
	match parser.peek() {
		ExprToken::Eof => Ok(expr),
		other => Err(ExprError::UnexpectedToken {
			found: other.describe(),
			expected: "end of expression".to_string(),
		}),
	}
}

enum Infix {
	Binary(BinaryOp),
	Logical(LogicalOp),
	Conditional,
}

fn infix_operator(token: &ExprToken) -> Option<(Infix, BindingPower)> {
	let ExprToken::Punct(punct) = token else {
		return None;
	};
	let operator = match *punct {
		"?" => (Infix::Conditional, prec::CONDITIONAL),
		"??" => (Infix::Logical(LogicalOp::Nullish), prec::NULLISH),
		"||" => (Infix::Logical(LogicalOp::Or), prec::LOGICAL_OR),
		"&&" => (Infix::Logical(LogicalOp::And), prec::LOGICAL_AND),
		"==" => (Infix::Binary(BinaryOp::LooseEqual), prec::EQUALITY),
		"!=" => (Infix::Binary(BinaryOp::LooseNotEqual), prec::EQUALITY),
		"===" => (Infix::Binary(BinaryOp::StrictEqual), prec::EQUALITY),
		"!==" => (Infix::Binary(BinaryOp::StrictNotEqual), prec::EQUALITY),
		"<" => (Infix::Binary(BinaryOp::Less), prec::RELATIONAL),
		"<=" => (Infix::Binary(BinaryOp::LessEqual), prec::RELATIONAL),
		">" => (Infix::Binary(BinaryOp::Greater), prec::RELATIONAL),
		">=" => (Infix::Binary(BinaryOp::GreaterEqual), prec::RELATIONAL),
		"+" => (Infix::Binary(BinaryOp::Add), prec::ADDITIVE),
		"-" => (Infix::Binary(BinaryOp::Subtract), prec::ADDITIVE),
		"*" => (Infix::Binary(BinaryOp::Multiply), prec::MULTIPLICATIVE),
		"/" => (Infix::Binary(BinaryOp::Divide), prec::MULTIPLICATIVE),
		"%" => (Infix::Binary(BinaryOp::Remainder), prec::MULTIPLICATIVE),
		_ => return None,
	};
	Some(operator)
}

struct ExprParser {
	tokens: Vec<ExprToken>,
	pos: usize,
}

impl ExprParser {
	fn peek(&self) -> &ExprToken {
		self.tokens.get(self.pos).unwrap_or(&ExprToken::Eof)
	}

	fn advance(&mut self) -> ExprToken {
		let token = self.peek().clone();
		if self.pos < self.tokens.len() {
			self.pos += 1;
		}
		token
	}

	fn eat(&mut self, punct: &str) -> bool {
		if matches!(self.peek(), ExprToken::Punct(p) if *p == punct) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn expect(&mut self, punct: &str) -> Result<(), ExprError> {
		if self.eat(punct) {
			return Ok(());
		}
		match self.peek() {
			ExprToken::Eof => Err(ExprError::UnexpectedEnd),
			other => Err(ExprError::UnexpectedToken {
				found: other.describe(),
				expected: format!("'{punct}'"),
			}),
		}
	}

	fn expression(&mut self, min_bp: u8) -> Result<Expr, ExprError> {
		let mut left = self.prefix()?;

		while let Some((infix, power)) = infix_operator(self.peek()) {
			if power.left < min_bp {
				break;
			}
			self.advance();

			left = match infix {
				Infix::Conditional => {
					let consequent = self.expression(0)?;
					self.expect(":")?;
					let alternate = self.expression(power.right)?;
					Expr::Conditional {
						test: Box::new(left),
						consequent: Box::new(consequent),
						alternate: Box::new(alternate),
					}
				}
				Infix::Logical(op) => Expr::Logical {
					op,
					left: Box::new(left),
					right: Box::new(self.expression(power.right)?),
				},
				Infix::Binary(op) => Expr::Binary {
					op,
					left: Box::new(left),
					right: Box::new(self.expression(power.right)?),
				},
			};
		}

		Ok(left)
	}

	fn prefix(&mut self) -> Result<Expr, ExprError> {
		let op = match self.peek() {
			ExprToken::Punct("!") => Some(UnaryOp::Not),
			ExprToken::Punct("-") => Some(UnaryOp::Negate),
			ExprToken::Punct("+") => Some(UnaryOp::Plus),
			ExprToken::Ident(name) if name == "typeof" => Some(UnaryOp::Typeof),
			_ => None,
		};
		if let Some(op) = op {
			self.advance();
			let operand = self.expression(prec::PREFIX)?;
			return Ok(Expr::Unary {
				op,
				operand: Box::new(operand),
			});
		}

		let primary = self.primary()?;
		self.postfix(primary)
	}

	fn primary(&mut self) -> Result<Expr, ExprError> {
		match self.advance() {
			ExprToken::Number(n) => Ok(Expr::Literal(Literal::Number(n))),
			ExprToken::Str(s) => Ok(Expr::Literal(Literal::String(s))),
			ExprToken::Ident(name) => Ok(match name.as_str() {
				"true" => Expr::Literal(Literal::Bool(true)),
				"false" => Expr::Literal(Literal::Bool(false)),
				"null" => Expr::Literal(Literal::Null),
				"undefined" => Expr::Literal(Literal::Undefined),
				_ => Expr::Identifier(name),
			}),
			ExprToken::Punct("(") => {
				let inner = self.expression(0)?;
				self.expect(")")?;
				Ok(inner)
			}
			ExprToken::Punct("[") => self.array_literal(),
			ExprToken::Punct("{") => self.object_literal(),
			ExprToken::Eof => Err(ExprError::UnexpectedEnd),
			other => Err(ExprError::UnexpectedToken {
				found: other.describe(),
				expected: "an expression".to_string(),
			}),
		}
	}

	fn postfix(&mut self, mut expr: Expr) -> Result<Expr, ExprError> {
		loop {
			if self.eat(".") {
				let property = match self.advance() {
					ExprToken::Ident(name) => name,
					ExprToken::Eof => return Err(ExprError::UnexpectedEnd),
					other => {
						return Err(ExprError::UnexpectedToken {
							found: other.describe(),
							expected: "a property name".to_string(),
						});
					}
				};
				expr = Expr::Member {
					object: Box::new(expr),
					property,
				};
			} else if self.eat("[") {
				let index = self.expression(0)?;
				self.expect("]")?;
				expr = Expr::Index {
					object: Box::new(expr),
					index: Box::new(index),
				};
			} else if self.eat("(") {
				let args = self.list_until(")")?;
				expr = Expr::Call {
					callee: Box::new(expr),
					args,
				};
			} else {
				return Ok(expr);
			}
		}
	}

	/// Comma-separated expressions up to `close`; a trailing comma is allowed.
	fn list_until(&mut self, close: &str) -> Result<Vec<Expr>, ExprError> {
		let mut items = Vec::new();
		loop {
			if self.eat(close) {
				return Ok(items);
			}
			items.push(self.expression(0)?);
			if !self.eat(",") {
				self.expect(close)?;
				return Ok(items);
			}
		}
	}

	fn array_literal(&mut self) -> Result<Expr, ExprError> {
		Ok(Expr::Array(self.list_until("]")?))
	}

	fn object_literal(&mut self) -> Result<Expr, ExprError> {
		let mut entries = Vec::new();
		loop {
			if self.eat("}") {
				return Ok(Expr::Object(entries));
			}
			let (key, shorthand) = match self.advance() {
				ExprToken::Ident(name) => (name, true),
				ExprToken::Str(s) => (s, false),
				ExprToken::Number(n) => (Value::Number(n).to_display_string(), false),
				ExprToken::Eof => return Err(ExprError::UnexpectedEnd),
				other => {
					return Err(ExprError::UnexpectedToken {
						found: other.describe(),
						expected: "a property key".to_string(),
					});
				}
			};
			let value = if shorthand && !matches!(self.peek(), ExprToken::Punct(":")) {
				Expr::Identifier(key.clone())
			} else {
				self.expect(":")?;
				self.expression(0)?
			};
			entries.push((key, value));
			if !self.eat(",") {
				self.expect("}")?;
				return Ok(Expr::Object(entries));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn ident(name: &str) -> Box<Expr> {
		Box::new(Expr::Identifier(name.to_string()))
	}

	fn number(n: f64) -> Box<Expr> {
		Box::new(Expr::Literal(Literal::Number(n)))
	}

	#[test]
	fn test_precedence_of_arithmetic() {
		assert_eq!(
			parse_expression("1 + 2 * 3").unwrap(),
			Expr::Binary {
				op: BinaryOp::Add,
				left: number(1.0),
				right: Box::new(Expr::Binary {
					op: BinaryOp::Multiply,
					left: number(2.0),
					right: number(3.0),
				}),
			}
		);
	}

	#[test]
	fn test_left_associativity() {
		assert_eq!(
			parse_expression("a - b - c").unwrap(),
			Expr::Binary {
				op: BinaryOp::Subtract,
				left: Box::new(Expr::Binary {
					op: BinaryOp::Subtract,
					left: ident("a"),
					right: ident("b"),
				}),
				right: ident("c"),
			}
		);
	}

	#[test]
	fn test_nested_ternary_is_right_associative() {
		assert_eq!(
			parse_expression("a ? b : c ? d : e").unwrap(),
			Expr::Conditional {
				test: ident("a"),
				consequent: ident("b"),
				alternate: Box::new(Expr::Conditional {
					test: ident("c"),
					consequent: ident("d"),
					alternate: ident("e"),
				}),
			}
		);
	}

	#[test]
	fn test_unary_binds_looser_than_member() {
		assert_eq!(
			parse_expression("!user.admin").unwrap(),
			Expr::Unary {
				op: UnaryOp::Not,
				operand: Box::new(Expr::Member {
					object: ident("user"),
					property: "admin".to_string(),
				}),
			}
		);
	}

	#[test]
	fn test_method_call_and_index() {
		assert_eq!(
			parse_expression("items[0].name.toUpperCase()").unwrap(),
			Expr::Call {
				callee: Box::new(Expr::Member {
					object: Box::new(Expr::Member {
						object: Box::new(Expr::Index {
							object: ident("items"),
							index: number(0.0),
						}),
						property: "name".to_string(),
					}),
					property: "toUpperCase".to_string(),
				}),
				args: Vec::new(),
			}
		);
	}

	#[test]
	fn test_object_literal_with_shorthand() {
		assert_eq!(
			parse_expression("{ active: isActive, 'text-red': err, count, }").unwrap(),
			Expr::Object(vec![
				("active".to_string(), Expr::Identifier("isActive".to_string())),
				("text-red".to_string(), Expr::Identifier("err".to_string())),
				("count".to_string(), Expr::Identifier("count".to_string())),
			])
		);
	}

	#[rstest]
	#[case("")]
	#[case("a +")]
	#[case("(a")]
	#[case("a b")]
	#[case("{ 'k' }")]
	#[case("x => x")]
	fn test_invalid_expressions(#[case] source: &str) {
		assert!(parse_expression(source).is_err(), "{source:?} should fail");
	}
}
