//! Expression tokenizer

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExprToken {
	Number(f64),
	Str(String),
	Ident(String),
	Punct(&'static str),
	Eof,
}

impl ExprToken {
	pub(crate) fn describe(&self) -> String {
		match self {
			Self::Number(n) => n.to_string(),
			Self::Str(s) => format!("\"{s}\""),
			Self::Ident(name) => name.clone(),
			Self::Punct(p) => (*p).to_string(),
			Self::Eof => "end of expression".to_string(),
		}
	}
}

/// Punctuators, longest first so `===` wins over `==`.
const PUNCTUATORS: &[&str] = &[
	"===", "!==", "==", "!=", "<=", ">=", "&&", "||", "??", "+", "-", "*", "/", "%", "<", ">",
	"!", "?", ":", ".", ",", "(", ")", "[", "]", "{", "}",
];

fn is_ident_start(c: char) -> bool {
	c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || c == '$'
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<ExprToken>, ExprError> {
	let mut tokens = Vec::new();
	let mut chars = source.char_indices().peekable();

	while let Some(&(offset, c)) = chars.peek() {
		if c.is_whitespace() {
			chars.next();
			continue;
		}

		if c.is_ascii_digit()
			|| (c == '.' && source[offset + 1..].starts_with(|d: char| d.is_ascii_digit()))
		{
			let mut end = offset;
			let mut seen_exponent = false;
			while let Some(&(i, d)) = chars.peek() {
				let sign_after_exponent =
					(d == '+' || d == '-') && seen_exponent && matches!(source[..i].chars().last(), Some('e' | 'E'));
				if d.is_ascii_digit() || d == '.' || sign_after_exponent {
					end = i + d.len_utf8();
					chars.next();
				} else if (d == 'e' || d == 'E') && !seen_exponent {
					seen_exponent = true;
					end = i + 1;
					chars.next();
				} else {
					break;
				}
			}
			let text = &source[offset..end];
			let value = text
				.parse::<f64>()
				.map_err(|_| ExprError::UnexpectedToken {
					found: text.to_string(),
					expected: "a number".to_string(),
				})?;
			tokens.push(ExprToken::Number(value));
			continue;
		}

		if c == '\'' || c == '"' || c == '`' {
			chars.next();
			let mut value = String::new();
			let mut closed = false;
			while let Some((_, d)) = chars.next() {
				match d {
					'\\' => {
						let Some((_, escaped)) = chars.next() else {
							break;
						};
						value.push(match escaped {
							'n' => '\n',
							't' => '\t',
							'r' => '\r',
							'0' => '\0',
							other => other,
						});
					}
					d if d == c => {
						closed = true;
						break;
					}
					d => value.push(d),
				}
			}
			if !closed {
				return Err(ExprError::UnterminatedString);
			}
			tokens.push(ExprToken::Str(value));
			continue;
		}

		if is_ident_start(c) {
			let mut end = offset;
			while let Some(&(i, d)) = chars.peek() {
				if is_ident_continue(d) {
					end = i + d.len_utf8();
					chars.next();
				} else {
					break;
				}
			}
			tokens.push(ExprToken::Ident(source[offset..end].to_string()));
			continue;
		}

		let rest = &source[offset..];
		let Some(punct) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) else {
			return Err(ExprError::UnexpectedChar { ch: c, offset });
		};
		for _ in 0..punct.len() {
			chars.next();
		}
		tokens.push(ExprToken::Punct(punct));
	}

	tokens.push(ExprToken::Eof);
	Ok(tokens)
}
