//! Template lexer
//!
//! Splits template source into a flat token stream. The lexer is context
//! free: `>` is always a [`Token::TagClose`] and parentheses are always
//! [`Token::ParenStart`]/[`Token::ParenEnd`], whatever surrounds them. The
//! parser decides what those tokens mean and turns the ones it does not need
//! back into text with [`Token::source_text`].
//!
//! Markers, in priority order:
//!
//! | Input | Token |
//! |-------|-------|
//! | `{{` | `EchoStart` |
//! | `}}` | `EchoEnd` |
//! | `@name` | `Directive(name)` |
//! | `<x-name` | `TagOpen("x-name")` |
//! | `</x-name>` | `TagEndOpen("x-name")` |
//! | `>` | `TagClose` |
//! | `(` / `)` | `ParenStart` / `ParenEnd` |
//!
//! Everything else is [`Token::Text`].

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	Text(String),
	EchoStart,
	EchoEnd,
	/// Directive name without the leading `@`
	Directive(String),
	ParenStart,
	ParenEnd,
	/// Tag name including the `x-` prefix
	TagOpen(String),
	TagClose,
	/// Tag name including the `x-` prefix
	TagEndOpen(String),
	Eof,
}

impl Token {
	/// The exact source text this token was produced from.
	pub fn source_text(&self) -> String {
		match self {
			Self::Text(text) => text.clone(),
			Self::EchoStart => "{{".to_string(),
			Self::EchoEnd => "}}".to_string(),
			Self::Directive(name) => format!("@{name}"),
			Self::ParenStart => "(".to_string(),
			Self::ParenEnd => ")".to_string(),
			Self::TagOpen(name) => format!("<{name}"),
			Self::TagClose => ">".to_string(),
			Self::TagEndOpen(name) => format!("</{name}>"),
			Self::Eof => String::new(),
		}
	}

	pub fn is_eof(&self) -> bool {
		matches!(self, Self::Eof)
	}
}

fn is_directive_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_'
}

fn is_tag_name_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.'
}

/// The lexer for template input.
pub struct Lexer<'a> {
	input: &'a str,
	/// Current byte position in the input
	pos: usize,
}

impl<'a> Lexer<'a> {
	pub fn new(input: &'a str) -> Self {
		Self { input, pos: 0 }
	}

	fn bytes(&self) -> &'a [u8] {
		self.input.as_bytes()
	}

	fn starts_with_at(&self, pos: usize, pattern: &str) -> bool {
		self.bytes()
			.get(pos..)
			.is_some_and(|rest| rest.starts_with(pattern.as_bytes()))
	}

	fn scan_while(&self, start: usize, accept: fn(u8) -> bool) -> usize {
		let bytes = self.bytes();
		let mut end = start;
		while end < bytes.len() && accept(bytes[end]) {
			end += 1;
		}
		end
	}

	/// Whether a token other than text starts at `pos`.
	fn is_marker_at(&self, pos: usize) -> bool {
		let bytes = self.bytes();
		match bytes[pos] {
			b'{' => self.starts_with_at(pos, "{{"),
			b'}' => self.starts_with_at(pos, "}}"),
			b'<' => self.starts_with_at(pos, "<x-") || self.starts_with_at(pos, "</x-"),
			b'@' | b'(' | b')' | b'>' => true,
			_ => false,
		}
	}

	/// Produce the next token. Returns [`Token::Eof`] repeatedly once the
	/// input is exhausted.
	pub fn next_token(&mut self) -> Token {
		let bytes = self.bytes();
		if self.pos >= bytes.len() {
			return Token::Eof;
		}

		if self.starts_with_at(self.pos, "{{") {
			self.pos += 2;
			return Token::EchoStart;
		}
		if self.starts_with_at(self.pos, "}}") {
			self.pos += 2;
			return Token::EchoEnd;
		}

		if bytes[self.pos] == b'@' {
			let start = self.pos + 1;
			let end = self.scan_while(start, is_directive_byte);
			if end > start {
				self.pos = end;
				return Token::Directive(self.input[start..end].to_string());
			}
			// A bare `@` is text
		}

		if self.starts_with_at(self.pos, "<x-") {
			let start = self.pos + 1;
			let end = self.scan_while(start + 2, is_tag_name_byte);
			self.pos = end;
			return Token::TagOpen(self.input[start..end].to_string());
		}

		if self.starts_with_at(self.pos, "</x-") {
			let start = self.pos + 2;
			let end = self.scan_while(start + 2, is_tag_name_byte);
			if bytes.get(end) == Some(&b'>') {
				self.pos = end + 1;
				return Token::TagEndOpen(self.input[start..end].to_string());
			}
			// Unterminated end tag is text
		}

		match bytes[self.pos] {
			b'>' => {
				self.pos += 1;
				return Token::TagClose;
			}
			b'(' => {
				self.pos += 1;
				return Token::ParenStart;
			}
			b')' => {
				self.pos += 1;
				return Token::ParenEnd;
			}
			_ => {}
		}

		// Text runs to the next marker. The first byte is always consumed so a
		// marker that failed to match above cannot stall the lexer. All markers
		// are ASCII, so every stop position is a char boundary.
		let start = self.pos;
		let mut end = start + 1;
		while end < bytes.len() && !self.is_marker_at(end) {
			end += 1;
		}
		while !self.input.is_char_boundary(end) {
			end += 1;
		}
		self.pos = end;
		Token::Text(self.input[start..end].to_string())
	}

	/// Tokenize the whole input. The result ends with exactly one `Eof`.
	pub fn tokenize(mut self) -> Vec<Token> {
		let mut tokens = Vec::new();
		loop {
			let token = self.next_token();
			let done = token.is_eof();
			tokens.push(token);
			if done {
				return tokens;
			}
		}
	}
}

/// Tokenize `input`.
pub fn tokenize(input: &str) -> Vec<Token> {
	Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn text(value: &str) -> Token {
		Token::Text(value.to_string())
	}

	#[test]
	fn test_echo_and_text() {
		assert_eq!(
			tokenize("Hello {{ name }}!"),
			vec![
				text("Hello "),
				Token::EchoStart,
				text(" name "),
				Token::EchoEnd,
				text("!"),
				Token::Eof,
			]
		);
	}

	#[test]
	fn test_directive_with_arguments() {
		assert_eq!(
			tokenize("@if(user.admin)x@endif"),
			vec![
				Token::Directive("if".to_string()),
				Token::ParenStart,
				text("user.admin"),
				Token::ParenEnd,
				text("x"),
				Token::Directive("endif".to_string()),
				Token::Eof,
			]
		);
	}

	#[test]
	fn test_component_tags() {
		assert_eq!(
			tokenize(r#"<x-alert type="error">Body</x-alert>"#),
			vec![
				Token::TagOpen("x-alert".to_string()),
				text(r#" type="error""#),
				Token::TagClose,
				text("Body"),
				Token::TagEndOpen("x-alert".to_string()),
				Token::Eof,
			]
		);
	}

	#[rstest]
	#[case("a @ b", vec![text("a "), text("@ b")])]
	#[case("mail@", vec![text("mail"), text("@")])]
	#[case("</x-open", vec![text("</x-open")])]
	#[case("<div>", vec![text("<div"), Token::TagClose])]
	fn test_fallbacks_to_text(#[case] input: &str, #[case] expected: Vec<Token>) {
		let mut tokens = tokenize(input);
		assert_eq!(tokens.pop(), Some(Token::Eof));
		assert_eq!(tokens, expected);
	}

	#[test]
	fn test_eof_repeats() {
		let mut lexer = Lexer::new("x");
		assert_eq!(lexer.next_token(), text("x"));
		assert_eq!(lexer.next_token(), Token::Eof);
		assert_eq!(lexer.next_token(), Token::Eof);
	}

	#[test]
	fn test_multibyte_text_is_preserved() {
		let tokens = tokenize("héllo (wörld) ✓");
		let rebuilt: String = tokens.iter().map(Token::source_text).collect();
		assert_eq!(rebuilt, "héllo (wörld) ✓");
	}

	#[test]
	fn test_source_text_round_trip() {
		let source = r#"<x-card :title="t">{{ a }} @foreach(items as i)(@json(i))@endforeach</x-card>"#;
		let rebuilt: String = tokenize(source).iter().map(Token::source_text).collect();
		assert_eq!(rebuilt, source);
	}
}
