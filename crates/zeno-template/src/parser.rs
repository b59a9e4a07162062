//! Template parser
//!
//! Builds a [`Node`] tree from the token stream with an explicit stack of
//! open frames above the root. Parsing never fails: every structural
//! mismatch degrades to literal text, so a template made only of text
//! always parses to a single text node equal to its input.

use crate::args::split_arguments;
use crate::ast::Node;
use crate::lexer::{Lexer, Token};

/// Directives that open a block closed by `@end<name>`.
const BLOCK_DIRECTIVES: &[&str] = &[
	"if",
	"unless",
	"isset",
	"empty",
	"switch",
	"foreach",
	"push",
	"component",
];

/// Directives attached as flat siblings inside the enclosing block.
const SIBLING_DIRECTIVES: &[&str] = &["else", "elseif", "case", "default", "break"];

/// Whether `@name(args)` opens a block.
///
/// `@section('name')` is a block; the inline form `@section('name', value)`
/// is not.
pub fn is_block_directive(name: &str, args: Option<&str>) -> bool {
	if BLOCK_DIRECTIVES.contains(&name) {
		return true;
	}
	name == "section" && args.is_some_and(|args| split_arguments(args).len() == 1)
}

/// Parse template source into a `Root` node.
///
/// # Example
///
/// ```ignore
/// use zeno_template::{Node, parse};
///
/// let root = parse("Hello {{ name }}");
/// assert_eq!(root.children().len(), 2);
/// ```
pub fn parse(source: &str) -> Node {
	Parser::new(source).parse()
}

/// What an open frame will become once closed.
enum FrameKind {
	Root,
	Directive { name: String, args: Option<String> },
	Component { tag_name: String, attrs: String },
}

struct Frame {
	kind: FrameKind,
	children: Vec<Node>,
}

impl Frame {
	fn new(kind: FrameKind) -> Self {
		Self {
			kind,
			children: Vec::new(),
		}
	}

	fn into_node(self) -> Node {
		let children = self.children;
		match self.kind {
			FrameKind::Root => Node::Root { children },
			FrameKind::Directive { name, args } => Node::Directive {
				name,
				args,
				children,
			},
			FrameKind::Component { tag_name, attrs } => Node::Component {
				tag_name,
				attrs,
				children,
			},
		}
	}
}

struct Parser<'a> {
	lexer: Lexer<'a>,
	peeked: Option<Token>,
	/// Open frames above the root
	stack: Vec<Frame>,
	root: Frame,
}

impl<'a> Parser<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			lexer: Lexer::new(source),
			peeked: None,
			stack: Vec::new(),
			root: Frame::new(FrameKind::Root),
		}
	}

	fn next(&mut self) -> Token {
		self.peeked
			.take()
			.unwrap_or_else(|| self.lexer.next_token())
	}

	fn peek(&mut self) -> &Token {
		let lexer = &mut self.lexer;
		self.peeked.get_or_insert_with(|| lexer.next_token())
	}

	fn top(&mut self) -> &mut Frame {
		self.stack.last_mut().unwrap_or(&mut self.root)
	}

	fn push_node(&mut self, node: Node) {
		if let Node::Text { value } = node {
			self.push_text(value);
		} else {
			self.top().children.push(node);
		}
	}

	fn push_text(&mut self, text: String) {
		if text.is_empty() {
			return;
		}
		let children = &mut self.top().children;
		if let Some(Node::Text { value }) = children.last_mut() {
			value.push_str(&text);
		} else {
			children.push(Node::Text { value: text });
		}
	}

	/// Pop the top frame into its parent.
	fn close_frame(&mut self) {
		if let Some(frame) = self.stack.pop() {
			let node = frame.into_node();
			self.top().children.push(node);
		}
	}

	fn parse(mut self) -> Node {
		loop {
			match self.next() {
				Token::Eof => break,
				Token::Text(text) => self.push_text(text),
				Token::EchoStart => {
					let expr = self.read_echo();
					self.push_node(Node::Echo { expr });
				}
				Token::Directive(name) => self.directive(name),
				Token::TagOpen(tag_name) => self.open_tag(tag_name),
				Token::TagEndOpen(tag_name) => self.close_tag(tag_name),
				stray @ (Token::ParenStart | Token::ParenEnd | Token::TagClose | Token::EchoEnd) => {
					self.push_text(stray.source_text());
				}
			}
		}

		// Unclosed frames fold into their parents
		while !self.stack.is_empty() {
			self.close_frame();
		}
		self.root.into_node()
	}

	fn read_echo(&mut self) -> String {
		let mut content = String::new();
		loop {
			match self.next() {
				Token::EchoEnd | Token::Eof => break,
				token => content.push_str(&token.source_text()),
			}
		}
		content.trim().to_string()
	}

	/// Consume tokens up to the `)` balancing an already consumed `(`.
	fn read_balanced_parens(&mut self) -> String {
		let mut content = String::new();
		let mut depth = 1usize;
		loop {
			match self.next() {
				Token::Eof => break,
				Token::ParenStart => {
					depth += 1;
					content.push('(');
				}
				Token::ParenEnd => {
					depth -= 1;
					if depth == 0 {
						break;
					}
					content.push(')');
				}
				token => content.push_str(&token.source_text()),
			}
		}
		content
	}

	fn read_arguments(&mut self) -> Option<String> {
		if matches!(self.peek(), Token::ParenStart) {
			self.next();
			Some(self.read_balanced_parens())
		} else {
			None
		}
	}

	fn directive(&mut self, name: String) {
		if let Some(opener) = name.strip_prefix("end") {
			let matches_top = matches!(
				self.stack.last(),
				Some(Frame { kind: FrameKind::Directive { name: open, .. }, .. }) if open == opener
			);
			if matches_top {
				self.close_frame();
			} else {
				self.push_text(format!("@{name}"));
			}
			return;
		}

		let args = self.read_arguments();
		let opens_block = !SIBLING_DIRECTIVES.contains(&name.as_str())
			&& is_block_directive(&name, args.as_deref());
		if opens_block {
			self.stack
				.push(Frame::new(FrameKind::Directive { name, args }));
		} else {
			self.push_node(Node::Directive {
				name,
				args,
				children: Vec::new(),
			});
		}
	}

	fn open_tag(&mut self, tag_name: String) {
		let mut attrs = String::new();
		loop {
			match self.next() {
				Token::TagClose | Token::Eof => break,
				token => attrs.push_str(&token.source_text()),
			}
		}

		let mut attrs = attrs.trim().to_string();
		let self_closing = attrs.ends_with('/');
		if self_closing {
			attrs.pop();
			attrs = attrs.trim_end().to_string();
		}

		if self_closing {
			self.push_node(Node::Component {
				tag_name,
				attrs,
				children: Vec::new(),
			});
		} else {
			self.stack
				.push(Frame::new(FrameKind::Component { tag_name, attrs }));
		}
	}

	fn close_tag(&mut self, tag_name: String) {
		let matches_top = matches!(
			self.stack.last(),
			Some(Frame { kind: FrameKind::Component { tag_name: open, .. }, .. }) if *open == tag_name
		);
		if matches_top {
			self.close_frame();
		} else {
			self.push_text(format!("</{tag_name}>"));
		}
	}
}
