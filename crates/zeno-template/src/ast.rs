//! Template syntax tree

/// A node of the template syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	Root {
		children: Vec<Node>,
	},
	/// Literal text, emitted verbatim
	Text {
		value: String,
	},
	/// `{{ expr }}` with the expression source trimmed
	Echo {
		expr: String,
	},
	/// `@name(args)`; block directives carry their body in `children`
	Directive {
		name: String,
		args: Option<String>,
		children: Vec<Node>,
	},
	/// `<x-name attrs>children</x-name>`
	Component {
		tag_name: String,
		attrs: String,
		children: Vec<Node>,
	},
}

impl Node {
	pub fn text(value: impl Into<String>) -> Self {
		Self::Text {
			value: value.into(),
		}
	}

	pub fn directive(name: impl Into<String>, args: Option<&str>) -> Self {
		Self::Directive {
			name: name.into(),
			args: args.map(str::to_string),
			children: Vec::new(),
		}
	}

	/// Child list of container nodes.
	pub fn children(&self) -> &[Node] {
		match self {
			Self::Root { children }
			| Self::Directive { children, .. }
			| Self::Component { children, .. } => children,
			Self::Text { .. } | Self::Echo { .. } => &[],
		}
	}

	/// Directive name, if this is a directive.
	pub fn directive_name(&self) -> Option<&str> {
		match self {
			Self::Directive { name, .. } => Some(name),
			_ => None,
		}
	}

	/// Whitespace-only text.
	pub fn is_blank_text(&self) -> bool {
		matches!(self, Self::Text { value } if value.trim().is_empty())
	}
}
