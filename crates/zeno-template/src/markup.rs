//! Render results
//!
//! Every render entry point returns a [`Rendered`] value instead of a bare
//! string, so callers can tell real markup from the placeholder fragment
//! produced when something went wrong. Both variants still carry HTML that
//! can be spliced into the parent output.

use std::fmt;

/// What went wrong while producing a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
	/// The template failed to compile
	Compile,
	/// The top-level render of an instance failed
	Render,
	/// A child component failed to render
	Component,
	/// A layout failed to render
	Layout,
	/// An included view failed to render
	Include,
	/// A component, layout or view name is not registered
	NotFound,
}

/// A failure together with the placeholder markup shown in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	pub kind: DiagnosticKind,
	pub message: String,
	pub fragment: String,
}

impl Diagnostic {
	pub fn new(kind: DiagnosticKind, message: impl Into<String>, fragment: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
			fragment: fragment.into(),
		}
	}

	/// `[Component x-card not found]` style placeholder.
	///
	/// ```
	/// use zeno_template::{Diagnostic, DiagnosticKind};
	///
	/// let diagnostic = Diagnostic::not_found("Layout", "app");
	/// assert_eq!(diagnostic.kind, DiagnosticKind::NotFound);
	/// assert_eq!(diagnostic.fragment, "[Layout app not found]");
	/// ```
	pub fn not_found(what: &str, name: &str) -> Self {
		let fragment = format!("[{what} {name} not found]");
		Self::new(DiagnosticKind::NotFound, fragment.clone(), fragment)
	}

	/// Failure of a child component; the fragment is `Error: <message>`.
	pub fn component(message: impl Into<String>) -> Self {
		let message = message.into();
		let fragment = format!("Error: {message}");
		Self::new(DiagnosticKind::Component, message, fragment)
	}

	/// Failure of a layout or include; the fragment is the bare message.
	pub fn nested(kind: DiagnosticKind, message: impl Into<String>) -> Self {
		let message = message.into();
		Self::new(kind, message.clone(), message)
	}

	/// Failure of an instance's own render.
	pub fn render(message: impl Into<String>) -> Self {
		let message = message.into();
		let fragment = format!(r#"<div style="color:red">Render Error: {message}</div>"#);
		Self::new(DiagnosticKind::Render, message, fragment)
	}
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}: {}", self.kind, self.message)
	}
}

/// Outcome of rendering a template, component, layout or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
	Markup(String),
	Diagnostic(Diagnostic),
}

impl Rendered {
	/// HTML to splice into the output, the placeholder for diagnostics.
	pub fn as_html(&self) -> &str {
		match self {
			Self::Markup(html) => html,
			Self::Diagnostic(diagnostic) => &diagnostic.fragment,
		}
	}

	pub fn into_html(self) -> String {
		match self {
			Self::Markup(html) => html,
			Self::Diagnostic(diagnostic) => diagnostic.fragment,
		}
	}

	pub fn is_diagnostic(&self) -> bool {
		matches!(self, Self::Diagnostic(_))
	}

	pub fn diagnostic(&self) -> Option<&Diagnostic> {
		match self {
			Self::Diagnostic(diagnostic) => Some(diagnostic),
			Self::Markup(_) => None,
		}
	}
}

impl From<String> for Rendered {
	fn from(html: String) -> Self {
		Self::Markup(html)
	}
}

impl From<Diagnostic> for Rendered {
	fn from(diagnostic: Diagnostic) -> Self {
		Self::Diagnostic(diagnostic)
	}
}

impl fmt::Display for Rendered {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_html())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_markup_html() {
		let rendered = Rendered::from("<p>hi</p>".to_string());
		assert!(!rendered.is_diagnostic());
		assert_eq!(rendered.as_html(), "<p>hi</p>");
	}

	#[test]
	fn test_diagnostic_fragments() {
		assert_eq!(Diagnostic::component("boom").fragment, "Error: boom");
		assert_eq!(
			Diagnostic::render("boom").fragment,
			r#"<div style="color:red">Render Error: boom</div>"#
		);
		let include = Rendered::from(Diagnostic::nested(DiagnosticKind::Include, "bad"));
		assert!(include.is_diagnostic());
		assert_eq!(include.into_html(), "bad");
	}
}
