//! Interaction markers
//!
//! `@click` and `@model` leave `data-z-click="method"` and
//! `data-z-model="path"` attributes in the rendered markup. After each render
//! the markers are collected from opening tags into [`Binding`]s and
//! stripped from the markup that reaches the mount target.
//!
//! Quoted attribute values may contain `>`. A tag with an unterminated
//! quote is not recognised, so its markers stay in the markup.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use zeno_reactive::Value;

static OPENING_TAG: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"<[A-Za-z](?:[^<>"']|"[^"]*"|'[^']*')*>"#).expect("Invalid regex pattern")
});

static MARKER: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"\s*data-z-(click|model)="([^"]*)""#).expect("Invalid regex pattern")
});

static CHECKBOX: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"type\s*=\s*["']checkbox["']"#).expect("Invalid regex pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
	Click,
	Model,
}

/// A handler slot found in rendered markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
	pub kind: BindingKind,
	/// Method name for clicks, dotted data path for models
	pub target: String,
	/// Position among bindings of the same kind, in document order
	pub ordinal: usize,
	/// Model bound to a checkbox; input events carry the checked state
	pub checkbox: bool,
}

impl Binding {
	pub fn new(kind: BindingKind, target: impl Into<String>, ordinal: usize) -> Self {
		Self {
			kind,
			target: target.into(),
			ordinal,
			checkbox: false,
		}
	}

	/// Sets the checkbox flag.
	pub fn checkbox(mut self, checkbox: bool) -> Self {
		self.checkbox = checkbox;
		self
	}
}

/// An event dispatched to an attached handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	Click,
	/// New value of a bound field (the checked state for checkboxes)
	Input(Value),
}

/// Markup with markers stripped, plus the bindings they described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
	pub markup: String,
	pub bindings: Vec<Binding>,
}

/// Collect and strip interaction markers.
///
/// # Examples
///
/// ```
/// use zeno_view::bindings::{BindingKind, extract_bindings};
///
/// let extracted = extract_bindings(r#"<button data-z-click="save">Save</button>"#);
/// assert_eq!(extracted.markup, "<button>Save</button>");
/// assert_eq!(extracted.bindings[0].kind, BindingKind::Click);
/// assert_eq!(extracted.bindings[0].target, "save");
/// ```
pub fn extract_bindings(markup: &str) -> Extracted {
	let mut bindings = Vec::new();
	let mut clicks = 0;
	let mut models = 0;

	let stripped = OPENING_TAG.replace_all(markup, |tag: &Captures| {
		let tag = &tag[0];
		if !MARKER.is_match(tag) {
			return tag.to_string();
		}
		let checkbox = CHECKBOX.is_match(tag);
		for marker in MARKER.captures_iter(tag) {
			let (kind, ordinal) = match &marker[1] {
				"click" => {
					clicks += 1;
					(BindingKind::Click, clicks - 1)
				}
				_ => {
					models += 1;
					(BindingKind::Model, models - 1)
				}
			};
			let binding = Binding::new(kind, &marker[2], ordinal);
			bindings.push(match kind {
				BindingKind::Model => binding.checkbox(checkbox),
				BindingKind::Click => binding,
			});
		}
		MARKER.replace_all(tag, "").into_owned()
	});

	Extracted {
		markup: stripped.into_owned(),
		bindings,
	}
}
