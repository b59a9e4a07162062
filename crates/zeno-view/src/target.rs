//! Mount targets
//!
//! A [`MountTarget`] is where a mounted instance writes its markup and
//! attaches its interaction handlers. [`MemoryDocument`] and
//! [`MemoryTarget`] keep everything in memory and let callers dispatch
//! events by binding position.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use zeno_reactive::Value;

use crate::bindings::{Binding, BindingKind, Event};
use crate::error::{ViewError, ViewResult};

/// Event handler attached to a binding.
pub type Handler = Rc<dyn Fn(Event)>;

/// Something an instance can render into.
pub trait MountTarget {
	/// Replace the whole content.
	fn replace_content(&self, html: &str);

	fn content(&self) -> String;

	fn attach(&self, binding: Binding, handler: Handler);

	/// Detach every handler.
	fn clear_handlers(&self);
}

/// Resolves selectors to mount targets.
pub trait Document {
	fn query(&self, selector: &str) -> Option<Rc<dyn MountTarget>>;
}

/// In-memory mount target.
#[derive(Default)]
pub struct MemoryTarget {
	content: RefCell<String>,
	handlers: RefCell<Vec<(Binding, Handler)>>,
	writes: Cell<usize>,
}

impl MemoryTarget {
	pub fn new() -> Rc<Self> {
		Rc::new(Self::default())
	}

	/// Bindings currently attached, in attach order.
	pub fn bindings(&self) -> Vec<Binding> {
		self.handlers
			.borrow()
			.iter()
			.map(|(binding, _)| binding.clone())
			.collect()
	}

	/// Number of times the content was replaced.
	pub fn write_count(&self) -> usize {
		self.writes.get()
	}

	/// Click the `ordinal`-th click binding.
	pub fn click(&self, ordinal: usize) -> ViewResult<()> {
		self.dispatch(BindingKind::Click, ordinal, Event::Click)
	}

	/// Type `value` into the `ordinal`-th model binding.
	pub fn input(&self, ordinal: usize, value: impl Into<Value>) -> ViewResult<()> {
		self.dispatch(BindingKind::Model, ordinal, Event::Input(value.into()))
	}

	fn dispatch(&self, kind: BindingKind, ordinal: usize, event: Event) -> ViewResult<()> {
		// The handler may re-render and replace the handler list
		let handler = self
			.handlers
			.borrow()
			.iter()
			.find(|(binding, _)| binding.kind == kind && binding.ordinal == ordinal)
			.map(|(_, handler)| Rc::clone(handler))
			.ok_or(ViewError::BindingNotFound { kind, ordinal })?;
		handler(event);
		Ok(())
	}
}

impl MountTarget for MemoryTarget {
	fn replace_content(&self, html: &str) {
		*self.content.borrow_mut() = html.to_string();
		self.writes.set(self.writes.get() + 1);
	}

	fn content(&self) -> String {
		self.content.borrow().clone()
	}

	fn attach(&self, binding: Binding, handler: Handler) {
		self.handlers.borrow_mut().push((binding, handler));
	}

	fn clear_handlers(&self) {
		let removed = std::mem::take(&mut *self.handlers.borrow_mut());
		drop(removed);
	}
}

impl fmt::Debug for MemoryTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryTarget")
			.field("content", &self.content.borrow())
			.field("bindings", &self.bindings())
			.finish()
	}
}

/// In-memory document keyed by selector.
#[derive(Default)]
pub struct MemoryDocument {
	targets: RefCell<IndexMap<String, Rc<MemoryTarget>>>,
}

impl MemoryDocument {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an empty target reachable through `selector`.
	pub fn insert(&self, selector: impl Into<String>) -> Rc<MemoryTarget> {
		let target = MemoryTarget::new();
		self.targets
			.borrow_mut()
			.insert(selector.into(), Rc::clone(&target));
		target
	}

	pub fn get(&self, selector: &str) -> Option<Rc<MemoryTarget>> {
		self.targets.borrow().get(selector).cloned()
	}
}

impl Document for MemoryDocument {
	fn query(&self, selector: &str) -> Option<Rc<dyn MountTarget>> {
		self.get(selector)
			.map(|target| target as Rc<dyn MountTarget>)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_dispatch_to_attached_handler() {
		let target = MemoryTarget::new();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let log = Rc::clone(&seen);
		target.attach(
			Binding::new(BindingKind::Model, "name", 0),
			Rc::new(move |event| log.borrow_mut().push(event)),
		);

		target.input(0, "Ada").unwrap();
		assert_eq!(*seen.borrow(), vec![Event::Input(Value::from("Ada"))]);
		assert_eq!(
			target.click(0),
			Err(ViewError::BindingNotFound {
				kind: BindingKind::Click,
				ordinal: 0
			})
		);

		target.clear_handlers();
		assert!(target.bindings().is_empty());
	}

	#[test]
	fn test_document_query() {
		let document = MemoryDocument::new();
		let target = document.insert("#app");
		assert!(document.query("#missing").is_none());

		let found = document.query("#app").unwrap();
		found.replace_content("<p>x</p>");
		assert_eq!(target.content(), "<p>x</p>");
		assert_eq!(target.write_count(), 1);
	}
}
