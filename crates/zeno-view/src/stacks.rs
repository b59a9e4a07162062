//! Named stacks filled by `@push` and read by `@stack`
//!
//! Stacks belong to a render pass: a top-level render clears them, and
//! every nested component, layout and include of that pass shares them.

use std::cell::RefCell;

use indexmap::IndexMap;

thread_local! {
	static STACKS: RefCell<IndexMap<String, Vec<String>>> = RefCell::new(IndexMap::new());
}

/// Forget everything pushed so far.
pub fn reset() {
	STACKS.with(|stacks| stacks.borrow_mut().clear());
}

pub fn push(name: &str, content: String) {
	STACKS.with(|stacks| {
		stacks
			.borrow_mut()
			.entry(name.to_string())
			.or_default()
			.push(content);
	});
}

/// Pushed content of `name`, concatenated in push order.
pub fn stack(name: &str) -> String {
	STACKS.with(|stacks| {
		stacks
			.borrow()
			.get(name)
			.map(|items| items.concat())
			.unwrap_or_default()
	})
}
