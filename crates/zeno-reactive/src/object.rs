//! Observable containers
//!
//! [`ReactiveObject`] and [`ReactiveList`] are shared, interior-mutable
//! containers. Every read records `(container, key)` against the Active
//! Effect; every write that actually changes a slot triggers the effects
//! subscribed to that slot.
//!
//! Clones share the same storage, so identity (`ptr_eq`, `===`) is preserved
//! no matter how many times a container is handed around.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::runtime::{DependencyKey, NodeId, track, trigger, try_with_runtime};
use crate::value::Value;

const LENGTH_KEY: &str = "length";

struct ObjectInner {
	id: NodeId,
	entries: RefCell<IndexMap<String, Value>>,
}

impl Drop for ObjectInner {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.remove_target(self.id));
	}
}

/// An observable string-keyed map preserving insertion order.
#[derive(Clone)]
pub struct ReactiveObject(Rc<ObjectInner>);

impl ReactiveObject {
	pub fn new() -> Self {
		Self::from_entries(std::iter::empty::<(String, Value)>())
	}

	/// Build an object without triggering anything.
	pub fn from_entries<I, K>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		Self(Rc::new(ObjectInner {
			id: NodeId::new(),
			entries: RefCell::new(
				entries
					.into_iter()
					.map(|(key, value)| (key.into(), value))
					.collect(),
			),
		}))
	}

	pub fn id(&self) -> NodeId {
		self.0.id
	}

	/// Tracked read; `Undefined` when the key is absent.
	pub fn get(&self, key: &str) -> Value {
		self.lookup(key).unwrap_or(Value::Undefined)
	}

	/// Tracked read distinguishing "absent" from "present but undefined".
	pub fn lookup(&self, key: &str) -> Option<Value> {
		track(self.0.id, DependencyKey::property(key));
		self.0.entries.borrow().get(key).cloned()
	}

	pub fn contains_key(&self, key: &str) -> bool {
		track(self.0.id, DependencyKey::property(key));
		self.0.entries.borrow().contains_key(key)
	}

	/// Read without recording a dependency.
	pub fn get_untracked(&self, key: &str) -> Value {
		self.0
			.entries
			.borrow()
			.get(key)
			.cloned()
			.unwrap_or(Value::Undefined)
	}

	/// Write `key`, triggering its subscribers when the value changed.
	///
	/// Adding a new key also triggers key iteration.
	pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
		let key = key.into();
		let value = value.into();

		let (changed, added, previous) = {
			let mut entries = self.0.entries.borrow_mut();
			match entries.get_mut(&key) {
				Some(slot) if slot.strict_equals(&value) => (false, false, None),
				Some(slot) => (true, false, Some(std::mem::replace(slot, value))),
				None => {
					entries.insert(key.clone(), value);
					(true, true, None)
				}
			}
		};
		drop(previous);

		if changed {
			trigger(self.0.id, DependencyKey::Property(key));
		}
		if added {
			trigger(self.0.id, DependencyKey::Iterate);
		}
	}

	/// Remove `key`, triggering its subscribers and key iteration.
	pub fn remove(&self, key: &str) -> Option<Value> {
		let removed = self.0.entries.borrow_mut().shift_remove(key);
		if removed.is_some() {
			trigger(self.0.id, DependencyKey::property(key));
			trigger(self.0.id, DependencyKey::Iterate);
		}
		removed
	}

	/// Keys in insertion order (tracks iteration).
	pub fn keys(&self) -> Vec<String> {
		track(self.0.id, DependencyKey::Iterate);
		self.0.entries.borrow().keys().cloned().collect()
	}

	/// Entries in insertion order (tracks iteration and every key).
	pub fn entries(&self) -> Vec<(String, Value)> {
		track(self.0.id, DependencyKey::Iterate);
		let entries: Vec<(String, Value)> = self
			.0
			.entries
			.borrow()
			.iter()
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect();
		for (key, _) in &entries {
			track(self.0.id, DependencyKey::property(key.as_str()));
		}
		entries
	}

	/// Entries without recording dependencies.
	pub fn entries_untracked(&self) -> Vec<(String, Value)> {
		self.0
			.entries
			.borrow()
			.iter()
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect()
	}

	pub fn len(&self) -> usize {
		track(self.0.id, DependencyKey::Iterate);
		self.0.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// A new object holding the same top-level entries (tracked read).
	pub fn shallow_copy(&self) -> Self {
		Self::from_entries(self.entries())
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Default for ReactiveObject {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for ReactiveObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map()
			.entries(self.0.entries.borrow().iter())
			.finish()
	}
}

struct ListInner {
	id: NodeId,
	items: RefCell<Vec<Value>>,
}

impl Drop for ListInner {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.remove_target(self.id));
	}
}

/// An observable ordered sequence.
///
/// Index reads track the index; `len` tracks `length`. Structural changes
/// trigger `length` plus every index whose slot moved.
#[derive(Clone)]
pub struct ReactiveList(Rc<ListInner>);

impl ReactiveList {
	pub fn new() -> Self {
		Self::from_values(Vec::new())
	}

	pub fn from_values(items: Vec<Value>) -> Self {
		Self(Rc::new(ListInner {
			id: NodeId::new(),
			items: RefCell::new(items),
		}))
	}

	pub fn id(&self) -> NodeId {
		self.0.id
	}

	pub fn len(&self) -> usize {
		track(self.0.id, DependencyKey::property(LENGTH_KEY));
		self.0.items.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Tracked read; `Undefined` past the end.
	pub fn get(&self, index: usize) -> Value {
		track(self.0.id, DependencyKey::Property(index.to_string()));
		self.0
			.items
			.borrow()
			.get(index)
			.cloned()
			.unwrap_or(Value::Undefined)
	}

	/// Write `index`, growing the list with `undefined` holes when needed.
	pub fn set(&self, index: usize, value: impl Into<Value>) {
		let value = value.into();
		let (changed_from, changed_to, grew, previous) = {
			let mut items = self.0.items.borrow_mut();
			if index < items.len() {
				if items[index].strict_equals(&value) {
					return;
				}
				let previous = std::mem::replace(&mut items[index], value);
				(index, index + 1, false, Some(previous))
			} else {
				let start = items.len();
				items.resize(index, Value::Undefined);
				items.push(value);
				(start, index + 1, true, None)
			}
		};
		drop(previous);

		self.trigger_indices(changed_from, changed_to);
		if grew {
			trigger(self.0.id, DependencyKey::property(LENGTH_KEY));
		}
	}

	pub fn push(&self, value: impl Into<Value>) {
		let index = {
			let mut items = self.0.items.borrow_mut();
			items.push(value.into());
			items.len() - 1
		};
		self.trigger_indices(index, index + 1);
		trigger(self.0.id, DependencyKey::property(LENGTH_KEY));
	}

	pub fn pop(&self) -> Option<Value> {
		let (popped, index) = {
			let mut items = self.0.items.borrow_mut();
			let popped = items.pop();
			(popped, items.len())
		};
		if popped.is_some() {
			self.trigger_indices(index, index + 1);
			trigger(self.0.id, DependencyKey::property(LENGTH_KEY));
		}
		popped
	}

	pub fn insert(&self, index: usize, value: impl Into<Value>) {
		let len = {
			let mut items = self.0.items.borrow_mut();
			let index = index.min(items.len());
			items.insert(index, value.into());
			items.len()
		};
		self.trigger_indices(index.min(len - 1), len);
		trigger(self.0.id, DependencyKey::property(LENGTH_KEY));
	}

	pub fn remove(&self, index: usize) -> Option<Value> {
		let (removed, old_len) = {
			let mut items = self.0.items.borrow_mut();
			if index >= items.len() {
				return None;
			}
			let old_len = items.len();
			(items.remove(index), old_len)
		};
		self.trigger_indices(index, old_len);
		trigger(self.0.id, DependencyKey::property(LENGTH_KEY));
		Some(removed)
	}

	pub fn clear(&self) {
		let old = std::mem::take(&mut *self.0.items.borrow_mut());
		let old_len = old.len();
		drop(old);
		if old_len > 0 {
			self.trigger_indices(0, old_len);
			trigger(self.0.id, DependencyKey::property(LENGTH_KEY));
		}
	}

	/// Snapshot of the items (tracks `length` and every index).
	pub fn to_vec(&self) -> Vec<Value> {
		let items = self.0.items.borrow().clone();
		track(self.0.id, DependencyKey::property(LENGTH_KEY));
		for index in 0..items.len() {
			track(self.0.id, DependencyKey::Property(index.to_string()));
		}
		items
	}

	pub fn to_vec_untracked(&self) -> Vec<Value> {
		self.0.items.borrow().clone()
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	fn trigger_indices(&self, from: usize, to: usize) {
		for index in from..to {
			trigger(self.0.id, DependencyKey::Property(index.to_string()));
		}
	}
}

impl Default for ReactiveList {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for ReactiveList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.0.items.borrow().iter()).finish()
	}
}

/// Convert any input into the observable value model.
///
/// Containers are already observable, so objects and lists pass through with
/// their identity intact; plain JSON is converted into fresh containers.
///
/// # Example
///
/// ```ignore
/// use zeno_reactive::reactive;
/// use serde_json::json;
///
/// let state = reactive(json!({ "user": { "name": "Ada" } }));
/// ```
pub fn reactive(value: impl Into<Value>) -> Value {
	value.into()
}
