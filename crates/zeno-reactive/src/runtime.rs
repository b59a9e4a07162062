//! Reactive Runtime
//!
//! This module holds the dependency registry and the Active Effect slot.
//!
//! ## Architecture
//!
//! 1. **Active Effect**: at most one effect is "current" at any time. Reads
//!    performed while it is set are recorded against it.
//! 2. **Dependency Registry**: `(target, key) -> [effect]`, plus the reverse
//!    index `effect -> [(target, key)]` so an effect can drop its old
//!    dependencies before re-running.
//! 3. **Synchronous Triggering**: a write runs every subscriber immediately,
//!    in registration order. Nothing is batched.
//!
//! ## Example
//!
//! ```ignore
//! use zeno_reactive::{effect, reactive};
//! use serde_json::json;
//!
//! let state = reactive(json!({ "count": 0 }));
//! let obj = state.as_object().unwrap().clone();
//!
//! let _effect = effect(move || {
//!     println!("count is {}", obj.get("count"));
//! });
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default bound on recursive re-runs of a single effect.
pub const DEFAULT_MAX_EFFECT_DEPTH: usize = 32;

/// Unique identifier for reactive nodes (containers and effects)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Create a new unique NodeId
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// The key half of a dependency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyKey {
	/// A named property, or a list index rendered as a string.
	Property(String),
	/// Key enumeration of a container.
	Iterate,
}

impl DependencyKey {
	/// Shorthand for a property key.
	pub fn property(key: impl Into<String>) -> Self {
		Self::Property(key.into())
	}
}

/// A `(target, key)` pair an effect depends on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dependency {
	pub target: NodeId,
	pub key: DependencyKey,
}

/// Reactive runtime
///
/// It uses thread-local storage to keep separate state per thread, so every
/// container and effect belongs to the thread that created it.
pub struct Runtime {
	/// The currently executing effect, if any
	active_effect: Cell<Option<NodeId>>,
	/// Dependency registry: (target, key) -> subscribers in registration order
	subscribers: RefCell<BTreeMap<Dependency, Vec<NodeId>>>,
	/// Reverse index: effect -> dependencies
	dependencies: RefCell<BTreeMap<NodeId, Vec<Dependency>>>,
	max_effect_depth: Cell<usize>,
}

impl Runtime {
	/// Create a new Runtime instance
	pub fn new() -> Self {
		Self {
			active_effect: Cell::new(None),
			subscribers: RefCell::new(BTreeMap::new()),
			dependencies: RefCell::new(BTreeMap::new()),
			max_effect_depth: Cell::new(DEFAULT_MAX_EFFECT_DEPTH),
		}
	}

	/// Get the current Active Effect
	pub fn active_effect(&self) -> Option<NodeId> {
		self.active_effect.get()
	}

	/// Replace the Active Effect, returning the previous one.
	pub(crate) fn replace_active_effect(&self, effect: Option<NodeId>) -> Option<NodeId> {
		self.active_effect.replace(effect)
	}

	/// Record that the Active Effect depends on `(target, key)`.
	///
	/// Does nothing when no effect is active.
	pub fn track(&self, target: NodeId, key: DependencyKey) {
		let Some(effect_id) = self.active_effect() else {
			return;
		};
		let dependency = Dependency { target, key };

		let mut subscribers = self.subscribers.borrow_mut();
		let list = subscribers.entry(dependency.clone()).or_default();
		if list.contains(&effect_id) {
			return;
		}
		list.push(effect_id);

		self.dependencies
			.borrow_mut()
			.entry(effect_id)
			.or_default()
			.push(dependency);
	}

	/// Snapshot of the subscribers of `(target, key)`.
	pub fn subscribers_of(&self, target: NodeId, key: &DependencyKey) -> Vec<NodeId> {
		let dependency = Dependency {
			target,
			key: key.clone(),
		};
		self.subscribers
			.borrow()
			.get(&dependency)
			.cloned()
			.unwrap_or_default()
	}

	/// Clear dependencies for an effect
	///
	/// This is called before re-executing an effect so the graph reflects
	/// only the reads of its latest run.
	pub fn clear_dependencies(&self, effect_id: NodeId) {
		let Some(dependencies) = self.dependencies.borrow_mut().remove(&effect_id) else {
			return;
		};

		let mut subscribers = self.subscribers.borrow_mut();
		for dependency in dependencies {
			if let Some(list) = subscribers.get_mut(&dependency) {
				list.retain(|&id| id != effect_id);
				if list.is_empty() {
					subscribers.remove(&dependency);
				}
			}
		}
	}

	/// Remove every registry entry keyed on `target`.
	///
	/// Called when a container is dropped.
	pub fn remove_target(&self, target: NodeId) {
		let mut removed = Vec::new();
		self.subscribers.borrow_mut().retain(|dependency, list| {
			if dependency.target == target {
				removed.extend(list.iter().copied());
				false
			} else {
				true
			}
		});

		if removed.is_empty() {
			return;
		}
		let mut dependencies = self.dependencies.borrow_mut();
		for effect_id in removed {
			if let Some(list) = dependencies.get_mut(&effect_id) {
				list.retain(|dependency| dependency.target != target);
			}
		}
	}

	/// Get the number of subscribers for `(target, key)` (for testing)
	pub fn subscriber_count(&self, target: NodeId, key: &DependencyKey) -> usize {
		self.subscribers_of(target, key).len()
	}

	/// Get the number of dependencies recorded for an effect (for testing)
	pub fn dependency_count(&self, effect_id: NodeId) -> usize {
		self.dependencies
			.borrow()
			.get(&effect_id)
			.map(Vec::len)
			.unwrap_or(0)
	}

	/// Check whether any registry entry mentions `target` (for testing)
	pub fn has_target(&self, target: NodeId) -> bool {
		self.subscribers
			.borrow()
			.keys()
			.any(|dependency| dependency.target == target)
	}

	/// Maximum recursive depth of a single effect.
	pub fn max_effect_depth(&self) -> usize {
		self.max_effect_depth.get()
	}

	/// Set the maximum recursive depth of a single effect.
	///
	/// Values below 1 are raised to 1.
	pub fn set_max_effect_depth(&self, depth: usize) {
		self.max_effect_depth.set(depth.max(1));
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

// Thread-local runtime instance
thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Get a reference to the thread's runtime
///
/// # Example
///
/// ```ignore
/// use zeno_reactive::runtime::with_runtime;
///
/// let active = with_runtime(|rt| rt.active_effect());
/// ```
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.with(f)
}

/// Try to access the runtime (safe version for Drop implementations)
///
/// Returns None if the thread-local storage has been destroyed.
pub(crate) fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.try_with(f).ok()
}

/// Record a read of `(target, key)` by the Active Effect.
pub fn track(target: NodeId, key: DependencyKey) {
	let _ = try_with_runtime(|rt| rt.track(target, key));
}

/// Run every effect subscribed to `(target, key)`.
///
/// The subscriber list is snapshotted first; each effect clears and
/// re-records its own dependencies while it runs.
pub fn trigger(target: NodeId, key: DependencyKey) {
	let Some(subscribers) = try_with_runtime(|rt| rt.subscribers_of(target, &key)) else {
		return;
	};
	for effect_id in subscribers {
		crate::effect::run_effect(effect_id);
	}
}

/// Guard that installs an Active Effect and restores the previous one on drop.
///
/// Restoration also happens while unwinding, so a panicking render never
/// leaves a stale effect behind.
#[must_use = "the previous Active Effect is restored when the scope is dropped"]
pub struct ActiveEffectScope {
	previous: Option<NodeId>,
}

impl ActiveEffectScope {
	/// Make `effect` the Active Effect until the returned guard drops.
	pub fn enter(effect: Option<NodeId>) -> Self {
		let previous = with_runtime(|rt| rt.replace_active_effect(effect));
		Self { previous }
	}
}

impl Drop for ActiveEffectScope {
	fn drop(&mut self) {
		let previous = self.previous;
		let _ = try_with_runtime(|rt| rt.replace_active_effect(previous));
	}
}

/// Run `f` with no Active Effect, so none of its reads are tracked.
pub fn untracked<F, R>(f: F) -> R
where
	F: FnOnce() -> R,
{
	let _scope = ActiveEffectScope::enter(None);
	f()
}

/// Set the maximum recursive depth of a single effect on this thread.
pub fn set_max_effect_depth(depth: usize) {
	with_runtime(|rt| rt.set_max_effect_depth(depth));
}
