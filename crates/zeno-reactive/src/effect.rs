//! Effect - Reactive Side Effects
//!
//! `Effect` represents a side effect that re-runs synchronously whenever
//! something it read changes. Dependencies are tracked automatically: any
//! container read performed inside the effect closure becomes a dependency.
//!
//! ## Re-entrancy
//!
//! A write performed while an effect is running may trigger that same effect.
//! The nested run happens immediately (recursively). It is reported with
//! `tracing::warn!`, and once the nesting exceeds the runtime's
//! `max_effect_depth` the run is refused and reported with `tracing::error!`.
//!
//! ## Example
//!
//! ```ignore
//! use zeno_reactive::{Effect, ReactiveObject};
//!
//! let state = ReactiveObject::new();
//! state.set("count", 0);
//!
//! let reader = state.clone();
//! let _effect = Effect::new(move || {
//!     println!("count is {}", reader.get("count"));
//! });
//!
//! state.set("count", 42); // Prints: "count is 42"
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::runtime::{ActiveEffectScope, NodeId, try_with_runtime, with_runtime};

/// Type alias for effect functions
type EffectFn = Rc<dyn Fn() + 'static>;

// Storage for Effect functions
//
// This stores the closures for all Effects so they can be re-executed when
// dependencies change.
thread_local! {
	static EFFECT_FUNCTIONS: RefCell<BTreeMap<NodeId, EffectFn>> = const { RefCell::new(BTreeMap::new()) };
}

// Current nesting depth of each running effect
thread_local! {
	static EFFECT_DEPTH: RefCell<BTreeMap<NodeId, usize>> = const { RefCell::new(BTreeMap::new()) };
}

/// A reactive effect that re-runs when its dependencies change
///
/// Effects run immediately when created. Dropping the handle disposes the
/// effect, so keep it alive for as long as the side effect should stay live.
pub struct Effect {
	/// Unique identifier for this effect
	id: NodeId,
	/// Whether this effect has been disposed
	disposed: Cell<bool>,
}

impl Effect {
	/// Create a new Effect that runs the given function
	///
	/// The function runs immediately, and will re-run whenever any reactive
	/// value it reads changes.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn() + 'static,
	{
		let id = NodeId::new();

		EFFECT_FUNCTIONS.with(|storage| {
			storage.borrow_mut().insert(id, Rc::new(f));
		});

		run_effect(id);

		Self {
			id,
			disposed: Cell::new(false),
		}
	}

	/// Get the NodeId of this effect
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Run the effect again, re-recording its dependencies.
	pub fn run(&self) {
		if !self.disposed.get() {
			run_effect(self.id);
		}
	}

	/// Whether [`Effect::dispose`] has been called
	pub fn is_disposed(&self) -> bool {
		self.disposed.get()
	}

	/// Dispose this effect
	///
	/// After calling this, the effect will no longer run and its dependencies
	/// are removed from the registry.
	pub fn dispose(&self) {
		if self.disposed.replace(true) {
			return;
		}

		// Ignore if TLS is destroyed
		let _ = try_with_runtime(|rt| rt.clear_dependencies(self.id));
		// The closure may own other effects; drop it outside the borrow
		let removed = EFFECT_FUNCTIONS
			.try_with(|storage| storage.borrow_mut().remove(&self.id))
			.ok()
			.flatten();
		drop(removed);
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl std::fmt::Debug for Effect {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Effect")
			.field("id", &self.id)
			.field("disposed", &self.disposed.get())
			.finish()
	}
}

/// Create and immediately run an effect.
pub fn effect<F>(f: F) -> Effect
where
	F: Fn() + 'static,
{
	Effect::new(f)
}

/// Decrements the effect's depth counter when a run ends.
struct DepthGuard {
	id: NodeId,
}

impl Drop for DepthGuard {
	fn drop(&mut self) {
		let _ = EFFECT_DEPTH.try_with(|depths| {
			let mut depths = depths.borrow_mut();
			if let Some(depth) = depths.get_mut(&self.id) {
				*depth -= 1;
				if *depth == 0 {
					depths.remove(&self.id);
				}
			}
		});
	}
}

/// Execute an effect by its ID
///
/// Clears the effect's previous dependencies, makes it the Active Effect for
/// the duration of the call, and restores the previous Active Effect after.
/// Unknown (disposed) ids are ignored.
pub(crate) fn run_effect(effect_id: NodeId) {
	let Some(effect_fn) = EFFECT_FUNCTIONS
		.try_with(|storage| storage.borrow().get(&effect_id).cloned())
		.ok()
		.flatten()
	else {
		return;
	};

	let depth = EFFECT_DEPTH.with(|depths| {
		let mut depths = depths.borrow_mut();
		let depth = depths.entry(effect_id).or_insert(0);
		*depth += 1;
		*depth
	});
	let _depth_guard = DepthGuard { id: effect_id };

	let max_depth = with_runtime(|rt| rt.max_effect_depth());
	if depth > max_depth {
		tracing::error!(
			effect = ?effect_id,
			depth,
			max_depth,
			"effect re-entered too deeply, skipping run"
		);
		return;
	}
	if depth > 1 {
		tracing::warn!(effect = ?effect_id, depth, "effect triggered while already running");
	}

	with_runtime(|rt| rt.clear_dependencies(effect_id));
	let _scope = ActiveEffectScope::enter(Some(effect_id));
	effect_fn();
}
