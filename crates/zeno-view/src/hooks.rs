//! Lifecycle hooks
//!
//! While an instance runs its data factory, its hook set is the ambient
//! one, so [`on_mounted`] and [`on_unmounted`] called from the factory
//! attach to that instance. Outside of that window they do nothing.

use std::cell::RefCell;
use std::rc::Rc;

use crate::instance::Instance;

pub(crate) type LifecycleHook = Rc<dyn Fn(&Instance)>;

/// Mounted and unmounted hooks of one instance.
#[derive(Default)]
pub(crate) struct HookSet {
	mounted: RefCell<Vec<LifecycleHook>>,
	unmounted: RefCell<Vec<LifecycleHook>>,
}

impl HookSet {
	pub(crate) fn add_mounted(&self, hook: LifecycleHook) {
		self.mounted.borrow_mut().push(hook);
	}

	pub(crate) fn add_unmounted(&self, hook: LifecycleHook) {
		self.unmounted.borrow_mut().push(hook);
	}

	/// Snapshot so hooks may register further hooks while running.
	pub(crate) fn mounted(&self) -> Vec<LifecycleHook> {
		self.mounted.borrow().clone()
	}

	pub(crate) fn unmounted(&self) -> Vec<LifecycleHook> {
		self.unmounted.borrow().clone()
	}
}

thread_local! {
	static CURRENT_HOOKS: RefCell<Option<Rc<HookSet>>> = const { RefCell::new(None) };
}

/// Makes a hook set ambient until dropped, then restores the previous one.
pub(crate) struct HookScope {
	previous: Option<Rc<HookSet>>,
}

impl HookScope {
	pub(crate) fn enter(hooks: Rc<HookSet>) -> Self {
		let previous = CURRENT_HOOKS.with(|current| current.borrow_mut().replace(hooks));
		Self { previous }
	}
}

impl Drop for HookScope {
	fn drop(&mut self) {
		let previous = self.previous.take();
		let _ = CURRENT_HOOKS.try_with(|current| *current.borrow_mut() = previous);
	}
}

/// Whether an instance is currently being constructed.
pub fn has_current_instance() -> bool {
	CURRENT_HOOKS.with(|current| current.borrow().is_some())
}

fn register(kind: &str, hook: LifecycleHook, add: fn(&HookSet, LifecycleHook)) -> bool {
	let current = CURRENT_HOOKS.with(|current| current.borrow().clone());
	match current {
		Some(hooks) => {
			add(&hooks, hook);
			true
		}
		None => {
			tracing::warn!(hook = kind, "Lifecycle hook registered outside of a component instance");
			false
		}
	}
}

/// Run `f` once after the ambient instance first renders.
///
/// Returns `false`, and does nothing, when no instance is being constructed.
///
/// # Example
///
/// ```ignore
/// let counter = ComponentDefinition::new("counter")
/// 	.template("{{ count }}")
/// 	.data(|| {
/// 		on_mounted(|| tracing::info!("counter mounted"));
/// 		Value::from(json!({ "count": 0 }))
/// 	});
/// ```
pub fn on_mounted<F>(f: F) -> bool
where
	F: Fn() + 'static,
{
	register("mounted", Rc::new(move |_: &Instance| f()), HookSet::add_mounted)
}

/// Run `f` when the ambient instance is unmounted.
pub fn on_unmounted<F>(f: F) -> bool
where
	F: Fn() + 'static,
{
	register("unmounted", Rc::new(move |_: &Instance| f()), HookSet::add_unmounted)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_hooks_outside_instance_are_noops() {
		assert!(!has_current_instance());
		assert!(!on_mounted(|| {}));
		assert!(!on_unmounted(|| {}));
	}

	#[test]
	#[serial]
	fn test_scope_registers_and_restores() {
		let outer = Rc::new(HookSet::default());
		let inner = Rc::new(HookSet::default());
		{
			let _outer = HookScope::enter(Rc::clone(&outer));
			{
				let _inner = HookScope::enter(Rc::clone(&inner));
				assert!(on_mounted(|| {}));
			}
			assert!(on_unmounted(|| {}));
		}
		assert!(!has_current_instance());
		assert_eq!(inner.mounted().len(), 1);
		assert_eq!(outer.mounted().len(), 0);
		assert_eq!(outer.unmounted().len(), 1);
	}
}
