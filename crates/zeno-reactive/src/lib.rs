//! Fine-grained reactivity core.
//!
//! This crate provides the primitives the view layer is built on:
//!
//! - [`track`] / [`trigger`]: record and notify `(container, key)` reads
//! - [`ReactiveObject`] / [`ReactiveList`]: observable containers
//! - [`Effect`]: a closure that re-runs synchronously when its reads change
//! - [`Value`]: the dynamically typed data model templates read
//!
//! ## Example
//!
//! ```ignore
//! use zeno_reactive::{Effect, reactive};
//! use serde_json::json;
//!
//! let state = reactive(json!({ "count": 0 }));
//! let object = state.as_object().cloned().unwrap();
//!
//! let reader = object.clone();
//! let _effect = Effect::new(move || {
//!     println!("count = {}", reader.get("count"));
//! });
//!
//! object.set("count", 1); // effect re-runs immediately
//! ```

pub mod effect;
pub mod object;
pub mod runtime;
pub mod value;

pub use effect::{Effect, effect};
pub use object::{ReactiveList, ReactiveObject, reactive};
pub use runtime::{
	ActiveEffectScope, DEFAULT_MAX_EFFECT_DEPTH, Dependency, DependencyKey, NodeId, Runtime,
	set_max_effect_depth, track, trigger, untracked, with_runtime,
};
pub use value::{Function, HostObject, Value, ValueError, ValueResult};
