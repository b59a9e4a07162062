//! Reactivity core and value model.
//!
//! This module provides access to zeno-reactive: reactive objects and lists,
//! effects, dependency tracking and the dynamic [`Value`](zeno_reactive::Value)
//! templates operate on.
//!
//! # Examples
//!
//! ```rust
//! # #[cfg(feature = "reactive")]
//! # {
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use zeno::reactive::{Effect, ReactiveObject, Value};
//!
//! let state = ReactiveObject::from_entries([("count", Value::from(1))]);
//! let seen = Rc::new(Cell::new(0.0));
//! let effect = {
//! 	let (state, seen) = (state.clone(), Rc::clone(&seen));
//! 	Effect::new(move || seen.set(state.get("count").to_number()))
//! };
//! state.set("count", 2);
//! assert_eq!(seen.get(), 2.0);
//! drop(effect);
//! # }
//! ```

#[cfg(feature = "reactive")]
pub use zeno_reactive::*;
