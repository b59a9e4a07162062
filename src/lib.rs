//! # Zeno
//!
//! A template compiler and fine-grained reactive rendering runtime.
//!
//! Templates are written in a Blade-like syntax (`{{ expr }}`, `@if`,
//! `@foreach`, `<x-component>`, `@extends`, ...). They compile once into a
//! routine, and the routine renders against reactive data. When a mounted
//! instance renders inside an effect, every property the template reads
//! becomes a dependency, so changing that property renders it again.
//!
//! ## Feature Flags
//!
//! - `reactive` - reactivity core and value model
//! - `template` - template compiler (implies `reactive`)
//! - `view` (default) - render instances, registry, hooks and mount targets
//!   (implies `template`)
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "view")]
//! # {
//! use serde_json::json;
//! use zeno::prelude::*;
//!
//! let greeting = ComponentDefinition::new("greeting")
//! 	.template("@if(name)Hello {{ name }}!@else Nobody here.@endif")
//! 	.data(|| Value::from(json!({ "name": "Ada" })));
//!
//! let document = MemoryDocument::new();
//! let root = document.insert("#root");
//! let instance = Instance::new(greeting);
//! instance.mount(&document, "#root").unwrap();
//! assert_eq!(root.content(), "Hello Ada!");
//!
//! instance.data().set("name", "Grace");
//! assert_eq!(root.content(), "Hello Grace!");
//! # }
//! ```

#[cfg(feature = "reactive")]
pub mod reactive;
#[cfg(feature = "template")]
pub mod template;
#[cfg(feature = "view")]
pub mod view;

#[cfg(feature = "reactive")]
pub use zeno_reactive::{
	Effect, HostObject, ReactiveList, ReactiveObject, Value, ValueError, ValueResult, effect,
	reactive, untracked,
};

#[cfg(feature = "template")]
pub use zeno_template::{
	CompileError, Diagnostic, DiagnosticKind, Fragment, RenderError, RenderHost, Rendered,
	Routine, Scope, SlotMap, TemplateResult, compile,
};

#[cfg(feature = "view")]
pub use zeno_view::{
	AttributeBag, ComponentDefinition, Document, Instance, InstanceOptions, MemoryDocument,
	MemoryTarget, MountTarget, StateStore, Store, ViewError, ViewResult, ViewSettings,
	install_store, on_mounted, on_unmounted, register_component, register_layout,
	register_service, register_view, render_dynamic,
};

/// Re-exports of the commonly used types.
pub mod prelude {
	#[cfg(feature = "reactive")]
	pub use crate::{Effect, ReactiveObject, Value, effect, untracked};

	#[cfg(feature = "template")]
	pub use crate::{Rendered, Routine, compile};

	#[cfg(feature = "view")]
	pub use crate::{
		ComponentDefinition, Instance, MemoryDocument, MountTarget, StateStore, Store,
		ViewSettings, install_store, on_mounted, on_unmounted, register_component,
		register_layout, register_service, register_view,
	};
}
