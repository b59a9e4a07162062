//! Zeno View - render instances over compiled templates
//!
//! This crate ties a compiled [`Routine`](zeno_template::Routine) to reactive
//! data and keeps a mount target in sync with it.
//!
//! ## Architecture
//!
//! - [`definition`]: component definitions (data factory, methods, props, hooks)
//! - [`instance`]: render instances, nested component rendering and mounting
//! - [`registry`]: components, layouts, include views, services and the store
//! - [`hooks`]: `on_mounted` / `on_unmounted` registered from data factories
//! - [`bindings`]: click and model markers extracted from rendered markup
//! - [`target`]: the mount target seam and its in-memory implementation
//! - [`settings`]: TOML configuration for reactivity and diagnostics
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use zeno_reactive::Value;
//! use zeno_view::{ComponentDefinition, Instance, MemoryDocument, MountTarget};
//!
//! let counter = ComponentDefinition::new("counter")
//! 	.template(r#"<button @click('increment')>{{ count }}</button>"#)
//! 	.data(|| Value::from(json!({ "count": 0 })))
//! 	.method("increment", |data, _| {
//! 		data.set("count", data.get("count").to_number() + 1.0);
//! 		Ok(Value::Undefined)
//! 	});
//!
//! let document = MemoryDocument::new();
//! let app = document.insert("#app");
//! // The target only stays live while `instance` is held
//! let instance = Instance::new(counter);
//! instance.mount(&document, "#app").unwrap();
//! assert_eq!(app.content(), "<button>0</button>");
//!
//! app.click(0).unwrap();
//! assert_eq!(app.content(), "<button>1</button>");
//! ```

pub mod attributes;
pub mod bindings;
pub mod definition;
pub mod error;
pub mod hooks;
pub mod instance;
pub mod registry;
pub mod settings;
pub mod stacks;
pub mod store;
pub mod target;

pub use attributes::AttributeBag;
pub use bindings::{Binding, BindingKind, Event, Extracted, extract_bindings};
pub use definition::{COMPILE_ERROR_TEXT, ComponentDefinition};
pub use error::{ViewError, ViewResult};
pub use hooks::{has_current_instance, on_mounted, on_unmounted};
pub use instance::{Instance, InstanceOptions, render_dynamic};
pub use registry::{
	install_store, register_component, register_layout, register_service, register_view,
};
pub use settings::ViewSettings;
pub use store::{StateStore, Store};
pub use target::{Document, Handler, MemoryDocument, MemoryTarget, MountTarget};
