//! Render instances
//!
//! An [`Instance`] binds a compiled routine to reactive data. Mounting
//! wraps its render pass in an effect, so any write to data the routine
//! read renders it again and rewrites the mount target. Nested components,
//! layouts and includes are fresh child instances built on every render
//! pass; nothing is cached between passes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use zeno_reactive::{Effect, ReactiveObject, Value, ValueError, untracked};
use zeno_template::helpers::{class_names, escape_html, style_names};
use zeno_template::{
	Diagnostic, DiagnosticKind, Fragment, RenderError, RenderHost, Rendered, Routine, Scope,
	SlotMap,
};

use crate::attributes::AttributeBag;
use crate::bindings::{Binding, BindingKind, Event, extract_bindings};
use crate::definition::ComponentDefinition;
use crate::error::{ViewError, ViewResult};
use crate::hooks::{HookScope, HookSet};
use crate::store::{AuthHelper, StoreHandle};
use crate::target::{Document, Handler, MountTarget};
use crate::{registry, settings, stacks};

/// Everything a caller may pass to a new instance besides its definition.
#[derive(Default)]
pub struct InstanceOptions {
	/// Values for declared props, merged into the data
	pub props: IndexMap<String, Value>,
	/// Undeclared attributes, exposed as `$attributes`
	pub attributes: IndexMap<String, Value>,
	pub slots: SlotMap,
	/// Sections of the template extending this layout
	pub sections: SlotMap,
	/// Use this data instead of running the data factory
	pub data: Option<ReactiveObject>,
}

struct InstanceInner {
	definition: ComponentDefinition,
	data: ReactiveObject,
	globals: Rc<IndexMap<String, Value>>,
	routine: Routine,
	hooks: Rc<HookSet>,
	sections: SlotMap,
	target: RefCell<Option<Rc<dyn MountTarget>>>,
	mount_effect: RefCell<Option<Effect>>,
	mounted: Cell<bool>,
	unmounted: Cell<bool>,
}

/// A live component: data, methods, routine and an optional mount target.
#[derive(Clone)]
pub struct Instance {
	inner: Rc<InstanceInner>,
}

impl Instance {
	pub fn new(definition: ComponentDefinition) -> Self {
		Self::with_options(definition, InstanceOptions::default())
	}

	pub fn with_options(definition: ComponentDefinition, options: InstanceOptions) -> Self {
		let InstanceOptions {
			props,
			attributes,
			slots,
			sections,
			data,
		} = options;

		let hooks = Rc::new(HookSet::default());
		let data = {
			let _scope = HookScope::enter(Rc::clone(&hooks));
			match data {
				Some(data) => data,
				None => untracked(|| definition.create_data()),
			}
		};
		for (prop, value) in props {
			data.set(prop, value);
		}
		for hook in definition.mounted_hooks() {
			hooks.add_mounted(Rc::clone(hook));
		}
		for hook in definition.unmounted_hooks() {
			hooks.add_unmounted(Rc::clone(hook));
		}

		let globals = helper_bindings(&definition, &data, &slots, &sections, attributes);
		let routine = definition.compiled_routine();

		Self {
			inner: Rc::new(InstanceInner {
				definition,
				data,
				globals: Rc::new(globals),
				routine,
				hooks,
				sections,
				target: RefCell::new(None),
				mount_effect: RefCell::new(None),
				mounted: Cell::new(false),
				unmounted: Cell::new(false),
			}),
		}
	}

	/// The reactive data of this instance.
	pub fn data(&self) -> ReactiveObject {
		self.inner.data.clone()
	}

	pub fn definition(&self) -> &ComponentDefinition {
		&self.inner.definition
	}

	pub fn is_mounted(&self) -> bool {
		self.inner.target.borrow().is_some()
	}

	/// Call a method with this instance's data.
	pub fn call_method(&self, name: &str, args: &[Value]) -> ViewResult<Value> {
		let method = self
			.inner
			.definition
			.find_method(name)
			.ok_or_else(|| ViewError::MethodNotFound(name.to_string()))?;
		Ok(method(&self.inner.data, args)?)
	}

	/// Mount into the element `selector` resolves to.
	///
	/// Keep this `Instance` (or a clone) alive for as long as the target
	/// should stay live. The render effect only holds a weak reference, so
	/// dropping the last handle stops re-rendering like [`Instance::unmount`]
	/// but without running the unmounted hooks.
	///
	/// # Example
	///
	/// ```ignore
	/// let document = MemoryDocument::new();
	/// let app = document.insert("#app");
	/// let instance = Instance::new(counter);
	/// instance.mount(&document, "#app")?;
	/// app.click(0)?;
	/// // `instance` must outlive the interaction above
	/// ```
	pub fn mount(&self, document: &dyn Document, selector: &str) -> ViewResult<()> {
		let Some(target) = document.query(selector) else {
			tracing::error!(selector = selector, "Element {} not found", selector);
			return Err(ViewError::TargetNotFound(selector.to_string()));
		};
		self.mount_target(target);
		Ok(())
	}

	/// Mount onto an already resolved target.
	///
	/// The same lifetime rule as [`Instance::mount`] applies.
	pub fn mount_target(&self, target: Rc<dyn MountTarget>) {
		tracing::debug!(component = self.inner.definition.name(), "Mounting");
		*self.inner.target.borrow_mut() = Some(target);

		let weak: Weak<InstanceInner> = Rc::downgrade(&self.inner);
		let effect = Effect::new(move || {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			let instance = Instance { inner };
			let rendered = instance.render();
			if !rendered.is_diagnostic() && !instance.inner.mounted.replace(true) {
				untracked(|| instance.run_hooks(instance.inner.hooks.mounted()));
			}
		});

		// A mounted hook may already have unmounted the instance
		if self.inner.target.borrow().is_none() {
			effect.dispose();
			return;
		}
		let previous = self.inner.mount_effect.borrow_mut().replace(effect);
		drop(previous);
	}

	/// Stop re-rendering, detach the target and run the unmounted hooks.
	pub fn unmount(&self) {
		let effect = self.inner.mount_effect.borrow_mut().take();
		if let Some(effect) = effect {
			effect.dispose();
		}
		let target = self.inner.target.borrow_mut().take();
		if let Some(target) = target {
			target.clear_handlers();
		}
		if !self.inner.unmounted.replace(true) {
			tracing::debug!(component = self.inner.definition.name(), "Unmounting");
			untracked(|| self.run_hooks(self.inner.hooks.unmounted()));
		}
	}

	/// Top-level render pass.
	///
	/// Clears the push stacks, runs the routine and, when mounted, writes the
	/// markup to the target and rebinds its interactions.
	pub fn render(&self) -> Rendered {
		stacks::reset();
		let rendered = match self.render_routine() {
			Ok(html) => Rendered::Markup(html),
			Err(err) => {
				tracing::error!(
					component = self.inner.definition.name(),
					error = %err,
					"Render failed"
				);
				Rendered::Diagnostic(failure(DiagnosticKind::Render, err.to_string()))
			}
		};

		let target = self.inner.target.borrow().clone();
		if let Some(target) = target {
			self.write(target.as_ref(), &rendered);
		}
		rendered
	}

	fn render_routine(&self) -> Result<String, RenderError> {
		let host: Rc<dyn RenderHost> = self.inner.clone();
		let scope = Scope::new(self.inner.data.clone(), Rc::clone(&self.inner.globals));
		self.inner.routine.render(&scope, &host)
	}

	fn write(&self, target: &dyn MountTarget, rendered: &Rendered) {
		let extracted = extract_bindings(rendered.as_html());
		target.replace_content(&extracted.markup);
		target.clear_handlers();
		tracing::debug!(
			component = self.inner.definition.name(),
			bindings = extracted.bindings.len(),
			"Rendered into target"
		);
		for binding in extracted.bindings {
			let handler = self.handler(&binding);
			target.attach(binding, handler);
		}
	}

	fn handler(&self, binding: &Binding) -> Handler {
		match binding.kind {
			BindingKind::Click => {
				// Resolved at event time; a weak reference keeps the target
				// from owning the instance
				let weak = Rc::downgrade(&self.inner);
				let method = binding.target.clone();
				Rc::new(move |_event: Event| {
					let Some(inner) = weak.upgrade() else {
						return;
					};
					let instance = Instance { inner };
					match instance.call_method(&method, &[]) {
						Ok(_) => {}
						Err(ViewError::MethodNotFound(_)) => {
							tracing::warn!(method = %method, "Click handler method not found");
						}
						Err(err) => {
							tracing::error!(method = %method, error = %err, "Click handler failed");
						}
					}
				})
			}
			BindingKind::Model => {
				let data = self.inner.data.clone();
				let path = binding.target.clone();
				let checkbox = binding.checkbox;
				Rc::new(move |event: Event| {
					let Event::Input(value) = event else {
						return;
					};
					let value = if checkbox {
						Value::Bool(value.is_truthy())
					} else {
						value
					};
					write_path(&data, &path, value);
				})
			}
		}
	}

	fn run_hooks(&self, hooks: Vec<crate::hooks::LifecycleHook>) {
		for hook in hooks {
			hook(self);
		}
	}

	/// One-off instance for a nested component, layout or include.
	fn render_child(
		definition: ComponentDefinition,
		options: InstanceOptions,
	) -> Result<String, RenderError> {
		Instance::with_options(definition, options).render_routine()
	}
}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance")
			.field("component", &self.inner.definition.name())
			.field("mounted", &self.is_mounted())
			.finish()
	}
}

/// Render `definition` as a component with `attrs` and `slots`.
///
/// Declared props are taken out of `attrs` into the child data; the rest
/// become its `$attributes`.
pub fn render_dynamic(
	definition: &ComponentDefinition,
	attrs: IndexMap<String, Value>,
	slots: SlotMap,
) -> Rendered {
	let mut props = IndexMap::new();
	let mut attributes = IndexMap::new();
	for (name, value) in attrs {
		if definition.is_prop(&name) {
			props.insert(name, value);
		} else {
			attributes.insert(name, value);
		}
	}
	let options = InstanceOptions {
		props,
		attributes,
		slots,
		..Default::default()
	};
	match Instance::render_child(definition.clone(), options) {
		Ok(html) => Rendered::Markup(html),
		Err(err) => {
			tracing::error!(component = definition.name(), error = %err, "Component render failed");
			Rendered::Diagnostic(failure(DiagnosticKind::Component, err.to_string()))
		}
	}
}

impl RenderHost for InstanceInner {
	fn render_component(
		&self,
		name: &str,
		attrs: IndexMap<String, Value>,
		slots: SlotMap,
	) -> Rendered {
		match registry::component(name) {
			Some(definition) => render_dynamic(&definition, attrs, slots),
			None => {
				tracing::warn!(component = name, "Component not registered");
				Diagnostic::not_found("Component", name).into()
			}
		}
	}

	fn render_layout(&self, name: &str, sections: SlotMap) -> Rendered {
		let Some(definition) = registry::layout(name) else {
			tracing::warn!(layout = name, "Layout not registered");
			return Diagnostic::not_found("Layout", name).into();
		};
		let options = InstanceOptions {
			sections,
			..Default::default()
		};
		match Instance::render_child(definition, options) {
			Ok(html) => Rendered::Markup(html),
			Err(err) => {
				tracing::error!(layout = name, error = %err, "Layout render failed");
				Rendered::Diagnostic(failure(DiagnosticKind::Layout, err.to_string()))
			}
		}
	}

	fn render_include(&self, name: &str, data: Option<Value>) -> Rendered {
		let Some(definition) = registry::view(name) else {
			tracing::warn!(view = name, "View not registered");
			return Diagnostic::not_found("View", name).into();
		};
		let merged = self.data.shallow_copy();
		if let Some(Value::Object(passed)) = data {
			for (key, value) in passed.entries() {
				merged.set(key, value);
			}
		}
		let options = InstanceOptions {
			data: Some(merged),
			..Default::default()
		};
		match Instance::render_child(definition, options) {
			Ok(html) => Rendered::Markup(html),
			Err(err) => {
				tracing::error!(view = name, error = %err, "Include render failed");
				Rendered::Diagnostic(failure(DiagnosticKind::Include, err.to_string()))
			}
		}
	}

	fn section(&self, name: &str) -> Option<Fragment> {
		self.sections.get(name).cloned()
	}

	fn push(&self, stack: &str, content: String) {
		stacks::push(stack, content);
	}

	fn stack(&self, stack: &str) -> String {
		stacks::stack(stack)
	}

	fn service(&self, name: &str) -> Option<Value> {
		registry::service(name)
	}
}

/// Diagnostic for a failed render, shaped by the installed settings.
fn failure(kind: DiagnosticKind, message: String) -> Diagnostic {
	let diagnostics = settings::current().diagnostics;
	let shown = diagnostics.expose_messages.then_some(message.as_str());
	let fragment = match (kind, shown) {
		(DiagnosticKind::Render, Some(shown)) => format!(
			r#"<div style="{}">Render Error: {shown}</div>"#,
			diagnostics.render_error_style
		),
		(DiagnosticKind::Render, None) => format!(
			r#"<div style="{}">Render Error</div>"#,
			diagnostics.render_error_style
		),
		(DiagnosticKind::Component, Some(shown)) => format!("Error: {shown}"),
		(_, Some(shown)) => shown.to_string(),
		(_, None) => "Error".to_string(),
	};
	Diagnostic::new(kind, message, fragment)
}

/// Write `value` at a dotted `path` inside `data`, walking nested objects.
fn write_path(data: &ReactiveObject, path: &str, value: Value) {
	let mut segments: Vec<&str> = path.split('.').collect();
	let Some(last) = segments.pop() else {
		return;
	};
	let mut object = data.clone();
	for segment in segments {
		match object.get_untracked(segment) {
			Value::Object(next) => object = next,
			other => {
				tracing::warn!(
					path = path,
					segment = segment,
					kind = other.type_name(),
					"Model path does not lead to an object"
				);
				return;
			}
		}
	}
	object.set(last, value);
}

fn fragment_function(name: &str, fragment: Fragment) -> Value {
	Value::function(name, move |_| match fragment.render() {
		Rendered::Markup(html) => Ok(Value::String(html)),
		Rendered::Diagnostic(diagnostic) => Err(ValueError::Custom(diagnostic.message)),
	})
}

fn first_string(args: &[Value]) -> Option<String> {
	args.first()
		.filter(|value| !value.is_undefined())
		.map(Value::to_display_string)
}

/// Names every template of the instance can see besides its data.
fn helper_bindings(
	definition: &ComponentDefinition,
	data: &ReactiveObject,
	slots: &SlotMap,
	sections: &SlotMap,
	attributes: IndexMap<String, Value>,
) -> IndexMap<String, Value> {
	let mut globals = IndexMap::new();

	let helpers = ReactiveObject::from_entries([
		(
			"classNames",
			Value::function("classNames", |args| {
				Ok(Value::String(class_names(&args.first().cloned().unwrap_or_default())))
			}),
		),
		(
			"styleNames",
			Value::function("styleNames", |args| {
				Ok(Value::String(style_names(&args.first().cloned().unwrap_or_default())))
			}),
		),
	]);
	globals.insert("$helpers".to_string(), Value::Object(helpers));

	let slot_flags = ReactiveObject::from_entries(slots.keys().map(|name| (name.clone(), Value::Bool(true))));
	globals.insert("$slots".to_string(), Value::Object(slot_flags));

	let slot_map = slots.clone();
	globals.insert(
		"$slot".to_string(),
		Value::function("$slot", move |args| {
			let name = first_string(args).unwrap_or_else(|| "default".to_string());
			match slot_map.get(&name) {
				Some(fragment) => match fragment.render() {
					Rendered::Markup(html) => Ok(Value::String(html)),
					Rendered::Diagnostic(diagnostic) => Err(ValueError::Custom(diagnostic.message)),
				},
				None => Ok(Value::String(String::new())),
			}
		}),
	);

	let section_functions = ReactiveObject::from_entries(
		sections
			.iter()
			.map(|(name, fragment)| (name.clone(), fragment_function(name, fragment.clone()))),
	);
	globals.insert("$sections".to_string(), Value::Object(section_functions));

	globals.insert(
		"$push".to_string(),
		Value::function("$push", |args| {
			let name = first_string(args).unwrap_or_default();
			let content = args.get(1).map(Value::to_display_string).unwrap_or_default();
			stacks::push(&name, content);
			Ok(Value::Undefined)
		}),
	);
	globals.insert(
		"$stack".to_string(),
		Value::function("$stack", |args| {
			Ok(Value::String(stacks::stack(&first_string(args).unwrap_or_default())))
		}),
	);

	globals.insert(
		"$services".to_string(),
		Value::Object(ReactiveObject::from_entries(registry::services())),
	);
	globals.insert("$attributes".to_string(), Value::host(AttributeBag::new(attributes)));
	globals.insert(
		"e".to_string(),
		Value::function("e", |args| {
			let text = match args.first() {
				None | Some(Value::Undefined) | Some(Value::Null) => String::new(),
				Some(value) => escape_html(&value.to_display_string()),
			};
			Ok(Value::String(text))
		}),
	);

	for (name, method) in definition.methods() {
		let data = data.clone();
		let method = Rc::clone(method);
		globals.insert(
			name.clone(),
			Value::function(name, move |args| method(&data, args)),
		);
	}

	if let Some(store) = registry::store() {
		globals.insert("$store".to_string(), Value::host(StoreHandle(Rc::clone(&store))));
		globals.insert("auth".to_string(), Value::host(AuthHelper(store)));
	}

	globals
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use serial_test::serial;

	#[rstest]
	#[case("form.email", json!({ "form": { "email": "new" } }))]
	#[case("name", json!({ "form": { "email": "old" }, "name": "new" }))]
	#[case("form.missing.deep", json!({ "form": { "email": "old" } }))]
	fn test_write_path(#[case] path: &str, #[case] expected: serde_json::Value) {
		let data = ReactiveObject::from_entries([(
			"form",
			Value::from(json!({ "email": "old" })),
		)]);
		write_path(&data, path, Value::from("new"));
		assert_eq!(Value::Object(data).to_json(), expected);
	}

	#[test]
	#[serial]
	fn test_failure_fragments_follow_settings() {
		settings::ViewSettings::default().install();
		assert_eq!(
			failure(DiagnosticKind::Render, "boom".to_string()).fragment,
			r#"<div style="color:red">Render Error: boom</div>"#
		);
		assert_eq!(failure(DiagnosticKind::Component, "boom".to_string()).fragment, "Error: boom");
		assert_eq!(failure(DiagnosticKind::Layout, "boom".to_string()).fragment, "boom");

		settings::ViewSettings::from_toml_str("[diagnostics]\nexpose_messages = false")
			.unwrap()
			.install();
		let hidden = failure(DiagnosticKind::Include, "secret".to_string());
		assert_eq!(hidden.fragment, "Error");
		assert_eq!(hidden.message, "secret");
		settings::ViewSettings::default().install();
	}
}
