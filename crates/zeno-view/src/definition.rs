//! Component definitions
//!
//! A [`ComponentDefinition`] describes how to build instances: the data
//! factory, methods, declared props, lifecycle hooks and the template. The
//! template is compiled on first use and the routine is shared by every
//! clone of the definition.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use zeno_reactive::{ReactiveObject, Value, ValueResult};
use zeno_template::{Routine, compile};

use crate::hooks::LifecycleHook;
use crate::instance::Instance;

/// Text shown in place of a template that failed to compile
pub const COMPILE_ERROR_TEXT: &str = "Error compiling template";

/// Builds the initial data of an instance.
pub type DataFactory = Rc<dyn Fn() -> Value>;

/// A method bound to the instance data.
pub type Method = Rc<dyn Fn(&ReactiveObject, &[Value]) -> ValueResult<Value>>;

#[derive(Clone)]
enum TemplateSource {
	Source(Rc<str>),
	Compiled(Routine),
}

/// Definition of a component, layout or view.
///
/// # Example
///
/// ```ignore
/// use zeno_view::ComponentDefinition;
///
/// let counter = ComponentDefinition::new("counter")
/// 	.template(r#"<button @click('increment')>{{ count }}</button>"#)
/// 	.data(|| Value::from(json!({ "count": 0 })))
/// 	.method("increment", |data, _| {
/// 		data.set("count", data.get("count").to_number() + 1.0);
/// 		Ok(Value::Undefined)
/// 	});
/// ```
#[derive(Clone)]
pub struct ComponentDefinition {
	name: Rc<str>,
	data: Option<DataFactory>,
	methods: IndexMap<String, Method>,
	props: Vec<String>,
	source: TemplateSource,
	compiled: Rc<OnceCell<Routine>>,
	mounted: Vec<LifecycleHook>,
	unmounted: Vec<LifecycleHook>,
}

impl ComponentDefinition {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: Rc::from(name.into()),
			data: None,
			methods: IndexMap::new(),
			props: Vec::new(),
			source: TemplateSource::Source(Rc::from("")),
			compiled: Rc::new(OnceCell::new()),
			mounted: Vec::new(),
			unmounted: Vec::new(),
		}
	}

	/// Template source, compiled lazily.
	pub fn template(mut self, source: impl Into<String>) -> Self {
		self.source = TemplateSource::Source(Rc::from(source.into()));
		self.compiled = Rc::new(OnceCell::new());
		self
	}

	/// Use an already compiled routine instead of a template.
	pub fn routine(mut self, routine: Routine) -> Self {
		self.source = TemplateSource::Compiled(routine);
		self.compiled = Rc::new(OnceCell::new());
		self
	}

	/// Data factory, run once per instance.
	pub fn data<F>(mut self, factory: F) -> Self
	where
		F: Fn() -> Value + 'static,
	{
		self.data = Some(Rc::new(factory));
		self
	}

	pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
	where
		F: Fn(&ReactiveObject, &[Value]) -> ValueResult<Value> + 'static,
	{
		self.methods.insert(name.into(), Rc::new(method));
		self
	}

	/// Declare props; passed attributes with these names become data.
	pub fn props<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.props.extend(names.into_iter().map(Into::into));
		self
	}

	pub fn mounted<F>(mut self, hook: F) -> Self
	where
		F: Fn(&Instance) + 'static,
	{
		self.mounted.push(Rc::new(hook));
		self
	}

	pub fn unmounted<F>(mut self, hook: F) -> Self
	where
		F: Fn(&Instance) + 'static,
	{
		self.unmounted.push(Rc::new(hook));
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn declared_props(&self) -> &[String] {
		&self.props
	}

	pub fn is_prop(&self, name: &str) -> bool {
		self.props.iter().any(|prop| prop == name)
	}

	pub(crate) fn methods(&self) -> &IndexMap<String, Method> {
		&self.methods
	}

	pub(crate) fn find_method(&self, name: &str) -> Option<Method> {
		self.methods.get(name).cloned()
	}

	pub(crate) fn mounted_hooks(&self) -> &[LifecycleHook] {
		&self.mounted
	}

	pub(crate) fn unmounted_hooks(&self) -> &[LifecycleHook] {
		&self.unmounted
	}

	/// Run the data factory. Anything but an object yields empty data.
	pub(crate) fn create_data(&self) -> ReactiveObject {
		let Some(factory) = &self.data else {
			return ReactiveObject::new();
		};
		match factory() {
			Value::Object(object) => object,
			Value::Undefined | Value::Null => ReactiveObject::new(),
			other => {
				tracing::warn!(
					component = %self.name,
					kind = other.type_name(),
					"Data factory must return an object"
				);
				ReactiveObject::new()
			}
		}
	}

	/// The routine instances render. A template that fails to compile is
	/// reported once and replaced by a routine printing
	/// [`COMPILE_ERROR_TEXT`].
	pub fn compiled_routine(&self) -> Routine {
		let source = match &self.source {
			TemplateSource::Compiled(routine) => return routine.clone(),
			TemplateSource::Source(source) => source,
		};
		self.compiled
			.get_or_init(|| match compile(source) {
				Ok(routine) => routine,
				Err(err) => {
					tracing::error!(
						component = %self.name,
						error = %err,
						"Template compilation failed"
					);
					Routine::fixed(COMPILE_ERROR_TEXT)
				}
			})
			.clone()
	}
}

impl fmt::Debug for ComponentDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentDefinition")
			.field("name", &self.name)
			.field("props", &self.props)
			.field("methods", &self.methods.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_compiled_routine_is_shared_between_clones() {
		let definition = ComponentDefinition::new("card").template("{{ title }}");
		let copy = definition.clone();
		definition.compiled_routine();
		assert!(copy.compiled.get().is_some());
	}

	#[test]
	fn test_compile_failure_falls_back_to_fixed_text() {
		let definition = ComponentDefinition::new("broken").template("{{ a + }}");
		let routine = definition.compiled_routine();
		assert_eq!(routine.layout(), None);
		assert!(format!("{routine:?}").contains(COMPILE_ERROR_TEXT));
	}

	#[test]
	fn test_data_factory_result_shapes() {
		let object = ComponentDefinition::new("a").data(|| Value::from(json!({ "x": 1 })));
		assert!(object.create_data().contains_key("x"));

		let scalar = ComponentDefinition::new("b").data(|| Value::from(3));
		assert!(scalar.create_data().is_empty());
		assert!(ComponentDefinition::new("c").create_data().is_empty());
	}

	#[test]
	fn test_props() {
		let definition = ComponentDefinition::new("alert").props(["type", "title"]);
		assert!(definition.is_prop("type"));
		assert!(!definition.is_prop("class"));
		assert_eq!(definition.declared_props(), ["type", "title"]);
	}
}
