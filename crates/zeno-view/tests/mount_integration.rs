//! Mounting, interaction bindings and lifecycle hooks.

use std::cell::Cell;
use std::rc::Rc;

use rstest::{fixture, rstest};
use serde_json::json;
use serial_test::serial;
use zeno_reactive::Value;
use zeno_view::{
	COMPILE_ERROR_TEXT, ComponentDefinition, Instance, MemoryDocument, MountTarget, ViewError,
	ViewSettings, on_mounted, on_unmounted, registry,
};

#[fixture]
fn clean() {
	registry::reset();
	ViewSettings::default().install();
}

fn counter() -> ComponentDefinition {
	ComponentDefinition::new("counter")
		.template(r#"<button @click('increment')>{{ count }}</button>"#)
		.data(|| Value::from(json!({ "count": 0 })))
		.method("increment", |data, _| {
			data.set("count", data.get("count").to_number() + 1.0);
			Ok(Value::Undefined)
		})
}

#[rstest]
#[serial]
fn test_click_rerenders_target(#[from(clean)] _clean: ()) {
	let document = MemoryDocument::new();
	let app = document.insert("#app");
	let instance = Instance::new(counter());

	instance.mount(&document, "#app").unwrap();
	assert!(instance.is_mounted());
	assert_eq!(app.content(), "<button>0</button>");

	app.click(0).unwrap();
	app.click(0).unwrap();
	assert_eq!(app.content(), "<button>2</button>");
	assert_eq!(app.write_count(), 3);
	assert_eq!(instance.data().get("count"), Value::from(2));
}

#[rstest]
#[serial]
fn test_model_writes_nested_path(#[from(clean)] _clean: ()) {
	let form = ComponentDefinition::new("form")
		.template(r#"<input @model(form.email)><p>{{ form.email }}</p>"#)
		.data(|| Value::from(json!({ "form": { "email": "a@b.c" } })));
	let document = MemoryDocument::new();
	let app = document.insert("#form");
	let instance = Instance::new(form);
	instance.mount(&document, "#form").unwrap();
	assert_eq!(app.content(), r#"<input value="a@b.c"><p>a@b.c</p>"#);

	app.input(0, "x@y.z").unwrap();
	assert_eq!(app.content(), r#"<input value="x@y.z"><p>x@y.z</p>"#);
}

#[rstest]
#[serial]
fn test_checkbox_model_writes_checked_state(#[from(clean)] _clean: ()) {
	let terms = ComponentDefinition::new("terms")
		.template(r#"<input type="checkbox" @model(agree)>{{ agree }}"#)
		.data(|| Value::from(json!({ "agree": false })));
	let document = MemoryDocument::new();
	let app = document.insert("#terms");
	let instance = Instance::new(terms);
	instance.mount(&document, "#terms").unwrap();

	assert!(app.bindings()[0].checkbox);
	app.input(0, "on").unwrap();
	assert_eq!(instance.data().get("agree"), Value::Bool(true));
	assert!(app.content().ends_with("true"));
}

#[rstest]
#[serial]
fn test_unknown_click_method_is_ignored(#[from(clean)] _clean: ()) {
	let broken = ComponentDefinition::new("broken").template(r#"<a @click('nowhere')>go</a>"#);
	let document = MemoryDocument::new();
	let app = document.insert("#app");
	Instance::new(broken).mount(&document, "#app").unwrap();

	app.click(0).unwrap();
	assert_eq!(app.content(), "<a>go</a>");
	assert_eq!(app.write_count(), 1);
}

#[rstest]
#[serial]
fn test_missing_target(#[from(clean)] _clean: ()) {
	let document = MemoryDocument::new();
	let instance = Instance::new(counter());
	assert_eq!(
		instance.mount(&document, "#nowhere"),
		Err(ViewError::TargetNotFound("#nowhere".to_string()))
	);
	assert!(!instance.is_mounted());
}

#[rstest]
#[serial]
fn test_mounted_hooks_fire_once(#[from(clean)] _clean: ()) {
	let from_definition = Rc::new(Cell::new(0));
	let from_factory = Rc::new(Cell::new(0));
	let definition_count = Rc::clone(&from_definition);
	let factory_count = Rc::clone(&from_factory);

	let definition = counter()
		.data(move || {
			let factory_count = Rc::clone(&factory_count);
			assert!(on_mounted(move || factory_count.set(factory_count.get() + 1)));
			Value::from(json!({ "count": 0 }))
		})
		.mounted(move |instance| {
			assert!(instance.is_mounted());
			definition_count.set(definition_count.get() + 1);
		});

	let document = MemoryDocument::new();
	let app = document.insert("#app");
	let instance = Instance::new(definition);
	instance.mount(&document, "#app").unwrap();
	app.click(0).unwrap();
	app.click(0).unwrap();

	assert_eq!(app.content(), "<button>2</button>");
	assert_eq!(from_definition.get(), 1);
	assert_eq!(from_factory.get(), 1);
}

#[rstest]
#[serial]
fn test_dropping_instance_stops_rendering(#[from(clean)] _clean: ()) {
	let document = MemoryDocument::new();
	let app = document.insert("#app");
	let instance = Instance::new(counter());
	instance.mount(&document, "#app").unwrap();
	drop(instance);

	app.click(0).unwrap();
	assert_eq!(app.content(), "<button>0</button>");
}

#[rstest]
#[serial]
fn test_mounted_hooks_wait_for_markup(#[from(clean)] _clean: ()) {
	let fired = Rc::new(Cell::new(false));
	let flag = Rc::clone(&fired);
	let definition = ComponentDefinition::new("late")
		.template("{{ ready ? 'ok' : missing }}")
		.data(|| Value::from(json!({ "ready": false })))
		.mounted(move |_| flag.set(true));

	let instance = Instance::new(definition);
	let target = zeno_view::MemoryTarget::new();
	instance.mount_target(target.clone());
	assert!(!fired.get());
	assert!(target.content().contains("Render Error: missing is not defined"));

	instance.data().set("ready", true);
	assert!(fired.get());
	assert_eq!(target.content(), "ok");
}

#[rstest]
#[serial]
fn test_unmount_stops_rendering(#[from(clean)] _clean: ()) {
	let unmounted = Rc::new(Cell::new(0));
	let count = Rc::clone(&unmounted);
	let definition = counter().data(move || {
		let count = Rc::clone(&count);
		on_unmounted(move || count.set(count.get() + 1));
		Value::from(json!({ "count": 0 }))
	});

	let document = MemoryDocument::new();
	let app = document.insert("#app");
	let instance = Instance::new(definition);
	instance.mount(&document, "#app").unwrap();

	instance.unmount();
	instance.unmount();
	assert_eq!(unmounted.get(), 1);
	assert!(!instance.is_mounted());
	assert!(app.bindings().is_empty());

	instance.data().set("count", 5);
	assert_eq!(app.content(), "<button>0</button>");
	assert_eq!(app.write_count(), 1);
}

#[rstest]
#[serial]
fn test_unmount_from_mounted_hook(#[from(clean)] _clean: ()) {
	let unmounted = Rc::new(Cell::new(0));
	let count = Rc::clone(&unmounted);
	let definition = counter()
		.data(move || {
			let count = Rc::clone(&count);
			on_unmounted(move || count.set(count.get() + 1));
			Value::from(json!({ "count": 0 }))
		})
		.mounted(|instance| instance.unmount());

	let document = MemoryDocument::new();
	let app = document.insert("#app");
	let instance = Instance::new(definition);
	instance.mount(&document, "#app").unwrap();
	assert!(!instance.is_mounted());
	assert_eq!(unmounted.get(), 1);

	instance.data().set("count", 5);
	assert_eq!(app.content(), "<button>0</button>");
	assert_eq!(app.write_count(), 1);
}

#[rstest]
#[serial]
fn test_compile_error_renders_fixed_text(#[from(clean)] _clean: ()) {
	let broken = ComponentDefinition::new("broken").template("{{ 1 + }}");
	let rendered = Instance::new(broken).render();
	assert_eq!(rendered.as_html(), COMPILE_ERROR_TEXT);
	assert!(!rendered.is_diagnostic());
}

#[rstest]
#[serial]
fn test_render_error_fragment(#[from(clean)] _clean: ()) {
	let broken = ComponentDefinition::new("broken").template("<p>{{ missing }}</p>");
	let rendered = Instance::new(broken).render();
	assert!(rendered.is_diagnostic());
	assert_eq!(
		rendered.as_html(),
		r#"<div style="color:red">Render Error: missing is not defined</div>"#
	);
}

#[rstest]
#[serial]
fn test_render_error_fragment_follows_settings(#[from(clean)] _clean: ()) {
	ViewSettings::from_toml_str(
		"[diagnostics]\nexpose_messages = false\nrender_error_style = \"color:orange\"",
	)
	.unwrap()
	.install();
	let broken = ComponentDefinition::new("broken").template("{{ missing }}");
	assert_eq!(
		Instance::new(broken).render().as_html(),
		r#"<div style="color:orange">Render Error</div>"#
	);
	ViewSettings::default().install();
}

#[rstest]
#[serial]
fn test_call_method(#[from(clean)] _clean: ()) {
	let instance = Instance::new(counter().method("double", |data, args| {
		let by = args.first().map(Value::to_number).unwrap_or(2.0);
		Ok(Value::from(data.get("count").to_number() * by))
	}));
	instance.call_method("increment", &[]).unwrap();
	assert_eq!(instance.call_method("double", &[Value::from(3)]).unwrap(), Value::from(3));
	assert_eq!(
		instance.call_method("nope", &[]),
		Err(ViewError::MethodNotFound("nope".to_string()))
	);
}
