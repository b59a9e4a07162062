//! Components, layouts, includes, stacks and the store rendered through the
//! registry.

use indexmap::IndexMap;
use rstest::{fixture, rstest};
use serde_json::json;
use serial_test::serial;
use zeno_reactive::Value;
use zeno_template::{Fragment, Rendered};
use zeno_view::store::StateStore;
use zeno_view::{
	ComponentDefinition, Instance, MemoryDocument, MountTarget, Store, ViewSettings,
	install_store, register_component, register_layout, register_service, register_view,
	registry, render_dynamic,
};

#[fixture]
fn clean() {
	registry::reset();
	ViewSettings::default().install();
}

fn page(source: &str, data: serde_json::Value) -> ComponentDefinition {
	ComponentDefinition::new("page")
		.template(source)
		.data(move || Value::from(data.clone()))
}

fn render(source: &str, data: serde_json::Value) -> String {
	Instance::new(page(source, data)).render().into_html()
}

#[rstest]
#[serial]
fn test_component_props_attributes_and_slots(#[from(clean)] _clean: ()) {
	register_component(
		"card",
		ComponentDefinition::new("card")
			.props(["title"])
			.template(r#"<div {{ $attributes.merge({ class: 'card' }) }}><h2>{{ title }}</h2>{{ $slot() }}@if($slots.footer)<footer>{{ $slot('footer') }}</footer>@endif</div>"#),
	);
	let source = r#"<x-card title="Hello" class="wide" :data-id="id">Hi {{ name }}<x-slot name="footer">bye</x-slot></x-card>"#;
	assert_eq!(
		render(source, json!({ "id": 7, "name": "Ada" })),
		r#"<div class="card wide" data-id="7"><h2>Hello</h2>Hi Ada<footer>bye</footer></div>"#
	);
}

#[rstest]
#[serial]
fn test_component_without_slots(#[from(clean)] _clean: ()) {
	register_component(
		"badge",
		ComponentDefinition::new("badge").template("[{{ $slot() }}]@if($slots.footer)!@endif"),
	);
	assert_eq!(render("<x-badge />", json!({})), "[]");
}

#[rstest]
#[serial]
fn test_slot_body_reads_parent_data(#[from(clean)] _clean: ()) {
	register_component(
		"shell",
		ComponentDefinition::new("shell")
			.template("<section>{{ $slot() }}</section>")
			.data(|| Value::from(json!({ "user": "child" }))),
	);
	assert_eq!(
		render("<x-shell>{{ user }}</x-shell>", json!({ "user": "parent" })),
		"<section>parent</section>"
	);
}

#[rstest]
#[serial]
fn test_unknown_component_placeholder(#[from(clean)] _clean: ()) {
	assert_eq!(
		render("a<x-ghost></x-ghost>b", json!({})),
		"a[Component ghost not found]b"
	);
}

#[rstest]
#[serial]
fn test_component_failure_is_local(#[from(clean)] _clean: ()) {
	register_component(
		"broken",
		ComponentDefinition::new("broken").template("{{ nothing.here }}"),
	);
	assert_eq!(
		render("<p>before</p><x-broken></x-broken><p>after</p>", json!({})),
		"<p>before</p>Error: nothing is not defined<p>after</p>"
	);
}

#[rstest]
#[serial]
fn test_legacy_component_directive(#[from(clean)] _clean: ()) {
	register_component(
		"alert",
		ComponentDefinition::new("alert")
			.props(["tone"])
			.template(r#"<p class="{{ tone }}">{{ $slot() }}</p>"#),
	);
	assert_eq!(
		render("@component('alert', { tone: 'warn' })Careful@endcomponent", json!({})),
		r#"<p class="warn">Careful</p>"#
	);
}

#[rstest]
#[serial]
fn test_layout_sections_and_stacks(#[from(clean)] _clean: ()) {
	register_layout(
		"app",
		ComponentDefinition::new("app").template(
			"<title>@yield('title', 'Site')</title><main>@yield('content')</main>@stack('scripts')",
		),
	);
	register_component(
		"chart",
		ComponentDefinition::new("chart")
			.props(["id"])
			.template("<canvas></canvas>@push('scripts')<script>{{ id }}</script>@endpush"),
	);
	let source = "@extends('app')@section('content')<h1>{{ heading }}</h1><x-chart id=\"a\"></x-chart><x-chart id=\"b\"></x-chart>@endsection@push('scripts')<script>page</script>@endpush";
	let expected = "<title>Site</title><main><h1>Stats</h1><canvas></canvas><canvas></canvas></main><script>page</script><script>a</script><script>b</script>";

	let instance = Instance::new(page(source, json!({ "heading": "Stats" })));
	assert_eq!(instance.render().into_html(), expected);
	// Stacks start empty on every top-level render
	assert_eq!(instance.render().into_html(), expected);
}

#[rstest]
#[serial]
fn test_missing_layout(#[from(clean)] _clean: ()) {
	assert_eq!(render("@extends('nope')", json!({})), "[Layout nope not found]");
}

#[rstest]
#[serial]
fn test_include_merges_data(#[from(clean)] _clean: ()) {
	register_view(
		"partials.greeting",
		ComponentDefinition::new("greeting").template("{{ salutation }}, {{ name }}"),
	);
	let source = "@include('partials.greeting', { salutation: 'Hello' }) / @include('partials.greeting')";
	assert_eq!(
		render(source, json!({ "name": "Ada", "salutation": "Hi" })),
		"Hello, Ada / Hi, Ada"
	);
	assert_eq!(render("@include('missing')", json!({})), "[View missing not found]");
}

#[rstest]
#[serial]
fn test_include_does_not_write_back(#[from(clean)] _clean: ()) {
	register_view(
		"bump",
		ComponentDefinition::new("bump")
			.template("{{ bump() }}{{ n }}")
			.method("bump", |data, _| {
				data.set("n", data.get("n").to_number() + 10.0);
				Ok(Value::from(""))
			}),
	);
	let instance = Instance::new(page("@include('bump', { m: 2 }){{ n }}", json!({ "n": 1 })));
	assert_eq!(instance.render().into_html(), "111");
	assert_eq!(instance.data().get("n"), Value::from(1));
	assert!(!instance.data().contains_key("m"));
}

#[rstest]
#[serial]
fn test_services_and_inject(#[from(clean)] _clean: ()) {
	register_service("currency", json!({ "symbol": "€" }));
	let source = "@inject('money', 'currency'){{ money.symbol }}{{ price }} {{ $services.currency.symbol }}";
	assert_eq!(render(source, json!({ "price": 5 })), "€5 €");
}

#[rstest]
#[serial]
fn test_helpers_and_escaper(#[from(clean)] _clean: ()) {
	let source = r#"<p class="{{ $helpers.classNames({ on: active, off: !active }) }}">{{ e(html) }}{{ e(nothing) }}</p>"#;
	assert_eq!(
		render(source, json!({ "active": true, "html": "<b>", "nothing": null })),
		r#"<p class="on">&lt;b&gt;</p>"#
	);
}

#[rstest]
#[serial]
fn test_methods_are_callable_from_templates(#[from(clean)] _clean: ()) {
	let definition = page("{{ total(2) }}", json!({ "price": 4 })).method("total", |data, args| {
		let quantity = args.first().map(Value::to_number).unwrap_or(1.0);
		Ok(Value::from(data.get("price").to_number() * quantity))
	});
	assert_eq!(Instance::new(definition).render().into_html(), "8");
}

#[rstest]
#[serial]
fn test_store_and_auth(#[from(clean)] _clean: ()) {
	let store = Store::new(json!({ "user": { "name": "Ada" }, "cart": [] }))
		.mutation("logout", |state, _| {
			state.set("user", Value::Null);
			Ok(())
		})
		.mutation("add", |state, item| {
			if let Value::List(cart) = state.get("cart") {
				cart.push(item);
			}
			Ok(())
		});
	install_store(store.clone());

	let source = "@if(auth.check())Hi {{ auth.user().name }}@else<i>guest</i>@endif ({{ $store.state.cart.length }})";
	let document = MemoryDocument::new();
	let app = document.insert("#nav");
	let instance = Instance::new(page(source, json!({})));
	instance.mount(&document, "#nav").unwrap();
	assert_eq!(app.content(), "Hi Ada (0)");

	store.commit("add", Value::from("tea")).unwrap();
	assert_eq!(app.content(), "Hi Ada (1)");

	store.commit("logout", Value::Null).unwrap();
	assert_eq!(app.content(), "<i>guest</i> (1)");
}

#[rstest]
#[serial]
fn test_render_dynamic_partitions_props(#[from(clean)] _clean: ()) {
	let definition = ComponentDefinition::new("link")
		.props(["label"])
		.template(r#"<a {{ $attributes }}>{{ label }}</a>"#);
	let mut attrs = IndexMap::new();
	attrs.insert("label".to_string(), Value::from("Home"));
	attrs.insert("href".to_string(), Value::from("/"));
	attrs.insert("hidden".to_string(), Value::Bool(false));

	let rendered = render_dynamic(&definition, attrs, IndexMap::new());
	assert_eq!(rendered, Rendered::Markup(r#"<a href="/">Home</a>"#.to_string()));
}

#[rstest]
#[serial]
fn test_render_dynamic_with_slots(#[from(clean)] _clean: ()) {
	let definition = ComponentDefinition::new("wrap").template("<div>{{ $slot() }}</div>");
	let mut slots = IndexMap::new();
	slots.insert("default".to_string(), Fragment::markup("<b>x</b>"));
	assert_eq!(
		render_dynamic(&definition, IndexMap::new(), slots).into_html(),
		"<div><b>x</b></div>"
	);
}
