//! End-to-end rendering of compiled templates against a test host.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use proptest::prelude::*;
use rstest::rstest;
use serde_json::json;
use zeno_reactive::{ReactiveObject, Value};
use zeno_template::{
	Diagnostic, Fragment, RenderError, RenderHost, Rendered, Routine, Scope, SlotMap, compile,
};

/// Host with registered layouts, shared stacks and services. Components
/// render as `<name attr="v">default slot</name>`.
#[derive(Default)]
struct TestHost {
	layouts: IndexMap<String, Routine>,
	sections: SlotMap,
	stacks: Rc<RefCell<IndexMap<String, Vec<String>>>>,
	services: IndexMap<String, Value>,
}

impl RenderHost for TestHost {
	fn render_component(&self, name: &str, attrs: IndexMap<String, Value>, slots: SlotMap) -> Rendered {
		let attrs: String = attrs
			.iter()
			.map(|(key, value)| format!(r#" {key}="{value}""#))
			.collect();
		let body = slots
			.get("default")
			.map(|slot| slot.render().into_html())
			.unwrap_or_default();
		let footer = slots
			.get("footer")
			.map(|slot| format!("|{}", slot.render().into_html()))
			.unwrap_or_default();
		Rendered::Markup(format!("<{name}{attrs}>{body}{footer}</{name}>"))
	}

	fn render_layout(&self, name: &str, sections: SlotMap) -> Rendered {
		let Some(layout) = self.layouts.get(name) else {
			return Diagnostic::not_found("Layout", name).into();
		};
		let host: Rc<dyn RenderHost> = Rc::new(TestHost {
			layouts: IndexMap::new(),
			sections,
			stacks: Rc::clone(&self.stacks),
			services: IndexMap::new(),
		});
		match layout.render(&empty_scope(), &host) {
			Ok(html) => Rendered::Markup(html),
			Err(err) => Rendered::Markup(err.to_string()),
		}
	}

	fn render_include(&self, name: &str, _data: Option<Value>) -> Rendered {
		Rendered::Markup(format!("[include {name}]"))
	}

	fn section(&self, name: &str) -> Option<Fragment> {
		self.sections.get(name).cloned()
	}

	fn push(&self, stack: &str, content: String) {
		self.stacks
			.borrow_mut()
			.entry(stack.to_string())
			.or_default()
			.push(content);
	}

	fn stack(&self, stack: &str) -> String {
		self.stacks
			.borrow()
			.get(stack)
			.map(|items| items.concat())
			.unwrap_or_default()
	}

	fn service(&self, name: &str) -> Option<Value> {
		self.services.get(name).cloned()
	}
}

fn empty_scope() -> Scope {
	Scope::new(ReactiveObject::new(), Rc::new(IndexMap::new()))
}

fn scope_with(data: serde_json::Value) -> Scope {
	let data = match Value::from(data) {
		Value::Object(object) => object,
		other => panic!("test data must be an object, got {other:?}"),
	};
	Scope::new(data, Rc::new(IndexMap::new()))
}

fn render_with(host: TestHost, source: &str, data: serde_json::Value) -> Result<String, RenderError> {
	let routine = compile(source).unwrap_or_else(|err| panic!("{source:?} failed to compile: {err}"));
	let host: Rc<dyn RenderHost> = Rc::new(host);
	routine.render(&scope_with(data), &host)
}

fn render(source: &str, data: serde_json::Value) -> String {
	render_with(TestHost::default(), source, data).unwrap_or_else(|err| panic!("{source:?} failed to render: {err}"))
}

#[test]
fn test_hello_interpolation() {
	assert_eq!(render("Hello {{ name }}!", json!({ "name": "Ada" })), "Hello Ada!");
}

#[rstest]
#[case(json!({ "role": "admin" }), "A")]
#[case(json!({ "role": "editor" }), "E")]
#[case(json!({ "role": "guest" }), "G")]
fn test_if_elseif_else(#[case] data: serde_json::Value, #[case] expected: &str) {
	let source = "@if(role === 'admin')A@elseif(role == 'editor')E@else{{ 'G' }}@endif";
	assert_eq!(render(source, data), expected);
}

#[test]
fn test_unless() {
	assert_eq!(render("@unless(done)todo@endunless", json!({ "done": false })), "todo");
	assert_eq!(render("@unless(done)todo@endunless", json!({ "done": true })), "");
}

#[test]
fn test_foreach_loop_record() {
	let source = "@foreach(items as item){{ loop.iteration }}/{{ loop.count }}:{{ item }}{{ loop.last ? '' : ',' }}@endforeach";
	assert_eq!(
		render(source, json!({ "items": ["a", "b", "c"] })),
		"1/3:a,2/3:b,3/3:c"
	);
}

#[test]
fn test_nested_loops_see_parent() {
	let source = "@foreach(rows as row)@foreach(row as cell){{ loop.depth }}{{ loop.parent.index }}{{ cell }} @endforeach@endforeach";
	assert_eq!(
		render(source, json!({ "rows": [["a"], ["b"]] })),
		"20a 21b "
	);
}

#[test]
fn test_foreach_over_object_with_key() {
	let source = "@foreach(prices as name => price){{ name }}={{ price }};@endforeach";
	assert_eq!(
		render(source, json!({ "prices": { "tea": 2, "cake": 4.5 } })),
		"tea=2;cake=4.5;"
	);
}

#[test]
fn test_foreach_over_missing_list_is_empty() {
	assert_eq!(render("[@foreach(items as i){{ i }}@endforeach]", json!({ "items": null })), "[]");
}

#[test]
fn test_foreach_over_number_fails() {
	let err = render_with(
		TestHost::default(),
		"@foreach(count as i)x@endforeach",
		json!({ "count": 3 }),
	)
	.unwrap_err();
	assert_eq!(err.to_string(), "count is not iterable");
}

#[test]
fn test_break_leaves_loop() {
	let source = "@foreach(items as i)@if(i > 2)@break@endif{{ i }}@endforeach";
	assert_eq!(render(source, json!({ "items": [1, 2, 3, 4] })), "12");
}

#[rstest]
#[case(1, "one two ")]
#[case(2, "two ")]
#[case(3, "three dflt")]
#[case(9, " dflt")]
fn test_switch_falls_through(#[case] n: i32, #[case] expected: &str) {
	let source = "@switch(n)\n\t@case(1)one @case(2)two @break@case(3)three@default dflt@endswitch";
	assert_eq!(render(source, json!({ "n": n })), expected);
}

#[test]
fn test_switch_uses_strict_equality() {
	let source = "@switch(n)@case('1')string@break@default other@endswitch";
	assert_eq!(render(source, json!({ "n": 1 })), " other");
}

#[rstest]
#[case("@isset(user)set@endisset", json!({}), "")]
#[case("@isset(user)set@endisset", json!({ "user": null }), "")]
#[case("@isset(user.name)set@endisset", json!({ "user": null }), "")]
#[case("@isset(user)set@endisset", json!({ "user": 0 }), "set")]
#[case("@empty(items)none@endempty", json!({ "items": [] }), "none")]
#[case("@empty(items)none@endempty", json!({}), "none")]
#[case("@empty(items)none@endempty", json!({ "items": [1] }), "")]
fn test_isset_and_empty(#[case] source: &str, #[case] data: serde_json::Value, #[case] expected: &str) {
	assert_eq!(render(source, data), expected);
}

#[test]
fn test_undefined_identifier_is_a_render_error() {
	let err = render_with(TestHost::default(), "{{ missing }}", json!({})).unwrap_err();
	assert_eq!(err.to_string(), "missing is not defined");
}

#[test]
fn test_attribute_directives() {
	let source = r#"<input @checked(on) @disabled(off) @class(['a', { b: on, c: off }]) @style({ color: 'red' }) @click('save') @model(form.email)>"#;
	assert_eq!(
		render(source, json!({ "on": true, "off": false, "form": { "email": "a@b.c" } })),
		r#"<input checked  class="a b" style="color: red" data-z-click="save" value="a@b.c" data-z-model="form.email">"#
	);
}

#[test]
fn test_json_directive() {
	assert_eq!(
		render("@json(user) @json(nothing)", json!({ "user": { "id": 1, "tags": ["x"] }, "nothing": null })),
		r#"{"id":1,"tags":["x"]} null"#
	);
}

#[test]
fn test_circular_data_fails_json_and_prints_in_echo() {
	let scope = scope_with(json!({ "items": [1] }));
	let data = scope.data().clone();
	data.set("me", Value::Object(data.clone()));
	if let Value::List(items) = data.get("items") {
		items.push(Value::List(items.clone()));
	}
	let host: Rc<dyn RenderHost> = Rc::new(TestHost::default());

	let err = compile("@json(me)").unwrap().render(&scope, &host).unwrap_err();
	assert_eq!(err.to_string(), "Converting circular structure to JSON");
	assert_eq!(
		compile("[{{ items }}]").unwrap().render(&scope, &host).unwrap(),
		"[1,]"
	);
}

#[test]
fn test_stray_end_directive_renders_literally() {
	assert_eq!(render("a @endif b", json!({})), "a @endif b");
}

#[test]
fn test_component_props_and_slots() {
	let source = r#"<x-alert type="error" :count="n + 1">Hi {{ name }}<x-slot name="footer">F{{ n }}</x-slot></x-alert>"#;
	assert_eq!(
		render(source, json!({ "n": 1, "name": "Ada" })),
		r#"<alert type="error" count="2">Hi Ada|F1</alert>"#
	);
}

#[test]
fn test_legacy_component_directive() {
	let source = "@component('badge', { tone: 'green' })New@endcomponent";
	assert_eq!(render(source, json!({})), r#"<badge tone="green">New</badge>"#);
}

#[test]
fn test_layout_sections_and_stacks() {
	let mut host = TestHost::default();
	host.layouts.insert(
		"app".to_string(),
		compile("<title>@yield('title', 'Default')</title>@yield('body')@yield('aside', 'none')@stack('scripts')").unwrap(),
	);
	let source = "@extends('app')ignored@section('title', 'Home')@section('body')<p>{{ msg }}</p>@endsection@push('scripts')<script>s</script>@endpush";
	assert_eq!(
		render_with(host, source, json!({ "msg": "hi" })).unwrap(),
		"<title>Home</title><p>hi</p>none<script>s</script>"
	);
}

#[test]
fn test_missing_layout_renders_placeholder() {
	assert_eq!(render("@extends('nope')", json!({})), "[Layout nope not found]");
}

#[test]
fn test_include_and_inject() {
	let mut host = TestHost::default();
	host.services.insert(
		"formatter".to_string(),
		Value::from(json!({ "prefix": ">> " })),
	);
	let source = "@inject('fmt', 'formatter'){{ fmt.prefix }}@include('partials.nav')";
	assert_eq!(
		render_with(host, source, json!({})).unwrap(),
		">> [include partials.nav]"
	);
}

#[test]
fn test_section_without_extends_renders_inline() {
	assert_eq!(
		render("@section('a')A@endsection@section('b', 'B')", json!({})),
		"AB"
	);
}

proptest! {
	#[test]
	fn prop_plain_text_renders_unchanged(text in "[a-zA-Z0-9 .,;:!?\n()>-]*") {
		prop_assert_eq!(render(&text, json!({})), text);
	}
}
