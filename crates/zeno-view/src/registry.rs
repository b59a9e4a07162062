//! Thread-local registry
//!
//! Components, layouts, include views, services and the optional store are
//! registered by name before anything renders. Lookups clone the entry, so
//! a render never holds the registry borrowed.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use zeno_reactive::Value;

use crate::definition::ComponentDefinition;
use crate::store::StateStore;

#[derive(Default)]
struct Registry {
	components: IndexMap<String, ComponentDefinition>,
	layouts: IndexMap<String, ComponentDefinition>,
	views: IndexMap<String, ComponentDefinition>,
	services: IndexMap<String, Value>,
	store: Option<Rc<dyn StateStore>>,
}

thread_local! {
	static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

fn with_registry<F, R>(f: F) -> R
where
	F: FnOnce(&mut Registry) -> R,
{
	REGISTRY.with(|registry| f(&mut registry.borrow_mut()))
}

/// Register a component used as `<x-name>` or `@component('name')`.
pub fn register_component(name: impl Into<String>, definition: ComponentDefinition) {
	let name = name.into();
	tracing::debug!(component = %name, "Registering component");
	with_registry(|registry| registry.components.insert(name, definition));
}

/// Register a layout used by `@extends('name')`.
pub fn register_layout(name: impl Into<String>, definition: ComponentDefinition) {
	with_registry(|registry| registry.layouts.insert(name.into(), definition));
}

/// Register a view used by `@include('name')`.
pub fn register_view(name: impl Into<String>, definition: ComponentDefinition) {
	with_registry(|registry| registry.views.insert(name.into(), definition));
}

/// Register a service for `@inject` and `$services`.
pub fn register_service(name: impl Into<String>, service: impl Into<Value>) {
	let service = service.into();
	with_registry(|registry| registry.services.insert(name.into(), service));
}

/// Install the global store behind `$store` and `auth`.
pub fn install_store(store: impl StateStore + 'static) {
	with_registry(|registry| registry.store = Some(Rc::new(store)));
}

/// Remove every registration.
pub fn reset() {
	// Dropping entries may drop reactive containers; do it outside the borrow
	let previous = with_registry(std::mem::take);
	drop(previous);
}

pub(crate) fn component(name: &str) -> Option<ComponentDefinition> {
	with_registry(|registry| registry.components.get(name).cloned())
}

pub(crate) fn layout(name: &str) -> Option<ComponentDefinition> {
	with_registry(|registry| registry.layouts.get(name).cloned())
}

pub(crate) fn view(name: &str) -> Option<ComponentDefinition> {
	with_registry(|registry| registry.views.get(name).cloned())
}

pub(crate) fn service(name: &str) -> Option<Value> {
	with_registry(|registry| registry.services.get(name).cloned())
}

pub(crate) fn services() -> Vec<(String, Value)> {
	with_registry(|registry| {
		registry
			.services
			.iter()
			.map(|(name, service)| (name.clone(), service.clone()))
			.collect()
	})
}

pub(crate) fn store() -> Option<Rc<dyn StateStore>> {
	with_registry(|registry| registry.store.clone())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::Store;
	use serde_json::json;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_register_and_reset() {
		reset();
		register_component("alert", ComponentDefinition::new("alert"));
		register_layout("app", ComponentDefinition::new("app"));
		register_view("nav", ComponentDefinition::new("nav"));
		register_service("clock", "12:00");
		install_store(Store::new(json!({})));

		assert_eq!(component("alert").map(|d| d.name().to_string()), Some("alert".to_string()));
		assert!(component("app").is_none());
		assert!(layout("app").is_some());
		assert!(view("nav").is_some());
		assert_eq!(service("clock"), Some(Value::from("12:00")));
		assert_eq!(services().len(), 1);
		assert!(store().is_some());

		reset();
		assert!(component("alert").is_none());
		assert!(store().is_none());
	}
}
