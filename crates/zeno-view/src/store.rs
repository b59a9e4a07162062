//! Global state store contract
//!
//! The view layer only needs two things from a state container: its
//! reactive state and a way to commit named mutations. [`Store`] is a small
//! in-memory implementation. When a store is installed in the registry,
//! templates see it as `$store` and get an `auth` helper reading
//! `state.user`.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use zeno_reactive::{HostObject, ReactiveObject, Value, ValueError, ValueResult};

use crate::error::{ViewError, ViewResult};

/// A state container templates can read and commit to.
pub trait StateStore {
	fn state(&self) -> ReactiveObject;

	fn commit(&self, mutation: &str, payload: Value) -> ViewResult<()>;
}

/// Mutation applied to the store state.
pub type Mutation = Rc<dyn Fn(&ReactiveObject, Value) -> ValueResult<()>>;

/// In-memory store with named mutations.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use zeno_reactive::Value;
/// use zeno_view::store::{StateStore, Store};
///
/// let store = Store::new(json!({ "count": 1 })).mutation("add", |state, amount| {
/// 	let count = state.get("count").to_number();
/// 	state.set("count", count + amount.to_number());
/// 	Ok(())
/// });
/// store.commit("add", Value::from(2)).unwrap();
/// assert_eq!(store.state().get("count").to_number(), 3.0);
/// assert!(store.commit("missing", Value::Null).is_err());
/// ```
#[derive(Clone)]
pub struct Store {
	state: ReactiveObject,
	mutations: IndexMap<String, Mutation>,
}

impl Store {
	/// Store over `state`; anything but an object starts empty.
	pub fn new(state: impl Into<Value>) -> Self {
		let state = match state.into() {
			Value::Object(object) => object,
			other => {
				if !other.is_nullish() {
					tracing::warn!(
						kind = other.type_name(),
						"Store state must be an object; starting empty"
					);
				}
				ReactiveObject::new()
			}
		};
		Self {
			state,
			mutations: IndexMap::new(),
		}
	}

	/// Register a mutation.
	pub fn mutation<F>(mut self, name: impl Into<String>, f: F) -> Self
	where
		F: Fn(&ReactiveObject, Value) -> ValueResult<()> + 'static,
	{
		self.mutations.insert(name.into(), Rc::new(f));
		self
	}
}

impl StateStore for Store {
	fn state(&self) -> ReactiveObject {
		self.state.clone()
	}

	fn commit(&self, mutation: &str, payload: Value) -> ViewResult<()> {
		let Some(apply) = self.mutations.get(mutation) else {
			tracing::warn!(mutation = mutation, "Unknown store mutation");
			return Err(ViewError::MutationNotFound(mutation.to_string()));
		};
		apply(&self.state, payload)?;
		Ok(())
	}
}

impl fmt::Debug for Store {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Store")
			.field("mutations", &self.mutations.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// `$store` as seen by templates: `state` and `commit(name, payload)`.
pub(crate) struct StoreHandle(pub(crate) Rc<dyn StateStore>);

impl HostObject for StoreHandle {
	fn type_name(&self) -> &str {
		"Store"
	}

	fn get(&self, key: &str) -> Value {
		match key {
			"state" => Value::Object(self.0.state()),
			_ => Value::Undefined,
		}
	}

	fn call_method(&self, name: &str, args: &[Value]) -> ValueResult<Value> {
		match name {
			"commit" => {
				let mutation = args.first().map(Value::to_display_string).unwrap_or_default();
				let payload = args.get(1).cloned().unwrap_or_default();
				self.0
					.commit(&mutation, payload)
					.map_err(|err| ValueError::Custom(err.to_string()))?;
				Ok(Value::Undefined)
			}
			_ => Err(ValueError::NotAFunction(format!("$store.{name}"))),
		}
	}
}

/// `auth` helper: `user()`, `check()` and `guest()` over `state.user`.
pub(crate) struct AuthHelper(pub(crate) Rc<dyn StateStore>);

impl AuthHelper {
	fn user(&self) -> Value {
		self.0.state().get("user")
	}

	/// A signed-in user is truthy and is not the guest placeholder.
	fn check(&self) -> bool {
		let user = self.user();
		if !user.is_truthy() {
			return false;
		}
		let name = match &user {
			Value::Object(object) => object.get("name"),
			_ => Value::Undefined,
		};
		name != Value::from("Guest") && name != Value::Null
	}
}

impl HostObject for AuthHelper {
	fn type_name(&self) -> &str {
		"Auth"
	}

	fn call_method(&self, name: &str, _args: &[Value]) -> ValueResult<Value> {
		match name {
			"user" => Ok(self.user()),
			"check" => Ok(Value::Bool(self.check())),
			"guest" => Ok(Value::Bool(!self.check())),
			_ => Err(ValueError::NotAFunction(format!("auth.{name}"))),
		}
	}
}
