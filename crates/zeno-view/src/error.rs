//! Error types for the view layer

use zeno_reactive::ValueError;

use crate::bindings::BindingKind;

/// Errors raised by instances, stores, targets and settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewError {
	/// `mount` could not resolve its selector
	#[error("Element {0} not found")]
	TargetNotFound(String),

	#[error("Method {0} is not defined")]
	MethodNotFound(String),

	#[error("Mutation {0} is not defined")]
	MutationNotFound(String),

	/// No handler is attached at the given position
	#[error("No {kind:?} binding at position {ordinal}")]
	BindingNotFound { kind: BindingKind, ordinal: usize },

	/// Failure raised by a method, mutation or host object
	#[error(transparent)]
	Value(#[from] ValueError),

	#[error("Invalid view settings: {0}")]
	Settings(String),
}

/// Result type for view operations
pub type ViewResult<T> = Result<T, ViewError>;
