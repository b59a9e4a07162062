//! Template compiler and routine interpreter.
//!
//! This module provides access to zeno-template: the lexer, the tree
//! parser, the code generator and the [`Routine`](zeno_template::Routine)
//! that renders against a [`Scope`](zeno_template::Scope).

#[cfg(feature = "template")]
pub use zeno_template::*;
