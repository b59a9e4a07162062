//! Render instances, registry and mount targets.
//!
//! This module provides access to zeno-view.

#[cfg(feature = "view")]
pub use zeno_view::*;
