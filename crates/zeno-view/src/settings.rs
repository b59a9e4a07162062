//! View layer settings
//!
//! Settings are read from TOML and installed per thread:
//!
//! ```toml
//! [reactive]
//! max_effect_depth = 16
//!
//! [diagnostics]
//! expose_messages = false
//! render_error_style = "color:orange"
//! ```

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::error::{ViewError, ViewResult};

/// Settings for the view layer
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ViewSettings {
	/// Reactivity configuration
	#[serde(default)]
	pub reactive: ReactiveSettings,

	/// How render failures are shown
	#[serde(default)]
	pub diagnostics: DiagnosticSettings,
}

/// Reactivity settings
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactiveSettings {
	/// Nesting limit for an effect re-triggered while it runs
	#[serde(default = "default_max_effect_depth")]
	pub max_effect_depth: usize,
}

impl Default for ReactiveSettings {
	fn default() -> Self {
		Self {
			max_effect_depth: default_max_effect_depth(),
		}
	}
}

/// Diagnostic fragment settings
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSettings {
	/// Include error messages in rendered fragments
	#[serde(default = "default_expose_messages")]
	pub expose_messages: bool,

	/// Inline style of the render error box
	#[serde(default = "default_render_error_style")]
	pub render_error_style: String,
}

impl Default for DiagnosticSettings {
	fn default() -> Self {
		Self {
			expose_messages: default_expose_messages(),
			render_error_style: default_render_error_style(),
		}
	}
}

fn default_max_effect_depth() -> usize {
	zeno_reactive::DEFAULT_MAX_EFFECT_DEPTH
}

fn default_expose_messages() -> bool {
	true
}

fn default_render_error_style() -> String {
	"color:red".to_string()
}

thread_local! {
	static SETTINGS: RefCell<ViewSettings> = RefCell::new(ViewSettings::default());
}

impl ViewSettings {
	/// Parse settings from TOML; missing keys take their defaults.
	///
	/// # Examples
	///
	/// ```
	/// use zeno_view::settings::ViewSettings;
	///
	/// let settings = ViewSettings::from_toml_str("[reactive]\nmax_effect_depth = 8").unwrap();
	/// assert_eq!(settings.reactive.max_effect_depth, 8);
	/// assert!(settings.diagnostics.expose_messages);
	/// ```
	pub fn from_toml_str(source: &str) -> ViewResult<Self> {
		let settings: ViewSettings = toml::from_str(source)
			.map_err(|e| ViewError::Settings(format!("TOML parse error: {}", e)))?;
		settings.validate()?;
		Ok(settings)
	}

	fn validate(&self) -> ViewResult<()> {
		if self.reactive.max_effect_depth == 0 {
			return Err(ViewError::Settings(
				"reactive.max_effect_depth must be at least 1".to_string(),
			));
		}
		Ok(())
	}

	/// Make these the current thread's settings and apply the effect depth
	/// limit to the reactive runtime.
	pub fn install(self) {
		zeno_reactive::set_max_effect_depth(self.reactive.max_effect_depth);
		tracing::debug!(
			max_effect_depth = self.reactive.max_effect_depth,
			expose_messages = self.diagnostics.expose_messages,
			"View settings installed"
		);
		SETTINGS.with(|settings| *settings.borrow_mut() = self);
	}
}

/// Settings installed on this thread, or the defaults.
pub fn current() -> ViewSettings {
	SETTINGS.with(|settings| settings.borrow().clone())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	fn test_defaults_from_empty_document() {
		let settings = ViewSettings::from_toml_str("").unwrap();
		assert_eq!(settings, ViewSettings::default());
		assert_eq!(settings.reactive.max_effect_depth, 32);
		assert_eq!(settings.diagnostics.render_error_style, "color:red");
	}

	#[rstest]
	#[case("[reactive]\nmax_effect_depth = 0")]
	#[case("[reactive]\nmax_effect_depth = \"deep\"")]
	fn test_invalid_settings(#[case] source: &str) {
		assert!(matches!(
			ViewSettings::from_toml_str(source),
			Err(ViewError::Settings(_))
		));
	}

	#[rstest]
	#[serial]
	fn test_install_updates_runtime() {
		let settings = ViewSettings::from_toml_str(
			"[reactive]\nmax_effect_depth = 5\n[diagnostics]\nexpose_messages = false",
		)
		.unwrap();
		settings.install();
		assert_eq!(zeno_reactive::with_runtime(|rt| rt.max_effect_depth()), 5);
		assert!(!current().diagnostics.expose_messages);

		ViewSettings::default().install();
		assert_eq!(zeno_reactive::with_runtime(|rt| rt.max_effect_depth()), 32);
	}
}
