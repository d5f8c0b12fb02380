//! Application configuration, read from the host page.
//!
//! The page embeds `<script id="app-config" type="application/json">`. Every
//! field is optional; a missing or malformed block means defaults.

use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

use crate::canvas::{BuilderConfig, ViewerConfig};
use crate::error::ConfigError;
use crate::graph::LayoutConfig;

/// Id of the script element holding the configuration JSON.
pub const CONFIG_ELEMENT_ID: &str = "app-config";

fn default_api_base() -> String {
	"http://localhost:8080/api".to_string()
}

/// Everything the app reads from the page at startup.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// Base URL of the record store, without trailing slash.
	pub api_base: String,
	/// Project shown on startup, if any.
	pub subject: Option<String>,
	/// Viewer node sizes and spacing.
	pub layout: LayoutConfig,
	/// Zoom limits and click slop, shared by both canvases.
	pub viewer: ViewerConfig,
	/// Builder card and connector sizes.
	pub builder: BuilderConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			api_base: default_api_base(),
			subject: None,
			layout: LayoutConfig::default(),
			viewer: ViewerConfig::default(),
			builder: BuilderConfig::default(),
		}
	}
}

/// Parses the configuration JSON. Blank input is the default configuration.
pub fn parse_config(json: &str) -> Result<AppConfig, ConfigError> {
	if json.trim().is_empty() {
		return Ok(AppConfig::default());
	}
	let mut config: AppConfig = serde_json::from_str(json).map_err(ConfigError)?;
	config.api_base = config.api_base.trim_end_matches('/').to_string();
	if config.api_base.is_empty() {
		config.api_base = default_api_base();
	}
	config.subject = config.subject.filter(|s| !s.trim().is_empty());
	Ok(config)
}

fn config_text() -> Option<String> {
	let document = web_sys::window()?.document()?;
	let element = document.get_element_by_id(CONFIG_ELEMENT_ID)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Loads configuration from the DOM, falling back to defaults.
pub fn load_config() -> AppConfig {
	let Some(text) = config_text() else {
		info!("arch-graph: no #{CONFIG_ELEMENT_ID} element, using defaults");
		return AppConfig::default();
	};
	match parse_config(&text) {
		Ok(config) => {
			info!("arch-graph: store at {}", config.api_base);
			config
		}
		Err(e) => {
			warn!("arch-graph: {e}; using defaults");
			AppConfig::default()
		}
	}
}
