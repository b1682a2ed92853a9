//! Component configuration supplied by the embedding page
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::request::LoadRequest;
use crate::state::{CanvasRect, CanvasVisibility, LoadState};
use crate::style::validate_box_value;

const DEFAULT_BOX_VALUE: &str = "0px";

/// Minimum graphics context the canvas must support before loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum GraphicsCapability {
    /// `webgl`
    #[default]
    Base,
    /// `webgl2`
    Elevated,
}

impl GraphicsCapability {
    /// Context id passed to `HTMLCanvasElement.getContext`
    pub fn context_id(self) -> &'static str {
        match self {
            Self::Base => "webgl",
            Self::Elevated => "webgl2",
        }
    }
}

impl FromStr for GraphicsCapability {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "webgl" | "1" => Ok(Self::Base),
            "webgl2" | "2" => Ok(Self::Elevated),
            _ => Err(ConfigError::UnknownCapability(s.to_string())),
        }
    }
}

impl TryFrom<String> for GraphicsCapability {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for GraphicsCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.context_id())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Prefix for both resource URLs; empty means relative to the page
    pub base_path: String,
    /// File stem shared by the binary and the companion script
    pub module_name: String,
    /// Startup arguments handed to the module
    pub arguments: Vec<String>,
    #[serde(deserialize_with = "box_value_or_default")]
    pub padding: String,
    #[serde(deserialize_with = "box_value_or_default")]
    pub margin: String,
    #[serde(deserialize_with = "box_value_or_default")]
    pub border_radius: String,
    #[serde(deserialize_with = "graphics_or_default")]
    pub graphics: GraphicsCapability,
    /// Append a timestamp query parameter to defeat stale caches
    pub cache_bust: bool,
    /// Drop output lines tagged as informational before they reach the store
    pub suppress_info_lines: bool,
    /// Also store lines written to the runtime's error sink
    pub forward_errors: bool,
    pub binary_extension: String,
    pub script_extension: String,
    /// Listen for window resizes and request a geometry update
    pub track_resize: bool,
    /// Size the canvas to its parent element
    pub fit_container: bool,
    pub initial_rect: CanvasRect,
    pub initial_visibility: CanvasVisibility,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            module_name: String::new(),
            arguments: Vec::new(),
            padding: DEFAULT_BOX_VALUE.to_string(),
            margin: DEFAULT_BOX_VALUE.to_string(),
            border_radius: DEFAULT_BOX_VALUE.to_string(),
            graphics: GraphicsCapability::Base,
            cache_bust: false,
            suppress_info_lines: false,
            forward_errors: false,
            binary_extension: "wasm".to_string(),
            script_extension: "js".to_string(),
            track_resize: true,
            fit_container: false,
            initial_rect: CanvasRect::default(),
            initial_visibility: CanvasVisibility::default(),
        }
    }
}

/// `null` and blank strings mean "no value"
fn box_value_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Ok(DEFAULT_BOX_VALUE.to_string()),
    }
}

fn graphics_or_default<'de, D>(deserializer: D) -> Result<GraphicsCapability, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<GraphicsCapability>::deserialize(deserializer)?.unwrap_or_default())
}

impl CanvasConfig {
    /// Parse and validate a JSON configuration object
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_box_value("padding", &self.padding)?;
        validate_box_value("margin", &self.margin)?;
        validate_box_value("borderRadius", &self.border_radius)?;
        Ok(())
    }

    /// Request for one load of the configured module
    pub fn load_request(&self) -> LoadRequest {
        LoadRequest {
            base_path: self.base_path.clone(),
            module_name: self.module_name.clone(),
            arguments: self.arguments.clone(),
            graphics: self.graphics,
            binary_extension: self.binary_extension.clone(),
            script_extension: self.script_extension.clone(),
            cache_bust: self.cache_bust,
            suppress_info_lines: self.suppress_info_lines,
            forward_errors: self.forward_errors,
            track_resize: self.track_resize,
        }
    }

    /// State a fresh store starts from
    pub fn initial_state(&self) -> LoadState {
        LoadState::with_canvas(self.initial_rect, self.initial_visibility)
    }
}
