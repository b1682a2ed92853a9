//! Presentation attributes for the canvas element
use crate::config::CanvasConfig;
use crate::error::ConfigError;
use crate::state::{CanvasVisibility, LoadState};

/// Characters that would end the declaration a value is written into
const DECLARATION_BREAKERS: &[char] = &[';', '{', '}'];

/// Everything needed to render the canvas for one state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasStyle {
    /// CSS width in logical pixels
    pub width: String,
    /// CSS height in logical pixels
    pub height: String,
    /// Drawing buffer width in device pixels
    pub backing_width: u32,
    /// Drawing buffer height in device pixels
    pub backing_height: u32,
    pub top: String,
    pub left: String,
    pub visibility: CanvasVisibility,
    pub padding: String,
    pub margin: String,
    pub border_radius: String,
}

impl CanvasStyle {
    pub fn compute(state: &LoadState, config: &CanvasConfig, device_pixel_ratio: f64) -> Self {
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };

        Self {
            width: px(state.canvas_width),
            height: px(state.canvas_height),
            backing_width: device_pixels(state.canvas_width, ratio),
            backing_height: device_pixels(state.canvas_height, ratio),
            top: px(state.canvas_top),
            left: px(state.canvas_left),
            visibility: state.canvas_visible,
            padding: config.padding.clone(),
            margin: config.margin.clone(),
            border_radius: config.border_radius.clone(),
        }
    }

    /// CSS property/value pairs in the order they are applied
    pub fn declarations(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("top", &self.top),
            ("left", &self.left),
            ("width", &self.width),
            ("height", &self.height),
            ("visibility", self.visibility.as_css()),
            ("padding", &self.padding),
            ("margin", &self.margin),
            ("border-radius", &self.border_radius),
        ]
    }
}

fn px(value: f64) -> String {
    format!("{value}px")
}

fn device_pixels(logical: f64, ratio: f64) -> u32 {
    (logical * ratio).round().max(0.0) as u32
}

/// Check a padding/margin/border-radius value before it is written to the
/// element style. Any CSS value is passed through as long as it stays inside
/// its own declaration.
pub fn validate_box_value(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.contains(DECLARATION_BREAKERS) {
        return Err(ConfigError::InvalidCssValue {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
