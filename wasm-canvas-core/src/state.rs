//! Load state kept in the canvas store
use serde::Deserialize;

/// Visibility of the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasVisibility {
    Visible,
    #[default]
    Hidden,
}

impl CanvasVisibility {
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            Self::Visible
        } else {
            Self::Hidden
        }
    }

    pub fn is_visible(self) -> bool {
        self == Self::Visible
    }

    /// Value for the CSS `visibility` property
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        }
    }
}

/// Canvas geometry in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CanvasRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// State of one load session and the canvas it renders into.
///
/// Only the reducer changes it. `console_output` only grows while a session is
/// alive; `console_output_dirty` flips on every appended line so observers that
/// compare by flag see each distinct update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadState {
    pub error: Option<String>,
    pub loading: bool,
    pub initialized: bool,
    pub running: bool,
    pub console_output: Vec<String>,
    pub console_output_dirty: bool,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub canvas_top: f64,
    pub canvas_left: f64,
    pub canvas_visible: CanvasVisibility,
    /// Geometry needs to be measured again
    pub resize: bool,
}

impl LoadState {
    /// Default state seeded with an initial canvas geometry
    pub fn with_canvas(rect: CanvasRect, visibility: CanvasVisibility) -> Self {
        let mut state = Self::default();
        state.set_canvas_rect(rect);
        state.canvas_visible = visibility;
        state
    }

    pub fn canvas_rect(&self) -> CanvasRect {
        CanvasRect::new(
            self.canvas_top,
            self.canvas_left,
            self.canvas_width,
            self.canvas_height,
        )
    }

    pub(crate) fn set_canvas_rect(&mut self, rect: CanvasRect) {
        self.canvas_top = rect.top;
        self.canvas_left = rect.left;
        self.canvas_width = rect.width;
        self.canvas_height = rect.height;
    }
}
