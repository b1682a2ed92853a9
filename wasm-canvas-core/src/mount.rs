//! Mount lifecycle of the canvas component
use crate::action::Action;
use crate::config::CanvasConfig;
use crate::error::AlreadyMounted;
use crate::state::{CanvasRect, CanvasVisibility, LoadState};

/// Where a component is in its single mount/unmount cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountPhase {
    #[default]
    Fresh,
    Mounted,
    Unmounted,
}

impl MountPhase {
    /// Only a fresh component may mount, and only once
    pub fn begin(&mut self) -> Result<(), AlreadyMounted> {
        match self {
            Self::Fresh => {
                *self = Self::Mounted;
                Ok(())
            }
            Self::Mounted | Self::Unmounted => Err(AlreadyMounted),
        }
    }

    /// Returns false when there was nothing mounted
    pub fn end(&mut self) -> bool {
        let was_mounted = self.is_mounted();
        if was_mounted {
            *self = Self::Unmounted;
        }
        was_mounted
    }

    pub fn is_mounted(self) -> bool {
        self == Self::Mounted
    }
}

/// Actions that size the canvas to a measured container and show it
pub fn fit_to_container(width: f64, height: f64) -> [Action; 2] {
    [
        Action::SetCanvasSize(CanvasRect::new(0.0, 0.0, width, height)),
        Action::SetCanvasVisibility(CanvasVisibility::Visible),
    ]
}

/// Whether the container must be measured again for this state
pub fn needs_measurement(config: &CanvasConfig, state: &LoadState) -> bool {
    config.fit_container && state.resize
}
