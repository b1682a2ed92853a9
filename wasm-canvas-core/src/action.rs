//! Actions dispatched to the canvas store
use crate::state::{CanvasRect, CanvasVisibility};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoadStart,
    InitializeSuccess,
    InitializeFailed(String),
    AddConsoleText(String),
    ResizeCallback,
    SetCanvasSize(CanvasRect),
    SetCanvasVisibility(CanvasVisibility),
    /// An action meant for another consumer of a shared store
    Other(String),
}

impl Action {
    /// Stable name of the action kind, used in log output
    pub fn kind(&self) -> &str {
        match self {
            Self::LoadStart => "LoadStart",
            Self::InitializeSuccess => "InitializeSuccess",
            Self::InitializeFailed(_) => "InitializeFailed",
            Self::AddConsoleText(_) => "AddConsoleText",
            Self::ResizeCallback => "ResizeCallback",
            Self::SetCanvasSize(_) => "SetCanvasSize",
            Self::SetCanvasVisibility(_) => "SetCanvasVisibility",
            Self::Other(kind) => kind,
        }
    }
}
