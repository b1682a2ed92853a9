/// WasmCanvas Core Library - load lifecycle, state and presentation logic
///
/// This library holds everything about loading a compiled module into a canvas
/// that does not touch the browser: the load state and its reducer, the store,
/// component configuration, style mapping, and the asynchronous load sequence
/// written against the host traits in [`host`].

pub mod action;
pub mod config;
pub mod console;
pub mod error;
pub mod host;
pub mod loader;
pub mod mount;
pub mod reducer;
pub mod request;
pub mod state;
pub mod store;
pub mod style;

// Re-export commonly used types
pub use action::Action;
pub use config::{CanvasConfig, GraphicsCapability};
pub use error::{AlreadyMounted, ConfigError, LoadError};
pub use host::{Fetch, HostEvent, HostEvents, HostRuntime, Platform, RuntimeConfig};
pub use loader::Loader;
pub use mount::{fit_to_container, needs_measurement, MountPhase};
pub use reducer::reduce;
pub use request::{LoadRequest, ResourceUrls};
pub use state::{CanvasRect, CanvasVisibility, LoadState};
pub use store::{Dispatch, Store, SubscriptionId};
pub use style::CanvasStyle;
