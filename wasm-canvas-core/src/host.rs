//! Seams between the load sequence and the page it runs in
//!
//! The browser binding implements these traits with `web-sys`; tests use
//! in-memory doubles.
#![allow(async_fn_in_trait)]

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::GraphicsCapability;
use crate::error::LoadError;

/// Capability probes and the clock
pub trait Platform {
    fn supports_webassembly(&self) -> bool;

    /// Whether a graphics context at `capability` can be created
    fn supports_graphics(&self, capability: GraphicsCapability) -> bool;

    /// Milliseconds since the Unix epoch, used for cache busting
    fn now_millis(&self) -> u64;
}

/// HTTP GET of the two module resources
pub trait Fetch {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, LoadError>;
    async fn fetch_text(&self, url: &str) -> Result<String, LoadError>;
}

/// Settings published for the host runtime to read while it boots
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Let the runtime install keyboard handlers on the document
    pub capture_keyboard: bool,
    pub arguments: Vec<String>,
    /// Report window resizes as [`HostEvent::Resize`]
    pub track_resize: bool,
}

/// Callbacks from the host runtime, delivered in order
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent<I> {
    /// A line written to the runtime's output sink
    Print(String),
    /// A line written to the runtime's error sink
    PrintErr(String),
    /// The runtime wants the binary instantiated against its imports
    InstantiateRequested(I),
    RuntimeInitialized,
    Resize,
    /// Another session took over the runtime configuration
    Superseded,
}

/// Sending half of a session's event channel.
///
/// Once the session is gone every emit is dropped, so callbacks that fire
/// after cancellation have no effect.
pub struct HostEvents<I> {
    sender: UnboundedSender<HostEvent<I>>,
}

impl<I> HostEvents<I> {
    pub fn channel() -> (Self, UnboundedReceiver<HostEvent<I>>) {
        let (sender, receiver) = mpsc::unbounded();
        (Self { sender }, receiver)
    }

    /// Returns false when the session no longer listens
    pub fn emit(&self, event: HostEvent<I>) -> bool {
        match self.sender.unbounded_send(event) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("dropping host event for a finished load session");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<I> Clone for HostEvents<I> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// The page-side integration point of the host runtime.
///
/// Instantiation is a two-phase handshake: the runtime asks through
/// [`HostEvent::InstantiateRequested`] and the load sequence answers by
/// awaiting [`HostRuntime::instantiate`] with the opaque request.
pub trait HostRuntime {
    /// Import surface plus whatever the runtime needs to resume
    type Instantiation;

    /// Publish `config` and route runtime callbacks into `events`
    fn install(
        &self,
        config: &RuntimeConfig,
        events: HostEvents<Self::Instantiation>,
    ) -> Result<(), LoadError>;

    /// Add the companion script to the page, unchanged
    fn inject_script(&self, source: &str) -> Result<(), LoadError>;

    async fn instantiate(
        &self,
        binary: &[u8],
        request: Self::Instantiation,
    ) -> Result<(), LoadError>;

    /// Withdraw the configuration and release listeners. Must be idempotent.
    fn uninstall(&self);
}
