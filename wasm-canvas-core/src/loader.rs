//! The asynchronous load sequence
//!
//! One call to [`Loader::load`] is one session: capability checks, the two
//! fetches, publishing the runtime configuration, injecting the companion
//! script, then relaying runtime callbacks into the store until the host
//! closes the session. Every failure is reported as `InitializeFailed`.
//!
//! Dropping the load future ends the session: the configuration is withdrawn
//! and callbacks that arrive afterwards are discarded.
use futures::future::try_join;
use futures::StreamExt;

use crate::action::Action;
use crate::console;
use crate::error::LoadError;
use crate::host::{Fetch, HostEvent, HostEvents, HostRuntime, Platform, RuntimeConfig};
use crate::request::LoadRequest;
use crate::store::Dispatch;

pub struct Loader<P, F, H> {
    platform: P,
    fetcher: F,
    host: H,
}

impl<P, F, H> Loader<P, F, H>
where
    P: Platform,
    F: Fetch,
    H: HostRuntime,
{
    pub fn new(platform: P, fetcher: F, host: H) -> Self {
        Self {
            platform,
            fetcher,
            host,
        }
    }

    /// Run one load session to completion
    pub async fn load<D: Dispatch + ?Sized>(
        &self,
        request: LoadRequest,
        dispatcher: &D,
    ) -> Result<(), LoadError> {
        dispatcher.dispatch(Action::LoadStart);

        let result = self.run(&request, dispatcher).await;
        if let Err(err) = &result {
            log::error!("loading {} failed: {err}", request.module_name);
            dispatcher.dispatch(Action::InitializeFailed(err.to_string()));
        }
        result
    }

    fn check_platform(&self, request: &LoadRequest) -> Result<(), LoadError> {
        if !self.platform.supports_webassembly() {
            return Err(LoadError::UnsupportedPlatform(
                "WebAssembly is not supported".to_string(),
            ));
        }
        if !self.platform.supports_graphics(request.graphics) {
            return Err(LoadError::UnsupportedPlatform(format!(
                "{} is not supported",
                request.graphics
            )));
        }
        Ok(())
    }

    async fn run<D: Dispatch + ?Sized>(
        &self,
        request: &LoadRequest,
        dispatcher: &D,
    ) -> Result<(), LoadError> {
        self.check_platform(request)?;

        let urls = request.resource_urls(self.platform.now_millis());
        log::info!("fetching {} and {}", urls.binary, urls.script);
        let (binary, script) = try_join(
            self.fetcher.fetch_bytes(&urls.binary),
            self.fetcher.fetch_text(&urls.script),
        )
        .await?;
        log::debug!(
            "fetched {} bytes of binary and {} bytes of script",
            binary.len(),
            script.len()
        );

        let config = RuntimeConfig {
            capture_keyboard: false,
            arguments: request.arguments.clone(),
            track_resize: request.track_resize,
        };
        let (events, mut receiver) = HostEvents::channel();
        let _installed = Installed::new(&self.host, &config, events)?;
        self.host.inject_script(&script)?;

        let mut initialized = false;
        while let Some(event) = receiver.next().await {
            match event {
                HostEvent::Print(line) => {
                    log::info!("[WASM] {line}");
                    if request.suppress_info_lines && console::is_informational(&line) {
                        continue;
                    }
                    dispatcher.dispatch(Action::AddConsoleText(line));
                }
                HostEvent::PrintErr(line) => {
                    log::warn!("[WASM-ERROR] {line}");
                    if request.forward_errors {
                        dispatcher.dispatch(Action::AddConsoleText(line));
                    }
                }
                HostEvent::InstantiateRequested(instantiation) => {
                    self.host.instantiate(&binary, instantiation).await?;
                    log::info!("WASM instantiated successfully");
                }
                HostEvent::RuntimeInitialized => {
                    log::info!("WASM runtime initialized");
                    initialized = true;
                    dispatcher.dispatch(Action::InitializeSuccess);
                }
                HostEvent::Resize => dispatcher.dispatch(Action::ResizeCallback),
                HostEvent::Superseded if !initialized => return Err(LoadError::Superseded),
                HostEvent::Superseded => {
                    log::warn!(
                        "runtime configuration for {} was replaced after it started",
                        request.module_name
                    );
                }
            }
        }

        if initialized {
            Ok(())
        } else {
            Err(LoadError::Host(
                "host runtime stopped before initializing".to_string(),
            ))
        }
    }
}

/// Keeps the runtime configuration published for as long as it lives
struct Installed<'a, H: HostRuntime> {
    host: &'a H,
}

impl<'a, H: HostRuntime> Installed<'a, H> {
    fn new(
        host: &'a H,
        config: &RuntimeConfig,
        events: HostEvents<H::Instantiation>,
    ) -> Result<Self, LoadError> {
        host.install(config, events)?;
        Ok(Self { host })
    }
}

impl<H: HostRuntime> Drop for Installed<'_, H> {
    fn drop(&mut self) {
        self.host.uninstall();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphicsCapability;
    use crate::state::LoadState;
    use crate::store::Store;
    use futures::executor::LocalPool;
    use futures::future::abortable;
    use futures::task::LocalSpawnExt;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct MockPlatform {
        webassembly: bool,
        graphics: GraphicsCapability,
    }

    impl MockPlatform {
        fn capable() -> Self {
            Self {
                webassembly: true,
                graphics: GraphicsCapability::Elevated,
            }
        }
    }

    impl Platform for MockPlatform {
        fn supports_webassembly(&self) -> bool {
            self.webassembly
        }

        fn supports_graphics(&self, capability: GraphicsCapability) -> bool {
            match self.graphics {
                GraphicsCapability::Elevated => true,
                GraphicsCapability::Base => capability == GraphicsCapability::Base,
            }
        }

        fn now_millis(&self) -> u64 {
            1_000
        }
    }

    #[derive(Default)]
    struct MockFetcher {
        binary: Option<Vec<u8>>,
        script: Option<String>,
        requested: RefCell<Vec<String>>,
    }

    impl MockFetcher {
        fn serving(binary: &[u8], script: &str) -> Self {
            Self {
                binary: Some(binary.to_vec()),
                script: Some(script.to_string()),
                requested: RefCell::default(),
            }
        }
    }

    impl Fetch for MockFetcher {
        async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, LoadError> {
            self.requested.borrow_mut().push(url.to_string());
            self.binary
                .clone()
                .ok_or_else(|| LoadError::fetch(url, "404 Not Found"))
        }

        async fn fetch_text(&self, url: &str) -> Result<String, LoadError> {
            self.requested.borrow_mut().push(url.to_string());
            self.script
                .clone()
                .ok_or_else(|| LoadError::fetch(url, "404 Not Found"))
        }
    }

    /// Token standing in for the runtime's import surface
    type Token = u32;

    #[derive(Default)]
    struct MockHostState {
        config: RefCell<Option<RuntimeConfig>>,
        sink: RefCell<Option<HostEvents<Token>>>,
        scripts: RefCell<Vec<String>>,
        instantiated: RefCell<Vec<(Vec<u8>, Token)>>,
        uninstalls: Cell<u32>,
        // Behaviour of the simulated runtime once its script runs
        boot_events: Vec<HostEvent<Token>>,
        stay_open: bool,
        fail_instantiation: bool,
    }

    #[derive(Clone, Default)]
    struct MockHost(Rc<MockHostState>);

    impl MockHost {
        fn booting(events: Vec<HostEvent<Token>>) -> Self {
            Self(Rc::new(MockHostState {
                boot_events: events,
                ..MockHostState::default()
            }))
        }

        fn standard_boot() -> Vec<HostEvent<Token>> {
            vec![
                HostEvent::InstantiateRequested(7),
                HostEvent::RuntimeInitialized,
            ]
        }
    }

    impl HostRuntime for MockHost {
        type Instantiation = Token;

        fn install(
            &self,
            config: &RuntimeConfig,
            events: HostEvents<Token>,
        ) -> Result<(), LoadError> {
            *self.0.config.borrow_mut() = Some(config.clone());
            *self.0.sink.borrow_mut() = Some(events);
            Ok(())
        }

        fn inject_script(&self, source: &str) -> Result<(), LoadError> {
            self.0.scripts.borrow_mut().push(source.to_string());
            if let Some(sink) = self.0.sink.borrow().as_ref() {
                for event in &self.0.boot_events {
                    sink.emit(event.clone());
                }
            }
            if !self.0.stay_open {
                self.0.sink.borrow_mut().take();
            }
            Ok(())
        }

        async fn instantiate(&self, binary: &[u8], request: Token) -> Result<(), LoadError> {
            if self.0.fail_instantiation {
                return Err(LoadError::Instantiation("invalid magic number".to_string()));
            }
            self.0
                .instantiated
                .borrow_mut()
                .push((binary.to_vec(), request));
            Ok(())
        }

        fn uninstall(&self) {
            self.0.sink.borrow_mut().take();
            self.0.uninstalls.set(self.0.uninstalls.get() + 1);
        }
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Action>>);

    impl Dispatch for Recorder {
        fn dispatch(&self, action: Action) {
            self.0.borrow_mut().push(action);
        }
    }

    fn request() -> LoadRequest {
        let mut request = LoadRequest::new("/static", "game");
        request.arguments = vec!["--level".into(), "3".into()];
        request
    }

    fn load_into_store(
        platform: MockPlatform,
        fetcher: MockFetcher,
        host: MockHost,
        request: LoadRequest,
    ) -> (Result<(), LoadError>, Rc<LoadState>) {
        let store = Store::new();
        let loader = Loader::new(platform, fetcher, host);
        let result = pollster::block_on(loader.load(request, &store));
        (result, store.state())
    }

    #[test]
    fn test_no_webassembly_installs_nothing() {
        let host = MockHost::booting(MockHost::standard_boot());
        let platform = MockPlatform {
            webassembly: false,
            graphics: GraphicsCapability::Elevated,
        };
        let loader = Loader::new(platform, MockFetcher::serving(&[0, 1], "x"), host.clone());
        let recorder = Recorder::default();

        let result = pollster::block_on(loader.load(request(), &recorder));

        assert!(matches!(result, Err(LoadError::UnsupportedPlatform(_))));
        assert!(host.0.config.borrow().is_none());
        assert!(host.0.scripts.borrow().is_empty());
        assert!(loader.fetcher.requested.borrow().is_empty());
        assert_eq!(host.0.uninstalls.get(), 0);

        let actions = recorder.0.borrow();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], Action::LoadStart);
        assert!(matches!(&actions[1], Action::InitializeFailed(msg) if msg.contains("WebAssembly")));
    }

    #[test]
    fn test_graphics_level_too_low() {
        let mut request = request();
        request.graphics = GraphicsCapability::Elevated;
        let platform = MockPlatform {
            webassembly: true,
            graphics: GraphicsCapability::Base,
        };
        let (result, state) = load_into_store(
            platform,
            MockFetcher::serving(&[0], "x"),
            MockHost::booting(MockHost::standard_boot()),
            request,
        );

        assert_eq!(
            result,
            Err(LoadError::UnsupportedPlatform("webgl2 is not supported".into()))
        );
        assert!(state.error.as_deref().unwrap_or_default().contains("webgl2"));
        assert!(!state.loading);
    }

    #[test]
    fn test_base_level_is_default() {
        let platform = MockPlatform {
            webassembly: true,
            graphics: GraphicsCapability::Base,
        };
        let (result, state) = load_into_store(
            platform,
            MockFetcher::serving(&[0], "x"),
            MockHost::booting(MockHost::standard_boot()),
            request(),
        );
        assert_eq!(result, Ok(()));
        assert!(state.initialized);
    }

    #[test]
    fn test_successful_load_injects_script_verbatim() {
        let host = MockHost::booting(vec![
            HostEvent::InstantiateRequested(7),
            HostEvent::RuntimeInitialized,
            HostEvent::Print("hello".into()),
            HostEvent::Resize,
        ]);
        let fetcher = MockFetcher::serving(&[0, 1, 2, 3], "console.log(1)");
        let store = Store::new();
        let loader = Loader::new(MockPlatform::capable(), fetcher, host.clone());

        let result = pollster::block_on(loader.load(request(), &store));

        assert_eq!(result, Ok(()));
        assert_eq!(*host.0.scripts.borrow(), vec!["console.log(1)".to_string()]);
        assert_eq!(*host.0.instantiated.borrow(), vec![(vec![0, 1, 2, 3], 7)]);
        assert_eq!(
            *loader.fetcher.requested.borrow(),
            vec!["/static/game.wasm".to_string(), "/static/game.js".to_string()]
        );

        let config = host.0.config.borrow().clone().unwrap();
        assert!(!config.capture_keyboard);
        assert_eq!(config.arguments, vec!["--level".to_string(), "3".to_string()]);
        assert_eq!(host.0.uninstalls.get(), 1);

        let state = store.state();
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert!(state.initialized && state.running);
        assert_eq!(state.console_output, vec!["hello".to_string()]);
        assert!(state.resize);
    }

    #[test]
    fn test_cache_bust_urls() {
        let mut request = request();
        request.cache_bust = true;
        let store = Store::new();
        let loader = Loader::new(
            MockPlatform::capable(),
            MockFetcher::serving(&[0], "x"),
            MockHost::booting(MockHost::standard_boot()),
        );
        pollster::block_on(loader.load(request, &store)).unwrap();
        assert_eq!(
            *loader.fetcher.requested.borrow(),
            vec![
                "/static/game.wasm?t=1000".to_string(),
                "/static/game.js?t=1000".to_string()
            ]
        );
    }

    #[test]
    fn test_fetch_failure_is_reported() {
        let fetcher = MockFetcher {
            binary: Some(vec![0]),
            script: None,
            requested: RefCell::default(),
        };
        let host = MockHost::booting(MockHost::standard_boot());
        let (result, state) =
            load_into_store(MockPlatform::capable(), fetcher, host.clone(), request());

        assert_eq!(
            result,
            Err(LoadError::fetch("/static/game.js", "404 Not Found"))
        );
        assert!(host.0.config.borrow().is_none());
        assert!(host.0.scripts.borrow().is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some("failed to fetch /static/game.js: 404 Not Found")
        );
        assert!(!state.loading);
    }

    #[test]
    fn test_instantiation_failure() {
        let host = MockHost(Rc::new(MockHostState {
            boot_events: MockHost::standard_boot(),
            fail_instantiation: true,
            ..MockHostState::default()
        }));
        let (result, state) = load_into_store(
            MockPlatform::capable(),
            MockFetcher::serving(&[9, 9], "glue"),
            host.clone(),
            request(),
        );

        assert!(matches!(result, Err(LoadError::Instantiation(_))));
        assert!(!state.initialized);
        assert!(!state.running);
        assert!(state.error.is_some());
        assert_eq!(host.0.uninstalls.get(), 1);
    }

    #[test]
    fn test_runtime_closing_before_init_is_an_error() {
        let host = MockHost::booting(vec![HostEvent::Print("booting".into())]);
        let (result, state) = load_into_store(
            MockPlatform::capable(),
            MockFetcher::serving(&[0], "x"),
            host,
            request(),
        );
        assert!(matches!(result, Err(LoadError::Host(_))));
        assert_eq!(state.console_output, vec!["booting".to_string()]);
        assert!(state.error.is_some());
    }

    #[test]
    fn test_info_lines_suppressed() {
        let mut request = request();
        request.suppress_info_lines = true;
        let host = MockHost::booting(vec![
            HostEvent::Print("[INFO] loading assets".into()),
            HostEvent::Print("frame 1".into()),
            HostEvent::RuntimeInitialized,
        ]);
        let (_, state) = load_into_store(
            MockPlatform::capable(),
            MockFetcher::serving(&[0], "x"),
            host,
            request,
        );
        assert_eq!(state.console_output, vec!["frame 1".to_string()]);
    }

    #[test]
    fn test_error_lines_forwarding() {
        let boot = vec![
            HostEvent::PrintErr("missing texture".into()),
            HostEvent::RuntimeInitialized,
        ];

        let (_, state) = load_into_store(
            MockPlatform::capable(),
            MockFetcher::serving(&[0], "x"),
            MockHost::booting(boot.clone()),
            request(),
        );
        assert!(state.console_output.is_empty());

        let mut forwarding = request();
        forwarding.forward_errors = true;
        let (_, state) = load_into_store(
            MockPlatform::capable(),
            MockFetcher::serving(&[0], "x"),
            MockHost::booting(boot),
            forwarding,
        );
        assert_eq!(state.console_output, vec!["missing texture".to_string()]);
    }

    #[test]
    fn test_superseded_before_and_after_init() {
        let (result, state) = load_into_store(
            MockPlatform::capable(),
            MockFetcher::serving(&[0], "x"),
            MockHost::booting(vec![HostEvent::Superseded, HostEvent::RuntimeInitialized]),
            request(),
        );
        assert_eq!(result, Err(LoadError::Superseded));
        assert!(!state.initialized);

        let (result, state) = load_into_store(
            MockPlatform::capable(),
            MockFetcher::serving(&[0], "x"),
            MockHost::booting(vec![HostEvent::RuntimeInitialized, HostEvent::Superseded]),
            request(),
        );
        assert_eq!(result, Ok(()));
        assert!(state.running);
    }

    #[test]
    fn test_cancelled_session_ignores_late_callbacks() {
        let host = MockHost(Rc::new(MockHostState {
            boot_events: MockHost::standard_boot(),
            stay_open: true,
            ..MockHostState::default()
        }));
        let store = Rc::new(Store::new());
        let loader = Loader::new(
            MockPlatform::capable(),
            MockFetcher::serving(&[0, 1, 2, 3], "glue"),
            host.clone(),
        );

        let session_store = Rc::clone(&store);
        let (session, abort) = abortable(async move {
            loader.load(request(), &session_store).await
        });

        let mut pool = LocalPool::new();
        pool.spawner()
            .spawn_local(async move {
                let _ = session.await;
            })
            .unwrap();
        pool.run_until_stalled();

        assert!(store.state().running);
        assert_eq!(host.0.uninstalls.get(), 0);
        let late = host.0.sink.borrow().clone().unwrap();

        // Unmount
        abort.abort();
        pool.run_until_stalled();
        assert_eq!(host.0.uninstalls.get(), 1);

        assert!(!late.emit(HostEvent::Print("too late".into())));
        pool.run_until_stalled();
        assert!(store.state().console_output.is_empty());
    }
}
