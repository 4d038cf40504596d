use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use studio_bridge_protocol::{DecodeError, GuestMessage, HostMessage};
use tokio::{runtime::Handle, sync::oneshot};

use crate::{
    BridgeConfig, BridgeError, Correlator, GenerateContentOptions, InitOptions, Pending, Result,
    ScreenshotProvider, Transport, functions::FunctionRegistry,
};

/// One guest session with the host.
///
/// Cloning is cheap and every clone drives the same session: the guest API
/// and the inbound message pump usually hold one each.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

struct Inner {
    config: BridgeConfig,
    transport: Box<dyn Transport>,
    session: Mutex<Session>,
}

struct Session {
    origin: Option<String>,
    initialized: bool,
    pending_init: Option<GuestMessage>,
    init_resolver: Option<oneshot::Sender<Result<()>>>,
    functions: FunctionRegistry,
    screenshot_provider: Option<Arc<dyn ScreenshotProvider>>,
    model_requests: Correlator<String>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.inner.session.lock();
        f.debug_struct("Bridge")
            .field("origin", &session.origin)
            .field("initialized", &session.initialized)
            .field("functions", &session.functions)
            .field("model_requests", &session.model_requests)
            .finish()
    }
}

impl Session {
    /// Posts `message` to the locked origin. Sending under the session lock
    /// keeps outbound order identical to call order.
    fn send(&self, transport: &dyn Transport, message: &GuestMessage) -> Result<()> {
        let origin = self.origin.as_deref().ok_or(BridgeError::NotReady)?;
        tracing::debug!("Posting {} to {}", message.kind(), origin);
        transport.post(origin, message).map_err(|e| {
            tracing::error!("Failed to post {} to {}: {}", message.kind(), origin, e);
            BridgeError::from(e)
        })
    }
}

impl Bridge {
    pub fn new(config: BridgeConfig, transport: impl Transport + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport: Box::new(transport),
                session: Mutex::new(Session {
                    origin: None,
                    initialized: false,
                    pending_init: None,
                    init_resolver: None,
                    functions: FunctionRegistry::default(),
                    screenshot_provider: None,
                    model_requests: Correlator::new(1),
                }),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// The host origin locked in by the handshake, if it has happened.
    pub fn origin(&self) -> Option<String> {
        self.inner.session.lock().origin.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.session.lock().origin.is_some()
    }

    /// Announces the guest to the host and registers its callbacks.
    ///
    /// Before the handshake the announcement is held back and the returned
    /// [`Pending`] completes once the handshake has flushed it. After the
    /// handshake it is sent right away and the `Pending` is already complete.
    pub fn init(&self, options: InitOptions) -> Result<Pending<()>> {
        let InitOptions {
            model,
            screenshot_provider,
            function_declarations,
            system_instructions,
        } = options;

        let (functions, descriptors) = FunctionRegistry::from_declarations(function_declarations)?;
        let message = GuestMessage::Init {
            model: model.unwrap_or_else(|| self.inner.config.default_model.clone()),
            supports_screenshot: screenshot_provider.is_some(),
            function_declarations: descriptors,
            system_instructions,
        };

        let mut session = self.inner.session.lock();
        if session.initialized {
            return Err(BridgeError::AlreadyInitialized);
        }
        // Registered only once the host has the announcement, so a failed
        // send can be retried.
        let ready = session.origin.is_some();
        if ready {
            session.send(self.inner.transport.as_ref(), &message)?;
        }
        session.initialized = true;
        session.functions = functions;
        session.screenshot_provider = screenshot_provider;

        if ready {
            return Ok(Pending::ready(()));
        }

        tracing::debug!("Holding init until the host handshake arrives");
        let (resolver, pending) = Pending::channel();
        session.pending_init = Some(message);
        session.init_resolver = Some(resolver);
        Ok(pending)
    }

    /// Shows `text` in the host's chat view. The model does not see it.
    pub fn chat(&self, text: impl Into<String>) -> Result<()> {
        self.send(GuestMessage::Chat { text: text.into() })
    }

    pub fn clear_chat(&self) -> Result<()> {
        self.send(GuestMessage::ClearChat)
    }

    pub fn set_system_instructions(&self, instructions: impl Into<String>) -> Result<()> {
        self.send(GuestMessage::SetSystemInstructions {
            system_instructions: instructions.into(),
        })
    }

    /// Asks the host to call the model.
    ///
    /// Only one call may be outstanding; a second one fails with
    /// [`BridgeError::CallInProgress`] and leaves the first alone. The
    /// returned [`Pending`] yields the model's text, or
    /// [`BridgeError::Timeout`] once the configured timeout elapses.
    pub fn generate_content(&self, options: GenerateContentOptions) -> Result<Pending<String>> {
        let (request_id, pending) = {
            let mut session = self.inner.session.lock();

            if session.origin.is_none() {
                return Err(BridgeError::NotReady);
            }
            if let Some(enabled) = &options.enabled_functions
                && let Some(unknown) = enabled.iter().find(|n| !session.functions.contains(n))
            {
                return Err(BridgeError::validation(format!(
                    "enabledFunctions names `{unknown}`, which was not declared at init"
                )));
            }

            let (request_id, pending) = session.model_requests.begin()?;
            let message = options.into_message(request_id.clone());

            if let Err(e) = session.send(self.inner.transport.as_ref(), &message) {
                session.model_requests.cancel(&request_id);
                return Err(e);
            }

            tracing::debug!("Model request {} sent", request_id);
            (request_id, pending)
        };

        self.arm_timeout(request_id);
        Ok(pending)
    }

    /// [`generate_content`](Self::generate_content) for options arriving as
    /// untyped JSON.
    pub fn generate_content_json(&self, options: Value) -> Result<Pending<String>> {
        self.generate_content(GenerateContentOptions::from_json(options)?)
    }

    /// Entry point for every message the host delivers. Messages that cannot
    /// be decoded are logged and dropped.
    pub fn handle_inbound(&self, origin: &str, data: Value) {
        match HostMessage::from_value(data) {
            Ok(message) => self.handle_message(origin, message),
            Err(DecodeError::UnknownKind(kind)) => {
                tracing::warn!("Ignoring unknown message kind {} from {}", kind, origin);
            }
            Err(e) => {
                tracing::warn!("Ignoring undecodable message from {}: {}", origin, e);
            }
        }
    }

    pub fn handle_message(&self, origin: &str, message: HostMessage) {
        tracing::debug!("Received {} from {}", message.kind(), origin);

        if message.is_handshake() {
            self.handshake(origin);
            return;
        }
        if !self.accepts(origin) {
            return;
        }

        match message {
            HostMessage::Init => {}
            HostMessage::Screenshot => self.spawn_screenshot(),
            HostMessage::FunctionCall { name, args } => self.call_function(&name, args),
            HostMessage::ModelResponse { request_id, text } => {
                self.resolve_model_request(&request_id, text)
            }
        }
    }

    /// Captures a screenshot with the provider registered at init and sends
    /// it to the host.
    pub async fn answer_screenshot(&self) -> Result<()> {
        let provider = self
            .inner
            .session
            .lock()
            .screenshot_provider
            .clone()
            .ok_or(BridgeError::NoScreenshotProvider)?;

        let data_url = provider.capture().await.map_err(BridgeError::Screenshot)?;
        self.send(GuestMessage::Screenshot { data_url })
    }

    fn send(&self, message: GuestMessage) -> Result<()> {
        self.inner
            .session
            .lock()
            .send(self.inner.transport.as_ref(), &message)
    }

    fn handshake(&self, origin: &str) {
        let mut session = self.inner.session.lock();

        if let Some(locked) = &session.origin {
            tracing::debug!(
                "Ignoring repeated handshake from {}, origin stays {}",
                origin,
                locked
            );
            return;
        }
        if !self.inner.config.trusts(origin) {
            tracing::warn!(
                "Rejecting handshake: {}",
                BridgeError::UntrustedOrigin(origin.to_string())
            );
            return;
        }

        session.origin = Some(origin.to_string());
        tracing::info!("Host handshake complete, origin locked to {}", origin);

        let Some(message) = session.pending_init.take() else {
            return;
        };
        let outcome = session.send(self.inner.transport.as_ref(), &message);
        if outcome.is_err() {
            session.initialized = false;
            session.functions = FunctionRegistry::default();
            session.screenshot_provider = None;
        }
        if let Some(resolver) = session.init_resolver.take()
            && resolver.send(outcome).is_err()
        {
            tracing::debug!("Init caller stopped waiting for the handshake");
        }
    }

    fn accepts(&self, origin: &str) -> bool {
        let session = self.inner.session.lock();
        match &session.origin {
            None => {
                tracing::warn!("Dropping message from {} received before the handshake", origin);
                false
            }
            Some(locked) if self.inner.config.strict_origin && locked != origin => {
                tracing::warn!(
                    "Dropping message from {}, session is locked to {}",
                    origin,
                    locked
                );
                false
            }
            Some(_) => true,
        }
    }

    fn call_function(&self, name: &str, args: Value) {
        // Looked up under the lock, called outside it: callbacks may use the
        // bridge themselves.
        let callback = self.inner.session.lock().functions.get(name);
        match callback {
            Some(callback) => {
                tracing::debug!("Calling function {}", name);
                callback(args);
            }
            None => tracing::warn!("Host called unknown function {}", name),
        }
    }

    fn resolve_model_request(&self, request_id: &str, text: String) {
        let mut session = self.inner.session.lock();
        if session.model_requests.complete(request_id, text) {
            tracing::debug!("Model request {} resolved", request_id);
            return;
        }
        tracing::warn!(
            "Protocol mismatch: modelResponse for request {} while outstanding requests are {:?}",
            request_id,
            session.model_requests.outstanding()
        );
    }

    fn spawn_screenshot(&self) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::error!("Screenshot requested outside a tokio runtime, dropping it");
            return;
        };
        let bridge = self.clone();
        runtime.spawn(async move {
            if let Err(e) = bridge.answer_screenshot().await {
                tracing::warn!("Could not answer screenshot request: {}", e);
            }
        });
    }

    fn arm_timeout(&self, request_id: String) {
        let Some(timeout) = self.inner.config.request_timeout else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(
                "No tokio runtime, request {} will wait without a timeout",
                request_id
            );
            return;
        };

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let mut session = inner.session.lock();
            if session
                .model_requests
                .fail(&request_id, BridgeError::Timeout(request_id.clone()))
            {
                tracing::warn!("Model request {} timed out after {:?}", request_id, timeout);
            }
        });
    }
}
