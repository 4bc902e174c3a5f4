//! Scripted in-memory provider and log capture shared by the unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rfx_types::{GatewayError, Result};

use crate::normalize;
use crate::prompts::Prompt;
use crate::{AiProvider, ChatRequest, ChatResponse, ProviderType};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone)]
pub(crate) enum Step {
    Reply(String),
    Fail(fn() -> GatewayError),
}

pub(crate) struct MockProvider {
    kind: ProviderType,
    available: bool,
    probe_ok: bool,
    delay: Option<Duration>,
    script: Mutex<VecDeque<Step>>,
    otherwise: Step,
    calls: AtomicUsize,
}

impl MockProvider {
    pub(crate) fn new(kind: ProviderType) -> Self {
        Self {
            kind,
            available: true,
            probe_ok: true,
            delay: None,
            script: Mutex::new(VecDeque::new()),
            otherwise: Step::Reply(format!("{kind} reply")),
            calls: AtomicUsize::new(0),
        }
    }

    /// Reply used once the script is drained.
    pub(crate) fn replying(mut self, text: &str) -> Self {
        self.otherwise = Step::Reply(text.to_string());
        self
    }

    pub(crate) fn failing(mut self, err: fn() -> GatewayError) -> Self {
        self.otherwise = Step::Fail(err);
        self
    }

    /// Queue a one-off step ahead of the default behavior.
    pub(crate) fn then(self, step: Step) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub(crate) fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub(crate) fn probe_fails(mut self) -> Self {
        self.probe_ok = false;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.otherwise.clone());
        match step {
            Step::Reply(text) => Ok(text),
            Step::Fail(err) => Err(err()),
        }
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn provider_type(&self) -> ProviderType {
        self.kind
    }

    fn default_model(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn probe(&self) -> bool {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.available && self.probe_ok
    }

    async fn complete(&self, _prompt: &Prompt) -> Result<String> {
        self.next().await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let raw = self.next().await?;
        normalize::normalize_chat(self.name(), &raw, request.require_mode)
    }
}

pub(crate) fn overloaded() -> GatewayError {
    GatewayError::ServiceOverloaded {
        provider: "mock".into(),
        status: 503,
    }
}

pub(crate) fn auth_failed() -> GatewayError {
    GatewayError::AuthError {
        provider: "mock".into(),
    }
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

/// In-memory sink for a thread-local `fmt` subscriber.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

pub(crate) struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Capture events at `INFO` and above until the guard is dropped.
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes).lines().map(String::from).collect()
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(Arc::clone(&self.0))
    }
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
