//! Text generation gateway.
//!
//! Every component that needs generated text receives an `Arc<dyn TextGenerator>`
//! at construction. The production implementation is [`Gateway`], which wraps an
//! optional live backend and always falls back to the [`OfflineResponder`], so
//! callers never see a generation error.

pub mod bedrock;
pub mod gemini;
pub mod offline;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

pub use bedrock::BedrockBackend;
pub use gemini::GeminiBackend;
pub use offline::{OfflineResponder, OFFLINE_DEFAULT_RESPONSE, OFFLINE_RULES};

use crate::{Config, Result};

/// Generate text from a prompt. Never fails.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> String;
}

/// A live text generation backend that may fail.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl TextGenerator for OfflineResponder {
    async fn generate(&self, prompt: &str) -> String {
        self.respond(prompt).await
    }
}

/// Operating mode of a [`Gateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Live(&'static str),
    Offline,
}

/// Text generation gateway with offline fallback.
pub struct Gateway {
    live: Option<Arc<dyn CompletionBackend>>,
    live_disabled: AtomicBool,
    offline: OfflineResponder,
}

impl Gateway {
    /// Gateway that only uses the offline responder.
    pub fn offline(offline: OfflineResponder) -> Self {
        Self {
            live: None,
            live_disabled: AtomicBool::new(false),
            offline,
        }
    }

    /// Gateway backed by a live backend, falling back to `offline`.
    pub fn live(backend: Arc<dyn CompletionBackend>, offline: OfflineResponder) -> Self {
        Self {
            live: Some(backend),
            live_disabled: AtomicBool::new(false),
            offline,
        }
    }

    /// Select the gateway mode from configuration.
    ///
    /// Gemini wins when a key is present, then Bedrock when a model id is set.
    /// Anything else, including a backend that cannot be initialized, yields
    /// an offline gateway.
    pub async fn from_config(config: &Config) -> Self {
        let offline = OfflineResponder::new(config.offline_latency);
        if !config.has_live_backend() {
            warn!("No generation backend configured. Switching to offline mode.");
            return Self::offline(offline);
        }

        if let Some(api_key) = &config.gemini_api_key {
            match GeminiBackend::new(api_key, &config.gemini_model) {
                Ok(backend) => {
                    info!(model = %config.gemini_model, "Using Gemini generation backend");
                    return Self::live(Arc::new(backend), offline);
                }
                Err(e) => warn!(error = %e, "Gemini initialization failed. Switching to offline mode."),
            }
        }

        if let Some(model_id) = &config.bedrock_model_id {
            let sdk_config = config.aws_sdk_config().await;
            let client = aws_sdk_bedrockruntime::Client::new(&sdk_config);
            info!(model_id = %model_id, "Using Bedrock generation backend");
            return Self::live(
                Arc::new(BedrockBackend::new(client, model_id.clone(), config.max_tokens)),
                offline,
            );
        }

        Self::offline(offline)
    }

    /// Current mode. A live gateway turns offline once credentials are rejected.
    pub fn mode(&self) -> GatewayMode {
        match self.active_backend() {
            Some(backend) => GatewayMode::Live(backend.name()),
            None => GatewayMode::Offline,
        }
    }

    fn active_backend(&self) -> Option<&Arc<dyn CompletionBackend>> {
        if self.live_disabled.load(Ordering::Relaxed) {
            return None;
        }
        self.live.as_ref()
    }
}

#[async_trait]
impl TextGenerator for Gateway {
    async fn generate(&self, prompt: &str) -> String {
        if let Some(backend) = self.active_backend() {
            match backend.complete(prompt).await {
                Ok(text) => return text,
                Err(e) if e.is_sticky() => {
                    self.live_disabled.store(true, Ordering::Relaxed);
                    warn!(backend = backend.name(), error = %e, "Live backend unusable. Staying in offline mode.");
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "Live generation failed. Using offline response.");
                }
            }
        }

        self.offline.respond(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::AtomicUsize;

    struct FlakyBackend {
        calls: AtomicUsize,
        error: fn() -> Error,
    }

    #[async_trait]
    impl CompletionBackend for FlakyBackend {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }
    }

    struct EchoBackend;

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(format!("live: {}", prompt))
        }
    }

    #[tokio::test]
    async fn test_live_success() {
        let gateway = Gateway::live(Arc::new(EchoBackend), OfflineResponder::instant());
        assert_eq!(gateway.generate("hi").await, "live: hi");
        assert_eq!(gateway.mode(), GatewayMode::Live("echo"));
    }

    #[tokio::test]
    async fn test_transient_failure_falls_back_per_call() {
        let backend = Arc::new(FlakyBackend {
            calls: AtomicUsize::new(0),
            error: || Error::Generation("throttled".into()),
        });
        let gateway = Gateway::live(backend.clone(), OfflineResponder::instant());

        assert_eq!(gateway.generate("Hello").await, OFFLINE_DEFAULT_RESPONSE);
        assert_eq!(gateway.generate("Hello").await, OFFLINE_DEFAULT_RESPONSE);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(gateway.mode(), GatewayMode::Live("flaky"));
    }

    #[tokio::test]
    async fn test_credential_failure_is_sticky() {
        let backend = Arc::new(FlakyBackend {
            calls: AtomicUsize::new(0),
            error: || Error::Config("access denied".into()),
        });
        let gateway = Gateway::live(backend.clone(), OfflineResponder::instant());

        gateway.generate("Hello").await;
        gateway.generate("Hello").await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.mode(), GatewayMode::Offline);
    }

    #[tokio::test]
    async fn test_from_config_without_credentials_is_offline() {
        let config = Config {
            offline_latency: std::time::Duration::ZERO,
            ..Config::default()
        };
        let gateway = Gateway::from_config(&config).await;
        assert_eq!(gateway.mode(), GatewayMode::Offline);
        assert_eq!(gateway.generate("water cut").await, OFFLINE_RULES[0].response);
    }

    #[tokio::test]
    async fn test_from_config_with_gemini_key_is_live() {
        let config = Config {
            gemini_api_key: Some("test-key".to_string()),
            ..Config::default()
        };
        let gateway = Gateway::from_config(&config).await;
        assert_eq!(gateway.mode(), GatewayMode::Live("gemini"));
    }
}
