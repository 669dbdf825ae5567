//! The boundary between a chat session and whatever produces replies.
//!
//! A [`CompletionService`] turns a transcript into a reply. A
//! [`CompletionConnector`] builds a service from an API key; the session asks
//! for a fresh service every time the key changes.

use std::sync::Arc;
use std::time::Duration;

use crate::client::Gemini;
use crate::client_logger::ClientLogger;
use crate::error::Result;
use crate::types::{Content, Model};

/// Text placed in the transcript when a reply carries no text.
pub const NO_CONTENT: &str = "[No content]";

/// The outcome of a successful completion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// The generated text, if the service produced any.
    pub text: Option<String>,
}

impl Reply {
    /// A reply carrying `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// A reply without text.
    pub fn empty() -> Self {
        Self { text: None }
    }

    /// The text to append to a transcript; empty replies become [`NO_CONTENT`].
    pub fn into_transcript_text(self) -> String {
        match self.text {
            Some(text) if !text.is_empty() => text,
            _ => NO_CONTENT.to_string(),
        }
    }
}

/// Something that can generate a reply for a conversation.
///
/// The caller supplies the whole history on every call; implementations keep
/// no conversation state between calls.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate a reply to `transcript` using `model`.
    async fn generate(&self, model: &Model, transcript: &[Content]) -> Result<Reply>;
}

#[async_trait::async_trait]
impl CompletionService for Gemini {
    async fn generate(&self, model: &Model, transcript: &[Content]) -> Result<Reply> {
        let response = Gemini::generate(self, model, transcript.to_vec()).await?;
        Ok(Reply {
            text: response.text(),
        })
    }
}

/// Builds a [`CompletionService`] from an API key.
pub trait CompletionConnector: Send + Sync {
    /// Construct a service for `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error when no usable service can be built for the key.
    fn connect(&self, api_key: &str) -> Result<Arc<dyn CompletionService>>;
}

/// Connects to the Gemini REST API.
#[derive(Clone, Default)]
pub struct GeminiConnector {
    base_url: Option<String>,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl GeminiConnector {
    /// A connector for the public Gemini endpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different base URL (e.g. a proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Give up on requests after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a logger to every client this connector builds.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl CompletionConnector for GeminiConnector {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn CompletionService>> {
        let mut client = Gemini::with_options(
            Some(api_key.to_string()),
            self.base_url.clone(),
            self.timeout,
        )?;
        if let Some(logger) = &self.logger {
            client = client.with_logger(Arc::clone(logger));
        }
        Ok(Arc::new(client))
    }
}
