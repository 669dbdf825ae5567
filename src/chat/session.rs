//! Core chat session management.
//!
//! `ChatSession` owns the transcript, the composer draft, the API key and the
//! single-request guard. A send is split into three steps so that callers can
//! render while a request is outstanding:
//!
//! 1. [`ChatSession::begin_send`] checks the guards, appends the user message
//!    and hands back a [`PendingTurn`].
//! 2. [`PendingTurn::execute`] calls the completion service. It borrows
//!    nothing from the session.
//! 3. [`ChatSession::finish_send`] records the reply or the error.
//!
//! [`ChatSession::send_message`] does all three.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::to_writer_pretty;
use time::OffsetDateTime;

use crate::chat::config::ChatConfig;
use crate::completion::{CompletionConnector, CompletionService, Reply};
use crate::credential::{API_KEY_CREDENTIAL, CredentialStore};
use crate::error::{Error, Result};
use crate::observability::{
    SESSION_CONFIGURATION_ERRORS, SESSION_EMPTY_REPLIES, SESSION_FAILURES, SESSION_REPLIES,
    SESSION_SENDS, SESSION_SENDS_DROPPED,
};
use crate::types::{Content, Message, Model};

/// The model-authored message every session starts with.
pub const WELCOME_MESSAGE: &str = "what's good bro? what u up to right now?";

/// Quick replies that can be sent with one action.
pub const SUGGESTIONS: [&str; 3] = ["介紹喝酒的地方", "介紹打撞球的地方", "今晚去哪裏玩？"];

/// Error shown when a send is attempted without a usable API key.
pub const MISSING_KEY_MESSAGE: &str = "請先輸入有效的 Gemini API Key";

/// Error shown when a send is attempted without a model id.
pub const MISSING_MODEL_MESSAGE: &str = "請先輸入 Gemini 模型名稱";

/// Whether a completion request is outstanding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// No request in flight; sends are accepted.
    Idle,
    /// One request in flight; sends are dropped.
    Pending,
}

/// A request that has been admitted but not yet sent.
///
/// Holds everything the completion call needs, so the session stays free to
/// be inspected (and to reject further sends) while it runs.
pub struct PendingTurn {
    service: Arc<dyn CompletionService>,
    model: Model,
    contents: Vec<Content>,
}

impl PendingTurn {
    /// The model the request is for.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The transcript being sent, ending with the new user message.
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    /// Call the completion service. This is the only suspension point of a
    /// send; there is no timeout and no cancellation.
    pub async fn execute(self) -> TurnOutcome {
        let result = self.service.generate(&self.model, &self.contents).await;
        TurnOutcome { result }
    }
}

/// The settled result of a [`PendingTurn`], to be handed to
/// [`ChatSession::finish_send`].
#[derive(Debug)]
pub struct TurnOutcome {
    result: Result<Reply>,
}

impl TurnOutcome {
    /// The service's result.
    pub fn result(&self) -> &Result<Reply> {
        &self.result
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: Model,
    /// The number of messages in the transcript, welcome included.
    pub message_count: usize,
    /// Whether an API key is present.
    pub has_api_key: bool,
    /// Whether the key is mirrored to the credential store.
    pub remember_key: bool,
    /// Whether a request is in flight.
    pub state: RequestState,
    /// Requests sent to the completion service.
    pub total_requests: u64,
    /// Requests that failed.
    pub total_failures: u64,
    /// The current error, if any.
    pub error: Option<String>,
}

/// A chat session with a completion service.
pub struct ChatSession {
    config: ChatConfig,
    store: Arc<dyn CredentialStore>,
    connector: Arc<dyn CompletionConnector>,
    service: Option<Arc<dyn CompletionService>>,
    connect_error: Option<Error>,
    transcript: Vec<Message>,
    composer: String,
    state: RequestState,
    error: Option<String>,
    request_count: u64,
    failure_count: u64,
}

impl ChatSession {
    /// Creates a new session.
    ///
    /// A key already in `store` is adopted unless `config` carries one. When
    /// `config` does not remember the key, the stored copy is removed; the
    /// adopted key still lives in memory for this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store cannot be read or cleared.
    pub fn new(
        mut config: ChatConfig,
        store: Arc<dyn CredentialStore>,
        connector: Arc<dyn CompletionConnector>,
    ) -> Result<Self> {
        if config.api_key.is_empty()
            && let Some(saved) = store.get(API_KEY_CREDENTIAL)?
            && !saved.is_empty()
        {
            config.api_key = saved;
        }
        if !config.remember_key {
            store.remove(API_KEY_CREDENTIAL)?;
        }
        let composer = config.starter.clone();
        let mut session = Self {
            config,
            store,
            connector,
            service: None,
            connect_error: None,
            transcript: vec![Message::model(WELCOME_MESSAGE)],
            composer,
            state: RequestState::Idle,
            error: None,
            request_count: 0,
            failure_count: 0,
        };
        session.reconnect();
        Ok(session)
    }

    /// Sends `message`, or the composer draft when `message` is `None`.
    ///
    /// Returns true if a request was made. Blank content and sends made while
    /// a request is pending are silently ignored; a missing key sets
    /// [`ChatSession::error`]. Service failures are recorded in
    /// [`ChatSession::error`] rather than returned.
    pub async fn send_message(&mut self, message: Option<&str>) -> bool {
        let Some(turn) = self.begin_send(message) else {
            return false;
        };
        let outcome = turn.execute().await;
        self.finish_send(outcome);
        true
    }

    /// Sends the quick reply at `index` in [`SUGGESTIONS`].
    pub async fn suggest(&mut self, index: usize) -> bool {
        match SUGGESTIONS.get(index).copied() {
            Some(text) => self.send_message(Some(text)).await,
            None => false,
        }
    }

    /// Admits a send and performs its synchronous effects.
    ///
    /// On success the error is cleared, the session is pending, the user
    /// message is at the end of the transcript and the composer is empty.
    pub fn begin_send(&mut self, message: Option<&str>) -> Option<PendingTurn> {
        let content = message.unwrap_or(self.composer.as_str()).trim().to_string();
        if content.is_empty() || self.state == RequestState::Pending {
            SESSION_SENDS_DROPPED.click();
            return None;
        }
        let Some(service) = self.service.clone() else {
            let err = self
                .connect_error
                .clone()
                .unwrap_or_else(|| Error::configuration(MISSING_KEY_MESSAGE));
            self.reject(err);
            return None;
        };
        if self.config.model.is_blank() {
            self.reject(Error::configuration(MISSING_MODEL_MESSAGE));
            return None;
        }

        SESSION_SENDS.click();
        self.error = None;
        self.state = RequestState::Pending;
        self.transcript.push(Message::user(content));
        self.composer.clear();
        self.request_count = self.request_count.saturating_add(1);

        Some(PendingTurn {
            service,
            model: self.config.model.clone(),
            contents: self.transcript.iter().map(Content::from).collect(),
        })
    }

    /// Records the outcome of the pending request and returns to idle.
    ///
    /// Does nothing if no request is pending.
    pub fn finish_send(&mut self, outcome: TurnOutcome) {
        if self.state != RequestState::Pending {
            return;
        }
        self.state = RequestState::Idle;
        match outcome.result {
            Ok(reply) => {
                SESSION_REPLIES.click();
                if reply.text.as_deref().is_none_or(str::is_empty) {
                    SESSION_EMPTY_REPLIES.click();
                }
                self.transcript
                    .push(Message::model(reply.into_transcript_text()));
            }
            Err(err) => {
                SESSION_FAILURES.click();
                self.failure_count = self.failure_count.saturating_add(1);
                self.error = Some(err.describe());
            }
        }
    }

    /// The conversation so far, oldest first. Never empty.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Returns the number of messages in the transcript.
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// The composer draft.
    pub fn composer(&self) -> &str {
        &self.composer
    }

    /// Replaces the composer draft.
    pub fn set_composer(&mut self, text: impl Into<String>) {
        self.composer = text.into();
    }

    /// Whether a request is in flight.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Returns true while a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.state == RequestState::Pending
    }

    /// The error from the last send attempt, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the submit control is enabled: idle, a non-blank draft and a
    /// key present.
    pub fn can_send(&self) -> bool {
        !self.is_pending() && !self.composer.trim().is_empty() && !self.config.api_key.is_empty()
    }

    /// Changes the model used for responses.
    pub fn set_model(&mut self, model: Model) {
        self.config.model = model;
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        &self.config.model
    }

    /// The in-memory API key; empty when none is set.
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// Replaces the API key.
    ///
    /// The in-memory key and the service handle change first; when the key is
    /// remembered the new value is then written to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store write fails.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> Result<()> {
        self.config.api_key = api_key.into();
        self.reconnect();
        if self.config.remember_key {
            self.store.set(API_KEY_CREDENTIAL, &self.config.api_key)?;
        }
        Ok(())
    }

    /// Whether the API key is mirrored into the credential store.
    pub fn remember_key(&self) -> bool {
        self.config.remember_key
    }

    /// Turns key persistence on or off.
    ///
    /// Turning it off deletes the stored key; turning it on stores the
    /// current key if there is one. The in-memory key never changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store update fails.
    pub fn set_remember_key(&mut self, remember_key: bool) -> Result<()> {
        self.config.remember_key = remember_key;
        if !remember_key {
            self.store.remove(API_KEY_CREDENTIAL)
        } else if !self.config.api_key.is_empty() {
            self.store.set(API_KEY_CREDENTIAL, &self.config.api_key)
        } else {
            Ok(())
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Saves the transcript to the specified path as JSON.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile {
            version: 1,
            saved_at: OffsetDateTime::now_utc(),
            model: &self.config.model,
            messages: &self.transcript,
        };
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            message_count: self.message_count(),
            has_api_key: !self.config.api_key.is_empty(),
            remember_key: self.config.remember_key,
            state: self.state,
            total_requests: self.request_count,
            total_failures: self.failure_count,
            error: self.error.clone(),
        }
    }

    fn reconnect(&mut self) {
        self.service = None;
        self.connect_error = None;
        if self.config.api_key.is_empty() {
            return;
        }
        match self.connector.connect(&self.config.api_key) {
            Ok(service) => self.service = Some(service),
            Err(err) => self.connect_error = Some(err),
        }
    }

    fn reject(&mut self, err: Error) {
        SESSION_CONFIGURATION_ERRORS.click();
        self.error = Some(err.describe());
    }
}

#[derive(Serialize)]
struct TranscriptFile<'a> {
    version: u8,
    #[serde(with = "crate::utils::time")]
    saved_at: OffsetDateTime,
    model: &'a Model,
    messages: &'a [Message],
}
