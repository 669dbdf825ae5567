//! A chat session for the Gemini generative-language API.
//!
//! The [`chat::ChatSession`] keeps an append-only transcript, allows one
//! request in flight at a time, and remembers the API key in a device-local
//! [`CredentialStore`]. Replies come from any [`CompletionService`]; the
//! [`Gemini`] client is the one shipped here.

// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod completion;
pub mod credential;
pub mod error;
pub mod observability;
pub mod render;
pub mod types;
pub mod utils;

// Re-exports
pub use client::{API_KEY_ENV, Gemini};
pub use client_logger::ClientLogger;
pub use completion::{CompletionConnector, CompletionService, GeminiConnector, NO_CONTENT, Reply};
pub use credential::{
    API_KEY_CREDENTIAL, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
