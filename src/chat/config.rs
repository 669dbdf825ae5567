//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! session configuration.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::types::Model;

/// Draft placed in the composer when a session starts.
pub const DEFAULT_STARTER: &str = "嗨！幫我測試一下台北旅遊的一日行程～";

/// Command-line arguments for the bestbro-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-2.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// API key; overrides any stored key.
    #[arrrg(optional, "Gemini API key (default: $GEMINI_API_KEY or the stored key)", "KEY")]
    pub api_key: Option<String>,

    /// Do not persist the API key on this device.
    #[arrrg(flag, "Do not remember the API key on this device")]
    pub no_remember: bool,

    /// Draft to pre-fill the composer with.
    #[arrrg(optional, "Initial composer text (empty for none)", "TEXT")]
    pub starter: Option<String>,

    /// Where to keep the remembered key.
    #[arrrg(optional, "Credential file (default: <config dir>/bestbro/credentials.json)", "PATH")]
    pub credentials: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// The API key; empty when none has been entered.
    pub api_key: String,

    /// Whether the API key is mirrored into the credential store.
    pub remember_key: bool,

    /// Initial composer text.
    pub starter: String,

    /// Credential file location; `None` uses the default.
    pub credential_path: Option<PathBuf>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-2.5-flash
    /// - API key: none
    /// - Remember key: enabled
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            api_key: String::new(),
            remember_key: true,
            starter: DEFAULT_STARTER.to_string(),
            credential_path: None,
            use_color: true,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Sets whether the API key is remembered.
    pub fn with_remember_key(mut self, remember_key: bool) -> Self {
        self.remember_key = remember_key;
        self
    }

    /// Sets the starter text.
    pub fn with_starter(mut self, starter: impl Into<String>) -> Self {
        self.starter = starter.into();
        self
    }

    /// Sets the credential file location.
    pub fn with_credential_path(mut self, path: Option<PathBuf>) -> Self {
        self.credential_path = path;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let model = args
            .model
            .map(|s| s.parse::<Model>().unwrap_or(Model::Custom(s)))
            .unwrap_or_default();

        ChatConfig {
            model,
            api_key: args.api_key.unwrap_or_default(),
            remember_key: !args.no_remember,
            starter: args.starter.unwrap_or_else(|| DEFAULT_STARTER.to_string()),
            credential_path: args.credentials.map(PathBuf::from),
            use_color: !args.no_color,
        }
    }
}
