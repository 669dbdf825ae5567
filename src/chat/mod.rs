//! Chat application module for conversations with Gemini.
//!
//! This module provides the session state machine and a REPL-friendly command
//! layer built on top of the bestbro client library. It supports:
//!
//! - An append-only transcript seeded with a welcome message
//! - One request in flight at a time; extra sends are dropped
//! - API keys remembered in a device-local credential store
//! - Quick-reply suggestions and slash commands for session control
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: the chat session state machine
//! - [`commands`]: slash command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{Lines, PlainTextRenderer, Renderer, lines, role_label};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, DEFAULT_STARTER};
pub use session::{
    ChatSession, MISSING_KEY_MESSAGE, MISSING_MODEL_MESSAGE, PendingTurn, RequestState,
    SUGGESTIONS, SessionStats, TurnOutcome, WELCOME_MESSAGE,
};
