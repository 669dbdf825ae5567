//! Interactive chat with your best bro, backed by Gemini.
//!
//! # Usage
//!
//! ```bash
//! # Use the stored key (or $GEMINI_API_KEY)
//! bestbro-chat
//!
//! # Pick a model and don't persist the key
//! bestbro-chat --model gemini-2.5-pro --api-key "$KEY" --no-remember
//!
//! # Start with an empty composer and no colors
//! bestbro-chat --starter "" --no-color
//! ```
//!
//! The composer is pre-filled with the starter text; press Enter to send it or
//! edit it first. Slash commands (`/help`) change the model, the key and key
//! persistence, and send the quick-reply suggestions.

use std::env;
use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use bestbro::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, SUGGESTIONS,
    help_text, parse_command,
};
use bestbro::{
    API_KEY_ENV, CredentialStore, FileCredentialStore, GeminiConnector, MemoryCredentialStore,
    Model,
};

/// Main entry point for the bestbro-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("bestbro-chat [OPTIONS]");
    let mut config = ChatConfig::from(args);
    if config.api_key.is_empty()
        && let Ok(key) = env::var(API_KEY_ENV)
    {
        config.api_key = key;
    }
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    let store: Arc<dyn CredentialStore> = match &config.credential_path {
        Some(path) => Arc::new(FileCredentialStore::new(path)),
        None => match FileCredentialStore::open_default() {
            Ok(store) => Arc::new(store),
            Err(err) => {
                renderer.print_error(&format!("{err}; the API key will not be remembered"));
                Arc::new(MemoryCredentialStore::new())
            }
        },
    };
    let mut session = ChatSession::new(config, store, Arc::new(GeminiConnector::new()))?;
    let mut rl = DefaultEditor::new()?;

    println!("ur best bro (model: {})", session.model());
    println!("Type /help for commands, /quit to exit\n");
    if session.api_key().is_empty() {
        renderer.print_info("No API key yet. Set one with /key <secret>.\n");
    }
    renderer.print_transcript(session.transcript());

    loop {
        let draft = session.composer().to_string();
        let readline = rl.readline_with_initial("You: ", (&draft, ""));

        match readline {
            Ok(line) => {
                session.set_composer(line.as_str());
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if let Some(cmd) = parse_command(line) {
                    if !matches!(cmd, ChatCommand::Key(_)) {
                        let _ = rl.add_history_entry(line);
                    }
                    session.set_composer("");
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Model(model_name) => {
                            let model = model_name
                                .parse()
                                .unwrap_or_else(|_| Model::Custom(model_name.clone()));
                            session.set_model(model);
                            renderer.print_info(&format!("Model changed to: {}", model_name));
                        }
                        ChatCommand::Key(key) => {
                            let cleared = key.is_empty();
                            match session.set_api_key(key) {
                                Ok(()) if cleared => renderer.print_info("API key cleared."),
                                Ok(()) => renderer.print_info(&format!(
                                    "API key set to {}",
                                    mask_key(session.api_key())
                                )),
                                Err(err) => renderer
                                    .print_error(&format!("Failed to store API key: {}", err)),
                            }
                        }
                        ChatCommand::Remember(remember) => {
                            match session.set_remember_key(remember) {
                                Ok(()) if remember => {
                                    renderer.print_info("API key will be remembered.")
                                }
                                Ok(()) => renderer.print_info("API key forgotten on this device."),
                                Err(err) => renderer.print_error(&format!(
                                    "Failed to update stored API key: {}",
                                    err
                                )),
                            }
                        }
                        ChatCommand::ListSuggestions => {
                            for (idx, suggestion) in SUGGESTIONS.iter().enumerate() {
                                println!("    {}. {}", idx + 1, suggestion);
                            }
                        }
                        ChatCommand::Suggest(number) => {
                            match SUGGESTIONS.get(number - 1).copied() {
                                Some(text) => {
                                    submit(&mut session, &mut renderer, Some(text)).await
                                }
                                None => renderer.print_error(&format!(
                                    "There are only {} suggestions.",
                                    SUGGESTIONS.len()
                                )),
                            }
                        }
                        ChatCommand::SaveTranscript(path) => {
                            match session.save_transcript_to(&path) {
                                Ok(_) => {
                                    renderer.print_info(&format!("Transcript saved to {}", path))
                                }
                                Err(err) => renderer
                                    .print_error(&format!("Failed to save transcript: {}", err)),
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                let _ = rl.add_history_entry(line);
                submit(&mut session, &mut renderer, None).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at the prompt discards the draft.
                session.set_composer("");
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Sends `message` (or the composer draft) and renders what happened.
async fn submit(session: &mut ChatSession, renderer: &mut dyn Renderer, message: Option<&str>) {
    let Some(turn) = session.begin_send(message) else {
        if let Some(error) = session.error() {
            renderer.print_error(error);
        }
        return;
    };
    if let Some(sent) = session.transcript().last() {
        renderer.print_message(sent);
    }
    renderer.print_pending();

    let outcome = turn.execute().await;
    session.finish_send(outcome);

    match session.error() {
        Some(error) => renderer.print_error(error),
        None => {
            if let Some(reply) = session.transcript().last() {
                renderer.print_message(reply);
            }
        }
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model);
    println!("      Messages: {}", stats.message_count);
    println!("      State: {:?}", stats.state);
    println!(
        "      Requests: {} ({} failed)",
        stats.total_requests, stats.total_failures
    );
    match stats.error {
        Some(ref error) => println!("      Last error: {}", error),
        None => println!("      Last error: (none)"),
    }
}

fn print_config(session: &ChatSession) {
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Model: {}", config.model);
    if config.api_key.is_empty() {
        println!("      API key: (none)");
    } else {
        println!("      API key: {}", mask_key(&config.api_key));
    }
    println!(
        "      Remember key: {}",
        if config.remember_key { "on" } else { "off" }
    );
    match config.credential_path {
        Some(ref path) => println!("      Credential file: {}", path.display()),
        None => println!("      Credential file: (default)"),
    }
}
