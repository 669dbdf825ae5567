//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to change the model, the API key and key persistence
//! without sending anything to the API.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Change the model.
    Model(String),

    /// Set the API key. An empty key clears it.
    Key(String),

    /// Turn key persistence on or off.
    Remember(bool),

    /// Send the numbered quick reply (1-based, as shown to the user).
    Suggest(usize),

    /// List the quick replies.
    ListSuggestions,

    /// Save the transcript to a file.
    SaveTranscript(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use bestbro::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model gemini-2.5-pro").is_some());
/// assert!(parse_command("what's up").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model id".to_string()),
        },
        "key" => ChatCommand::Key(argument.unwrap_or_default().to_string()),
        "remember" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Remember(value),
            None => ChatCommand::Invalid("/remember expects 'on' or 'off'".to_string()),
        },
        "suggest" | "s" => match argument {
            None => ChatCommand::ListSuggestions,
            Some(arg) => match arg.parse::<usize>() {
                Ok(n) if n >= 1 => ChatCommand::Suggest(n),
                _ => ChatCommand::Invalid("/suggest expects a suggestion number".to_string()),
            },
        },
        "save" => match argument {
            Some(arg) => ChatCommand::SaveTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /model <id>            Change the model (e.g., /model gemini-2.5-pro)
  /key [secret]          Set the Gemini API key (no argument clears it)
  /remember on|off       Remember the API key on this device
  /suggest [n]           Send quick reply n (no argument lists them)
  /save <file>           Save the transcript as JSON
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat
Anything else is sent as a message."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_model() {
        assert_eq!(
            parse_command("/model gemini-2.5-pro"),
            Some(ChatCommand::Model("gemini-2.5-pro".to_string()))
        );
        assert_eq!(
            parse_command("/MODEL   gemini-2.5-flash  "),
            Some(ChatCommand::Model("gemini-2.5-flash".to_string()))
        );
        assert_eq!(
            parse_command("/model"),
            Some(ChatCommand::Invalid("/model requires a model id".to_string()))
        );
    }

    #[test]
    fn parse_key() {
        assert_eq!(
            parse_command("/key AIza-secret"),
            Some(ChatCommand::Key("AIza-secret".to_string()))
        );
        assert_eq!(parse_command("/key"), Some(ChatCommand::Key(String::new())));
    }

    #[test]
    fn parse_remember_toggle() {
        assert_eq!(
            parse_command("/remember on"),
            Some(ChatCommand::Remember(true))
        );
        assert_eq!(
            parse_command("/remember OFF"),
            Some(ChatCommand::Remember(false))
        );
        assert!(matches!(
            parse_command("/remember maybe"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn parse_suggest() {
        assert_eq!(parse_command("/suggest"), Some(ChatCommand::ListSuggestions));
        assert_eq!(parse_command("/s 2"), Some(ChatCommand::Suggest(2)));
        assert!(matches!(
            parse_command("/suggest 0"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/suggest two"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_save() {
        assert_eq!(
            parse_command("/save chat.json"),
            Some(ChatCommand::SaveTranscript("chat.json".to_string()))
        );
        assert!(matches!(
            parse_command("/save"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_stats_and_config() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(
            parse_command("/bogus"),
            Some(ChatCommand::Invalid("Unknown command: /bogus".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("hello bro"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/key"));
        assert!(help.contains("/remember"));
        assert!(help.contains("/suggest"));
    }
}
