//! Output rendering for the chat transcript.
//!
//! Message text is shown line by line with no markup interpretation. The
//! [`Renderer`] trait abstracts over where that output goes.

use std::io::{self, Stdout, Write};
use std::str::Split;

use crate::types::{Message, Role};

/// ANSI escape code for bold text (used for role labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for the pending placeholder).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for user labels).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for magenta text (used for model labels).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// ANSI escape code for red text (used for the error banner).
const ANSI_RED: &str = "\x1b[31m";

/// Label shown above user messages.
pub const USER_LABEL: &str = "You";

/// Label shown above model messages.
pub const MODEL_LABEL: &str = "ur best bro";

/// Shown while a request is outstanding.
pub const PENDING_TEXT: &str = "thinking…";

/// The lines of a message, split on `'\n'`.
///
/// The iterator is lazy and `Clone`, so it can be walked more than once. Lines
/// keep their whitespace (including a trailing `'\r'`); an empty text yields a
/// single empty line.
pub fn lines(text: &str) -> Lines<'_> {
    Lines {
        inner: text.split('\n'),
    }
}

/// Iterator returned by [`lines`].
#[derive(Clone, Debug)]
pub struct Lines<'a> {
    inner: Split<'a, char>,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// The label a renderer shows for `role`.
pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => USER_LABEL,
        Role::Model => MODEL_LABEL,
    }
}

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Render one transcript message.
    fn print_message(&mut self, message: &Message);

    /// Show that a reply is on its way.
    fn print_pending(&mut self);

    /// Show the error banner.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Render a whole transcript, oldest first.
    fn print_transcript(&mut self, transcript: &[Message]) {
        for message in transcript {
            self.print_message(message);
        }
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn label(&self, role: Role) -> String {
        let label = role_label(role);
        if self.use_color {
            let color = match role {
                Role::User => ANSI_CYAN,
                Role::Model => ANSI_MAGENTA,
            };
            format!("{ANSI_BOLD}{color}{label}{ANSI_RESET}")
        } else {
            label.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &Message) {
        println!("{}", self.label(message.role));
        for line in lines(&message.text) {
            println!("  {line}");
        }
        println!();
        self.flush();
    }

    fn print_pending(&mut self) {
        let label = self.label(Role::Model);
        if self.use_color {
            println!("{label}\n  {ANSI_DIM}{PENDING_TEXT}{ANSI_RESET}");
        } else {
            println!("{label}\n  {PENDING_TEXT}");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("{ANSI_RED}⚠ {error}{ANSI_RESET}");
        } else {
            eprintln!("⚠ {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }
}
