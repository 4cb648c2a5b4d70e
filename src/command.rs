//! Command surface
//!
//! Chat clients drive the translator with short text commands:
//!
//! ```text
//! ping
//! version
//! status
//! init_translator <api_key>
//! translate "<text>" <from_lang> <to_lang>
//! ```
//!
//! Every command produces exactly one human-readable reply. Failures,
//! including panics raised while handling a command, become reply strings as
//! well, so callers never have to handle an error path.

use crate::client::{TranslateError, TranslationClient};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info};

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Version,
    Status,
    InitTranslator {
        api_key: String,
    },
    Translate {
        text: String,
        from_lang: String,
        to_lang: String,
    },
}

/// Why a command line could not be turned into a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Nothing but whitespace was given
    NoSubcommand,
    /// The first word is not a known command
    Unknown(String),
    /// `init_translator` without a key
    MissingApiKey,
    /// `translate` with fewer than three arguments
    InsufficientArguments,
    /// A double quote was opened and never closed
    UnbalancedQuote,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::NoSubcommand => write!(f, "CET: No subcommand specified"),
            CommandError::Unknown(name) => write!(f, "CET: Unknown command '{}'", name),
            CommandError::MissingApiKey => {
                write!(f, "CET init_translator error: API key required")
            }
            CommandError::InsufficientArguments => write!(
                f,
                "CET translate error: insufficient arguments (text, from_lang, to_lang required)"
            ),
            CommandError::UnbalancedQuote => write!(f, "CET: Unbalanced quote in command"),
        }
    }
}

impl std::error::Error for CommandError {}

impl Command {
    /// Parse a command from its words (`args[0]` is the command name)
    ///
    /// Extra trailing arguments are ignored.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, CommandError> {
        let Some(name) = args.first() else {
            return Err(CommandError::NoSubcommand);
        };
        let arg = |i: usize| args.get(i).map(|s| s.as_ref().to_string());

        match name.as_ref() {
            "ping" => Ok(Command::Ping),
            "version" => Ok(Command::Version),
            "status" => Ok(Command::Status),
            "init_translator" => arg(1)
                .map(|api_key| Command::InitTranslator { api_key })
                .ok_or(CommandError::MissingApiKey),
            "translate" => match (arg(1), arg(2), arg(3)) {
                (Some(text), Some(from_lang), Some(to_lang)) => Ok(Command::Translate {
                    text,
                    from_lang,
                    to_lang,
                }),
                _ => Err(CommandError::InsufficientArguments),
            },
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Split a command line into words and parse it
    pub fn parse_line(line: &str) -> Result<Self, CommandError> {
        Self::parse(split_line(line)?.as_slice())
    }
}

/// Split a line on whitespace, keeping double-quoted runs together
///
/// Inside quotes `\"` is a literal quote and `\\` a literal backslash.
/// `""` yields an empty argument.
pub fn split_line(line: &str) -> Result<Vec<String>, CommandError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_word = true;
            }
            '\\' if in_quotes && matches!(chars.peek(), Some(&'"') | Some(&'\\')) => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_quotes {
        return Err(CommandError::UnbalancedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Runs commands against one owned [`TranslationClient`]
#[derive(Debug)]
pub struct Dispatcher {
    client: TranslationClient,
}

impl Dispatcher {
    pub fn new(client: TranslationClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut TranslationClient {
        &mut self.client
    }

    /// Parse and run one command line
    pub async fn dispatch_line(&mut self, line: &str) -> String {
        match split_line(line) {
            Ok(words) => self.dispatch(words.as_slice()).await,
            Err(e) => e.to_string(),
        }
    }

    /// Parse and run one command given as words
    ///
    /// Never panics: a panic inside a handler becomes `CET Exception: ...`,
    /// or `CET Unknown Exception` when the payload carries no message.
    pub async fn dispatch<S: AsRef<str>>(&mut self, args: &[S]) -> String {
        let command = match Command::parse(args) {
            Ok(command) => command,
            Err(e) => {
                debug!(error = %e, "Rejected command");
                return e.to_string();
            }
        };

        match AssertUnwindSafe(self.execute(command)).catch_unwind().await {
            Ok(reply) => reply,
            Err(panic) => match panic_message(panic.as_ref()) {
                Some(message) => {
                    error!(%message, "Command handler panicked");
                    format!("CET Exception: {}", message)
                }
                None => {
                    error!("Command handler panicked with a non-string payload");
                    "CET Unknown Exception".to_string()
                }
            },
        }
    }

    /// Run an already parsed command
    pub async fn execute(&mut self, command: Command) -> String {
        match command {
            Command::Ping => "CET pong - translator communication active".to_string(),
            Command::Version => format!(
                "CET v{} - Chat Event Trigger with Translation",
                env!("CARGO_PKG_VERSION")
            ),
            Command::Status => self.status(),
            Command::InitTranslator { api_key } => match self.client.initialize(&api_key) {
                Ok(()) => "CET translator initialized successfully".to_string(),
                Err(e) => {
                    error!(error = %e, "Translator initialization failed");
                    "CET init_translator error: initialization failed".to_string()
                }
            },
            Command::Translate {
                text,
                from_lang,
                to_lang,
            } => self.translate(&text, &from_lang, &to_lang).await,
        }
    }

    fn status(&self) -> String {
        let readiness = if self.client.is_initialized() {
            "Ready"
        } else {
            "Not Ready"
        };
        format!(
            "CET Status: Active, Translator {} ({} transport, cache: {})",
            readiness,
            self.client.transport_name(),
            self.client.cache_stats()
        )
    }

    async fn translate(&mut self, text: &str, from_lang: &str, to_lang: &str) -> String {
        if !self.client.is_initialized() {
            return "CET translate error: translator not initialized".to_string();
        }
        if text.is_empty() {
            return "CET translate error: empty text provided".to_string();
        }

        match self.client.translate(text, from_lang, to_lang).await {
            Ok(translation) => {
                info!(from = from_lang, to = to_lang, "Translation delivered");
                translation
            }
            Err(e) => {
                error!(error = %e, "Translation failed");
                translate_error_reply(&e)
            }
        }
    }
}

/// Reply text for a failed translation
pub fn translate_error_reply(err: &TranslateError) -> String {
    format!("CET translate error: {}", err.label())
}

fn panic_message(panic: &(dyn Any + Send)) -> Option<String> {
    if let Some(message) = panic.downcast_ref::<&str>() {
        Some(message.to_string())
    } else {
        panic.downcast_ref::<String>().cloned()
    }
}
