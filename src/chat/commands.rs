//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending queries
//! to the service.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the service.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the local transcript.
    Clear,

    /// Log in as the given email; the password is prompted separately.
    Login(String),

    /// Log out and discard the stored token.
    Logout,

    /// Re-fetch persisted history into the transcript.
    History,

    /// Toggle streaming responses on or off.
    Stream(bool),

    /// Cancel the in-flight exchange.
    Cancel,

    /// Display session statistics (message count, session id, etc.).
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular query.
///
/// # Examples
///
/// ```
/// # use ragline::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/login alice@example.com").is_some());
/// assert!(parse_command("What is a frame?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "login" => match argument {
            Some(email) => ChatCommand::Login(email.to_string()),
            None => ChatCommand::Invalid("/login requires an email".to_string()),
        },
        "logout" => ChatCommand::Logout,
        "history" => ChatCommand::History,
        "stream" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Stream(value),
            None => ChatCommand::Invalid("/stream expects 'on' or 'off'".to_string()),
        },
        "cancel" => ChatCommand::Cancel,
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
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
  /login <email>         Log in (prompts for the password)
  /logout                Log out and discard the stored token
  /clear                 Clear the local transcript
  /history               Re-fetch persisted history for this session
  /stream on|off         Toggle streaming responses
  /cancel                Cancel the in-flight exchange
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
}
