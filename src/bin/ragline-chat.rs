//! Interactive chat application for a conversational RAG service.
//!
//! This binary provides a streaming REPL interface over a retrieval-augmented
//! generation backend.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage against a local service
//! ragline-chat
//!
//! # Point at a remote service and log in at startup
//! ragline-chat --url https://rag.example.com --email alice@example.com
//!
//! # Resume a named session without streaming
//! ragline-chat --session reviews --no-stream
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/login <email>` - Log in (prompts for the password)
//! - `/clear` - Clear the local transcript
//! - `/history` - Re-fetch persisted history
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use ragline::chat::{ChatArgs, ChatCommand, ChatConfig, ChatSession, help_text, parse_command};
use ragline::{AuthSession, FileTokenStore, RagClient, TokenStore};

const DEFAULT_URL: &str = "http://localhost:8000";

/// Main entry point for the ragline-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("ragline-chat [OPTIONS]");
    let url = args.url.clone().unwrap_or_else(|| DEFAULT_URL.to_string());
    let startup_email = args.email.clone();
    let config = ChatConfig::from(args);

    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(token_path()));
    let client = Arc::new(RagClient::new(url, tokens.clone())?);
    let auth = AuthSession::new(client.clone(), tokens);
    auth.install_guard();

    let session = Arc::new(ChatSession::new(client, auth, config));
    let mut rl = DefaultEditor::new()?;

    // Ctrl+C cancels the in-flight exchange rather than killing the process.
    let cancel_target = session.clone();
    ctrlc::set_handler(move || {
        cancel_target.cancel();
    })?;

    println!("RAG Chat (session: {})", session.session_id());
    println!("Type /help for commands, /quit to exit\n");

    if let Some(email) = startup_email {
        login(&session, &mut rl, &email).await;
    }
    if session.auth().is_authenticated() && session.hydrate().await {
        println!("Restored {} messages from history.", session.message_count());
    }

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            if session.clear() {
                                println!("Transcript cleared.");
                            } else {
                                println!("Cannot clear while a query is in flight.");
                            }
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Login(email) => {
                            login(&session, &mut rl, &email).await;
                        }
                        ChatCommand::Logout => {
                            session.auth().logout();
                            println!("Logged out.");
                        }
                        ChatCommand::History => {
                            if session.hydrate().await {
                                println!(
                                    "Restored {} messages from history.",
                                    session.message_count()
                                );
                            } else {
                                println!("No history restored.");
                            }
                        }
                        ChatCommand::Stream(streaming) => {
                            session.set_streaming(streaming);
                            if streaming {
                                println!("Streaming enabled.");
                            } else {
                                println!("Streaming disabled.");
                            }
                        }
                        ChatCommand::Cancel => {
                            session.cancel();
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            println!("{}", message);
                        }
                    }
                    continue;
                }

                // Regular query - send to the service
                println!("Assistant:");
                send_and_render(&session, line).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Input error: {}", err);
                break;
            }
        }
    }

    Ok(())
}

/// Where the bearer token persists between runs.
fn token_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".ragline")
        .join("token")
}

async fn login(session: &Arc<ChatSession>, rl: &mut DefaultEditor, email: &str) {
    let password = match rl.readline("Password: ") {
        Ok(password) => password,
        Err(_) => {
            println!("Login aborted.");
            return;
        }
    };
    if session.auth().login(email, password.trim()).await {
        match session.auth().current_user() {
            Some(user) => println!("Logged in as {}.", user.email),
            None => println!("Logged in."),
        }
    } else {
        println!("Login failed.");
    }
}

/// Drive one exchange, echoing assistant text as it lands in the transcript.
///
/// The send runs on its own task while this function tails the placeholder
/// message, so streamed chunks appear as they arrive. Placeholder text only
/// ever grows by appending while the exchange is live, so the printed byte
/// offset stays on a valid boundary.
async fn send_and_render(session: &Arc<ChatSession>, query: &str) {
    let handle = tokio::spawn({
        let session = session.clone();
        let query = query.to_string();
        async move { session.send(&query).await }
    });

    let mut printed = 0usize;
    while !handle.is_finished() {
        print_new_text(session, &mut printed);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    match handle.await {
        Ok(Ok(true)) => {
            print_new_text(session, &mut printed);
            println!();
        }
        Ok(Ok(false)) => {
            println!("(a query is already in flight)");
        }
        Ok(Err(err)) => {
            println!();
            eprintln!("Error: {}", err);
        }
        Err(_) => {
            println!();
        }
    }
}

fn print_new_text(session: &ChatSession, printed: &mut usize) {
    let messages = session.messages();
    if let Some(message) = messages.last().filter(|message| message.is_assistant())
        && message.text.len() > *printed
        && message.text.is_char_boundary(*printed)
    {
        print!("{}", &message.text[*printed..]);
        let _ = std::io::stdout().flush();
        *printed = message.text.len();
    }
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Session: {}", stats.session_id);
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Streaming: {}",
        if stats.streaming { "on" } else { "off" }
    );
    println!(
        "      Authenticated: {}",
        if stats.authenticated { "yes" } else { "no" }
    );
}
