//! Minimal chat runner for the Inkwell stream core.
//!
//! Streams one prompt against an Atelier backend and prints the reply as
//! it arrives. Ctrl+C cancels the stream; the partial reply printed so
//! far stays final.
//!
//! Usage: `inkwell [--url <base-url>] [--document] <prompt...>`

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use inkwell::atelier::AtelierClient;
use inkwell::models::{StreamKind, StreamRequest};
use inkwell::session::{SessionMessage, StreamCoordinator};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Stream a prompt
    Run {
        base_url: Option<String>,
        document: bool,
        prompt: String,
    },
}

/// Parse command-line arguments and return the command to execute.
fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut base_url = None;
    let mut document = false;
    let mut prompt_words: Vec<String> = Vec::new();

    let mut args = args.skip(1); // Skip the program name
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--document" => document = true,
            "--url" => base_url = args.next(),
            _ => prompt_words.push(arg),
        }
    }

    if prompt_words.is_empty() {
        return CliCommand::Help;
    }
    CliCommand::Run {
        base_url,
        document,
        prompt: prompt_words.join(" "),
    }
}

fn print_usage() {
    println!("inkwell {} - stream a prompt against an Atelier backend", VERSION);
    println!();
    println!("Usage: inkwell [--url <base-url>] [--document] <prompt...>");
    println!();
    println!("  --url <base-url>  Backend base URL (default: $INKWELL_API_URL or http://localhost:8000)");
    println!("  --document        Request a document-generation stream");
    println!("  --version         Show version");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("inkwell=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (base_url, document, prompt) = match parse_args(std::env::args()) {
        CliCommand::Version => {
            println!("inkwell {}", VERSION);
            return;
        }
        CliCommand::Help => {
            print_usage();
            return;
        }
        CliCommand::Run {
            base_url,
            document,
            prompt,
        } => (base_url, document, prompt),
    };

    let client = match base_url {
        Some(url) => AtelierClient::with_base_url(url),
        None => AtelierClient::new(),
    };

    let mut request = StreamRequest::new(prompt);
    if document {
        request = request.with_kind(StreamKind::Document);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut coordinator = StreamCoordinator::new(Arc::new(client), tx);
    let key = coordinator.start_stream(request);

    // Length of snapshot content already printed; snapshots are
    // append-only so the delta is always a suffix
    let mut printed = 0usize;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                eprintln!("cancelling...");
                coordinator.cancel(&key);
            }
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                match msg {
                    SessionMessage::MessageUpdate { snapshot, .. } => {
                        print!("{}", &snapshot.content[printed..]);
                        printed = snapshot.content.len();
                        use std::io::Write;
                        let _ = std::io::stdout().flush();
                    }
                    SessionMessage::DocumentUpdate { draft, .. } => {
                        if draft.is_complete {
                            eprintln!("[document draft complete: {} block(s)]", draft.blocks.len());
                        }
                    }
                    SessionMessage::Warning { error, .. } => {
                        eprintln!("warning: {}", error.user_message());
                    }
                    SessionMessage::Completed { snapshot, .. } => {
                        print!("{}", &snapshot.content[printed..]);
                        println!();
                        if !snapshot.suggestions.is_empty() {
                            eprintln!();
                            eprintln!("suggestions:");
                            for suggestion in &snapshot.suggestions {
                                eprintln!("  - {}", suggestion);
                            }
                        }
                        break;
                    }
                    SessionMessage::Failed { error, snapshot, .. } => {
                        if let Some(snapshot) = snapshot {
                            print!("{}", &snapshot.content[printed..]);
                            println!();
                        }
                        eprintln!("error: {}", error.user_message());
                        std::process::exit(1);
                    }
                    SessionMessage::Cancelled { snapshot, .. } => {
                        print!("{}", &snapshot.content[printed..]);
                        println!();
                        eprintln!("[stopped]");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        std::iter::once("inkwell".to_string())
            .chain(list.iter().map(|s| s.to_string()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse_args(args(&["--version"])), CliCommand::Version);
        assert_eq!(parse_args(args(&["-V"])), CliCommand::Version);
    }

    #[test]
    fn test_parse_help_when_no_prompt() {
        assert_eq!(parse_args(args(&[])), CliCommand::Help);
        assert_eq!(parse_args(args(&["--help"])), CliCommand::Help);
    }

    #[test]
    fn test_parse_prompt_words_joined() {
        assert_eq!(
            parse_args(args(&["draft", "an", "intro"])),
            CliCommand::Run {
                base_url: None,
                document: false,
                prompt: "draft an intro".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_url_and_document_flags() {
        assert_eq!(
            parse_args(args(&["--url", "http://10.0.0.5:8000", "--document", "hello"])),
            CliCommand::Run {
                base_url: Some("http://10.0.0.5:8000".to_string()),
                document: true,
                prompt: "hello".to_string(),
            }
        );
    }
}
