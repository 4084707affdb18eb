//! CLI entry point for quill.

use clap::{Parser, Subcommand};

/// Quill diary & planning agent
#[derive(Parser, Debug)]
#[command(name = "quill", version, about = "Quill — streaming diary & planning agent")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one agent request and stream the reply
    Chat(ChatArgs),
    /// List the tools offered to the model
    Tools,
    /// Serve `POST /agent` over HTTP
    #[cfg(feature = "server")]
    Serve(ServeArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Model override (defaults to the configured model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Upper bound on streaming rounds
    #[arg(long)]
    pub max_rounds: Option<usize>,

    /// Print wire frames instead of rendered blocks
    #[arg(long)]
    pub raw: bool,

    /// User prompt (positional)
    pub prompt: String,
}

/// Arguments for the `serve` subcommand.
#[cfg(feature = "server")]
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub addr: std::net::SocketAddr,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
