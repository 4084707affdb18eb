//! Quill CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use futures::StreamExt;
use quill::agent::Orchestrator;
use quill::cli::{ChatArgs, Cli, Commands};
use quill::config::QuillConfig;
use quill::tools::ToolRegistry;
use quill::types::{Message, StreamEvent};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quill=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    let result = match cli.command {
        Commands::Chat(args) => handle_chat(args).await,
        Commands::Tools => handle_tools(),
        #[cfg(feature = "server")]
        Commands::Serve(args) => handle_serve(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_chat(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = QuillConfig::load()?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(rounds) = args.max_rounds {
        config = config.with_max_rounds(rounds);
    }
    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    let history = vec![Message::user(args.prompt)];

    if args.raw {
        let mut frames = orchestrator.stream(history);
        let mut stdout = std::io::stdout();
        while let Some(frame) = frames.next().await {
            stdout.write_all(&frame)?;
            stdout.flush()?;
        }
        return Ok(());
    }

    let (tx, rx) = mpsc::channel(64);
    let run = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.run(history, tx, CancellationToken::new()).await }
    });

    let mut events = ReceiverStream::new(rx);
    let mut last_kind = "";
    while let Some(event) = events.next().await {
        match &event {
            StreamEvent::Thinking { content, .. } => {
                if last_kind != "thinking" {
                    eprint!("\n[thinking] ");
                }
                eprint!("{content}");
                last_kind = "thinking";
            }
            StreamEvent::Text { content, .. } => {
                if last_kind == "thinking" {
                    eprintln!();
                }
                print!("{content}");
                std::io::stdout().flush()?;
                last_kind = "text";
            }
            StreamEvent::ToolStart { label, args, .. } => {
                eprintln!("\n⚡ {label} {args}");
                last_kind = "tool";
            }
            StreamEvent::ToolResult { label, result, .. } => {
                eprintln!("── {label} ──\n{result}\n");
                last_kind = "tool";
            }
            StreamEvent::Error { message } => {
                eprintln!("\n❌ {message}");
            }
            StreamEvent::Done => break,
        }
    }
    println!();

    let run = run.await?;
    tracing::debug!(rounds = run.rounds, termination = ?run.termination, "chat finished");
    Ok(())
}

fn handle_tools() -> Result<(), Box<dyn std::error::Error>> {
    let registry = ToolRegistry::with_defaults();
    for tool in registry.definitions() {
        println!("{:<16} {}", tool.name, tool.description);
    }
    Ok(())
}

#[cfg(feature = "server")]
async fn handle_serve(args: quill::cli::ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = QuillConfig::load()?;
    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    quill::server::serve(args.addr, orchestrator).await?;
    Ok(())
}
