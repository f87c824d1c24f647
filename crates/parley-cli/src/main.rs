//! parley - conversation CLI over a streaming inference backend

mod config;

use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use parley_chat::{ChatService, ChunkPublisher, MemoryStore, SendOptions};

/// Conversation id for the CLI's single in-process session
const CONVERSATION_ID: i64 = 1;

/// parley - chat with a configured inference backend
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend profile to use (default: the config's default_profile)
    #[arg(short, long)]
    profile: Option<String>,

    /// Run in non-interactive mode with a single message
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// List configured profiles
    #[arg(long)]
    profiles: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Publisher that prints streamed chunks to stdout as they arrive
struct StdoutPublisher;

#[async_trait::async_trait]
impl ChunkPublisher for StdoutPublisher {
    async fn publish(&self, _conversation_id: i64, chunk: &str) {
        print!("{chunk}");
        let _ = std::io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("parley=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::EXAMPLE_CONFIG);
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load()?;

    if args.profiles {
        let router = cfg.router();
        let mut keys: Vec<&str> = router.keys().collect();
        keys.sort_unstable();
        for key in keys {
            let profile = router.resolve(key)?;
            let marker = if key == cfg.default_profile { "*" } else { " " };
            println!(
                "{marker} {key}: {} ({}, streaming: {})",
                profile.model, profile.endpoint, profile.streaming
            );
        }
        return Ok(());
    }

    // Config key wins; otherwise the client reads PARLEY_API_KEY itself.
    let client = match cfg.api_key.clone() {
        Some(key) => parley_ai::InferenceClient::new(key),
        None => match parley_ai::InferenceClient::from_env() {
            Ok(client) => client,
            Err(e) => {
                eprintln!("{e}; set api_key in the config file instead.");
                std::process::exit(1);
            }
        },
    };

    let router = cfg.router();
    let profile_key = args.profile.unwrap_or_else(|| cfg.default_profile.clone());
    // Fail on a bad profile key at startup, not mid-conversation.
    let profile = router.resolve(&profile_key)?;
    let streaming = profile.streaming;

    let service = ChatService::new(
        router,
        Arc::new(client),
        Arc::new(MemoryStore::new()),
        Arc::new(StdoutPublisher),
        profile_key.clone(),
    );

    let options = SendOptions {
        profile_key: Some(profile_key),
        rules: cfg.rules.clone(),
    };

    if let Some(message) = args.command {
        return send_once(&service, &options, &message, streaming).await;
    }

    run_interactive(&service, &options, streaming).await
}

async fn send_once(
    service: &ChatService,
    options: &SendOptions,
    message: &str,
    streaming: bool,
) -> anyhow::Result<()> {
    match service
        .send_turn_with(
            CONVERSATION_ID,
            message,
            vec![],
            options,
            None,
            CancellationToken::new(),
        )
        .await
    {
        Ok(reply) => {
            if streaming {
                // The publisher already printed the chunks.
                println!();
            } else {
                println!("{}", reply.text);
            }
        }
        Err(e) => {
            eprintln!("Your message was saved, but no reply was generated: {e}");
        }
    }
    Ok(())
}

async fn run_interactive(
    service: &ChatService,
    options: &SendOptions,
    streaming: bool,
) -> anyhow::Result<()> {
    println!("parley (Ctrl-D to exit)");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        send_once(service, options, message, streaming).await?;
    }
    Ok(())
}
