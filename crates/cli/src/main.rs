use clap::{Parser, Subcommand};
use relay::channels::{ChannelHandle, ChatwootChannel};
use relay::config::RelayConfig;
use relay::llm::OllamaClient;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatwoot-relay")]
#[command(about = "Answer Chatwoot conversations with a local Ollama model", long_about = None)]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook relay (POST /webhook). Reads CHATWOOT_BASE_URL, CHATWOOT_API_TOKEN, CHATWOOT_ACCOUNT_ID and MISTRAL_ENDPOINT from the environment.
    Serve {
        /// Listen port (default from PORT or 10000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Check the inference endpoint: list models and send one prompt.
    Probe {
        /// Prompt to send
        #[arg(long, default_value = "Hello!")]
        prompt: String,
    },

    /// Post one outgoing message into a Chatwoot conversation.
    Send {
        /// Conversation id
        #[arg(long, short)]
        conversation: String,

        /// Message text
        #[arg(long, short, default_value = "This is a test message from chatwoot-relay.")]
        message: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let env_loaded = load_env_file(cli.env_file.as_deref());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match env_loaded {
        Ok(p) => log::debug!("loaded environment from {}", p.display()),
        Err(e) if cli.env_file.is_some() => log::warn!("could not load env file: {}", e),
        Err(_) => {}
    }

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("chatwoot-relay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Serve { port }) => run_serve(port).await,
        Some(Commands::Probe { prompt }) => run_probe(&prompt).await,
        Some(Commands::Send {
            conversation,
            message,
        }) => run_send(&conversation, &message).await,
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Values already in the process environment win over the file.
fn load_env_file(path: Option<&std::path::Path>) -> Result<PathBuf, dotenvy::Error> {
    match path {
        Some(p) => dotenvy::from_path(p).map(|_| p.to_path_buf()),
        None => dotenvy::dotenv(),
    }
}

fn load_config() -> anyhow::Result<RelayConfig> {
    Ok(RelayConfig::from_env()?)
}

async fn run_serve(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting relay on {}", config.listen_addr());
    relay::gateway::run_gateway(config).await
}

async fn run_probe(prompt: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let client = OllamaClient::new(&config.inference)?;
    println!("inference endpoint: {}", config.inference.endpoint);

    let models = client.list_models().await?;
    println!("available models:");
    for m in &models {
        match m.size {
            Some(bytes) => println!("  {} ({:.1} GB)", m.name, bytes as f64 / 1e9),
            None => println!("  {}", m.name),
        }
    }
    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    let wanted = client.model();
    let present = names
        .iter()
        .any(|n| *n == wanted || n.split(':').next() == Some(wanted));
    if !present {
        log::warn!("model {} not found on the server (try `ollama pull {}`)", wanted, wanted);
    }

    let reply = client.try_generate(prompt).await?;
    println!("> {}", prompt);
    println!("< {}", reply.into_text().trim());
    Ok(())
}

async fn run_send(conversation: &str, message: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let channel = ChatwootChannel::new(&config.chatwoot)?;
    println!("posting to {}", channel.messages_url(conversation));
    channel.send_message(conversation, message).await?;
    println!("message sent");
    Ok(())
}
