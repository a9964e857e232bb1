use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "embedchat")]
#[command(about = "embedchat - embeddable chat widget client", long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: SettingsArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags that take priority over the environment and the settings file.
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Settings file (defaults to ~/.config/embedchat/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Chat endpoint URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Client identifier of the chatbot
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the embed script tag for a client id
    Snippet {
        /// Override the script src
        #[arg(long)]
        script_src: Option<String>,
    },
    /// Inject the widget into an HTML page that carries the embed script tag
    Embed {
        /// Page to read
        page: PathBuf,
        /// Where to write the result (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the durable visitor identity for the endpoint origin
    Identity {
        /// Origin to resolve the identity for (defaults to the endpoint origin)
        #[arg(long)]
        origin: Option<String>,
    },
    /// Chat with the bot in the terminal
    Chat {
        /// Preview mode: no visitor identity, nothing persisted server-side
        #[arg(long)]
        preview: bool,
        /// JSON file with a data grid to answer from (preview mode)
        #[arg(long, requires = "preview")]
        context: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = commands::load_settings(&cli.overrides)?;

    match cli.command {
        Commands::Snippet { script_src } => commands::snippet::run(&settings, script_src)?,
        Commands::Embed { page, output } => commands::embed::run(settings, &page, output).await?,
        Commands::Identity { origin } => commands::identity::run(&settings, origin)?,
        Commands::Chat { preview, context } => commands::chat::run(settings, preview, context).await?,
    }

    Ok(())
}
