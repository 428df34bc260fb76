use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use farmchat::{ChatController, Commands, Container, ContainerConfig, DisplayIdPolicy, Router};

#[derive(Parser)]
#[command(name = "farmchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Answer from an offline scripted farmer instead of the hosted model
    #[arg(long, global = true)]
    mock: bool,

    /// Assign display identities the way the legacy web UI did
    #[arg(long, global = true)]
    legacy_display_ids: bool,

    /// Model identifier, overrides OPENAI_MODEL
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let display_ids = if cli.legacy_display_ids {
        DisplayIdPolicy::Legacy
    } else {
        DisplayIdPolicy::Sequential
    };

    let container = Container::new(ContainerConfig {
        mock: cli.mock,
        display_ids,
        model: cli.model,
    })?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            info!("Starting interactive chat");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            ChatController::new(&container)
                .run(stdin, std::io::stdout())
                .await?;
        }
        command => {
            let router = Router::new(&container);
            let output = router.route(command).await?;
            println!("{}", output);
        }
    }

    Ok(())
}
