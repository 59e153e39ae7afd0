mod commands;
mod gateway;

use banter_channels::telegram::TelegramChannel;
use banter_core::{config, context::Context, traits::Provider};
use banter_providers::{OpenAiProvider, ReplicateBackend};
use banter_store::Store;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "banter", version, about = "Banter — group-chat AI companion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Check configuration and backend availability.
    Status,
    /// Send a one-shot message to the model (no history, no store).
    Ask {
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            if cfg.telegram.bot_token.is_empty() {
                anyhow::bail!(
                    "telegram bot_token is empty. Set it in {} under [telegram].",
                    cli.config
                );
            }

            let provider = build_provider(&cfg);
            if !provider.is_available().await {
                anyhow::bail!("provider '{}' is not available", provider.name());
            }

            let channel = Arc::new(TelegramChannel::new(&cfg.telegram));
            let store = Store::new(&cfg.store).await?;
            let image = build_image_backend(&cfg);

            println!("Banter — starting bot...");
            let gw = Arc::new(gateway::Gateway::new(provider, channel, store, image, &cfg));
            gw.run().await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("Banter — status check\n");
            println!("Config: {}", cli.config);
            println!("Model: {}", cfg.openai.model);
            println!();

            let provider = build_provider(&cfg);
            println!(
                "  openai: {}",
                if provider.is_available().await {
                    "available"
                } else {
                    "not available"
                }
            );
            println!(
                "  telegram: {}",
                if cfg.telegram.bot_token.is_empty() {
                    "missing bot_token"
                } else {
                    "configured"
                }
            );
            println!(
                "  image: {}",
                if !cfg.image.enabled {
                    "disabled"
                } else if cfg.image.api_token.is_empty() {
                    "enabled but missing api_token"
                } else {
                    "configured"
                }
            );
        }
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: banter ask <message>");
            }

            let prompt = message.join(" ");
            let cfg = config::load(&cli.config)?;
            let provider = build_provider(&cfg);

            if !provider.is_available().await {
                anyhow::bail!(
                    "provider '{}' is not available. Is the API key set?",
                    provider.name()
                );
            }

            let context = Context::new(&prompt);
            let response = provider.complete(&context).await?;
            println!("{response}");
        }
    }

    Ok(())
}

/// Build the language-model provider.
fn build_provider(cfg: &config::Config) -> Arc<dyn Provider> {
    Arc::new(OpenAiProvider::from_config(
        cfg.openai.base_url.clone(),
        cfg.openai.api_key.clone(),
        cfg.openai.model.clone(),
    ))
}

/// Build the image backend, if enabled and configured.
fn build_image_backend(cfg: &config::Config) -> Option<Arc<dyn banter_core::traits::ImageBackend>> {
    if !cfg.image.enabled {
        return None;
    }
    if cfg.image.api_token.is_empty() {
        tracing::warn!("image generation enabled but api_token is empty; disabling");
        return None;
    }
    Some(Arc::new(ReplicateBackend::from_config(
        cfg.image.api_token.clone(),
        cfg.image.model.clone(),
    )))
}
