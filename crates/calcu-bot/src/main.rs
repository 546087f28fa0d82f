use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing::{info, warn};

use calcu_core::CalcuConfig;
use calcu_discord::DiscordAdapter;
use calcu_engine::SessionContext;

#[derive(Parser, Debug)]
#[command(name = "calcu-bot", version, about = "Discord calculator bot")]
struct Cli {
    /// Path to calcu.toml (defaults to ~/.calcu/calcu.toml)
    #[arg(long, env = "CALCU_CONFIG")]
    config: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "calcu_bot=info,calcu_engine=info,calcu_discord=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // --check must fail loudly; a normal start falls back to defaults.
    let config = match CalcuConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.check => return Err(e).context("invalid configuration"),
        Err(e) => {
            warn!(code = e.code(), "Config load failed ({}), using defaults", e);
            CalcuConfig::default()
        }
    };

    let token = config
        .discord
        .token()
        .context("set discord.bot_token, discord.bot_token_file or CALCU_DISCORD__BOT_TOKEN")?;

    if cli.check {
        info!("configuration OK");
        return Ok(());
    }

    let session = Arc::new(SessionContext::new(config.engine.session_capacity));
    info!(
        capacity = config.engine.session_capacity,
        trigger_channel = %config.discord.trigger_channel,
        "starting calcu"
    );

    DiscordAdapter::new(&config, token, session)?.run().await;
    Ok(())
}
