//! rugwatch - New coin screener and alerter for Rugplay
//!
//! Polls freshly listed coins, filters them and pushes alerts.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{fmt, EnvFilter};

use rugwatch::adapters::cli::{self, Command, InteractiveCmd, ScanCmd, WatchCmd};
use rugwatch::adapters::{Console, GroqRanker, LogSink, NtfyNotifier, RugplayClient};
use rugwatch::application::{
    render_reply, AlertDispatcher, HeldPositionMonitor, ScanScheduler, ScanService,
    ScheduleSettings,
};
use rugwatch::config::{load_config, Config};
use rugwatch::ports::{AlertSink, MarketDataPort};
use rugwatch::strategy::CandidateFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in the config file)
    dotenvy::dotenv().ok();

    let app = cli::init();

    match app.command {
        Command::Watch(cmd) => watch_command(cmd, app.verbose, app.debug).await,
        Command::Interactive(cmd) => interactive_command(cmd, app.verbose, app.debug).await,
        Command::Scan(cmd) => scan_command(cmd, app.verbose, app.debug).await,
    }
}

/// Flags win over the config level; RUST_LOG wins over both
fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config_level
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}

fn load(path: &std::path::Path, verbose: bool, debug: bool) -> Result<Config> {
    let config = load_config(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    init_logging(verbose, debug, &config.logging.level)?;
    tracing::info!("Config: {}", path.display());
    Ok(config)
}

fn build_market(config: &Config) -> Result<Arc<dyn MarketDataPort>> {
    let keys = Arc::new(config.key_rotator()?);
    tracing::info!("Using {} API keys in rotation", keys.len());

    let client = RugplayClient::new(config.rugplay_config(), keys)
        .context("Failed to create Rugplay client")?;
    Ok(Arc::new(client))
}

fn build_sink(config: &Config) -> Result<Arc<dyn AlertSink>> {
    match config.ntfy_config() {
        Some(ntfy) => {
            tracing::info!("Alerts go to ntfy topic '{}'", ntfy.topic);
            let notifier = NtfyNotifier::new(ntfy).context("Failed to create ntfy notifier")?;
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::warn!("No ntfy topic configured - alerts will only be logged");
            Ok(Arc::new(LogSink))
        }
    }
}

fn build_scan_service(config: &Config, market: Arc<dyn MarketDataPort>) -> Result<ScanService> {
    let ranker = GroqRanker::new(config.groq_config())
        .context("Ranking service is not configured (set GROQ_API_KEY or ranking.api_key)")?;

    Ok(ScanService::new(market, Arc::new(ranker), config.profiles.interactive.clone())
        .with_timeframe(config.market.timeframe.clone())
        .with_holder_limit(config.market.holder_limit))
}

async fn watch_command(cmd: WatchCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug)?;
    tracing::info!("Starting rugwatch scanner...");

    let market = build_market(&config)?;
    let dispatcher = AlertDispatcher::new(build_sink(&config)?);

    let filter = CandidateFilter::new(market.clone(), config.profiles.unattended.clone())
        .with_timeframe(config.market.timeframe.clone())
        .with_holder_limit(config.market.holder_limit);

    if config.watch.symbols.is_empty() {
        tracing::info!("No held positions to watch");
    } else {
        tracing::info!("Watching held positions: {}", config.watch.symbols.join(", "));
    }
    let monitor = HeldPositionMonitor::new(
        market.clone(),
        dispatcher.clone(),
        config.watch.symbols.clone(),
    )
    .with_holder_limit(config.market.holder_limit);

    let scheduler = ScanScheduler::new(
        market,
        filter,
        monitor,
        dispatcher,
        ScheduleSettings::from(&config),
    );

    // Setup Ctrl+C handler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        shutdown_tx.send(true).ok();
    });

    scheduler.run(shutdown_rx).await;
    tracing::info!("rugwatch stopped");
    Ok(())
}

async fn interactive_command(cmd: InteractiveCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug)?;
    let market = build_market(&config)?;
    let console = Console::new(Arc::new(build_scan_service(&config, market)?));

    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            println!("{}\n", reply);
        }
    });

    println!("rugwatch console - type !help for commands, Ctrl+D to exit");

    // Ctrl+C keeps its default behaviour here; end of input stops the console
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    console
        .serve(stdin, reply_tx, shutdown_rx)
        .await
        .context("Failed to read commands")?;

    printer.await.context("Reply printer failed")?;
    Ok(())
}

async fn scan_command(cmd: ScanCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug)?;
    let market = build_market(&config)?;
    let service = build_scan_service(&config, market)?;

    let params = cmd.params();
    println!("{}", rugwatch::application::acknowledgement(&params));

    let result = service.run(params).await;
    println!("{}", render_reply(&result));
    result.map(|_| ()).context("Scan failed")
}
