use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use tldrbot_common::Error;
use tldrbot_common::models::{BotConfig, ChannelRef};
use tldrbot_core::cache::ScoringWindow;
use tldrbot_core::platforms::SlackClient;
use tldrbot_core::services::strategies::strategies_from_config;
use tldrbot_core::services::{
    ChannelScraper, NoopCallback, NotificationCallback, NotificationTarget, OutboundNotice,
    ScraperConfig, SlackNoticeCallback,
};
use tldrbot_core::tasks::{spawn_notice_dispatcher, spawn_scrape_task};
use tldrbot_core::utils::{Clock, SystemClock};

#[derive(Parser, Debug, Clone)]
#[command(name = "tldrbot")]
#[command(author, version, about = "tldrbot - watches Slack channels and pings you about the messages worth reading")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, short = 'c', default_value = "tldrbot.json")]
    config: PathBuf,

    /// Score and log messages without posting any notices
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// How often each poll loop wakes up to check its interval, in milliseconds
    #[arg(long, default_value = "1000")]
    tick_ms: u64,

    /// Override the Slack API base URL
    #[arg(long)]
    api_base: Option<String>,
}

fn init_tracing() {
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records into tracing: {}", e);
    }
    let filter = EnvFilter::from_default_env()
        .add_directive("tldrbot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!("tldrbot starting. config={}, dry_run={}", args.config.display(), args.dry_run);

    if let Err(e) = run(args).await {
        error!("tldrbot error: {}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

/// Reads the config file, applies CLI overrides, then validates once.
fn load_config(args: &Args) -> Result<BotConfig, Error> {
    let mut config = BotConfig::read_path(&args.config)?;
    if args.dry_run {
        config.dry_run = true;
    }
    config.validate()?;
    Ok(config)
}

/// Picks the callback for one channel's window: queue Slack notices, or
/// nothing at all on a dry run.
fn notice_callback(
    config: &BotConfig,
    channel: &ChannelRef,
    outbound: &mpsc::UnboundedSender<OutboundNotice>,
) -> Arc<dyn NotificationCallback> {
    match (&config.notify_destination, config.dry_run) {
        (Some(destination), false) => Arc::new(SlackNoticeCallback::new(
            NotificationTarget::new(destination, &channel.id, &channel.name),
            outbound.clone(),
        )),
        _ => Arc::new(NoopCallback),
    }
}

async fn run(args: Args) -> Result<(), Error> {
    // 1) Load and check configuration before touching the network
    let config = load_config(&args)?;

    let token = std::env::var("SLACK_TOKEN")
        .map_err(|_| Error::Config("SLACK_TOKEN is not set".into()))?;
    let client = match &args.api_base {
        Some(base) => SlackClient::with_base_url(&token, base)?,
        None => SlackClient::new(&token)?,
    };
    let slack = Arc::new(client.with_timeout(Duration::from_secs(config.fetch_timeout_seconds))?);

    // 2) Outbound notices go through a single dispatcher task
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let dispatcher = spawn_notice_dispatcher(slack.clone(), notice_rx);

    // 3) One independent poll loop per channel
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let tick = Duration::from_millis(args.tick_ms.max(1));

    let mut loops: Vec<JoinHandle<Result<(), Error>>> = Vec::new();
    for channel in config.channel_refs() {
        let callback = notice_callback(&config, &channel, &notice_tx);
        let window = ScoringWindow::new(config.threshold, config.max_length).with_callbacks(vec![callback]);
        let strategies = strategies_from_config(&config, clock.clone());
        info!(
            "Watching {} ({}) with {} strateg(ies)",
            channel,
            channel.id,
            strategies.len()
        );

        let scraper = ChannelScraper::new(
            channel,
            slack.clone(),
            window,
            strategies,
            clock.clone(),
            ScraperConfig::from_bot_config(&config, clock.now()),
        );
        loops.push(spawn_scrape_task(scraper, tick, shutdown_rx.clone()));
    }
    // only the callbacks keep the queue open now
    drop(notice_tx);

    // 4) Handle Ctrl-C to signal shutdown
    let _ctrlc_handle = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
            return;
        }
        info!("Ctrl-C detected; stopping poll loops...");
        let _ = shutdown_tx.send(true);
    });

    // 5) Wait for every loop; a fatal error in one does not stop the others
    let mut first_fatal = None;
    for handle in loops {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Poll loop ended with error: {}", e);
                first_fatal.get_or_insert(e);
            }
            Err(e) => warn!("Poll loop task failed: {:?}", e),
        }
    }

    if let Err(e) = dispatcher.await {
        warn!("Notice dispatcher task failed: {:?}", e);
    }

    match first_fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
