// lol-toolkit - runs the League client automations until Ctrl-C

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lol_toolkit_lib::config::Config;
use lol_toolkit_lib::events::{ChannelSink, EventSink, TracingSink};
use lol_toolkit_lib::lcu::{spawn_health_monitor, ConnectionHealth, ConnectionLocator, LcuClient, SystemProcessInspector};
use lol_toolkit_lib::riot::{RateLimiter, RiotClient};
use lol_toolkit_lib::services::{AutoAcceptEngine, AutoPickEngine};

const USAGE: &str = "usage: lol-toolkit [--config <path>] [--status | --lookup <gameName#tagLine>]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    status: bool,
    lookup: Option<String>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().ok_or_else(|| anyhow::anyhow!("--config needs a path\n{}", USAGE))?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--status" => parsed.status = true,
                "--lookup" => {
                    let id = args.next().ok_or_else(|| anyhow::anyhow!("--lookup needs a Riot ID\n{}", USAGE))?;
                    parsed.lookup = Some(id);
                }
                other => match other.strip_prefix("--config=") {
                    Some(path) => parsed.config = Some(PathBuf::from(path)),
                    None => anyhow::bail!("unknown argument {}\n{}", other, USAGE),
                },
            }
        }
        Ok(parsed)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lol_toolkit=info,lol_toolkit_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = Config::load(args.config.as_deref())?;
    tracing::info!(region = %config.region, api_key = config.has_api_key(), "config loaded");

    if let Some(riot_id) = &args.lookup {
        return lookup(&config, riot_id).await;
    }

    let (channel, mut events) = ChannelSink::new();
    let sink: Arc<dyn EventSink> = Arc::new(channel);

    let locator = Arc::new(ConnectionLocator::with_ttl(
        Arc::new(SystemProcessInspector),
        config.tuning.connection_ttl(),
    ));
    let health = Arc::new(ConnectionHealth::with_sink(sink.clone()));
    let client = Arc::new(
        LcuClient::with_timeout(locator, health.clone(), config.tuning.request_timeout())?.with_sink(sink.clone()),
    );

    if args.status {
        return status(&client).await;
    }

    let shutdown = CancellationToken::new();
    let monitor = spawn_health_monitor(client.clone(), config.tuning.health_check(), shutdown.clone());

    let auto_accept = Arc::new(
        AutoAcceptEngine::new(client.clone(), health.clone())
            .with_intervals(config.tuning.poll_intervals())
            .with_sink(sink.clone()),
    );
    if config.auto_accept.enabled {
        auto_accept.start();
    }

    let auto_pick = Arc::new(
        AutoPickEngine::new(client.clone(), health.clone())
            .with_interval(config.tuning.pick_interval())
            .with_accept_cooldown(config.tuning.accept_cooldown()),
    );
    if config.auto_pick.enabled {
        auto_pick.apply_settings(config.auto_pick_settings());
        if let Some(name) = &config.auto_pick.champion {
            // The client may not be up yet, so resolve on the engine's own cycle
            auto_pick.set_champion_name(name);
        }
        auto_pick.start();
    }

    if !config.auto_accept.enabled && !config.auto_pick.enabled {
        tracing::info!("no automation enabled, only watching the connection");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                }
                break;
            }
            Some(event) = events.recv() => TracingSink.notify(event),
        }
    }

    tracing::info!("shutting down");
    shutdown.cancel();
    auto_accept.stop().await;
    auto_pick.stop().await;
    let _ = monitor.await;
    Ok(())
}

/// One health check plus the signed-in summoner, printed as JSON.
async fn status(client: &LcuClient) -> anyhow::Result<()> {
    let status = client.check_connection().await;
    let summoner = if status.connected {
        match client.current_summoner().await {
            Ok(summoner) => Some(summoner.riot_display_name()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read current summoner");
                None
            }
        }
    } else {
        None
    };

    let report = serde_json::json!({ "status": status, "summoner": summoner });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Profile, ranked entries and top masteries for a Riot ID.
async fn lookup(config: &Config, riot_id: &str) -> anyhow::Result<()> {
    if !config.has_api_key() {
        anyhow::bail!("no Riot API key, set riot_api_key in config.json or RIOT_API_KEY");
    }

    let limiter = Arc::new(RateLimiter::new());
    let client = RiotClient::new(&config.riot_api_key, &config.region, limiter.clone())?
        .with_sink(Arc::new(TracingSink));

    let profile = client.search_by_riot_id(riot_id).await?;
    let ranked = client.league_entries(&profile.puuid).await?;
    let masteries = client.top_masteries(&profile.puuid, 5).await?;

    let report = serde_json::json!({
        "profile": profile,
        "ranked": ranked,
        "masteries": masteries,
        "rateLimit": limiter.status(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
