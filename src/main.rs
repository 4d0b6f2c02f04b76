use std::path::PathBuf;
use std::time::Duration;

use anyhow::ensure;
use clap::Parser;
use log::{error, info, warn};
use tokio::sync::broadcast;

mod config;
mod devices;
mod error;
mod messages;
mod monitor;
mod mqtt;
mod notifier;
mod relay;
mod source;
#[cfg(test)]
mod testing;
mod tracker;

const EVENT_LOOP_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Publishes the devices seen on the local network segment to MQTT.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Seconds between scans, overriding `scan.interval_seconds`
    #[arg(short, long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let config = config::AppConfig::load(&args.config)?;
    let scan = config.scan();
    let interval = args
        .interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| scan.interval());
    ensure!(!interval.is_zero(), "scan interval must be positive");

    let (mqtt_client, mut eventloop) = mqtt::MqttClient::connect(&config.mqtt).await?;

    let (tx, rx) = broadcast::channel(10);
    let bus = mqtt_client.clone();
    let mut event_loop_handle = tokio::task::spawn(async move {
        bus.event_loop(&mut eventloop, tx).await;
    });

    let notifier = notifier::Notifier::new(mqtt_client.clone(), mqtt_client.topics().clone());
    let relay_notifier = notifier.clone();
    let relay_handle = tokio::task::spawn(async move {
        relay::AnnouncementRelay::new(rx, relay_notifier).run().await;
    });

    info!(
        "Scanning every {:?}, publishing on {}",
        interval,
        mqtt_client.topics().device
    );
    let core = monitor::Monitor::new(source::CommandSource::new(&scan), notifier, interval);
    let result = core.run_loop(shutdown_signal()).await;
    if let Err(err) = &result {
        error!("Monitor loop stopped: {}", err);
    }

    // The broker connection is released whether or not the loop failed.
    if let Err(err) = mqtt_client.disconnect().await {
        warn!("Error disconnecting from MQTT broker: {}", err);
    }
    if tokio::time::timeout(EVENT_LOOP_SHUTDOWN_GRACE, &mut event_loop_handle)
        .await
        .is_err()
    {
        warn!("MQTT event loop did not stop in time");
        event_loop_handle.abort();
    }
    relay_handle.abort();
    info!("Exiting");

    result?;
    Ok(())
}

fn init_logging() {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
}
