//! SolarLink Cloud Service
//!
//! Consumes solar controller telemetry over MQTT, tracks pairing codes and
//! live status in memory, and keeps durable ownership state in SQLite.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use solarlink_cloud::ingest::TelemetryIngestor;
use solarlink_cloud::state::{PairingLedger, StatusCache};
use solarlink_cloud::storage::CloudDatabase;
use solarlink_cloud::sweeper::{spawn_retention_purge, spawn_staleness_sweep};
use solarlink_cloud::transport::{self, MqttConfig};

#[derive(Parser, Debug)]
#[command(name = "solarlink-cloud")]
#[command(
    version,
    about = "SolarLink cloud service - device pairing, telemetry ingest, and access control"
)]
struct Args {
    /// MQTT broker host.
    #[arg(long, env = "SOLARLINK_MQTT_HOST", default_value = "localhost")]
    mqtt_host: String,

    /// MQTT broker port.
    #[arg(long, env = "SOLARLINK_MQTT_PORT", default_value_t = 1883)]
    mqtt_port: u16,

    /// MQTT username.
    #[arg(long, env = "SOLARLINK_MQTT_USER")]
    mqtt_user: Option<String>,

    /// MQTT password.
    #[arg(long, env = "SOLARLINK_MQTT_PASSWORD")]
    mqtt_password: Option<String>,

    /// Topic namespace devices publish under.
    #[arg(long, default_value = "solar")]
    namespace: String,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Staleness sweep interval in seconds.
    #[arg(long, default_value_t = 5)]
    sweep_interval: u64,

    /// Seconds without telemetry before a device is marked offline.
    #[arg(long, default_value_t = 30)]
    offline_threshold: i64,

    /// History purge interval in seconds.
    #[arg(long, default_value_t = 86_400)]
    purge_interval: u64,

    /// History retention window in days.
    #[arg(long, default_value_t = 30)]
    retention_days: i64,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    solarlink_core::tracing_init::init_tracing("solarlink_cloud=info", args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        broker = %format!("{}:{}", args.mqtt_host, args.mqtt_port),
        namespace = %args.namespace,
        "Starting solarlink-cloud"
    );

    let db = match &args.db_path {
        Some(path) => {
            info!(path = %path.display(), "Opening cloud database");
            CloudDatabase::open(path).await?
        }
        None => {
            let default_path = default_db_path()?;
            info!(path = %default_path.display(), "Opening cloud database (default path)");
            CloudDatabase::open(&default_path).await?
        }
    };

    let statuses = StatusCache::new();
    let codes = PairingLedger::new();

    let (inbound_tx, inbound_rx) = mpsc::channel(256);
    let mqtt_config = MqttConfig {
        host: args.mqtt_host,
        port: args.mqtt_port,
        username: args.mqtt_user,
        password: args.mqtt_password,
        client_id: format!("solarlink-cloud-{}", uuid::Uuid::new_v4()),
    };
    // The sink feeds `CommandDispatcher` in the embedding API layer; this
    // binary only runs the ingest and maintenance halves.
    let (_sink, mqtt_pump) = transport::connect(&mqtt_config, args.namespace.clone(), inbound_tx);

    let ingestor = TelemetryIngestor::new(args.namespace, statuses.clone(), codes, db.clone());
    let ingest_task = tokio::spawn(ingestor.run(inbound_rx));

    let _staleness = spawn_staleness_sweep(
        statuses,
        Duration::from_secs(args.sweep_interval),
        args.offline_threshold,
    );
    let _purge = spawn_retention_purge(
        db,
        Duration::from_secs(args.purge_interval),
        args.retention_days * 24 * 60 * 60,
    );

    tokio::select! {
        _ = mqtt_pump => {
            anyhow::bail!("MQTT pump exited unexpectedly");
        }
        _ = ingest_task => {
            anyhow::bail!("Telemetry ingestor exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Cloud service stopped");
    Ok(())
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".solarlink").join("cloud.db"))
}
