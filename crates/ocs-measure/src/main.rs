//! ocs-measure CLI
//!
//! Runs a Ceph fault-injection scenario against the current cluster while
//! recording Prometheus alerts, or prints a stored measurement.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ocs_measure::{
    Config, FileResultStore, Harness, KubeCluster, MeasurementRecord, Measurer, PrometheusClient,
    ResultStore, Scenario,
};

/// Fault-injection measurements for Ceph monitoring and alerting
#[derive(Parser)]
#[command(name = "ocs-measure")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Namespace of the Ceph cluster
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Directory holding measurement result files
    #[arg(long, global = true)]
    measurement_dir: Option<PathBuf>,

    /// Prometheus base URL
    #[arg(long, global = true)]
    prometheus_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScenarioArg {
    StopMgr,
    StopMon,
    StopOsd,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::StopMgr => Self::StopMgr,
            ScenarioArg::StopMon => Self::StopMon,
            ScenarioArg::StopOsd => Self::StopOsd,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario (or replay its stored result) and print the record
    Run {
        #[arg(value_enum)]
        scenario: ScenarioArg,

        /// How long the daemons stay down (defaults to the scenario's window)
        #[arg(long)]
        run_time_secs: Option<u64>,

        /// Seconds between two alert queries
        #[arg(long)]
        poll_interval_secs: Option<u64>,
    },
    /// Print a stored record without touching the cluster
    Show {
        #[arg(value_enum)]
        scenario: ScenarioArg,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "ocs_measure=debug"
    } else {
        "ocs_measure=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(namespace) = cli.namespace {
        config.env_data.cluster_namespace = namespace;
    }
    if let Some(dir) = cli.measurement_dir {
        config.env_data.measurement_dir = Some(dir);
    }
    if let Some(url) = cli.prometheus_url {
        config.prometheus.base_url = url;
    }
    config.validate()?;

    let dir = config
        .env_data
        .ensure_measurement_dir()
        .context("Failed to prepare measurement dir")?;
    let store = Arc::new(FileResultStore::new(dir));

    match cli.command {
        Commands::Run {
            scenario,
            run_time_secs,
            poll_interval_secs,
        } => {
            let scenario = Scenario::from(scenario);
            let poll_interval =
                Duration::from_secs(poll_interval_secs.unwrap_or(config.alert_poll_interval_secs));

            let cluster = KubeCluster::connect(&config.env_data.cluster_namespace)
                .await
                .context("Failed to connect to the cluster")?;
            let prometheus = PrometheusClient::new(config.prometheus.clone())
                .context("Failed to create Prometheus client")?;

            let measurer = Measurer::new(store, Arc::new(prometheus)).with_poll_interval(poll_interval);
            let harness = Harness::new(Arc::new(cluster), measurer);

            let record = harness
                .run(scenario, run_time_secs.map(Duration::from_secs))
                .await
                .with_context(|| format!("Scenario {scenario} failed"))?;

            summarize(scenario, &record);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Show { scenario } => {
            let scenario = Scenario::from(scenario);
            let record = store
                .load(scenario.slot())
                .await?
                .with_context(|| format!("No stored result at {}", store.location(scenario.slot())))?;

            summarize(scenario, &record);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

/// Log which of the scenario's expected alerts were observed.
fn summarize(scenario: Scenario, record: &MeasurementRecord) {
    info!(
        scenario = %scenario,
        duration_secs = record.duration_secs(),
        alerts = record.alerts.len(),
        "Measurement finished"
    );
    for name in scenario.expected_alerts() {
        let seen: Vec<_> = record.alerts_named(name).collect();
        if seen.is_empty() {
            warn!(alert = %name, "Expected alert was not observed");
        } else {
            let firing = seen.iter().any(|alert| alert.is_firing());
            info!(alert = %name, occurrences = seen.len(), firing, "Expected alert observed");
        }
    }
}
