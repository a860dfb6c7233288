//! Sensor Simulator - Main Entry Point

use clap::{Parser, Subcommand};
use sensor_sim::config::SimulatorConfig;
use sensor_sim::error::{SimulatorError, SimulatorResult};
use sensor_sim::observability::init_default_logging;
use sensor_sim::sensors::SensorRegistry;
use sensor_sim::server::SensorServer;
use sensor_sim::transport::mqtt::MqttClient;
use std::path::PathBuf;
use std::process;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Simulated environmental sensors publishing readings over MQTT
#[derive(Parser)]
#[command(name = "sensor-sim")]
#[command(about = "Publish simulated environmental sensor readings to an MQTT broker")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the broker and publish readings until interrupted
    Run,
    /// Validate configuration
    Config {
        /// Show the effective configuration (password redacted)
        #[arg(long)]
        show: bool,
    },
    /// Print one reading per enabled sensor without connecting
    Sample,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    info!("Starting sensor simulator v{}", env!("CARGO_PKG_VERSION"));

    let config = match SimulatorConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_simulator(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
        Commands::Sample => print_sample(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e.report());
        process::exit(1);
    }

    info!("Sensor simulator exited");
}

async fn run_simulator(config: SimulatorConfig) -> SimulatorResult<()> {
    info!(
        broker = %config.mqtt.broker,
        port = config.mqtt.port,
        base_topic = %config.mqtt.base_topic,
        sensors = config.sensors.len(),
        "Simulator configuration loaded"
    );

    let transport = MqttClient::new(&config.mqtt)?;
    let mut server = SensorServer::new(config, transport);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
        let _ = shutdown_tx.send(true);
    });

    let stats = server.run(shutdown_rx).await?;
    info!(
        ticks = stats.ticks,
        published = stats.published,
        "Simulator stopped"
    );
    Ok(())
}

fn handle_config_command(config: &SimulatorConfig, show: bool) -> SimulatorResult<()> {
    if show {
        println!("Current configuration:");
        println!(
            "{}",
            toml::to_string_pretty(&config.redacted()).map_err(SimulatorError::encode)?
        );
    }

    info!("Configuration validation complete");
    Ok(())
}

fn print_sample(config: &SimulatorConfig) -> SimulatorResult<()> {
    let registry = SensorRegistry::with_builtin_sensors();
    let mut sources = registry.build_active(&config.registrations(), config.runtime.seed)?;

    for source in sources.iter_mut() {
        let reading = source.produce_reading()?;
        let payload = serde_json::to_string(&reading).map_err(SimulatorError::encode)?;
        println!(
            "{}/{}/{} {}",
            config.mqtt.base_topic,
            source.kind(),
            source.identity(),
            payload
        );
    }
    Ok(())
}
