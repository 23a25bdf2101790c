mod board;
mod config;
mod cooker;
mod telemetry;
mod thermal;
mod web;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use board::Board;
use board::sim::SimulatedBoard;
use cooker::Cooker;
use telemetry::{CookReading, HttpPublisher, LogPublisher, Publisher};
use thermal::{Coefficients, Thermistor, calibration, sampler};
use web::cooker_channel::CookerRequest;

#[derive(Debug, Parser)]
#[command(name = "cooker-host", version, about = "Thermistor-driven cooker controller")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "cooker.toml")]
    config: String,

    /// Path to the per-probe calibration file (JSON)
    #[arg(long, default_value = "calibration.json")]
    calibration: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .init();

    tracing::info!("Starting cooker host");

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(config::ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No configuration at '{}', using built-in defaults", cli.config);
            config::Config::default()
        }
        Err(e) => {
            tracing::error!("Failed to load config from '{}': {}", cli.config, e);
            return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>);
        }
    };

    tracing::info!("Device: {}", config.device.device_id);
    tracing::info!(
        "Chamber target: {}K ± {}K, cooldown {}s",
        config.cooker.chamber_target,
        config.cooker.chamber_tolerance,
        config.cooker.cooldown_secs
    );

    // Per-probe coefficients; probes absent from the file run on defaults.
    let coefficients = match calibration::load_file(&cli.calibration) {
        Ok(map) => map,
        Err(calibration::CalibrationError::Io(e))
            if e.kind() == std::io::ErrorKind::NotFound =>
        {
            tracing::debug!("No calibration file, all probes use default coefficients");
            Default::default()
        }
        Err(e) => {
            tracing::error!("Failed to load calibration from '{}': {}", cli.calibration.display(), e);
            return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>);
        }
    };

    let thermistors: Vec<Arc<Thermistor>> = config
        .board
        .probe_pins
        .iter()
        .map(|&pin| {
            Arc::new(Thermistor::new(
                pin,
                coefficients.get(&pin).copied().unwrap_or(Coefficients::DEFAULT),
                config.board.series_resistor,
                config.board.supply_voltage,
                config.sampling.window,
            ))
        })
        .collect();
    for thermistor in &thermistors {
        tracing::debug!(
            "Probe on pin {} ({}Ω series, {}V supply)",
            thermistor.pin(),
            config.board.series_resistor,
            thermistor.supply_voltage()
        );
    }

    let chamber_pin = config.board.probe_pins.first().copied().unwrap_or(0);
    let board: Arc<dyn Board> =
        Arc::new(SimulatedBoard::new(chamber_pin, config.board.relay_pin));

    let cooker = Cooker::new(
        board.clone(),
        thermistors.clone(),
        config.cooker.chamber_target,
        config.cooker.chamber_tolerance,
        Duration::from_secs(config.cooker.cooldown_secs),
    )?;
    tracing::info!("Cook {} started", cooker.cook_id());

    // One background sampling task per probe, torn down over the broadcast.
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    for thermistor in &thermistors {
        sampler::spawn(
            board.clone(),
            thermistor.clone(),
            config.sampling.rate_hz,
            shutdown_tx.subscribe(),
        );
    }

    let publisher: Box<dyn Publisher> = match &config.device.ingest_url {
        Some(url) => {
            tracing::info!("Publishing cook readings to {}", url);
            Box::new(HttpPublisher::new(url.clone())?)
        }
        None => {
            tracing::info!("No ingest URL configured, cook readings go to the log");
            Box::new(LogPublisher)
        }
    };

    // Channel between the Axum handlers and the control task.
    let (cooker_tx, mut cooker_rx) = mpsc::channel::<CookerRequest>(16);
    let app = web::api::create_router(cooker_tx);
    let listener = tokio::net::TcpListener::bind(&config.web.listen).await?;
    tracing::info!("Command API listening on http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Web server error: {}", e);
        }
    });

    let mut publish_interval = tokio::time::interval(Duration::from_secs(
        config.cooker.publish_interval_secs.max(1),
    ));
    publish_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
            _ = publish_interval.tick() => {
                match cooker.update().await {
                    Ok(readings) => {
                        tracing::debug!("Updated cook with {} readings", readings.len());
                        let reading = CookReading::from_snapshot(&cooker.snapshot().await);
                        if let Err(e) = publisher.publish(&reading).await {
                            tracing::warn!("Publish failed, retrying next cycle: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("Cooker update failed: {}", e);
                    }
                }
            }
            Some(request) = cooker_rx.recv() => {
                match request {
                    CookerRequest::GetStatus { respond_to } => {
                        let _ = respond_to.send(cooker.snapshot().await);
                    }
                    CookerRequest::Execute { name, payload, respond_to } => {
                        let _ = respond_to.send(web::api::dispatch(&cooker, &name, &payload).await);
                    }
                }
            }
        }
    }

    let _ = shutdown_tx.send(());
    // Leave the element off no matter what state the cook ended in.
    if let Err(e) = board.set_relay(false).await {
        tracing::warn!("Could not turn off relay during shutdown: {}", e);
    }
    tracing::info!("Cooker host stopped");

    Ok(())
}
