mod application;
mod config;
mod infrastructure;
mod serde_duration;

use anyhow::Result;
use clap::Parser;
use config::{Cli, get_config};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use application::service::{IngestService, PipelineSettings};
use infrastructure::{input::InputSource, sst::RocksWriterFactory};

fn setup_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.parse()?)
        .from_env_lossy();

    // stdout carries rejected lines and the final count
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = get_config(&cli)?;
    setup_tracing(&config.logging.level)?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!("Starting bulk_loader...");
    tracing::debug!(?config, "Full application configuration");

    let settings = PipelineSettings {
        output_dir: config.paths.output_dir.clone(),
        keyspace: config.bulk_loader.keyspace.clone(),
        profiles_ttl: config.tables.profiles_ttl,
        segments_ttl: config.tables.segments_ttl,
    };
    let service = IngestService::new(RocksWriterFactory::new(&config), settings);
    let sources = InputSource::from_args(&cli.inputs);

    let result = {
        let mut rejected = std::io::stdout().lock();
        service.run(&sources, &mut rejected)
    };

    match result {
        Ok(report) => {
            println!("{}", report.events_routed);
            tracing::info!("Bulk loading completed successfully!");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Application finished with an error: {:?}", e);
            std::process::exit(1);
        }
    }
}
