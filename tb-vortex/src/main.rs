//! tb-vortex: Vortex driver for the tb-rs TigerBeetle client.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tb_vortex::{Args, Config, Driver};

fn main() -> ExitCode {
    let args = Args::parse();

    // Stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = match Config::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid arguments: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match tokio_uring::start(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("driver failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> tb_vortex::Result<()> {
    tracing::info!(
        "Connecting to TigerBeetle cluster {} at {:?}...",
        config.cluster,
        config.addresses
    );

    let client = tb_rs::Client::builder()
        .cluster(config.cluster)
        .addresses_vec(config.addresses)
        .build()
        .await?;

    tracing::info!(
        "Connected! Client ID: {:032x}, batch size limit: {:?}",
        client.id(),
        client.batch_size_limit()
    );

    let mut driver = Driver::new(client, io::stdin().lock(), io::stdout().lock());
    let result = driver.run().await;

    // Close the connection on every exit path so replicas see the disconnect.
    let (client, _) = driver.into_parts();
    client.close().await;

    result
}
