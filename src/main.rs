use clap::Parser;
use colored::Colorize;
use log::{error, info};
use speedtest_service::cloudflare::{Client, CloudflareProvider};
use speedtest_service::config::{Cli, ServiceConfig};
use speedtest_service::http::dto::version;
use speedtest_service::http::{create_router, AppContext};
use speedtest_service::measurement::{MeasurementOrchestrator, MeasurementProvider};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_env("RUST_LOG")
        .init();

    let config = ServiceConfig::from_cli(&cli)?;

    let client = Client::new(config.base_url.clone(), config.request_timeout)?;
    let provider: Arc<dyn MeasurementProvider> =
        Arc::new(CloudflareProvider::new(client, config.probe.clone()));
    let orchestrator = Arc::new(MeasurementOrchestrator::new(
        Arc::clone(&provider),
        config.orchestrator.clone(),
    ));

    let app = create_router(AppContext::new(orchestrator, provider));
    let listener = TcpListener::bind(config.listen).await?;

    print_banner(&config, &listener.local_addr()?.to_string());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn print_banner(config: &ServiceConfig, addr: &str) {
    println!(
        "{} {}",
        "Speedtest service".bold().white(),
        version().bright_blue()
    );
    println!("{} {}", "Listening on:".bold().white(), format!("http://{}", addr).bright_cyan());
    println!("{} {}", "Measuring against:".bold().white(), config.base_url.as_str().bright_blue());
    println!(
        "{} {}s",
        "Run budget:".bold().white(),
        config.orchestrator.budget.as_secs()
    );
}

/// Resolves on Ctrl-C. A measurement still running is abandoned.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
