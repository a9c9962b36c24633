//! Command line configuration.

use crate::cloudflare::{ProbeConfig, BASE_URL};
use crate::errors::MeasurementError;
use crate::measurement::{OrchestratorConfig, DEFAULT_BUDGET, HISTORY_CAPACITY};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Wall-clock budget of one measurement run, in seconds
    #[arg(long, default_value_t = DEFAULT_BUDGET.as_secs())]
    pub budget_secs: u64,

    /// Only check the budget between phases instead of also bounding
    /// each provider call
    #[arg(long)]
    pub coarse_timeout: bool,

    /// Number of completed results kept in memory
    #[arg(long, default_value_t = HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Base URL of the speed test endpoints
    #[arg(long, default_value = BASE_URL)]
    pub base_url: Url,

    /// Timeout of a single HTTP request to the speed test endpoints, in
    /// seconds
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Number of requests used to measure latency
    #[arg(long, default_value_t = 10)]
    pub latency_probes: usize,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// Validated service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen: SocketAddr,
    pub base_url: Url,
    pub request_timeout: Duration,
    pub orchestrator: OrchestratorConfig,
    pub probe: ProbeConfig,
}

impl ServiceConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, MeasurementError> {
        if cli.budget_secs == 0 {
            return Err(MeasurementError::config(
                "--budget-secs must be greater than zero",
            ));
        }
        if cli.history_capacity == 0 {
            return Err(MeasurementError::config(
                "--history-capacity must be at least 1",
            ));
        }
        if cli.request_timeout_secs == 0 {
            return Err(MeasurementError::config(
                "--request-timeout-secs must be greater than zero",
            ));
        }
        if cli.latency_probes == 0 {
            return Err(MeasurementError::config(
                "--latency-probes must be at least 1",
            ));
        }
        if !matches!(cli.base_url.scheme(), "http" | "https") {
            return Err(MeasurementError::config(format!(
                "--base-url must be an http or https URL, got {}",
                cli.base_url
            ))
            .with_suggestion(format!("Try --base-url {}", BASE_URL)));
        }

        let orchestrator = OrchestratorConfig {
            budget: Duration::from_secs(cli.budget_secs),
            cancel_in_flight: !cli.coarse_timeout,
            history_capacity: cli.history_capacity,
        };
        let probe = ProbeConfig {
            latency_packets: cli.latency_probes,
            ..ProbeConfig::default()
        };

        Ok(Self {
            listen: SocketAddr::new(cli.host, cli.port),
            base_url: cli.base_url.clone(),
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            orchestrator,
            probe,
        })
    }
}
