//! Shared fixtures for integration tests.
//!
//! [`ScriptedProvider`] plays back a fixed script instead of touching the
//! network, with optional delays, failures and gates per phase.

#![allow(dead_code)]

use async_trait::async_trait;
use speedtest_service::errors::MeasurementError;
use speedtest_service::measurement::{
    MeasurementProvider, MeasurementSession, ServerDirectory, ServerInfo,
    TransferTotals,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// How one provider call behaves.
#[derive(Clone, Default)]
pub enum Step {
    #[default]
    Succeed,
    /// Sleep before answering.
    Delay(Duration),
    /// Fail with a probe failure.
    Fail,
    /// Wait until the gate is opened.
    Gate(Arc<Notify>),
    /// Never answer.
    Hang,
    Panic,
}

impl Step {
    async fn play(&self) -> Result<(), ()> {
        match self {
            Step::Succeed => Ok(()),
            Step::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            Step::Fail => Err(()),
            Step::Gate(gate) => {
                gate.notified().await;
                Ok(())
            }
            Step::Hang => std::future::pending().await,
            Step::Panic => panic!("scripted provider panic"),
        }
    }
}

#[derive(Clone)]
pub struct Script {
    pub server: ServerInfo,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: f64,
    pub discover: Step,
    pub download: Step,
    pub upload: Step,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            server: acme_server(),
            download_mbps: 93.42,
            upload_mbps: 11.07,
            ping_ms: 14.3,
            discover: Step::Succeed,
            download: Step::Succeed,
            upload: Step::Succeed,
        }
    }
}

pub fn acme_server() -> ServerInfo {
    ServerInfo::new("NYC, US", "ACME", "US", "speed.acme.example:8080", 12.5, 14.3)
}

pub struct ScriptedProvider {
    /// Script of the n-th session; the last one repeats.
    scripts: Vec<Script>,
    directory: Option<ServerDirectory>,
    sessions: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Self::sequence(vec![script])
    }

    pub fn sequence(scripts: Vec<Script>) -> Arc<Self> {
        assert!(!scripts.is_empty());
        Arc::new(Self { scripts, directory: None, sessions: AtomicUsize::new(0) })
    }

    pub fn with_directory(directory: ServerDirectory) -> Arc<Self> {
        Arc::new(Self {
            scripts: vec![Script::default()],
            directory: Some(directory),
            sessions: AtomicUsize::new(0),
        })
    }

    /// Number of runs that reached the provider.
    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MeasurementProvider for ScriptedProvider {
    async fn open_session(
        &self,
    ) -> Result<Box<dyn MeasurementSession>, MeasurementError> {
        let n = self.sessions.fetch_add(1, Ordering::SeqCst);
        let script = &self.scripts[n.min(self.scripts.len() - 1)];
        Ok(Box::new(ScriptedSession {
            script: script.clone(),
            ping_ms: 0.0,
            totals: TransferTotals::default(),
        }))
    }

    async fn list_servers(&self) -> Result<ServerDirectory, MeasurementError> {
        self.directory.clone().ok_or_else(|| {
            MeasurementError::directory_unavailable("Server listing refused")
        })
    }
}

struct ScriptedSession {
    script: Script,
    ping_ms: f64,
    totals: TransferTotals,
}

#[async_trait]
impl MeasurementSession for ScriptedSession {
    async fn discover_best_server(
        &mut self,
    ) -> Result<ServerInfo, MeasurementError> {
        self.script.discover.play().await.map_err(|_| {
            MeasurementError::no_server_found("No reachable server")
        })?;
        self.ping_ms = self.script.ping_ms;
        Ok(self.script.server.clone())
    }

    async fn measure_download(&mut self) -> Result<f64, MeasurementError> {
        self.script.download.play().await.map_err(|_| {
            MeasurementError::probe_failure("Download probe failed")
        })?;
        self.totals.bytes_received += 1_000_000;
        Ok(self.script.download_mbps)
    }

    async fn measure_upload(&mut self) -> Result<f64, MeasurementError> {
        self.script.upload.play().await.map_err(|_| {
            MeasurementError::probe_failure("Upload probe failed")
        })?;
        self.totals.bytes_sent += 500_000;
        Ok(self.script.upload_mbps)
    }

    fn last_ping_ms(&self) -> f64 {
        self.ping_ms
    }

    fn totals(&self) -> TransferTotals {
        self.totals
    }
}

pub fn directory(layout: &[(&str, &[&str])]) -> ServerDirectory {
    ServerDirectory::from_servers(layout.iter().flat_map(|(region, names)| {
        names.iter().map(move |name| {
            (
                region.to_string(),
                ServerInfo::new(*name, "Test", "XX", "test.example.net", 0.0, 0.0),
            )
        })
    }))
}
