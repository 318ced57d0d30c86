use std::path::PathBuf;

use bot::BotError;
use clusters::ScanError;
use config::ConfigError;
use kube::config::{InferConfigError, KubeconfigError};
use manager::ManagerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unable to load build cluster configurations: {0}")]
    Scan(#[from] ScanError),

    #[error("Unable to load ambient cluster configuration: {0}")]
    AmbientConfig(#[source] InferConfigError),

    #[error("Unable to load release cluster kubeconfig {}: {source}", path.display())]
    ReleaseCluster {
        path: PathBuf,
        #[source]
        source: KubeconfigError,
    },

    #[error("Unable to create prow client: {0}")]
    ProwJobClient(#[source] kube::Error),

    #[error("Unable to create image client: {0}")]
    ReleaseImageClient(#[source] kube::Error),

    #[error("Unable to load initial configuration: {0}")]
    InitialConfig(#[from] ManagerError),

    #[error("Bot error: {0}")]
    Bot(#[from] BotError),

    #[error("Metrics registration error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Startup sequence and the bot retry loop
pub mod bootstrap;
pub use crate::bootstrap::State;
pub mod api;
pub mod bot;
pub mod clients;
pub mod clusters;
pub mod config;
pub mod manager;

/// Log and trace integrations
pub mod telemetry;

/// Metrics
mod metrics;
pub use metrics::{Diagnostics, Metrics};

#[cfg(test)]
pub(crate) mod fixtures;
