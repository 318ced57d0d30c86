use std::path::PathBuf;

use chrono::{DateTime, Utc};
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use serde::Serialize;

use crate::{bot::BotError, clusters::ClusterMap};

#[derive(Clone)]
pub struct Metrics {
    pub build_clusters: IntGauge,
    pub watched_kubeconfigs: IntGauge,
    pub bot_starts: IntCounter,
    pub bot_stops: IntCounterVec,
}

impl Default for Metrics {
    fn default() -> Self {
        let build_clusters = IntGauge::new(
            "ci_chat_bot_build_clusters",
            "build clusters loaded from kubeconfigs",
        )
        .unwrap();
        let watched_kubeconfigs = IntGauge::new(
            "ci_chat_bot_watched_kubeconfigs",
            "kubeconfig files watched for rotation",
        )
        .unwrap();
        let bot_starts =
            IntCounter::new("ci_chat_bot_bot_starts_total", "bot start attempts").unwrap();
        let bot_stops = IntCounterVec::new(
            Opts::new("ci_chat_bot_bot_stops_total", "bot stops by outcome"),
            &["outcome"],
        )
        .unwrap();
        Metrics {
            build_clusters,
            watched_kubeconfigs,
            bot_starts,
            bot_stops,
        }
    }
}

impl Metrics {
    /// Register API metrics to start tracking them.
    pub fn register(self, registry: &Registry) -> Result<Self, prometheus::Error> {
        registry.register(Box::new(self.build_clusters.clone()))?;
        registry.register(Box::new(self.watched_kubeconfigs.clone()))?;
        registry.register(Box::new(self.bot_starts.clone()))?;
        registry.register(Box::new(self.bot_stops.clone()))?;
        Ok(self)
    }

    pub fn bot_started(&self) {
        self.bot_starts.inc();
    }

    /// Count a bot stop; `None` means it returned without an error.
    pub fn bot_stopped(&self, error: Option<&BotError>) {
        let outcome = match error {
            None => "returned",
            Some(e) if e.is_retriable() => "retriable",
            Some(_) => "fatal",
        };
        self.bot_stops.with_label_values(&[outcome]).inc();
    }
}

/// Diagnostics to be exposed by the web server
#[derive(Clone, Serialize)]
pub struct Diagnostics {
    pub started: DateTime<Utc>,
    pub build_clusters: Vec<String>,
    pub watched_kubeconfigs: Vec<PathBuf>,
    pub last_bot_start: Option<DateTime<Utc>>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            started: Utc::now(),
            build_clusters: vec![],
            watched_kubeconfigs: vec![],
            last_bot_start: None,
        }
    }
}

impl Diagnostics {
    pub(crate) fn record_clusters(&mut self, clusters: &ClusterMap) {
        self.build_clusters = clusters.names().map(ToString::to_string).collect();
    }
}
