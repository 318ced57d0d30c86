use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use url::Url;

use crate::{
    clients::{ImageClient, ProwJobClient},
    clusters::{ClusterClientBundle, ClusterMap},
    config::{ConfigAgent, ConfigLoadError, ConfigResolver, ProwConfig},
};

pub type ManagerResult<T> = std::result::Result<T, ManagerError>;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("{0}")]
    ConfigLoad(#[from] ConfigLoadError),
}

/// Owner of job scheduling state, driven by the bot
#[allow(async_fn_in_trait)]
pub trait JobManager {
    /// Load the initial configuration. Must succeed before the bot starts.
    async fn start(&self) -> ManagerResult<()>;
}

/// Job manager holding every client needed to place jobs on build clusters
pub struct ClusterJobManager {
    config_agent: ConfigAgent,
    resolver: ConfigResolver,
    prow_jobs: ProwJobClient,
    release_images: ImageClient,
    clusters: ClusterMap,
    github_endpoint: Url,
    force_pr_owner: Option<String>,
    config: RwLock<Option<ProwConfig>>,
}

impl ClusterJobManager {
    pub fn new(
        config_agent: ConfigAgent,
        resolver: ConfigResolver,
        prow_jobs: ProwJobClient,
        release_images: ImageClient,
        clusters: ClusterMap,
        github_endpoint: Url,
        force_pr_owner: Option<String>,
    ) -> Self {
        Self {
            config_agent,
            resolver,
            prow_jobs,
            release_images,
            clusters,
            github_endpoint,
            force_pr_owner,
            config: RwLock::new(None),
        }
    }

    pub fn clusters(&self) -> &ClusterMap {
        &self.clusters
    }

    pub fn cluster(&self, name: &str) -> Option<&ClusterClientBundle> {
        self.clusters.get(name)
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    pub fn prow_jobs(&self) -> &ProwJobClient {
        &self.prow_jobs
    }

    pub fn release_images(&self) -> &ImageClient {
        &self.release_images
    }

    pub fn github_endpoint(&self) -> &Url {
        &self.github_endpoint
    }

    /// User that owns every PR for access control, when forced
    pub fn force_pr_owner(&self) -> Option<&str> {
        self.force_pr_owner.as_deref()
    }

    /// Configuration loaded by the last successful [`JobManager::start`]
    pub async fn prow_config(&self) -> Option<ProwConfig> {
        self.config.read().await.clone()
    }
}

impl JobManager for ClusterJobManager {
    async fn start(&self) -> ManagerResult<()> {
        let config = self.config_agent.load().await?;
        info!(
            jobs = config.jobs.len(),
            clusters = self.clusters.len(),
            resolver = %self.resolver,
            "loaded initial configuration"
        );
        *self.config.write().await = Some(config);
        Ok(())
    }
}
