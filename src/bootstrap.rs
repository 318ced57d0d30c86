use std::{path::Path, sync::Arc};

use chrono::Utc;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Config,
};
use tokio::{sync::RwLock, time::Duration};
use tracing::*;

use crate::{
    bot::{Bot, BotError, StandbyBot},
    clients::{ImageClient, ProwJobClient},
    clusters::{scan_cluster_directory, KubeconfigWatcher, ProcessExit},
    config::Settings,
    manager::{ClusterJobManager, JobManager},
    Diagnostics, Error, Metrics, Result,
};

/// Pause between bot restarts
pub const BOT_RESTART_INTERVAL: Duration = Duration::from_secs(5);

// Context for the startup sequence and the bot loop
#[derive(Clone)]
pub struct Context {
    /// Diagnostics read by the web server
    pub diagnostics: Arc<RwLock<Diagnostics>>,
    /// Prom metrics
    pub metrics: Metrics,
}

/// State shared between the bootstrap sequence and the web server
#[derive(Clone, Default)]
pub struct State {
    /// Diagnostics populated during startup
    diagnostics: Arc<RwLock<Diagnostics>>,
    /// Metrics registry
    registry: prometheus::Registry,
}

/// State wrapper around the bootstrap outputs for the web server
impl State {
    /// Metrics getter
    pub fn metrics(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// State getter
    pub async fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.read().await.clone()
    }

    // Create a Context that can update State
    pub fn to_context(&self) -> Result<Arc<Context>> {
        Ok(Arc::new(Context {
            metrics: Metrics::default().register(&self.registry)?,
            diagnostics: self.diagnostics.clone(),
        }))
    }
}

/// Discover build clusters, construct the job manager and run the bot.
///
/// Only returns on a startup failure or a fatal bot error.
pub async fn run(settings: Settings, state: State) -> Result<()> {
    let ctx = state.to_context()?;

    let clusters = scan_cluster_directory(&settings.build_cluster_kubeconfigs_location).await?;
    info!(clusters = clusters.len(), "loaded build cluster configurations");
    ctx.metrics.build_clusters.set(clusters.len() as i64);
    ctx.diagnostics.write().await.record_clusters(&clusters);

    match KubeconfigWatcher::start(&clusters, ProcessExit) {
        Ok(watch) => {
            ctx.metrics
                .watched_kubeconfigs
                .set(watch.registered().len() as i64);
            ctx.diagnostics.write().await.watched_kubeconfigs = watch.registered().to_vec();
        }
        Err(e) => warn!("failed to set up kubeconfig watches: {e}"),
    }

    let ambient = Config::infer().await.map_err(Error::AmbientConfig)?;
    let prow_jobs = ProwJobClient::new(ambient.clone()).map_err(Error::ProwJobClient)?;
    let release_config =
        release_cluster_config(settings.release_cluster_kubeconfig.as_deref(), ambient).await?;
    let release_images = ImageClient::new(release_config).map_err(Error::ReleaseImageClient)?;

    let manager = ClusterJobManager::new(
        settings.config_agent,
        settings.config_resolver,
        prow_jobs,
        release_images,
        clusters,
        settings.github_endpoint,
        settings.force_pr_owner,
    );
    manager.start().await?;

    let bot = StandbyBot::new(settings.bot_token);
    Err(run_bot(&bot, &manager, BOT_RESTART_INTERVAL, &ctx).await.into())
}

/// Connection config for the cluster housing release images.
async fn release_cluster_config(kubeconfig: Option<&Path>, ambient: Config) -> Result<Config> {
    let Some(path) = kubeconfig else {
        debug!("using ambient config for the release cluster");
        return Ok(ambient);
    };

    let release_error = |source| Error::ReleaseCluster {
        path: path.to_path_buf(),
        source,
    };
    let kubeconfig = Kubeconfig::read_from(path).map_err(release_error)?;
    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(release_error)
}

/// Keep the bot running, pausing `interval` between attempts.
///
/// A clean return is retried like a retriable error. Returns the first fatal
/// error.
pub async fn run_bot<B, M>(bot: &B, manager: &M, interval: Duration, ctx: &Context) -> BotError
where
    B: Bot<M>,
    M: JobManager,
{
    loop {
        ctx.metrics.bot_started();
        ctx.diagnostics.write().await.last_bot_start = Some(Utc::now());

        match bot.start(manager).await {
            Ok(()) => {
                ctx.metrics.bot_stopped(None);
                warn!("bot returned, restarting");
            }
            Err(e) if e.is_retriable() => {
                ctx.metrics.bot_stopped(Some(&e));
                warn!("bot failed, restarting: {e}");
            }
            Err(e) => {
                ctx.metrics.bot_stopped(Some(&e));
                error!("bot failed: {e}");
                return e;
            }
        }

        tokio::time::sleep(interval).await;
    }
}
