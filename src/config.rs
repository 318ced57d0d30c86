use std::{
    collections::BTreeMap,
    fmt, io,
    path::{Path, PathBuf},
};

use clap::Parser;
use thiserror::Error;
use tokio::fs;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("the environment variable BOT_TOKEN must be set")]
    MissingBotToken,

    #[error("--config-resolver is not a valid URL: {0}")]
    ResolverUrl(#[source] url::ParseError),

    #[error("--config-resolver must use http, https or file, not {0:?}")]
    ResolverScheme(String),

    #[error("--github-endpoint is not a valid URL: {0}")]
    GithubEndpoint(#[source] url::ParseError),
}

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Command line options
#[derive(Parser, Debug, Clone)]
#[command(name = "ci-chat-bot", version, about)]
pub struct Options {
    /// A URL pointing to a config resolver for retrieving ci-operator config.
    /// You may pass a location on disk with file://<abs_path_to_ci_operator_config>
    #[arg(long, default_value = "http://config.ci.openshift.org/config")]
    pub config_resolver: String,

    /// An optional proxy for connecting to github.
    #[arg(long, default_value = "https://api.github.com")]
    pub github_endpoint: String,

    /// Make the supplied user the owner of all PRs for access control purposes.
    #[arg(long)]
    pub force_pr_owner: Option<String>,

    /// Path to the location of the kubeconfigs for the various build clusters.
    #[arg(long, default_value = "/var/build-cluster-kubeconfigs")]
    pub build_cluster_kubeconfigs_location: PathBuf,

    /// Kubeconfig to use for the cluster housing the release imagestreams.
    /// Defaults to the ambient kubeconfig if unset.
    #[arg(long)]
    pub release_cluster_kubeconfig: Option<PathBuf>,

    /// Path to the prow config file.
    #[arg(long, default_value = "/etc/config/config.yaml")]
    pub prow_config: PathBuf,

    /// Path to a prow job config file or directory.
    #[arg(long)]
    pub job_config: Option<PathBuf>,

    /// Address serving /health and /metrics.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub metrics_address: String,

    /// Removed in favor of --build-cluster-kubeconfigs-location; accepted and ignored.
    #[arg(long, hide = true)]
    pub build_cluster_kubeconfig: Option<String>,
}

/// Where job configuration is looked up
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigResolver {
    Remote(Url),
    Local(PathBuf),
}

impl ConfigResolver {
    pub fn parse(location: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(location).map_err(ConfigError::ResolverUrl)?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Remote(url)),
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| ConfigError::ResolverScheme(location.to_string())),
            scheme => Err(ConfigError::ResolverScheme(scheme.to_string())),
        }
    }
}

impl fmt::Display for ConfigResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Local(path) => write!(f, "file://{}", path.display()),
        }
    }
}

/// Validated startup configuration
#[derive(Clone)]
pub struct Settings {
    pub config_resolver: ConfigResolver,
    pub github_endpoint: Url,
    pub force_pr_owner: Option<String>,
    pub build_cluster_kubeconfigs_location: PathBuf,
    pub release_cluster_kubeconfig: Option<PathBuf>,
    pub config_agent: ConfigAgent,
    pub metrics_address: String,
    pub bot_token: String,
}

impl Settings {
    pub fn new(options: Options, bot_token: Option<String>) -> Result<Self, ConfigError> {
        let bot_token = bot_token
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingBotToken)?;

        Ok(Self {
            config_resolver: ConfigResolver::parse(&options.config_resolver)?,
            github_endpoint: Url::parse(&options.github_endpoint)
                .map_err(ConfigError::GithubEndpoint)?,
            force_pr_owner: options.force_pr_owner.filter(|owner| !owner.is_empty()),
            build_cluster_kubeconfigs_location: options.build_cluster_kubeconfigs_location,
            release_cluster_kubeconfig: options.release_cluster_kubeconfig,
            config_agent: ConfigAgent::new(options.prow_config, options.job_config),
            metrics_address: options.metrics_address,
            bot_token,
        })
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("config_resolver", &self.config_resolver)
            .field("github_endpoint", &self.github_endpoint.as_str())
            .field("force_pr_owner", &self.force_pr_owner)
            .field(
                "build_cluster_kubeconfigs_location",
                &self.build_cluster_kubeconfigs_location,
            )
            .field("release_cluster_kubeconfig", &self.release_cluster_kubeconfig)
            .field("config_agent", &self.config_agent)
            .field("metrics_address", &self.metrics_address)
            .finish_non_exhaustive()
    }
}

/// Prow and job configuration as loaded from disk
#[derive(Clone, Debug, Default)]
pub struct ProwConfig {
    pub prow: serde_yaml::Value,
    pub jobs: BTreeMap<PathBuf, serde_yaml::Value>,
}

/// Loads prow configuration from the configured paths
#[derive(Clone, Debug)]
pub struct ConfigAgent {
    prow_config: PathBuf,
    job_config: Option<PathBuf>,
}

impl ConfigAgent {
    pub fn new(prow_config: PathBuf, job_config: Option<PathBuf>) -> Self {
        Self {
            prow_config,
            job_config,
        }
    }

    pub async fn load(&self) -> Result<ProwConfig, ConfigLoadError> {
        let prow = read_yaml(&self.prow_config).await?;
        let mut jobs = BTreeMap::new();

        if let Some(job_config) = &self.job_config {
            for path in yaml_files(job_config).await? {
                let jobs_document = read_yaml(&path).await?;
                jobs.insert(path, jobs_document);
            }
        }

        debug!(jobs = jobs.len(), "loaded prow configuration");
        Ok(ProwConfig { prow, jobs })
    }
}

async fn read_yaml(path: &Path) -> Result<serde_yaml::Value, ConfigLoadError> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Every `.yaml`/`.yml` file under `root`, or `root` itself when it is a file.
async fn yaml_files(root: &Path) -> Result<Vec<PathBuf>, ConfigLoadError> {
    let read_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ConfigLoadError::Read { path, source }
    };

    if !fs::metadata(root).await.map_err(read_error(root))?.is_dir() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await.map_err(read_error(&dir))?;
        while let Some(entry) = entries.next_entry().await.map_err(read_error(&dir))? {
            let path = entry.path();
            if fs::metadata(&path).await.map_err(read_error(&path))?.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
            {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
