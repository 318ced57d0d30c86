use std::{borrow::Borrow, collections::BTreeMap, fmt, io, path::PathBuf};

use kube::config::KubeconfigError;
use thiserror::Error;

pub mod bundle;
pub mod matcher;
pub mod scanner;
pub mod watch;

pub use bundle::{build_bundle, ClientKind, ClusterClientBundle};
pub use scanner::scan_cluster_directory;
pub use watch::{KubeconfigWatcher, ProcessExit, Terminator, TriggerRestart, WatchHandle};

pub type BundleResult<T> = std::result::Result<T, BundleError>;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("could not load build client configuration: {0}")]
    Parse(#[source] ParseError),

    #[error("could not load cluster configuration: {0}")]
    Resolve(#[source] KubeconfigError),

    #[error("unable to create {client} client: {source}")]
    ClientConstruction {
        client: ClientKind,
        #[source]
        source: kube::Error,
    },
}

/// Why kubeconfig bytes could not be read as a kubeconfig
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Yaml(#[from] KubeconfigError),
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("unable to access location {}: {source}", location.display())]
    ListDirectory {
        location: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to access kubeconfig {file:?}: {source}")]
    ReadFile {
        file: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid kubeconfig {file:?}: {source}")]
    Bundle {
        file: String,
        #[source]
        source: BundleError,
    },

    #[error("cluster {name} is defined by both {first:?} and {second:?}")]
    DuplicateCluster {
        name: ClusterName,
        first: String,
        second: String,
    },
}

pub type WatchResult<T> = std::result::Result<T, WatchError>;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to set up watcher: {0}")]
    Create(#[source] notify::Error),

    #[error("failed to watch {} for cluster {cluster}: {source}", path.display())]
    Watch {
        cluster: ClusterName,
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Logical name of a build cluster, taken from its kubeconfig file name
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterName(String);

impl ClusterName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClusterName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ClusterName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClusterName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Every build cluster discovered by one scan.
///
/// The map is assembled once and never changes afterwards. Picking up new
/// credentials means restarting the process and scanning again.
#[derive(Default)]
pub struct ClusterMap {
    clusters: BTreeMap<ClusterName, ClusterClientBundle>,
}

impl ClusterMap {
    pub fn get(&self, name: &str) -> Option<&ClusterClientBundle> {
        self.clusters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clusters.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &ClusterName> {
        self.clusters.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClusterName, &ClusterClientBundle)> {
        self.clusters.iter()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl From<BTreeMap<ClusterName, ClusterClientBundle>> for ClusterMap {
    fn from(clusters: BTreeMap<ClusterName, ClusterClientBundle>) -> Self {
        Self { clusters }
    }
}

impl<'a> IntoIterator for &'a ClusterMap {
    type Item = (&'a ClusterName, &'a ClusterClientBundle);
    type IntoIter = std::collections::btree_map::Iter<'a, ClusterName, ClusterClientBundle>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

impl fmt::Debug for ClusterMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.clusters.iter()).finish()
    }
}
