use std::{fmt, path::PathBuf};

use futures::{
    channel::mpsc::{self, UnboundedReceiver},
    StreamExt as _,
};
use notify::{
    event::ModifyKind, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ClusterMap, WatchError, WatchResult};

/// Request to restart the process so credentials are scanned again
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerRestart {
    pub kind: EventKind,
    pub paths: Vec<PathBuf>,
}

impl From<Event> for TriggerRestart {
    fn from(event: Event) -> Self {
        Self {
            kind: event.kind,
            paths: event.paths,
        }
    }
}

impl fmt::Display for TriggerRestart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} on ", self.kind)?;
        let mut paths = self.paths.iter();
        if let Some(first) = paths.next() {
            write!(f, "{}", first.display())?;
        }
        for path in paths {
            write!(f, ", {}", path.display())?;
        }
        Ok(())
    }
}

/// Receiver of the restart signal emitted when a watched kubeconfig changes
pub trait Terminator: Send + 'static {
    fn trigger_restart(&self, restart: TriggerRestart);
}

/// Exits with status 0 and leaves the restart to the process manager.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn trigger_restart(&self, restart: TriggerRestart) {
        info!(
            event = %restart,
            "kubeconfig changed, exiting to make the kubelet restart us so we can pick them up"
        );
        std::process::exit(0);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchDecision {
    Ignore,
    Restart,
}

/// Decide whether a filesystem event on a kubeconfig warrants a restart.
pub fn classify(kind: &EventKind) -> WatchDecision {
    match kind {
        // Some storage layers emit frequent spurious chmod events
        EventKind::Modify(ModifyKind::Metadata(_)) => WatchDecision::Ignore,
        EventKind::Access(_) => WatchDecision::Ignore,
        _ => WatchDecision::Restart,
    }
}

/// Background watch over the kubeconfigs of a [`ClusterMap`]
#[derive(Debug)]
pub struct WatchHandle {
    registered: Vec<PathBuf>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Kubeconfig files that are being watched
    pub fn registered(&self) -> &[PathBuf] {
        &self.registered
    }

    /// Whether the event loop has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub struct KubeconfigWatcher;

impl KubeconfigWatcher {
    /// Watch each bundle's kubeconfig file and signal `terminator` on change.
    ///
    /// Bundles whose file no longer exists are skipped. The returned handle may
    /// be dropped; the event loop keeps running on the tokio runtime.
    pub fn start<T: Terminator>(clusters: &ClusterMap, terminator: T) -> WatchResult<WatchHandle> {
        let (tx, rx) = mpsc::unbounded();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
            let _ = tx.unbounded_send(event);
        })
        .map_err(WatchError::Create)?;

        let mut registered = Vec::new();
        for (name, bundle) in clusters {
            let path = bundle.kubeconfig_path();
            if !path.exists() {
                debug!(cluster = %name, path = %path.display(), "kubeconfig not present, skipping watch");
                continue;
            }

            watcher
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(|source| WatchError::Watch {
                    cluster: name.clone(),
                    path: path.to_path_buf(),
                    source,
                })?;
            debug!(cluster = %name, path = %path.display(), "watching kubeconfig");
            registered.push(path.to_path_buf());
        }

        let task = tokio::spawn(watch_events(watcher, rx, terminator));

        Ok(WatchHandle { registered, task })
    }
}

async fn watch_events<T: Terminator>(
    watcher: RecommendedWatcher,
    mut events: UnboundedReceiver<notify::Result<Event>>,
    terminator: T,
) {
    // Dropping the watcher removes every registered watch
    let _watcher = watcher;

    while let Some(event) = events.next().await {
        match event {
            Ok(event) => match classify(&event.kind) {
                WatchDecision::Ignore => {
                    debug!(kind = ?event.kind, paths = ?event.paths, "ignoring kubeconfig event");
                }
                WatchDecision::Restart => {
                    terminator.trigger_restart(event.into());
                    return;
                }
            },
            Err(e) => warn!("kubeconfig watch error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, fs, time::Duration};

    use futures::channel::mpsc::UnboundedSender;
    use notify::event::{
        AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode,
    };

    use super::*;
    use crate::{clusters::ClusterName, fixtures};

    impl Terminator for UnboundedSender<TriggerRestart> {
        fn trigger_restart(&self, restart: TriggerRestart) {
            let _ = self.unbounded_send(restart);
        }
    }

    async fn cluster_map(entries: &[(&str, PathBuf)]) -> ClusterMap {
        let mut clusters = BTreeMap::new();
        for (name, path) in entries {
            clusters.insert(ClusterName::from(*name), fixtures::bundle(name, path).await);
        }
        clusters.into()
    }

    #[test]
    fn metadata_changes_are_ignored() {
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Metadata(
                MetadataKind::Permissions
            ))),
            WatchDecision::Ignore
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
            WatchDecision::Ignore
        );
        assert_eq!(
            classify(&EventKind::Access(AccessKind::Any)),
            WatchDecision::Ignore
        );
    }

    #[test]
    fn content_changes_restart() {
        for kind in [
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            EventKind::Create(CreateKind::File),
            EventKind::Remove(RemoveKind::File),
            EventKind::Any,
            EventKind::Other,
        ] {
            assert_eq!(classify(&kind), WatchDecision::Restart, "{kind:?}");
        }
    }

    #[test]
    fn restart_display_lists_paths() {
        let restart = TriggerRestart {
            kind: EventKind::Remove(RemoveKind::File),
            paths: vec!["/a.kubeconfig".into(), "/b.kubeconfig".into()],
        };
        assert_eq!(
            restart.to_string(),
            "Remove(File) on /a.kubeconfig, /b.kubeconfig"
        );
    }

    #[tokio::test]
    async fn skips_missing_kubeconfigs() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.kubeconfig");
        fs::write(&present, fixtures::KUBECONFIG).unwrap();
        let clusters = cluster_map(&[
            ("a", present.clone()),
            ("b", dir.path().join("b.kubeconfig")),
        ])
        .await;
        let (tx, _rx) = mpsc::unbounded();

        let handle = KubeconfigWatcher::start(&clusters, tx).unwrap();

        assert_eq!(handle.registered(), &[present]);
        assert!(!handle.is_finished());
    }

    #[tokio::test]
    async fn empty_map_watches_nothing() {
        let (tx, _rx) = mpsc::unbounded();

        let handle = KubeconfigWatcher::start(&ClusterMap::default(), tx).unwrap();

        assert!(handle.registered().is_empty());
    }

    #[tokio::test]
    async fn permission_change_is_ignored_and_write_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.kubeconfig");
        fs::write(&path, fixtures::KUBECONFIG).unwrap();
        let clusters = cluster_map(&[("a", path.clone())]).await;
        let (tx, mut rx) = mpsc::unbounded();

        let handle = KubeconfigWatcher::start(&clusters, tx).unwrap();

        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions.clone()).unwrap();
        assert!(
            tokio::time::timeout(Duration::from_millis(500), rx.next())
                .await
                .is_err(),
            "permission change must not restart"
        );

        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        fs::set_permissions(&path, permissions).unwrap();
        fs::write(&path, fixtures::CONTEXTLESS_KUBECONFIG).unwrap();

        let restart = tokio::time::timeout(Duration::from_secs(10), rx.next())
            .await
            .expect("kubeconfig write should trigger a restart")
            .unwrap();
        assert_eq!(classify(&restart.kind), WatchDecision::Restart);
        assert!(restart.paths.iter().any(|p| p.ends_with("a.kubeconfig")));

        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }
}
