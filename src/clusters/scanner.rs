use std::{collections::BTreeMap, path::Path};

use tokio::fs;
use tracing::{debug, info, instrument};

use crate::telemetry;

use super::{
    bundle::build_bundle, matcher, ClusterClientBundle, ClusterMap, ClusterName, ScanError,
    ScanResult,
};

/// Build a client bundle for every `<name>.kubeconfig` directly inside `location`.
///
/// Any unreadable or invalid kubeconfig fails the whole scan. An empty
/// directory yields an empty map.
#[instrument(skip_all, fields(trace_id = display(telemetry::get_trace_id()), location = %location.display()), err)]
pub async fn scan_cluster_directory(location: &Path) -> ScanResult<ClusterMap> {
    let list_error = |source| ScanError::ListDirectory {
        location: location.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(location).await.map_err(list_error)?;
    let mut clusters: BTreeMap<ClusterName, ClusterClientBundle> = BTreeMap::new();

    while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
        let file = entry.file_name().to_string_lossy().into_owned();
        if matcher::match_kubeconfig(&file).is_none() {
            debug!(file = %file, "ignoring non-kubeconfig entry");
            continue;
        }

        // Mounted secrets are symlinks, so follow them before deciding.
        let path = entry.path();
        let metadata = fs::metadata(&path)
            .await
            .map_err(|source| ScanError::ReadFile {
                file: file.clone(),
                source,
            })?;
        let Some(name) = matcher::match_entry(&file, metadata.is_dir()) else {
            debug!(file = %file, "ignoring directory");
            continue;
        };

        let contents = fs::read(&path).await.map_err(|source| ScanError::ReadFile {
            file: file.clone(),
            source,
        })?;
        let bundle = build_bundle(&name, &path, &contents)
            .await
            .map_err(|source| ScanError::Bundle {
                file: file.clone(),
                source,
            })?;

        if let Some(existing) = clusters.get(&name) {
            return Err(ScanError::DuplicateCluster {
                name,
                first: existing.kubeconfig_path().display().to_string(),
                second: path.display().to_string(),
            });
        }

        info!(cluster = %name, file = %file, "loaded build cluster kubeconfig");
        clusters.insert(name, bundle);
    }

    Ok(clusters.into())
}
