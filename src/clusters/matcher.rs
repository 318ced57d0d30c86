use super::ClusterName;

pub static KUBECONFIG_SUFFIX: &str = ".kubeconfig";

/// Extract the cluster name from a `<name>.kubeconfig` file name.
pub fn match_kubeconfig(file_name: &str) -> Option<ClusterName> {
    file_name
        .strip_suffix(KUBECONFIG_SUFFIX)
        .filter(|name| !name.is_empty())
        .map(ClusterName::from)
}

/// Like [`match_kubeconfig`], but directories never match.
pub fn match_entry(file_name: &str, is_dir: bool) -> Option<ClusterName> {
    match is_dir {
        true => None,
        false => match_kubeconfig(file_name),
    }
}
