use std::{
    fmt,
    path::{Path, PathBuf},
};

use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Config,
};
use tracing::{debug, instrument};

use crate::{
    clients::{CoreClient, ImageClient, ProjectClient},
    telemetry,
};

use super::{BundleError, BundleResult, ClusterName, ParseError};

/// Typed client held by a [`ClusterClientBundle`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientKind {
    Core,
    Project,
    Image,
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClientKind::Core => "core",
            ClientKind::Project => "project",
            ClientKind::Image => "target image",
        })
    }
}

/// Connection config and typed clients for a single build cluster
pub struct ClusterClientBundle {
    name: ClusterName,
    kubeconfig_path: PathBuf,
    config: Config,
    core: CoreClient,
    project: ProjectClient,
    image: ImageClient,
}

impl ClusterClientBundle {
    pub fn name(&self) -> &ClusterName {
        &self.name
    }

    /// Kubeconfig file the bundle was built from
    pub fn kubeconfig_path(&self) -> &Path {
        &self.kubeconfig_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn core(&self) -> &CoreClient {
        &self.core
    }

    pub fn project(&self) -> &ProjectClient {
        &self.project
    }

    pub fn image(&self) -> &ImageClient {
        &self.image
    }
}

impl fmt::Debug for ClusterClientBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterClientBundle")
            .field("name", &self.name)
            .field("kubeconfig_path", &self.kubeconfig_path)
            .field("cluster_url", &self.config.cluster_url)
            .finish_non_exhaustive()
    }
}

/// Parse a kubeconfig and construct every client a build cluster exposes.
///
/// Each client gets its own copy of the connection config, so one failing
/// to build never depends on another having been built.
#[instrument(skip_all, fields(trace_id = display(telemetry::get_trace_id()), cluster = %name), err)]
pub async fn build_bundle(
    name: &ClusterName,
    path: &Path,
    contents: &[u8],
) -> BundleResult<ClusterClientBundle> {
    let kubeconfig = parse_kubeconfig(contents).map_err(BundleError::Parse)?;

    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(BundleError::Resolve)?;
    debug!(server = %config.cluster_url, "resolved cluster configuration");

    let core = CoreClient::new(config.clone()).map_err(construction(ClientKind::Core))?;
    let image = ImageClient::new(config.clone()).map_err(construction(ClientKind::Image))?;
    let project = ProjectClient::new(config.clone()).map_err(construction(ClientKind::Project))?;

    Ok(ClusterClientBundle {
        name: name.clone(),
        kubeconfig_path: path.to_path_buf(),
        config,
        core,
        project,
        image,
    })
}

fn parse_kubeconfig(contents: &[u8]) -> Result<Kubeconfig, ParseError> {
    Ok(Kubeconfig::from_yaml(std::str::from_utf8(contents)?)?)
}

fn construction(client: ClientKind) -> impl FnOnce(kube::Error) -> BundleError {
    move |source| BundleError::ClientConstruction { client, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn builds_all_clients() {
        let name = ClusterName::from("build01");
        let path = Path::new("/var/build-cluster-kubeconfigs/build01.kubeconfig");

        let bundle = build_bundle(&name, path, fixtures::KUBECONFIG.as_bytes())
            .await
            .unwrap();

        assert_eq!(bundle.name(), &name);
        assert_eq!(bundle.kubeconfig_path(), path);
        assert_eq!(bundle.config().cluster_url.host(), Some("127.0.0.1"));
        assert_eq!(bundle.config().cluster_url.port_u16(), Some(6443));
        assert_eq!(bundle.config().default_namespace, "ci");
    }

    #[tokio::test]
    async fn malformed_kubeconfig_is_a_parse_error() {
        let err = build_bundle(
            &ClusterName::from("bad"),
            Path::new("bad.kubeconfig"),
            fixtures::MALFORMED_KUBECONFIG.as_bytes(),
        )
        .await
        .unwrap_err();

        assert!(
            matches!(err, BundleError::Parse(ParseError::Yaml(_))),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn binary_contents_are_rejected() {
        let err = build_bundle(
            &ClusterName::from("bad"),
            Path::new("bad.kubeconfig"),
            &[0xff, 0xfe, 0x00],
        )
        .await
        .unwrap_err();

        assert!(
            matches!(err, BundleError::Parse(ParseError::Encoding(_))),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn missing_context_is_a_resolve_error() {
        let err = build_bundle(
            &ClusterName::from("empty"),
            Path::new("empty.kubeconfig"),
            fixtures::CONTEXTLESS_KUBECONFIG.as_bytes(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BundleError::Resolve(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unusable_client_identity_names_the_client() {
        let kubeconfig = fixtures::KUBECONFIG.replace(
            "token: sha256~not-a-real-token",
            "client-certificate-data: bm90IGEgY2VydGlmaWNhdGU=\n    client-key-data: bm90IGEga2V5",
        );

        let err = build_bundle(
            &ClusterName::from("build02"),
            Path::new("build02.kubeconfig"),
            kubeconfig.as_bytes(),
        )
        .await
        .unwrap_err();

        assert!(
            matches!(
                err,
                BundleError::ClientConstruction {
                    client: ClientKind::Core,
                    ..
                }
            ),
            "{err:?}"
        );
        assert!(err.to_string().starts_with("unable to create core client"));
    }

    #[test]
    fn construction_errors_name_the_client() {
        let err = construction(ClientKind::Project)(kube::Error::LinesCodecMaxLineLengthExceeded);
        assert!(err.to_string().starts_with("unable to create project client"));
    }
}
