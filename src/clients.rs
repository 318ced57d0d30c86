use std::fmt;

use k8s_openapi::api::core::v1::{Namespace, Pod, Secret};
use kube::{api::Api, client::Client, Config};

use crate::api::{
    image_stream::ImageStream,
    project::{Project, ProjectRequest},
    prow_job::ProwJob,
};

/// Namespace holding prow jobs on the prow control plane
pub static PROW_JOB_NAMESPACE: &str = "ci";

/// Workload and namespace level operations
#[derive(Clone)]
pub struct CoreClient {
    client: Client,
}

impl CoreClient {
    pub fn new(config: Config) -> Result<Self, kube::Error> {
        Ok(Self {
            client: Client::try_from(config)?,
        })
    }

    pub fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Project (tenant) lifecycle on OpenShift clusters
#[derive(Clone)]
pub struct ProjectClient {
    client: Client,
}

impl ProjectClient {
    pub fn new(config: Config) -> Result<Self, kube::Error> {
        Ok(Self {
            client: Client::try_from(config)?,
        })
    }

    pub fn projects(&self) -> Api<Project> {
        Api::all(self.client.clone())
    }

    pub fn project_requests(&self) -> Api<ProjectRequest> {
        Api::all(self.client.clone())
    }
}

/// Image registry access, scoped to the cluster it was built for
#[derive(Clone)]
pub struct ImageClient {
    client: Client,
}

impl ImageClient {
    pub fn new(config: Config) -> Result<Self, kube::Error> {
        Ok(Self {
            client: Client::try_from(config)?,
        })
    }

    pub fn image_streams(&self, namespace: &str) -> Api<ImageStream> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Job queue access on the prow control plane
#[derive(Clone)]
pub struct ProwJobClient {
    client: Client,
    namespace: String,
}

impl ProwJobClient {
    pub fn new(config: Config) -> Result<Self, kube::Error> {
        Ok(Self {
            client: Client::try_from(config)?,
            namespace: PROW_JOB_NAMESPACE.to_string(),
        })
    }

    pub fn prow_jobs(&self) -> Api<ProwJob> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

macro_rules! opaque_debug {
    ($($client:ident),+) => {
        $(impl fmt::Debug for $client {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($client)).finish_non_exhaustive()
            }
        })+
    };
}

opaque_debug!(CoreClient, ProjectClient, ImageClient, ProwJobClient);
