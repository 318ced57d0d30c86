use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProwJob is a single run of a CI job queued on the prow control plane.
#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[kube(
    kind = "ProwJob",
    group = "prow.k8s.io",
    version = "v1",
    plural = "prowjobs",
    namespaced,
    status = "ProwJobStatus"
)]
pub struct ProwJobSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    pub agent: Option<String>,
    pub cluster: Option<String>,
    pub namespace: Option<String>,
    pub job: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProwJobStatus {
    pub start_time: Option<String>,
    pub completion_time: Option<String>,
    pub state: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl ProwJob {
    pub fn is_complete(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.completion_time.is_some())
    }
}
