use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ImageStream tracks a set of tagged images in the cluster registry.
#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[kube(
    kind = "ImageStream",
    group = "image.openshift.io",
    version = "v1",
    namespaced,
    status = "ImageStreamStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamSpec {
    pub lookup_policy: Option<ImageLookupPolicy>,
    pub tags: Option<Vec<TagReference>>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
pub struct ImageLookupPolicy {
    pub local: bool,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
pub struct TagReference {
    pub name: String,
    pub from: Option<TagSource>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
pub struct TagSource {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamStatus {
    pub docker_image_repository: Option<String>,
    pub public_docker_image_repository: Option<String>,
    pub tags: Option<Vec<NamedTagEventList>>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
pub struct NamedTagEventList {
    pub tag: String,
    #[serde(default)]
    pub items: Vec<TagEvent>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagEvent {
    pub created: Option<String>,
    pub docker_image_reference: String,
    pub image: String,
}

impl ImageStream {
    /// Pull spec of the most recent image recorded for `tag`.
    pub fn latest_image(&self, tag: &str) -> Option<&str> {
        self.status
            .as_ref()?
            .tags
            .as_ref()?
            .iter()
            .find(|t| t.tag == tag)?
            .items
            .first()
            .map(|event| event.docker_image_reference.as_str())
    }
}
