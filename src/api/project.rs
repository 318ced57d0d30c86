use kube::{
    api::{ObjectMeta, TypeMeta},
    CustomResource, Resource,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Project is the OpenShift tenant wrapper around a namespace.
#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
#[kube(
    kind = "Project",
    group = "project.openshift.io",
    version = "v1",
    status = "ProjectStatus"
)]
pub struct ProjectSpec {
    /// Finalizers that must be empty before the project is removed
    pub finalizers: Option<Vec<String>>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
pub struct ProjectStatus {
    pub phase: Option<String>,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .is_some_and(|phase| phase == "Active")
    }
}

mod request {
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    #[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, JsonSchema)]
    #[kube(
        kind = "ProjectRequest",
        group = "project.openshift.io",
        version = "v1"
    )]
    pub struct ProjectRequestFantomSpec {}
}

/// ProjectRequest asks the cluster to provision a project on behalf of the caller.
#[derive(Resource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[resource(inherit = request::ProjectRequest)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    pub metadata: ObjectMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectRequest {
    pub fn new(name: &str, display_name: Option<String>) -> Self {
        Self {
            types: Some(TypeMeta::resource::<ProjectRequest>()),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            display_name,
            description: None,
        }
    }
}
