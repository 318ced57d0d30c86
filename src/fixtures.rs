use std::path::Path;

use crate::clusters::{build_bundle, ClusterClientBundle, ClusterName};

/// Token-authenticated kubeconfig pointing at a local API server
pub const KUBECONFIG: &str = r#"apiVersion: v1
kind: Config
current-context: build01
clusters:
- name: build01
  cluster:
    server: https://127.0.0.1:6443
    certificate-authority-data: LS0tLS1CRUdJTiBDRVJUSUZJQ0FURS0tLS0tCk1JSUJlekNDQVNHZ0F3SUJBZ0lVV1c1K2xqRnk0L1RyWGlvQTMxVXpja210TmVBd0NnWUlLb1pJemowRUF3SXcKRWpFUU1BNEdBMVVFQXd3SGRHVnpkQzFqWVRBZ0Z3MHlOakV3TVRjeU1qQTJOVGxhR0E4eU1USTJNRGt5TXpJeQpNRFkxT1Zvd0VqRVFNQTRHQTFVRUF3d0hkR1Z6ZEMxallUQlpNQk1HQnlxR1NNNDlBZ0VHQ0NxR1NNNDlBd0VICkEwSUFCR09tS01ZdmpaNVFROXJJYmUxV2xsSStMSXhtRWNvOUtXdTd6c3JYMEVsRnNBYWJmQVhEekd1UW8yRWYKVzhYYTZtUTNWVVFNU3NkSnZJdXRtdEpkdWVPalV6QlJNQjBHQTFVZERnUVdCQlNhN0tYQi9oSGRxZ29Hb0RtZgpVaWVtLzBsZmR6QWZCZ05WSFNNRUdEQVdnQlNhN0tYQi9oSGRxZ29Hb0RtZlVpZW0vMGxmZHpBUEJnTlZIUk1CCkFmOEVCVEFEQVFIL01Bb0dDQ3FHU000OUJBTUNBMGdBTUVVQ0lFeE0xRFZKVnRCQUZzaGdhNldqcXN4Rm1vckoKdlM2YXdXOW1QRjREUXh5ckFpRUE4YnkxWnVZay9YZGVKK29IbFVoUDdZdkk4OTFvb3pEWCtBczdMalhFYktRPQotLS0tLUVORCBDRVJUSUZJQ0FURS0tLS0tCg==
contexts:
- name: build01
  context:
    cluster: build01
    user: ci-chat-bot
    namespace: ci
users:
- name: ci-chat-bot
  user:
    token: sha256~not-a-real-token
"#;

pub const MALFORMED_KUBECONFIG: &str = "clusters: [unterminated\n  - {\n";

pub const CONTEXTLESS_KUBECONFIG: &str = r#"apiVersion: v1
kind: Config
clusters: []
contexts: []
users: []
"#;

/// Bundle for `name` that claims to come from `path`, whether or not it exists.
pub async fn bundle(name: &str, path: &Path) -> ClusterClientBundle {
    build_bundle(&ClusterName::from(name), path, KUBECONFIG.as_bytes())
        .await
        .unwrap()
}
