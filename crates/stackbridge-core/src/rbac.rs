//! RBAC rules the CAPO provider agent needs beyond the CAPI defaults

use k8s_openapi::api::rbac::v1::PolicyRule;

const IPAM_API_GROUP: &str = "ipam.cluster.x-k8s.io";

pub fn provider_policy_rules() -> Vec<PolicyRule> {
    vec![
        PolicyRule {
            api_groups: Some(vec![IPAM_API_GROUP.to_string()]),
            resources: Some(vec![
                "ipaddressclaims".to_string(),
                "ipaddressclaims/status".to_string(),
            ]),
            verbs: vec!["*".to_string()],
            ..Default::default()
        },
        PolicyRule {
            api_groups: Some(vec![IPAM_API_GROUP.to_string()]),
            resources: Some(vec![
                "ipaddresses".to_string(),
                "ipaddresses/status".to_string(),
            ]),
            verbs: ["create", "delete", "get", "list", "update", "watch"]
                .iter()
                .map(|v| v.to_string())
                .collect(),
            ..Default::default()
        },
    ]
}
