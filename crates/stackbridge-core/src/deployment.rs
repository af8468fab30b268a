//! CAPO provider agent deployment
//!
//! The provider image is resolved from three sources, highest precedence
//! first: the tenant annotation, the environment override, the default.
//! Callers pass all three in; nothing here reads the process environment.

use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, HTTPGetAction, ObjectFieldSelector,
    PodSpec, PodTemplateSpec, Probe, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

/// Environment variable overriding the default provider image
pub const PROVIDER_IMAGE_ENV_VAR: &str = "OPENSTACK_CAPI_PROVIDER_IMAGE";

/// Tenant annotation overriding the provider image
pub const PROVIDER_IMAGE_ANNOTATION: &str = "stackbridge.io/capi-openstack-provider-image";

const WEBHOOK_TLS_VOLUME: &str = "capi-webhooks-tls";
const WEBHOOK_CERT_DIR: &str = "/tmp/k8s-webhook-server/serving-certs";
const HEALTH_PORT_NAME: &str = "healthz";
const HEALTH_PORT: i32 = 9440;

/// Pick the provider image
///
/// An environment value only counts when non-empty; an annotation counts
/// whenever it is present.
pub fn resolve_provider_image(
    default: &str,
    env_override: Option<&str>,
    annotation_override: Option<&str>,
) -> String {
    if let Some(image) = annotation_override {
        return image.to_string();
    }
    match env_override {
        Some(image) if !image.is_empty() => image.to_string(),
        _ => default.to_string(),
    }
}

fn http_probe(path: &str) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.to_string()),
            port: IntOrString::String(HEALTH_PORT_NAME.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Deployment spec for the CAPO manager running `image`
pub fn provider_deployment_spec(image: &str) -> DeploymentSpec {
    let container = Container {
        name: "manager".to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        command: Some(vec!["/manager".to_string()]),
        args: Some(vec![
            "--namespace=$(MY_NAMESPACE)".to_string(),
            "--leader-elect".to_string(),
            "--metrics-bind-addr=127.0.0.1:8080".to_string(),
            "--v=2".to_string(),
        ]),
        ports: Some(vec![ContainerPort {
            name: Some(HEALTH_PORT_NAME.to_string()),
            container_port: HEALTH_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        liveness_probe: Some(http_probe("/healthz")),
        readiness_probe: Some(http_probe("/readyz")),
        volume_mounts: Some(vec![VolumeMount {
            name: WEBHOOK_TLS_VOLUME.to_string(),
            read_only: Some(true),
            mount_path: WEBHOOK_CERT_DIR.to_string(),
            ..Default::default()
        }]),
        env: Some(vec![EnvVar {
            name: "MY_NAMESPACE".to_string(),
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: "metadata.namespace".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        ..Default::default()
    };

    DeploymentSpec {
        replicas: Some(1),
        template: PodTemplateSpec {
            spec: Some(PodSpec {
                volumes: Some(vec![Volume {
                    name: WEBHOOK_TLS_VOLUME.to_string(),
                    secret: Some(SecretVolumeSource {
                        default_mode: Some(0o640),
                        secret_name: Some(WEBHOOK_TLS_VOLUME.to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                containers: vec![container],
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_precedence() {
        assert_eq!(resolve_provider_image("default", None, None), "default");
        assert_eq!(resolve_provider_image("default", Some("env"), None), "env");
        assert_eq!(resolve_provider_image("default", Some(""), None), "default");
        assert_eq!(
            resolve_provider_image("default", Some("env"), Some("annotated")),
            "annotated"
        );
        assert_eq!(resolve_provider_image("default", None, Some("annotated")), "annotated");
    }

    #[test]
    fn test_deployment_shape() {
        let spec = provider_deployment_spec("quay.io/example/capo:v0.11");
        assert_eq!(spec.replicas, Some(1));

        let pod = spec.template.spec.expect("pod spec");
        assert_eq!(pod.containers.len(), 1);

        let manager = &pod.containers[0];
        assert_eq!(manager.name, "manager");
        assert_eq!(manager.image.as_deref(), Some("quay.io/example/capo:v0.11"));
        assert_eq!(manager.command.as_deref(), Some(&["/manager".to_string()][..]));
        assert!(
            manager
                .args
                .as_ref()
                .unwrap()
                .contains(&"--leader-elect".to_string())
        );

        let port = &manager.ports.as_ref().unwrap()[0];
        assert_eq!(port.container_port, 9440);
        assert_eq!(port.name.as_deref(), Some("healthz"));

        let readiness = manager.readiness_probe.as_ref().unwrap().http_get.as_ref().unwrap();
        assert_eq!(readiness.path.as_deref(), Some("/readyz"));
        assert_eq!(readiness.port, IntOrString::String("healthz".to_string()));

        let mount = &manager.volume_mounts.as_ref().unwrap()[0];
        assert_eq!(mount.mount_path, "/tmp/k8s-webhook-server/serving-certs");
        assert_eq!(mount.read_only, Some(true));

        let volume = &pod.volumes.as_ref().unwrap()[0];
        let secret = volume.secret.as_ref().unwrap();
        assert_eq!(secret.default_mode, Some(0o640));
        assert_eq!(secret.secret_name.as_deref(), Some("capi-webhooks-tls"));

        let env = &manager.env.as_ref().unwrap()[0];
        assert_eq!(env.name, "MY_NAMESPACE");
        assert_eq!(
            env.value_from.as_ref().unwrap().field_ref.as_ref().unwrap().field_path,
            "metadata.namespace"
        );
    }
}
