use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus, Service, ServicePort, ServiceSpec, ServiceStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use maplit::btreemap;

pub mod capturing_logger;
pub mod memory_registry_context;

/// A NodePort service with an allocated cluster IP and a populated status
pub fn service(name: &str, namespace: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(btreemap! {
                "app".to_string() => name.to_string(),
                "registry.test/owner".to_string() => "tests".to_string(),
            }),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("NodePort".to_string()),
            cluster_ip: Some("10.96.0.10".to_string()),
            cluster_ips: Some(vec!["10.96.0.10".to_string()]),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: 80,
                node_port: Some(30080),
                ..Default::default()
            }]),
            selector: Some(btreemap! {
                "app".to_string() => name.to_string(),
            }),
            ..Default::default()
        }),
        status: Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(vec![LoadBalancerIngress {
                    ip: Some("192.0.2.10".to_string()),
                    ..Default::default()
                }]),
            }),
            ..Default::default()
        }),
    }
}
