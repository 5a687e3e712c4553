
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

const CLUSTER_IP_NONE: &str = "None";
const NODE_PORT_SERVICE_TYPE: &str = "NodePort";

/// Resource-specific preparation of an object for export
pub trait ExportStrategy<R>: Send + Sync {
    fn prepare_for_export(&self, object: &mut R, exact: bool);
}

/// Removes the metadata fields that are only meaningful inside the cluster the object was read from
pub fn export_object_meta(meta: &mut ObjectMeta, exact: bool) {
    meta.uid = None;
    meta.resource_version = None;
    meta.self_link = None;
    meta.creation_timestamp = None;
    meta.deletion_timestamp = None;
    meta.managed_fields = None;
    if !exact {
        meta.namespace = None;
        if meta.generate_name.as_deref().is_some_and(|prefix| !prefix.is_empty()) {
            meta.name = None;
        }
    }
}

pub struct ServiceExportStrategy;

impl ExportStrategy<Service> for ServiceExportStrategy {
    fn prepare_for_export(&self, service: &mut Service, exact: bool) {
        service.status = None;
        if exact {
            return;
        }
        let Some(spec) = service.spec.as_mut() else {
            return;
        };
        if spec.cluster_ip.as_deref() != Some(CLUSTER_IP_NONE) {
            spec.cluster_ip = None;
            spec.cluster_ips = None;
        }
        if spec.type_.as_deref() == Some(NODE_PORT_SERVICE_TYPE) {
            for port in spec.ports.iter_mut().flatten() {
                port.node_port = None;
            }
        }
    }
}
