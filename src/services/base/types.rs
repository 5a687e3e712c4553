use crate::services::registry::ResourceRegistry;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::Service;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// A namespaced, listable Kubernetes resource that can be stored in a registry
pub trait RegistryResource:
    kube::Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + k8s_openapi::ListableResource
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<R> RegistryResource for R where
    R: kube::Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + k8s_openapi::ListableResource
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// An ordered collection of resources with the list metadata
pub type ResourceList<R> = k8s_openapi::List<R>;

/// Represents a registry for Kubernetes services
pub type ServiceRegistry = dyn ResourceRegistry<Service>;
