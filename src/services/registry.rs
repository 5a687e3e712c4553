pub mod logging_facade;
pub mod storage_registry;

use crate::contracts::options::{ExportOptions, GetOptions, ListOptions};
use crate::contracts::request_context::RequestContext;
use crate::services::base::standard_storage::{StandardStorage, WatchStream};
use crate::services::base::status::Status;
use crate::services::base::types::{RegistryResource, ResourceList};
use crate::services::registry::logging_facade::WithLoggingFacade;
use crate::services::registry::storage_registry::StorageRegistry;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
/// Represents a strongly typed registry for a single resource kind
pub trait ResourceRegistry<R>: Send + Sync
where
    R: RegistryResource,
{
    async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> Result<ResourceList<R>, Status>;

    async fn create(&self, ctx: &RequestContext, object: R) -> Result<R, Status>;

    async fn get(&self, ctx: &RequestContext, name: &str, options: &GetOptions) -> Result<R, Status>;

    async fn delete(&self, ctx: &RequestContext, name: &str) -> Result<(), Status>;

    async fn update(&self, ctx: &RequestContext, object: R) -> Result<R, Status>;

    async fn watch(&self, ctx: &RequestContext, options: &ListOptions) -> Result<WatchStream<R>, Status>;

    /// Fails with `Status::ExportNotSupported` if the underlying storage cannot export
    async fn export(&self, ctx: &RequestContext, name: &str, options: &ExportOptions) -> Result<R, Status>;
}

/// Creates a registry over the given storage with entry/exit logging around every call.
///
/// The storage must implement the whole storage contract:
///
/// ```compile_fail
/// use k8s_openapi::api::core::v1::Service;
/// use service_registry::services::registry::new_registry;
/// use std::sync::Arc;
///
/// struct NotAStorage;
///
/// let _registry = new_registry::<Service, _>(Arc::new(NotAStorage));
/// ```
pub fn new_registry<R, S>(storage: Arc<S>) -> Arc<dyn ResourceRegistry<R>>
where
    R: RegistryResource,
    S: StandardStorage<R> + ?Sized + 'static,
{
    Arc::new(StorageRegistry::new(storage)).with_logging()
}
