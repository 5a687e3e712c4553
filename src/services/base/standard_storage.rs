use crate::contracts::options::{DeleteOptions, ExportOptions, GetOptions, ListOptions};
use crate::contracts::request_context::RequestContext;
use crate::services::base::status::Status;
use crate::services::base::types::{RegistryResource, ResourceList};
use crate::services::base::updated_object_info::UpdatedObjectInfo;
use async_trait::async_trait;
use futures::stream::BoxStream;
use kube::api::WatchEvent;

/// A live stream of change events. Dropping the stream ends the subscription.
pub type WatchStream<R> = BoxStream<'static, Result<WatchEvent<R>, Status>>;

/// The outcome of a delete call
#[derive(Debug)]
pub struct Deleted<R> {
    /// The deleted object, if the backend returned it
    pub object: Option<R>,
    /// False if the object is only marked for deletion
    pub immediately: bool,
}

#[async_trait]
/// Represents a storage engine for a single resource kind
pub trait StandardStorage<R>: Send + Sync
where
    R: RegistryResource,
{
    async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> Result<ResourceList<R>, Status>;

    async fn get(&self, ctx: &RequestContext, name: &str, options: &GetOptions) -> Result<R, Status>;

    async fn create(&self, ctx: &RequestContext, object: R) -> Result<R, Status>;

    /// Updates the object by name. The boolean is true if the object was created by the call.
    async fn update(
        &self,
        ctx: &RequestContext,
        name: &str,
        object_info: &dyn UpdatedObjectInfo<R>,
    ) -> Result<(R, bool), Status>;

    async fn delete(
        &self,
        ctx: &RequestContext,
        name: &str,
        options: Option<&DeleteOptions>,
    ) -> Result<Deleted<R>, Status>;

    async fn watch(&self, ctx: &RequestContext, options: &ListOptions) -> Result<WatchStream<R>, Status>;

    /// Returns the export capability of the storage, if it has one
    fn exporter(&self) -> Option<&dyn Exporter<R>> {
        None
    }
}

#[async_trait]
/// Optional storage capability: returns objects stripped of cluster-specific fields
pub trait Exporter<R>: Send + Sync
where
    R: RegistryResource,
{
    async fn export(&self, ctx: &RequestContext, name: &str, options: &ExportOptions) -> Result<R, Status>;
}
