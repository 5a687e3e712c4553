
use crate::contracts::options::{ExportOptions, GetOptions, ListOptions};
use crate::contracts::request_context::RequestContext;
use crate::services::base::standard_storage::{StandardStorage, WatchStream};
use crate::services::base::status::Status;
use crate::services::base::types::{RegistryResource, ResourceList};
use crate::services::base::updated_object_info::DefaultUpdatedObjectInfo;
use crate::services::registry::ResourceRegistry;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

/// Puts strong typing around calls to a generic storage
pub struct StorageRegistry<R, S>
where
    S: ?Sized,
{
    storage: Arc<S>,
    _marker: PhantomData<R>,
}

impl<R, S> StorageRegistry<R, S>
where
    R: RegistryResource,
    S: StandardStorage<R> + ?Sized,
{
    pub fn new(storage: Arc<S>) -> Self {
        StorageRegistry {
            storage,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R, S> ResourceRegistry<R> for StorageRegistry<R, S>
where
    R: RegistryResource,
    S: StandardStorage<R> + ?Sized,
{
    async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> Result<ResourceList<R>, Status> {
        self.storage.list(ctx, options).await
    }

    async fn create(&self, ctx: &RequestContext, object: R) -> Result<R, Status> {
        self.storage.create(ctx, object).await
    }

    async fn get(&self, ctx: &RequestContext, name: &str, options: &GetOptions) -> Result<R, Status> {
        self.storage.get(ctx, name, options).await
    }

    async fn delete(&self, ctx: &RequestContext, name: &str) -> Result<(), Status> {
        self.storage.delete(ctx, name, None).await.map(|_| ())
    }

    async fn update(&self, ctx: &RequestContext, object: R) -> Result<R, Status> {
        let object_info = DefaultUpdatedObjectInfo::new(object);
        let name = object_info.object_name();
        let (updated, _) = self.storage.update(ctx, &name, &object_info).await?;
        Ok(updated)
    }

    async fn watch(&self, ctx: &RequestContext, options: &ListOptions) -> Result<WatchStream<R>, Status> {
        self.storage.watch(ctx, options).await
    }

    async fn export(&self, ctx: &RequestContext, name: &str, options: &ExportOptions) -> Result<R, Status> {
        let Some(exporter) = self.storage.exporter() else {
            return Err(Status::ExportNotSupported);
        };
        exporter.export(ctx, name, options).await
    }
}
