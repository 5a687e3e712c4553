
use crate::contracts::options::{ExportOptions, GetOptions, ListOptions};
use crate::contracts::request_context::RequestContext;
use crate::services::base::standard_storage::WatchStream;
use crate::services::base::status::Status;
use crate::services::base::types::{RegistryResource, ResourceList};
use crate::services::registry::ResourceRegistry;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOperation {
    List,
    Create,
    Get,
    Delete,
    Update,
    Watch,
    Export,
}

impl RegistryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryOperation::List => "List",
            RegistryOperation::Create => "Create",
            RegistryOperation::Get => "Get",
            RegistryOperation::Delete => "Delete",
            RegistryOperation::Update => "Update",
            RegistryOperation::Watch => "Watch",
            RegistryOperation::Export => "Export",
        }
    }

    /// Operation label for the resource kind, e.g. `ListServices` or `GetService`
    pub fn label(&self, kind: &str) -> String {
        match self {
            RegistryOperation::List | RegistryOperation::Watch => format!("{}{}s", self.as_str(), kind),
            _ => format!("{}{}", self.as_str(), kind),
        }
    }
}

pub trait WithLoggingFacade<R>
where
    R: RegistryResource,
{
    fn with_logging(self: Arc<Self>) -> Arc<dyn ResourceRegistry<R>>
    where
        Self: Sized + 'static;
}

impl<Registry, R> WithLoggingFacade<R> for Registry
where
    Registry: ResourceRegistry<R>,
    R: RegistryResource,
{
    fn with_logging(self: Arc<Self>) -> Arc<dyn ResourceRegistry<R>>
    where
        Self: Sized + 'static,
    {
        Arc::new(LoggingFacade::new(self))
    }
}

/// Emits entering/leaving traces around every call of the underlying registry
pub struct LoggingFacade<R>
where
    R: RegistryResource,
{
    underlying: Arc<dyn ResourceRegistry<R>>,
    kind: String,
}

impl<R> LoggingFacade<R>
where
    R: RegistryResource,
{
    pub fn new(underlying: Arc<dyn ResourceRegistry<R>>) -> Self {
        LoggingFacade {
            underlying,
            kind: R::kind(&()).to_string(),
        }
    }

    fn enter(&self, operation: RegistryOperation, ctx: &RequestContext) -> String {
        let label = operation.label(&self.kind);
        let request_id = ctx.request_id.to_string();
        debug!(
            operation = operation.as_str(),
            kind = self.kind.as_str(),
            request_id = request_id.as_str(),
            user = ctx.user.as_deref().unwrap_or_default();
            "Entering {}", label);
        label
    }

    fn leave<T>(&self, label: String, ctx: &RequestContext, result: Result<T, Status>) -> Result<T, Status> {
        let request_id = ctx.request_id.to_string();
        debug!(
            kind = self.kind.as_str(),
            request_id = request_id.as_str(),
            success = result.is_ok();
            "Leaving {}", label);
        result
    }
}

#[async_trait]
impl<R> ResourceRegistry<R> for LoggingFacade<R>
where
    R: RegistryResource,
{
    async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> Result<ResourceList<R>, Status> {
        let label = self.enter(RegistryOperation::List, ctx);
        let result = self.underlying.list(ctx, options).await;
        self.leave(label, ctx, result)
    }

    async fn create(&self, ctx: &RequestContext, object: R) -> Result<R, Status> {
        let label = self.enter(RegistryOperation::Create, ctx);
        let result = self.underlying.create(ctx, object).await;
        self.leave(label, ctx, result)
    }

    async fn get(&self, ctx: &RequestContext, name: &str, options: &GetOptions) -> Result<R, Status> {
        let label = self.enter(RegistryOperation::Get, ctx);
        let result = self.underlying.get(ctx, name, options).await;
        self.leave(label, ctx, result)
    }

    async fn delete(&self, ctx: &RequestContext, name: &str) -> Result<(), Status> {
        let label = self.enter(RegistryOperation::Delete, ctx);
        let result = self.underlying.delete(ctx, name).await;
        self.leave(label, ctx, result)
    }

    async fn update(&self, ctx: &RequestContext, object: R) -> Result<R, Status> {
        let label = self.enter(RegistryOperation::Update, ctx);
        let result = self.underlying.update(ctx, object).await;
        self.leave(label, ctx, result)
    }

    async fn watch(&self, ctx: &RequestContext, options: &ListOptions) -> Result<WatchStream<R>, Status> {
        let label = self.enter(RegistryOperation::Watch, ctx);
        let result = self.underlying.watch(ctx, options).await;
        self.leave(label, ctx, result)
    }

    async fn export(&self, ctx: &RequestContext, name: &str, options: &ExportOptions) -> Result<R, Status> {
        let label = self.enter(RegistryOperation::Export, ctx);
        let result = self.underlying.export(ctx, name, options).await;
        self.leave(label, ctx, result)
    }
}
