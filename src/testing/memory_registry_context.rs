use crate::contracts::request_context::RequestContext;
use crate::services::backends::memory::InMemoryStorage;
use crate::services::base::export_strategy::ServiceExportStrategy;
use crate::services::base::types::ServiceRegistry;
use crate::services::registry::new_registry;
use k8s_openapi::api::core::v1::Service;
use std::sync::Arc;
use test_context::AsyncTestContext;

pub const TEST_NAMESPACE: &str = "registry-test";

/// A service registry over an exporting in-memory storage
pub struct MemoryRegistryContext {
    pub storage: Arc<InMemoryStorage<Service>>,
    pub registry: Arc<ServiceRegistry>,
    pub ctx: RequestContext,
}

impl AsyncTestContext for MemoryRegistryContext {
    async fn setup() -> Self {
        let storage = Arc::new(InMemoryStorage::new(TEST_NAMESPACE).with_export_strategy(Arc::new(ServiceExportStrategy)));
        let registry = new_registry(storage.clone());
        MemoryRegistryContext {
            storage,
            registry,
            ctx: RequestContext::new().with_namespace(TEST_NAMESPACE),
        }
    }
}
