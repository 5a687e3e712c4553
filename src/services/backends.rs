use crate::configuration::models::registry_settings::{BackendSettings, KubeconfigSource, RegistrySettings};
use crate::services::backends::kubernetes::kubeconfig_loader;
use crate::services::backends::kubernetes::kubernetes_storage::KubernetesStorage;
use crate::services::backends::memory::InMemoryStorage;
use crate::services::base::export_strategy::ServiceExportStrategy;
use crate::services::base::types::ServiceRegistry;
use crate::services::registry::new_registry;
use crate::services::service_provider::ServiceProvider;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use log::info;
use std::sync::Arc;

pub mod kubernetes;
pub mod memory;


pub trait Backend: ServiceProvider<Arc<ServiceRegistry>> + Send + Sync {}

#[async_trait]
pub trait BackendConfiguration: Send + Sync + Sized {
    type BackendSettings;

    type InitializedBackend: Backend;

    async fn configure(self, settings: &Self::BackendSettings) -> anyhow::Result<Arc<Self::InitializedBackend>>;
}

/// Holds the service registry built by a backend configuration
pub struct RegistryBackend {
    registry: Arc<ServiceRegistry>,
}

impl ServiceProvider<Arc<ServiceRegistry>> for RegistryBackend {
    fn get(&self) -> Arc<ServiceRegistry> {
        self.registry.clone()
    }
}

impl Backend for RegistryBackend {}

pub struct MemoryBackendConfiguration {
    pub default_namespace: String,
}

#[async_trait]
impl BackendConfiguration for MemoryBackendConfiguration {
    type BackendSettings = bool;
    type InitializedBackend = RegistryBackend;

    async fn configure(self, export_enabled: &bool) -> anyhow::Result<Arc<Self::InitializedBackend>> {
        info!(
            "Configuring in-memory service storage in namespace {:?}, export enabled: {}",
            self.default_namespace, export_enabled
        );
        let mut storage = InMemoryStorage::<Service>::new(&self.default_namespace);
        if *export_enabled {
            storage = storage.with_export_strategy(Arc::new(ServiceExportStrategy));
        }
        Ok(Arc::new(RegistryBackend {
            registry: new_registry(Arc::new(storage)),
        }))
    }
}

pub struct KubernetesBackendConfiguration {
    pub default_namespace: String,
}

#[async_trait]
impl BackendConfiguration for KubernetesBackendConfiguration {
    type BackendSettings = KubeconfigSource;
    type InitializedBackend = RegistryBackend;

    async fn configure(self, source: &KubeconfigSource) -> anyhow::Result<Arc<Self::InitializedBackend>> {
        let mut config = match source {
            KubeconfigSource::File { path } => kubeconfig_loader::from_file().load(path).await?,
            KubeconfigSource::InCluster => kubeconfig_loader::from_cluster().load().await?,
            KubeconfigSource::Infer => kubeconfig_loader::from_environment().load().await?,
        };
        config.default_namespace = self.default_namespace;
        info!("Configuring Kubernetes service storage at {}", config.cluster_url);
        let storage = KubernetesStorage::<Service>::try_new(config)?;
        Ok(Arc::new(RegistryBackend {
            registry: new_registry(Arc::new(storage)),
        }))
    }
}

/// Builds the backend selected by the settings
pub async fn configure(settings: &RegistrySettings) -> anyhow::Result<Arc<dyn Backend>> {
    let default_namespace = settings.default_namespace.clone();
    let backend: Arc<dyn Backend> = match &settings.backend {
        BackendSettings::Memory { export_enabled } => {
            MemoryBackendConfiguration { default_namespace }
                .configure(export_enabled)
                .await?
        }
        BackendSettings::Kubernetes { kubeconfig } => {
            KubernetesBackendConfiguration { default_namespace }
                .configure(kubeconfig)
                .await?
        }
    };
    Ok(backend)
}
