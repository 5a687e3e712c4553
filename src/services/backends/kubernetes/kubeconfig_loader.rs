use async_trait::async_trait;
use kube::Config;
use kube::config::Kubeconfig;
use log::{debug, info};
use serde_yml::from_str;
use std::sync::Arc;

pub fn from_file() -> Arc<dyn KubeConfigLoader<ConfigSource = String>> {
    Arc::new(FileKubeConfigLoader)
}

pub fn from_cluster() -> Arc<dyn ParameterLessConfigLoader> {
    Arc::new(InClusterKubeConfigLoader)
}

pub fn from_environment() -> Arc<dyn ParameterLessConfigLoader> {
    Arc::new(InferredKubeConfigLoader)
}

#[async_trait]
pub trait KubeConfigLoader: Send + Sync {
    type ConfigSource;
    async fn load(&self, source: &Self::ConfigSource) -> anyhow::Result<Config>;
}

#[async_trait]
pub trait ParameterLessConfigLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<Config>;
}

struct FileKubeConfigLoader;

#[async_trait]
impl KubeConfigLoader for FileKubeConfigLoader {
    type ConfigSource = String;

    async fn load(&self, source: &Self::ConfigSource) -> anyhow::Result<Config> {
        info!("Configuring Kubernetes storage with kubeconfig file: {:?}", source);
        let kubeconfig_string = tokio::fs::read_to_string(source).await?;
        debug!("Kubeconfig used by the storage:\n{:?}", kubeconfig_string);
        let kubeconfig: Kubeconfig = from_str(&kubeconfig_string)?;
        Ok(Config::from_custom_kubeconfig(kubeconfig, &Default::default()).await?)
    }
}

struct InClusterKubeConfigLoader;

#[async_trait]
impl ParameterLessConfigLoader for InClusterKubeConfigLoader {
    async fn load(&self) -> anyhow::Result<Config> {
        info!("Loading in-cluster Kubernetes configuration");
        let config = Config::incluster()?;
        Ok(config)
    }
}

struct InferredKubeConfigLoader;

#[async_trait]
impl ParameterLessConfigLoader for InferredKubeConfigLoader {
    async fn load(&self) -> anyhow::Result<Config> {
        info!("Inferring Kubernetes configuration from the environment");
        Ok(Config::infer().await?)
    }
}
