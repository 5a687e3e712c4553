
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegistrySettings {
    pub default_namespace: String,
    pub backend: BackendSettings,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendSettings {
    Memory {
        #[serde(default)]
        export_enabled: bool,
    },
    Kubernetes {
        kubeconfig: KubeconfigSource,
    },
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum KubeconfigSource {
    File { path: String },
    InCluster,
    Infer,
}

impl RegistrySettings {
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yml::from_str(content)?)
    }
}
