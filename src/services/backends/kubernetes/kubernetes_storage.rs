
use crate::contracts::options::{DeleteOptions, GetOptions, ListOptions};
use crate::contracts::request_context::RequestContext;
use crate::services::base::standard_storage::{Deleted, StandardStorage, WatchStream};
use crate::services::base::status::Status;
use crate::services::base::status::object_details::ObjectDetails;
use crate::services::base::types::{RegistryResource, ResourceList};
use crate::services::base::updated_object_info::UpdatedObjectInfo;
use async_trait::async_trait;
use futures::StreamExt;
use kube::core::params::{DeleteParams, GetParams, ListParams, PostParams, Preconditions, WatchParams};
use kube::{Api, Client};
use log::debug;
use std::marker::PhantomData;

/// The API server rejects watch timeouts of 295 seconds and above
const MAX_WATCH_TIMEOUT_SECONDS: u32 = 290;
const WATCH_FROM_ANY_VERSION: &str = "0";

/// Stores objects in a Kubernetes API server.
/// The API server has no export endpoint, so this storage has no export capability.
pub struct KubernetesStorage<R> {
    client: Client,
    default_namespace: String,
    _marker: PhantomData<R>,
}

impl<R> KubernetesStorage<R>
where
    R: RegistryResource,
{
    pub fn new(client: Client, default_namespace: String) -> Self {
        KubernetesStorage {
            client,
            default_namespace,
            _marker: PhantomData,
        }
    }

    pub fn try_new(config: kube::Config) -> anyhow::Result<Self> {
        let default_namespace = config.default_namespace.clone();
        let client = Client::try_from(config)?;
        Ok(Self::new(client, default_namespace))
    }

    fn namespace(&self, ctx: &RequestContext) -> String {
        ctx.namespace.clone().unwrap_or_else(|| self.default_namespace.clone())
    }

    fn api(&self, namespace: &str) -> Api<R> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn api_error(error: kube::Error, name: &str, namespace: &str) -> Status {
        Status::from_api_error(error, ObjectDetails::of::<R>(name, Some(namespace.to_string())))
    }
}

pub fn to_list_params(options: &ListOptions) -> ListParams {
    let mut params = ListParams::default();
    params.label_selector = options.label_selector.clone();
    params.field_selector = options.field_selector.clone();
    params.resource_version = options.resource_version.clone();
    params.limit = options.limit;
    params.continue_token = options.continue_token.clone();
    params.timeout = options.timeout_seconds;
    params
}

pub fn to_get_params(options: &GetOptions) -> GetParams {
    let mut params = GetParams::default();
    params.resource_version = options.resource_version.clone();
    params
}

pub fn to_watch_params(options: &ListOptions) -> WatchParams {
    let mut params = WatchParams::default();
    params.label_selector = options.label_selector.clone();
    params.field_selector = options.field_selector.clone();
    params.timeout = options
        .timeout_seconds
        .map(|timeout| timeout.min(MAX_WATCH_TIMEOUT_SECONDS));
    params
}

pub fn to_delete_params(options: Option<&DeleteOptions>) -> DeleteParams {
    let mut params = DeleteParams::default();
    if let Some(options) = options {
        params.grace_period_seconds = options.grace_period_seconds;
        params.preconditions = options.preconditions.as_ref().map(|p| Preconditions {
            uid: p.uid.clone(),
            resource_version: p.resource_version.clone(),
        });
    }
    params
}

#[async_trait]
impl<R> StandardStorage<R> for KubernetesStorage<R>
where
    R: RegistryResource,
{
    async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> Result<ResourceList<R>, Status> {
        let namespace = self.namespace(ctx);
        let list = self
            .api(&namespace)
            .list(&to_list_params(options))
            .await
            .map_err(|e| Self::api_error(e, "", &namespace))?;
        Ok(ResourceList {
            items: list.items,
            metadata: list.metadata,
        })
    }

    async fn get(&self, ctx: &RequestContext, name: &str, options: &GetOptions) -> Result<R, Status> {
        let namespace = self.namespace(ctx);
        self.api(&namespace)
            .get_with(name, &to_get_params(options))
            .await
            .map_err(|e| Self::api_error(e, name, &namespace))
    }

    async fn create(&self, ctx: &RequestContext, object: R) -> Result<R, Status> {
        let namespace = self.namespace(ctx);
        let name = object.meta().name.clone().unwrap_or_default();
        self.api(&namespace)
            .create(&PostParams::default(), &object)
            .await
            .map_err(|e| Self::api_error(e, &name, &namespace))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        name: &str,
        object_info: &dyn UpdatedObjectInfo<R>,
    ) -> Result<(R, bool), Status> {
        let namespace = self.namespace(ctx);
        let api = self.api(&namespace);
        let old = api.get(name).await.map_err(|e| Self::api_error(e, name, &namespace))?;

        if let Some(uid) = object_info.preconditions().and_then(|p| p.uid) {
            if old.meta().uid.as_ref() != Some(&uid) {
                return Err(Status::Conflict(format!(
                    "Precondition failed: UID in precondition: {}, UID in object meta: {}",
                    uid,
                    old.meta().uid.as_deref().unwrap_or_default()
                )));
            }
        }

        let updated = object_info.updated_object(ctx, &old)?;
        debug!("Replacing {:?}/{:?}", namespace, name);
        let replaced = api
            .replace(name, &PostParams::default(), &updated)
            .await
            .map_err(|e| Self::api_error(e, name, &namespace))?;
        Ok((replaced, false))
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        name: &str,
        options: Option<&DeleteOptions>,
    ) -> Result<Deleted<R>, Status> {
        let namespace = self.namespace(ctx);
        let deleted = self
            .api(&namespace)
            .delete(name, &to_delete_params(options))
            .await
            .map_err(|e| Self::api_error(e, name, &namespace))?;
        let immediately = deleted.is_left();
        Ok(Deleted {
            object: deleted.left(),
            immediately,
        })
    }

    async fn watch(&self, ctx: &RequestContext, options: &ListOptions) -> Result<WatchStream<R>, Status> {
        let namespace = self.namespace(ctx);
        let version = options
            .resource_version
            .clone()
            .unwrap_or_else(|| WATCH_FROM_ANY_VERSION.to_string());
        let stream = self
            .api(&namespace)
            .watch(&to_watch_params(options), &version)
            .await
            .map_err(|e| Self::api_error(e, "", &namespace))?;
        Ok(stream.map(|event| event.map_err(Status::from)).boxed())
    }
}
