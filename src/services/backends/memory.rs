#[cfg(test)]
mod tests;

use crate::contracts::options::{DeleteOptions, ExportOptions, GetOptions, LabelSelector, ListOptions, Preconditions};
use crate::contracts::request_context::RequestContext;
use crate::services::base::export_strategy::{ExportStrategy, export_object_meta};
use crate::services::base::standard_storage::{Deleted, Exporter, StandardStorage, WatchStream};
use crate::services::base::status::Status;
use crate::services::base::status::object_details::ObjectDetails;
use crate::services::base::types::{RegistryResource, ResourceList};
use crate::services::base::updated_object_info::UpdatedObjectInfo;
use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ListMeta, Time};
use kube::api::WatchEvent;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

const WATCH_CHANNEL_CAPACITY: usize = 256;
const GENERATED_NAME_SUFFIX_LENGTH: usize = 5;

type ObjectKey = (String, String);

#[derive(Debug, Clone)]
enum Change<R> {
    Added(R),
    Modified(R),
    Deleted(R),
}

impl<R> Change<R> {
    fn object(&self) -> &R {
        match self {
            Change::Added(object) | Change::Modified(object) | Change::Deleted(object) => object,
        }
    }

    fn into_watch_event(self) -> WatchEvent<R> {
        match self {
            Change::Added(object) => WatchEvent::Added(object),
            Change::Modified(object) => WatchEvent::Modified(object),
            Change::Deleted(object) => WatchEvent::Deleted(object),
        }
    }
}

struct State<R> {
    objects: BTreeMap<ObjectKey, R>,
    revision: u64,
}

/// Stores objects of a single kind in memory, keyed by namespace and name
pub struct InMemoryStorage<R>
where
    R: RegistryResource,
{
    state: RwLock<State<R>>,
    changes: broadcast::Sender<Change<R>>,
    default_namespace: String,
    export_strategy: Option<Arc<dyn ExportStrategy<R>>>,
}

impl<R> InMemoryStorage<R>
where
    R: RegistryResource,
{
    pub fn new(default_namespace: &str) -> Self {
        let (changes, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        InMemoryStorage {
            state: RwLock::new(State {
                objects: BTreeMap::new(),
                revision: 0,
            }),
            changes,
            default_namespace: default_namespace.to_string(),
            export_strategy: None,
        }
    }

    /// Enables the export capability
    pub fn with_export_strategy(mut self, strategy: Arc<dyn ExportStrategy<R>>) -> Self {
        self.export_strategy = Some(strategy);
        self
    }

    fn namespace(&self, ctx: &RequestContext) -> String {
        requested_namespace(ctx)
            .unwrap_or(&self.default_namespace)
            .to_string()
    }

    fn details(name: &str, namespace: &str) -> ObjectDetails {
        ObjectDetails::of::<R>(name, Some(namespace.to_string()))
    }

    fn check_preconditions(object: &R, preconditions: Option<&Preconditions>) -> Result<(), Status> {
        let Some(preconditions) = preconditions else {
            return Ok(());
        };
        let meta = object.meta();
        if let Some(uid) = &preconditions.uid {
            if meta.uid.as_ref() != Some(uid) {
                return Err(Status::Conflict(format!(
                    "Precondition failed: UID in precondition: {}, UID in object meta: {}",
                    uid,
                    meta.uid.as_deref().unwrap_or_default()
                )));
            }
        }
        if let Some(resource_version) = &preconditions.resource_version {
            if meta.resource_version.as_ref() != Some(resource_version) {
                return Err(Status::Conflict(format!(
                    "Precondition failed: ResourceVersion in precondition: {}, ResourceVersion in object meta: {}",
                    resource_version,
                    meta.resource_version.as_deref().unwrap_or_default()
                )));
            }
        }
        Ok(())
    }

    fn publish(&self, change: Change<R>) {
        // No receivers is not an error: nobody is watching
        let _ = self.changes.send(change);
    }
}

/// An empty namespace counts as unset
fn requested_namespace(ctx: &RequestContext) -> Option<&str> {
    ctx.namespace.as_deref().filter(|ns| !ns.is_empty())
}

fn own_namespace<R: RegistryResource>(object: &R) -> Option<&str> {
    object.meta().namespace.as_deref().filter(|ns| !ns.is_empty())
}

fn namespace_mismatch(own: &str, requested: &str) -> Status {
    Status::Invalid(format!(
        "the namespace of the provided object ({}) does not match the namespace sent on the request ({})",
        own, requested
    ))
}

fn generate_name(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(GENERATED_NAME_SUFFIX_LENGTH)
        .collect();
    format!("{}{}", prefix, suffix)
}

fn label_selector(options: &ListOptions) -> Result<LabelSelector, Status> {
    options
        .parsed_label_selector()
        .map(Option::unwrap_or_default)
        .map_err(|e| Status::Invalid(e.to_string()))
}

fn in_scope<R: RegistryResource>(object: &R, namespace: Option<&str>, selector: &LabelSelector) -> bool {
    let namespace_matches = namespace.is_none_or(|ns| object.meta().namespace.as_deref() == Some(ns));
    namespace_matches && selector.matches(object.meta().labels.as_ref())
}

fn continue_token(key: &ObjectKey) -> String {
    format!("{}/{}", key.0, key.1)
}

fn parse_continue_token(token: &str) -> Result<ObjectKey, Status> {
    token
        .split_once('/')
        .map(|(namespace, name)| (namespace.to_string(), name.to_string()))
        .ok_or_else(|| Status::Invalid(format!("Invalid continue token: {:?}", token)))
}

#[async_trait]
impl<R> StandardStorage<R> for InMemoryStorage<R>
where
    R: RegistryResource,
{
    async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> Result<ResourceList<R>, Status> {
        ctx.check_deadline()?;
        let selector = label_selector(options)?;
        let start = options.continue_token.as_deref().map(parse_continue_token).transpose()?;
        let limit = options.limit.filter(|limit| *limit > 0).map(|limit| limit as usize);

        let read_guard = self.state.read().await;
        let mut matching = (*read_guard)
            .objects
            .iter()
            .filter(|(key, _)| start.as_ref().is_none_or(|start| *key >= start))
            .filter(|(_, object)| in_scope(*object, requested_namespace(ctx), &selector));

        let mut items = Vec::new();
        let mut next = None;
        for (key, object) in matching.by_ref() {
            if limit.is_some_and(|limit| items.len() == limit) {
                next = Some(key.clone());
                break;
            }
            items.push(object.clone());
        }
        let remaining = next.as_ref().map(|_| matching.count() as i64 + 1);

        Ok(ResourceList {
            items,
            metadata: ListMeta {
                resource_version: Some(read_guard.revision.to_string()),
                continue_: next.as_ref().map(continue_token),
                remaining_item_count: remaining,
                ..Default::default()
            },
        })
    }

    async fn get(&self, ctx: &RequestContext, name: &str, _: &GetOptions) -> Result<R, Status> {
        ctx.check_deadline()?;
        let namespace = self.namespace(ctx);
        let read_guard = self.state.read().await;
        match (*read_guard).objects.get(&(namespace.clone(), name.to_string())) {
            Some(object) => Ok(object.clone()),
            None => Err(Status::NotFound(Self::details(name, &namespace))),
        }
    }

    async fn create(&self, ctx: &RequestContext, object: R) -> Result<R, Status> {
        ctx.check_deadline()?;
        let mut object = object;
        let namespace = match (requested_namespace(ctx), own_namespace(&object)) {
            (Some(requested), Some(own)) if requested != own => return Err(namespace_mismatch(own, requested)),
            (_, Some(own)) => own.to_string(),
            (_, None) => self.namespace(ctx),
        };

        let name = match (object.meta().name.as_deref(), object.meta().generate_name.as_deref()) {
            (Some(name), _) if !name.is_empty() => name.to_string(),
            (_, Some(prefix)) if !prefix.is_empty() => generate_name(prefix),
            _ => return Err(Status::Invalid("name or generateName is required".to_string())),
        };

        let mut write_guard = self.state.write().await;
        let key = (namespace.clone(), name.clone());
        if (*write_guard).objects.contains_key(&key) {
            return Err(Status::AlreadyExists(Self::details(&name, &namespace)));
        }
        write_guard.revision += 1;

        let meta = object.meta_mut();
        meta.name = Some(name);
        meta.namespace = Some(namespace);
        meta.uid = Some(Uuid::new_v4().to_string());
        meta.resource_version = Some(write_guard.revision.to_string());
        meta.creation_timestamp = Some(Time(chrono::Utc::now()));

        (*write_guard).objects.insert(key, object.clone());
        debug!("Created object {:?}/{:?}", object.meta().namespace, object.meta().name);
        self.publish(Change::Added(object.clone()));
        Ok(object)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        name: &str,
        object_info: &dyn UpdatedObjectInfo<R>,
    ) -> Result<(R, bool), Status> {
        ctx.check_deadline()?;
        let namespace = self.namespace(ctx);
        let key = (namespace.clone(), name.to_string());

        let mut write_guard = self.state.write().await;
        let Some(old) = (*write_guard).objects.get(&key).cloned() else {
            return Err(Status::NotFound(Self::details(name, &namespace)));
        };
        Self::check_preconditions(&old, object_info.preconditions().as_ref())?;

        let mut updated = object_info.updated_object(ctx, &old)?;
        if let Some(own) = own_namespace(&updated).filter(|own| *own != namespace) {
            return Err(namespace_mismatch(own, &namespace));
        }
        if let Some(resource_version) = updated.meta().resource_version.as_deref().filter(|rv| !rv.is_empty()) {
            if old.meta().resource_version.as_deref() != Some(resource_version) {
                return Err(Status::Conflict(format!(
                    "Operation cannot be fulfilled on {}: the object has been modified",
                    Self::details(name, &namespace)
                )));
            }
        }
        write_guard.revision += 1;

        let meta = updated.meta_mut();
        meta.name = Some(name.to_string());
        meta.namespace = Some(namespace);
        meta.uid = old.meta().uid.clone();
        meta.creation_timestamp = old.meta().creation_timestamp.clone();
        meta.resource_version = Some(write_guard.revision.to_string());

        (*write_guard).objects.insert(key, updated.clone());
        self.publish(Change::Modified(updated.clone()));
        Ok((updated, false))
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        name: &str,
        options: Option<&DeleteOptions>,
    ) -> Result<Deleted<R>, Status> {
        ctx.check_deadline()?;
        let namespace = self.namespace(ctx);
        let key = (namespace.clone(), name.to_string());

        let mut write_guard = self.state.write().await;
        let Some(existing) = (*write_guard).objects.get(&key) else {
            return Err(Status::NotFound(Self::details(name, &namespace)));
        };
        Self::check_preconditions(existing, options.and_then(|o| o.preconditions.as_ref()))?;

        let removed = (*write_guard).objects.remove(&key);
        write_guard.revision += 1;
        if let Some(object) = &removed {
            self.publish(Change::Deleted(object.clone()));
        }
        Ok(Deleted {
            object: removed,
            immediately: true,
        })
    }

    async fn watch(&self, ctx: &RequestContext, options: &ListOptions) -> Result<WatchStream<R>, Status> {
        ctx.check_deadline()?;
        let selector = label_selector(options)?;
        let namespace = requested_namespace(ctx).map(str::to_string);

        // Subscribe while holding the lock so no change falls between the snapshot and the stream
        let read_guard = self.state.read().await;
        let receiver = self.changes.subscribe();
        let initial: Vec<Result<WatchEvent<R>, Status>> = match options.resource_version.as_deref() {
            None | Some("") | Some("0") => (*read_guard)
                .objects
                .values()
                .filter(|object| in_scope(*object, namespace.as_deref(), &selector))
                .map(|object| Ok(WatchEvent::Added(object.clone())))
                .collect(),
            Some(_) => Vec::new(),
        };
        drop(read_guard);

        let live = futures::stream::unfold(receiver, move |mut receiver| {
            let namespace = namespace.clone();
            let selector = selector.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(change) if in_scope(change.object(), namespace.as_deref(), &selector) => {
                            return Some((Ok(change.into_watch_event()), receiver));
                        }
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Watch receiver lagged behind, {} events skipped", skipped);
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(futures::stream::iter(initial).chain(live).boxed())
    }

    fn exporter(&self) -> Option<&dyn Exporter<R>> {
        self.export_strategy.as_ref().map(|_| self as &dyn Exporter<R>)
    }
}

#[async_trait]
impl<R> Exporter<R> for InMemoryStorage<R>
where
    R: RegistryResource,
{
    async fn export(&self, ctx: &RequestContext, name: &str, options: &ExportOptions) -> Result<R, Status> {
        let Some(strategy) = self.export_strategy.as_ref() else {
            return Err(Status::ExportNotSupported);
        };
        let mut object = self.get(ctx, name, &GetOptions::default()).await?;
        export_object_meta(object.meta_mut(), options.exact);
        strategy.prepare_for_export(&mut object, options.exact);
        Ok(object)
    }
}
