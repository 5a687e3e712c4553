use crate::contracts::options::{DeleteOptions, ExportOptions, GetOptions, ListOptions, Preconditions};
use crate::contracts::request_context::RequestContext;
use crate::services::backends::memory::InMemoryStorage;
use crate::services::base::standard_storage::StandardStorage;
use crate::services::base::status::Status;
use crate::services::base::types::ServiceRegistry;
use crate::services::registry::{ResourceRegistry, new_registry};
use crate::testing::memory_registry_context::{MemoryRegistryContext, TEST_NAMESPACE};
use crate::testing::service;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::api::WatchEvent;
use std::sync::Arc;
use std::time::Duration;
use test_context::test_context;

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_create_stamps_system_fields(ctx: &mut MemoryRegistryContext) {
    let created = ctx
        .registry
        .create(&ctx.ctx, service("svc-a", TEST_NAMESPACE))
        .await
        .unwrap();

    assert!(created.metadata.uid.is_some());
    assert!(created.metadata.creation_timestamp.is_some());
    assert_eq!(created.metadata.resource_version, Some("1".to_string()));

    let fetched = ctx.registry.get(&ctx.ctx, "svc-a", &GetOptions::default()).await.unwrap();
    assert_eq!(fetched, created);
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_create_existing_fails(ctx: &mut MemoryRegistryContext) {
    ctx.registry.create(&ctx.ctx, service("svc-a", TEST_NAMESPACE)).await.unwrap();

    let error = ctx
        .registry
        .create(&ctx.ctx, service("svc-a", TEST_NAMESPACE))
        .await
        .unwrap_err();

    assert!(matches!(error, Status::AlreadyExists(_)));
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_create_with_generated_name(ctx: &mut MemoryRegistryContext) {
    let mut object = service("", TEST_NAMESPACE);
    object.metadata.name = None;
    object.metadata.generate_name = Some("web-".to_string());

    let created = ctx.registry.create(&ctx.ctx, object).await.unwrap();

    let name = created.metadata.name.unwrap();
    assert!(name.starts_with("web-"));
    assert_eq!(name.len(), "web-".len() + 5);
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_create_rejects_namespace_mismatch(ctx: &mut MemoryRegistryContext) {
    let error = ctx
        .registry
        .create(&ctx.ctx, service("svc-a", "other"))
        .await
        .unwrap_err();

    assert!(matches!(error, Status::Invalid(_)));
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_list_pages_in_name_order(ctx: &mut MemoryRegistryContext) {
    for name in ["svc-c", "svc-a", "svc-b"] {
        ctx.registry.create(&ctx.ctx, service(name, TEST_NAMESPACE)).await.unwrap();
    }

    let first = ctx
        .registry
        .list(&ctx.ctx, &ListOptions::default().with_limit(2))
        .await
        .unwrap();
    let names: Vec<_> = first.items.iter().filter_map(|s| s.metadata.name.clone()).collect();
    assert_eq!(names, vec!["svc-a", "svc-b"]);
    assert_eq!(first.metadata.remaining_item_count, Some(1));
    assert_eq!(first.metadata.resource_version, Some("3".to_string()));

    let token = first.metadata.continue_.unwrap();
    let second = ctx
        .registry
        .list(&ctx.ctx, &ListOptions::default().with_limit(2).with_continue_token(token))
        .await
        .unwrap();
    let names: Vec<_> = second.items.iter().filter_map(|s| s.metadata.name.clone()).collect();
    assert_eq!(names, vec!["svc-c"]);
    assert_eq!(second.metadata.continue_, None);
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_list_filters_by_namespace_and_labels(ctx: &mut MemoryRegistryContext) {
    let other = RequestContext::new().with_namespace("other");
    ctx.registry.create(&ctx.ctx, service("svc-a", TEST_NAMESPACE)).await.unwrap();
    ctx.registry.create(&ctx.ctx, service("svc-b", TEST_NAMESPACE)).await.unwrap();
    ctx.registry.create(&other, service("svc-a", "other")).await.unwrap();

    let scoped = ctx.registry.list(&ctx.ctx, &ListOptions::default()).await.unwrap();
    assert_eq!(scoped.items.len(), 2);

    let all = ctx
        .registry
        .list(&RequestContext::new(), &ListOptions::default())
        .await
        .unwrap();
    assert_eq!(all.items.len(), 3);

    let selected = ctx
        .registry
        .list(&ctx.ctx, &ListOptions::default().with_label_selector("app=svc-b"))
        .await
        .unwrap();
    assert_eq!(selected.items.len(), 1);
    assert_eq!(selected.items[0].metadata.name, Some("svc-b".to_string()));
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_update_keeps_identity_and_bumps_version(ctx: &mut MemoryRegistryContext) {
    let created = ctx
        .registry
        .create(&ctx.ctx, service("svc-a", TEST_NAMESPACE))
        .await
        .unwrap();

    let mut changed = created.clone();
    changed.metadata.labels = None;
    let updated = ctx.registry.update(&ctx.ctx, changed).await.unwrap();

    assert_eq!(updated.metadata.uid, created.metadata.uid);
    assert_eq!(updated.metadata.labels, None);
    assert_eq!(updated.metadata.resource_version, Some("2".to_string()));
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_update_with_stale_version_conflicts(ctx: &mut MemoryRegistryContext) {
    let created = ctx
        .registry
        .create(&ctx.ctx, service("svc-a", TEST_NAMESPACE))
        .await
        .unwrap();
    ctx.registry.update(&ctx.ctx, created.clone()).await.unwrap();

    let error = ctx.registry.update(&ctx.ctx, created).await.unwrap_err();

    assert!(matches!(error, Status::Conflict(_)));
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_update_with_foreign_uid_conflicts(ctx: &mut MemoryRegistryContext) {
    ctx.registry.create(&ctx.ctx, service("svc-a", TEST_NAMESPACE)).await.unwrap();
    let mut object = service("svc-a", TEST_NAMESPACE);
    object.metadata.uid = Some("someone-else".to_string());

    let error = ctx.registry.update(&ctx.ctx, object).await.unwrap_err();

    assert!(matches!(error, Status::Conflict(_)));
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_update_missing_fails(ctx: &mut MemoryRegistryContext) {
    let error = ctx
        .registry
        .update(&ctx.ctx, service("svc-a", TEST_NAMESPACE))
        .await
        .unwrap_err();

    assert!(error.is_not_found());
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_delete_removes_object(ctx: &mut MemoryRegistryContext) {
    ctx.registry.create(&ctx.ctx, service("svc-a", TEST_NAMESPACE)).await.unwrap();

    ctx.registry.delete(&ctx.ctx, "svc-a").await.unwrap();

    let error = ctx
        .registry
        .get(&ctx.ctx, "svc-a", &GetOptions::default())
        .await
        .unwrap_err();
    assert!(error.is_not_found());
    assert!(ctx.registry.delete(&ctx.ctx, "svc-a").await.unwrap_err().is_not_found());
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_delete_checks_preconditions(ctx: &mut MemoryRegistryContext) {
    ctx.registry.create(&ctx.ctx, service("svc-a", TEST_NAMESPACE)).await.unwrap();
    let options = DeleteOptions {
        preconditions: Some(Preconditions {
            uid: Some("someone-else".to_string()),
            resource_version: None,
        }),
        ..Default::default()
    };

    let error = ctx.storage.delete(&ctx.ctx, "svc-a", Some(&options)).await.unwrap_err();
    assert!(matches!(error, Status::Conflict(_)));

    let deleted = ctx.storage.delete(&ctx.ctx, "svc-a", None).await.unwrap();
    assert!(deleted.immediately);
    assert_eq!(deleted.object.unwrap().metadata.name, Some("svc-a".to_string()));
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_watch_replays_and_follows_changes(ctx: &mut MemoryRegistryContext) {
    ctx.registry.create(&ctx.ctx, service("svc-a", TEST_NAMESPACE)).await.unwrap();

    let mut stream = ctx
        .registry
        .watch(&ctx.ctx, &ListOptions::default().with_label_selector("app!=svc-ignored"))
        .await
        .unwrap();

    ctx.registry
        .create(&ctx.ctx, service("svc-ignored", TEST_NAMESPACE))
        .await
        .unwrap();
    ctx.registry.create(&ctx.ctx, service("svc-b", TEST_NAMESPACE)).await.unwrap();
    ctx.registry.delete(&ctx.ctx, "svc-a").await.unwrap();

    let mut events = Vec::new();
    for _ in 0..3 {
        let event = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("Timed out waiting for a watch event")
            .expect("Watch stream ended")
            .unwrap();
        events.push(match event {
            WatchEvent::Added(s) => format!("ADDED {}", s.metadata.name.unwrap()),
            WatchEvent::Modified(s) => format!("MODIFIED {}", s.metadata.name.unwrap()),
            WatchEvent::Deleted(s) => format!("DELETED {}", s.metadata.name.unwrap()),
            _ => "OTHER".to_string(),
        });
    }

    assert_eq!(events, vec!["ADDED svc-a", "ADDED svc-b", "DELETED svc-a"]);
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_export_strips_cluster_fields(ctx: &mut MemoryRegistryContext) {
    ctx.registry.create(&ctx.ctx, service("svc-a", TEST_NAMESPACE)).await.unwrap();

    let exported = ctx
        .registry
        .export(&ctx.ctx, "svc-a", &ExportOptions::default())
        .await
        .unwrap();

    assert_eq!(exported.metadata.name, Some("svc-a".to_string()));
    assert_eq!(exported.metadata.namespace, None);
    assert_eq!(exported.metadata.uid, None);
    assert_eq!(exported.metadata.resource_version, None);
    assert!(exported.status.is_none());
    assert_eq!(exported.spec.unwrap().cluster_ip, None);
}

#[tokio::test]
async fn test_export_is_unsupported_without_strategy() {
    let storage = Arc::new(InMemoryStorage::<Service>::new(TEST_NAMESPACE));
    let registry: Arc<ServiceRegistry> = new_registry(storage.clone());
    let ctx = RequestContext::new();
    registry.create(&ctx, service("svc-a", TEST_NAMESPACE)).await.unwrap();

    assert!(storage.exporter().is_none());
    let error = registry
        .export(&ctx, "svc-a", &ExportOptions::default())
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "export is not supported");
}

#[tokio::test]
async fn test_expired_deadline_times_out() {
    let storage = InMemoryStorage::<Service>::new(TEST_NAMESPACE);
    let ctx = RequestContext::new().with_timeout(Duration::ZERO);

    let error = storage.get(&ctx, "svc-a", &GetOptions::default()).await.unwrap_err();

    assert!(matches!(error, Status::Timeout(_)));
}

#[test_context(MemoryRegistryContext)]
#[tokio::test]
async fn test_update_rejects_namespace_mismatch(ctx: &mut MemoryRegistryContext) {
    let created = ctx
        .registry
        .create(&ctx.ctx, service("svc-a", TEST_NAMESPACE))
        .await
        .unwrap();
    let mut foreign = service("svc-a", "other");
    foreign.metadata.labels = None;

    let error = ctx.registry.update(&ctx.ctx, foreign).await.unwrap_err();
    assert!(matches!(error, Status::Invalid(_)));

    let fetched = ctx.registry.get(&ctx.ctx, "svc-a", &GetOptions::default()).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_empty_namespace_falls_back_to_default() {
    let storage = Arc::new(InMemoryStorage::<Service>::new(TEST_NAMESPACE));
    let registry: Arc<ServiceRegistry> = new_registry(storage);
    let ctx = RequestContext::new();

    let created = registry.create(&ctx, service("svc-a", "")).await.unwrap();
    assert_eq!(created.metadata.namespace, Some(TEST_NAMESPACE.to_string()));

    let fetched = registry.get(&ctx, "svc-a", &GetOptions::default()).await.unwrap();
    assert_eq!(fetched, created);
    registry.delete(&ctx, "svc-a").await.unwrap();
}
