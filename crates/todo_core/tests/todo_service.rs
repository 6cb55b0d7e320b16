mod common;

use common::{harness, FakeRemote, YieldingStore};
use std::sync::Arc;
use todo_core::{
    Priority, QueryKey, ServiceError, TodoInput, TodoPatch, TodoQueryCache, TodoService,
    TodoValidationError,
};

fn slow_read_service(
    seed: usize,
) -> (TodoService<todo_core::MirroredTodoRepository>, Arc<YieldingStore>) {
    let store = Arc::new(YieldingStore::new(0));
    let remote = Arc::new(FakeRemote::with_seed(seed));
    let repo = todo_core::MirroredTodoRepository::new(store.clone(), remote);
    (TodoService::new(repo, TodoQueryCache::new()), store)
}

fn service(seed: usize) -> (TodoService<todo_core::MirroredTodoRepository>, common::Harness) {
    let h = harness(seed);
    let repo = todo_core::MirroredTodoRepository::new(h.store.clone(), h.remote.clone());
    (TodoService::new(repo, TodoQueryCache::new()), h)
}

#[tokio::test]
async fn list_query_is_served_from_cache_until_a_write() {
    let (service, h) = service(3);
    service.initialize().await.unwrap();

    let first = service.todos().await.unwrap();
    let second = service.todos().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(service.cache().misses(), 1);
    assert_eq!(service.cache().hits(), 1);

    service
        .create(TodoInput::new("fresh").with_priority(Priority::High))
        .await
        .unwrap();
    assert!(!service.cache().contains(&QueryKey::Todos));

    let after = service.todos().await.unwrap();
    assert_eq!(after.len(), 4);
    assert_eq!(after[0].title, "fresh");
    assert_eq!(h.remote.count("POST"), 1);
}

#[tokio::test]
async fn create_trims_title_and_rejects_blank_input() {
    let (service, h) = service(0);

    let created = service.create(TodoInput::new("  Buy milk  ")).await.unwrap();
    assert_eq!(created.title, "Buy milk");

    let err = service.create(TodoInput::new("   ")).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTitle(TodoValidationError::BlankTitle)
    ));
    assert_eq!(h.remote.count("POST"), 1);
}

#[tokio::test]
async fn edit_rejects_blank_title_but_allows_title_free_patches() {
    let (service, h) = service(2);
    let todos = service.initialize().await.unwrap();
    let id = todos[0].id.clone();

    let err = service
        .edit(TodoPatch::new(id.clone()).title("\t"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTitle(_)));
    assert_eq!(h.remote.count("PUT"), 0);

    let edited = service
        .edit(TodoPatch::new(id.clone()).priority(Priority::Low))
        .await
        .unwrap();
    assert_eq!(edited.priority, Priority::Low);
    assert_eq!(edited.title, todos[0].title);
}

#[tokio::test]
async fn detail_query_is_invalidated_by_toggle() {
    let (service, _h) = service(2);
    let todos = service.initialize().await.unwrap();
    let id = todos[0].id.clone();

    let before = service.todo(&id).await.unwrap().unwrap();
    assert!(service.cache().contains(&QueryKey::Todo(id.clone())));

    service.toggle(&id).await.unwrap();
    assert!(!service.cache().contains(&QueryKey::Todo(id.clone())));

    let after = service.todo(&id).await.unwrap().unwrap();
    assert_eq!(after.completed, !before.completed);
}

#[tokio::test]
async fn failed_write_keeps_cached_queries() {
    let (service, _h) = service(2);
    service.initialize().await.unwrap();
    service.todos().await.unwrap();

    let err = service.toggle("nonexistent").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(service.cache().contains(&QueryKey::Todos));
}

#[tokio::test]
async fn delete_and_reset_invalidate_queries() {
    let (service, _h) = service(3);
    let todos = service.initialize().await.unwrap();
    service.todos().await.unwrap();

    service.delete(&todos[0].id).await.unwrap();
    assert!(!service.cache().contains(&QueryKey::Todos));
    assert_eq!(service.todos().await.unwrap().len(), 2);

    service.reset().await;
    assert!(!service.cache().contains(&QueryKey::Todos));
    assert!(service.todos().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_read_overlapping_a_create_does_not_cache_stale_rows() {
    let (service, store) = slow_read_service(2);
    service.initialize().await.unwrap();

    store.slow_down_next_read(20);
    let (stale, created) =
        tokio::join!(service.todos(), service.create(TodoInput::new("fresh")));
    assert_eq!(stale.unwrap().len(), 2);
    created.unwrap();

    let todos = service.todos().await.unwrap();
    assert_eq!(todos.len(), 3);
    assert!(todos.iter().any(|todo| todo.title == "fresh"));
}

#[tokio::test]
async fn detail_read_overlapping_a_toggle_does_not_cache_stale_row() {
    let (service, store) = slow_read_service(2);
    let seeded = service.initialize().await.unwrap();
    let id = seeded[0].id.clone();

    store.slow_down_next_read(20);
    let (stale, toggled) = tokio::join!(service.todo(&id), service.toggle(&id));
    assert_eq!(stale.unwrap().map(|todo| todo.completed), Some(seeded[0].completed));
    let toggled = toggled.unwrap();

    assert_eq!(service.todo(&id).await.unwrap(), Some(toggled));
}
