/// Concurrent mutations of the same task
///
/// `BarrierStore` holds every `get_task` call until two requests have read
/// the task, so both decide against the same snapshot before either writes.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Barrier;
use uuid::Uuid;

use dutyroster_shared::auth::middleware::Identity;
use dutyroster_shared::error::CoreError;
use dutyroster_shared::hierarchy::{Scope, WILDCARD};
use dutyroster_shared::lifecycle::TaskUpdate;
use dutyroster_shared::models::task::{CreateTask, Task};
use dutyroster_shared::models::user::{CreateUser, Role, User};
use dutyroster_shared::services::{NewTask, TaskService};
use dutyroster_shared::store::memory::MemoryStore;
use dutyroster_shared::store::{
    Store, StoreResult, TaskQuery, TaskStore, UserQuery, UserStore,
};

struct BarrierStore {
    inner: MemoryStore,
    barrier: Barrier,
}

#[async_trait]
impl UserStore for BarrierStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_username(username).await
    }

    async fn get_users_where(&self, query: &UserQuery) -> StoreResult<Vec<User>> {
        self.inner.get_users_where(query).await
    }

    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        self.inner.insert_user(data).await
    }
}

#[async_trait]
impl TaskStore for BarrierStore {
    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = self.inner.get_task(id).await;
        self.barrier.wait().await;
        task
    }

    async fn get_tasks_where(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        self.inner.get_tasks_where(query).await
    }

    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        self.inner.insert_task(data).await
    }

    async fn put_task(&self, task: &Task) -> StoreResult<Task> {
        self.inner.put_task(task).await
    }

    async fn delete_task(&self, id: Uuid, expected_version: i64) -> StoreResult<()> {
        self.inner.delete_task(id, expected_version).await
    }
}

#[async_trait]
impl Store for BarrierStore {
    fn backend(&self) -> &'static str {
        "barrier"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

struct Race {
    inner: MemoryStore,
    service: TaskService,
    admin: Identity,
    other_admin: Identity,
    task: Task,
}

/// Seeds a completed task, then hands out a service that gates reads
async fn setup() -> Race {
    let inner = MemoryStore::new();
    let admin = inner
        .insert_user(CreateUser::new(
            "admin",
            "hash",
            Role::Admin,
            Scope::new(1, 2, WILDCARD, WILDCARD),
        ))
        .await
        .unwrap();
    let other_admin = inner
        .insert_user(CreateUser::new(
            "other",
            "hash",
            Role::Admin,
            Scope::new(1, WILDCARD, WILDCARD, WILDCARD),
        ))
        .await
        .unwrap();
    let soldier = inner
        .insert_user(CreateUser::new("soldier", "hash", Role::Normal, Scope::new(1, 2, 5, 9)))
        .await
        .unwrap();

    let seeding = TaskService::new(Arc::new(inner.clone()));
    let admin = Identity::new(admin.id, Role::Admin);
    let created = seeding
        .create(
            &admin,
            NewTask {
                name: "Clean rifle".to_string(),
                assigned_to: soldier.id,
            },
        )
        .await
        .unwrap();
    let task = seeding
        .update(
            &admin,
            TaskUpdate {
                completed: true,
                ..TaskUpdate::from_task(&created)
            },
        )
        .await
        .unwrap();

    let gated = BarrierStore {
        inner: inner.clone(),
        barrier: Barrier::new(2),
    };

    Race {
        inner,
        service: TaskService::new(Arc::new(gated)),
        admin,
        other_admin: Identity::new(other_admin.id, Role::Admin),
        task,
    }
}

fn lost(err: &CoreError) -> bool {
    matches!(err, CoreError::Conflict(_) | CoreError::NotFound(_))
}

#[tokio::test]
async fn test_verify_races_delete() {
    let race = setup().await;
    let verify = TaskUpdate {
        verified: true,
        ..TaskUpdate::from_task(&race.task)
    };

    let (updated, deleted) = tokio::join!(
        race.service.update(&race.admin, verify),
        race.service.delete(&race.other_admin, race.task.id),
    );

    match (&updated, &deleted) {
        (Ok(task), Err(err)) => {
            assert!(lost(err), "unexpected delete error: {:?}", err);
            assert_eq!(race.inner.get_task(task.id).await.unwrap(), Some(task.clone()));
        }
        (Err(err), Ok(())) => {
            assert!(lost(err), "unexpected update error: {:?}", err);
            assert_eq!(race.inner.get_task(race.task.id).await.unwrap(), None);
        }
        _ => panic!(
            "exactly one mutation must win: update={:?} delete={:?}",
            updated, deleted
        ),
    }
}

#[tokio::test]
async fn test_concurrent_verify_toggles() {
    let race = setup().await;
    let verify = TaskUpdate {
        verified: true,
        ..TaskUpdate::from_task(&race.task)
    };
    let uncomplete = TaskUpdate {
        completed: false,
        ..TaskUpdate::from_task(&race.task)
    };

    let (first, second) = tokio::join!(
        race.service.update(&race.admin, verify),
        race.service.update(&race.other_admin, uncomplete),
    );

    let winners = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "first={:?} second={:?}", first, second);

    for result in [&first, &second] {
        if let Err(err) = result {
            assert!(matches!(err, CoreError::Conflict(_)), "unexpected error: {:?}", err);
        }
    }

    let stored = race.inner.get_task(race.task.id).await.unwrap().unwrap();
    assert_eq!(stored.version, race.task.version + 1);
    assert!(!(stored.verified && !stored.completed));
}
