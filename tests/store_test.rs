mod helpers;

use std::time::Duration;

use helpers::test_postgres::TestPostgres;
use helpers::{at, hint_config, service_config};
use scanhub::application::ports::{
    DistributedLock, JobDateField, JobStore, RepositoryError, ServiceConfigStore,
};
use scanhub::domain::{
    ErrorPayload, Hint, HintSeverity, HintStatus, JobId, JobStatus, NewJob, ServiceConfig,
};
use scanhub::infrastructure::persistence::{
    InMemoryDistributedLock, InMemoryJobStore, InMemoryServiceConfigStore,
};

fn new_job(url: &str, queued_at: i64) -> NewJob {
    NewJob {
        url: url.to_string(),
        status: JobStatus::Pending,
        hints: vec![Hint::pending("axe", "accessibility")],
        config: vec![hint_config(&[("axe", HintSeverity::Error)])],
        max_run_time: 120,
        queued: at(queued_at),
        messages_in_queue: None,
    }
}

async fn check_job_store(store: &dyn JobStore) {
    let first = store.add(new_job("https://example.com/", 0)).await.unwrap();
    let second = store.add(new_job("https://example.com/", 10)).await.unwrap();
    store.add(new_job("https://other.example/", 5)).await.unwrap();

    assert_eq!(store.get(first.id).await.unwrap(), Some(first.clone()));
    assert_eq!(store.get(JobId::new()).await.unwrap(), None);

    let latest = store.get_latest_by_url("https://example.com/").await.unwrap();
    assert_eq!(latest, vec![second.clone()]);
    assert!(store.get_latest_by_url("https://none.example/").await.unwrap().is_empty());

    let mut updated = first.clone();
    updated.status = JobStatus::Finished;
    updated.started = Some(at(1));
    updated.finished = Some(at(3));
    updated.hints[0].status = HintStatus::Pass;
    updated.error.push(ErrorPayload::new("boom").with_stack("at scan"));
    updated.log = "part 1\n".to_string();
    updated.messages_in_queue = Some(4);
    updated.webhint_version = Some("4.2.0".to_string());
    store.update(&updated).await.unwrap();
    assert_eq!(store.get(first.id).await.unwrap(), Some(updated.clone()));

    let queued = store
        .get_by_date_range(JobDateField::Queued, at(0), at(10))
        .await
        .unwrap();
    let times: Vec<_> = queued.iter().map(|j| j.queued).collect();
    assert_eq!(times, vec![at(0), at(5)]);

    let finished = store
        .get_by_date_range(JobDateField::Finished, at(0), at(60))
        .await
        .unwrap();
    assert_eq!(finished, vec![updated]);

    let mut missing = second;
    missing.id = JobId::new();
    assert!(matches!(
        store.update(&missing).await,
        Err(RepositoryError::NotFound(_))
    ));
}

async fn check_service_config_store(store: &dyn ServiceConfigStore) {
    assert_eq!(store.get_active().await.unwrap(), None);

    let first = service_config(vec![hint_config(&[("axe", HintSeverity::Error)])]);
    let second = ServiceConfig::new(
        "next",
        60,
        90,
        vec![hint_config(&[("http-cache", HintSeverity::Warning)]).extending(["web-recommended"])],
    );
    store.add(&first).await.unwrap();
    store.add(&second).await.unwrap();
    assert!(matches!(
        store.add(&first).await,
        Err(RepositoryError::ConstraintViolation(_))
    ));

    let active = store.activate("default").await.unwrap();
    assert!(active.active);
    assert_eq!(active.webhint_configs, first.webhint_configs);

    store.activate("next").await.unwrap();
    let active = store.get_active().await.unwrap().unwrap();
    assert_eq!(active.name, "next");
    assert_eq!(active.job_cache_time, 60);
    assert_eq!(active.job_run_time, 90);
    assert_eq!(active.webhint_configs, second.webhint_configs);

    let mut names: Vec<_> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.name, c.active))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![("default".to_string(), false), ("next".to_string(), true)]
    );

    assert!(matches!(
        store.activate("missing").await,
        Err(RepositoryError::NotFound(_))
    ));
    assert_eq!(store.get("missing").await.unwrap(), None);
}

async fn check_lock(lock: &dyn DistributedLock) {
    let handle = lock.try_acquire("https://example.com/").await.unwrap().unwrap();
    assert_eq!(handle.key, "https://example.com/");
    assert!(lock.try_acquire("https://example.com/").await.unwrap().is_none());
    assert!(lock.try_acquire("https://other.example/").await.unwrap().is_some());

    lock.release(&handle).await.unwrap();
    let again = lock.try_acquire("https://example.com/").await.unwrap().unwrap();
    assert_ne!(again.code, handle.code);

    // Releasing with a stale handle leaves the current owner in place.
    lock.release(&handle).await.unwrap();
    assert!(lock.try_acquire("https://example.com/").await.unwrap().is_none());
}

#[tokio::test]
async fn given_in_memory_job_store_when_used_then_it_keeps_jobs() {
    check_job_store(&InMemoryJobStore::new()).await;
}

#[tokio::test]
async fn given_in_memory_config_store_when_activating_then_one_config_is_active() {
    check_service_config_store(&InMemoryServiceConfigStore::new()).await;
}

#[tokio::test]
async fn given_in_memory_lock_when_contended_then_only_owner_holds_it() {
    check_lock(&InMemoryDistributedLock::new(Duration::from_secs(30))).await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_postgres_job_store_when_used_then_it_keeps_jobs() {
    let pg = TestPostgres::new().await;
    check_job_store(&pg.job_store).await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_postgres_config_store_when_activating_then_one_config_is_active() {
    let pg = TestPostgres::new().await;
    check_service_config_store(&pg.config_store).await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_postgres_lock_when_contended_then_only_owner_holds_it() {
    let pg = TestPostgres::new().await;
    check_lock(&pg.lock).await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_expired_postgres_lock_when_acquiring_then_it_is_taken_over() {
    let pg = TestPostgres::new().await;
    let short = scanhub::infrastructure::persistence::PgDistributedLock::new(
        pg.pool.clone(),
        Duration::from_millis(100),
    );

    let stale = short.try_acquire("key").await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let fresh = short.try_acquire("key").await.unwrap().unwrap();

    assert_ne!(stale.code, fresh.code);
}
