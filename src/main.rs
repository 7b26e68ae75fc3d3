use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::future::try_join_all;
use tokio::net::TcpListener;

use scanhub::application::ports::{
    DistributedLock, HintCatalog, IssueReporter, JobStore, MessageQueue, ServiceConfigStore,
    TimeSource,
};
use scanhub::application::services::{
    LockManager, ResultPacker, ScannerService, SyncService, WorkerService,
};
use scanhub::domain::{HintConfig, ServiceConfig};
use scanhub::infrastructure::analyzer::ProcessAnalysisRunner;
use scanhub::infrastructure::catalog::StaticHintCatalog;
use scanhub::infrastructure::issues::{
    DEFAULT_GITHUB_API, GithubIssueReporter, GithubSettings, NoopIssueReporter,
};
use scanhub::infrastructure::observability::{TracingConfig, init_tracing};
use scanhub::infrastructure::persistence::{
    InMemoryDistributedLock, InMemoryJobStore, InMemoryServiceConfigStore, PgDistributedLock,
    PgJobStore, PgServiceConfigStore, create_pool, run_migrations,
};
use scanhub::infrastructure::queue::InMemoryQueue;
use scanhub::infrastructure::telemetry::TracingTelemetry;
use scanhub::infrastructure::time::{SntpTimeSource, SystemTimeSource};
use scanhub::presentation::config::ServiceSeedSettings;
use scanhub::presentation::{AppState, Environment, Settings, create_router};

struct Stores {
    jobs: Arc<dyn JobStore>,
    configs: Arc<dyn ServiceConfigStore>,
    locks: Arc<dyn DistributedLock>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(
        TracingConfig::new(environment.as_str(), settings.logging.json),
        "scanhub",
    );

    let stores = build_stores(&settings).await?;
    if let Some(seed) = &settings.service {
        seed_service_config(stores.configs.as_ref(), seed).await?;
    }

    let time_source: Arc<dyn TimeSource> = if settings.ntp.enabled {
        Arc::new(SntpTimeSource::new(
            settings.ntp.server.clone(),
            settings.ntp.retry_policy(),
            Duration::from_millis(settings.ntp.timeout_ms),
        ))
    } else {
        Arc::new(SystemTimeSource)
    };

    let catalog: Arc<dyn HintCatalog> = match &settings.hints.catalog_path {
        Some(path) => Arc::new(StaticHintCatalog::from_file(path).await?),
        None => Arc::new(StaticHintCatalog::default()),
    };

    let issue_reporter: Arc<dyn IssueReporter> = match &settings.github {
        Some(github) => Arc::new(GithubIssueReporter::new(GithubSettings {
            api_base: DEFAULT_GITHUB_API.to_string(),
            token: github.token.clone(),
            owner: github.owner.clone(),
            repo: github.repo.clone(),
            environment: github.environment.clone(),
            production: environment.is_production(),
        })),
        None => Arc::new(NoopIssueReporter),
    };

    let work_queue: Arc<dyn MessageQueue> = Arc::new(InMemoryQueue::new(
        "work",
        settings.queue.capacity,
        settings.queue.max_message_size,
    ));
    let results_queue: Arc<dyn MessageQueue> = Arc::new(InMemoryQueue::new(
        "results",
        settings.queue.capacity,
        settings.queue.max_message_size,
    ));

    let locks = LockManager::new(stores.locks, settings.lock.retry_policy());

    let scanner_service = Arc::new(ScannerService::new(
        Arc::clone(&stores.jobs),
        stores.configs,
        Arc::clone(&work_queue),
        Arc::clone(&time_source),
        Arc::clone(&catalog),
        locks.clone(),
    ));

    let worker_service = Arc::new(WorkerService::new(
        Arc::clone(&results_queue),
        Arc::new(ProcessAnalysisRunner::new(
            settings.worker.analyzer_command.clone(),
            settings.worker.analyzer_args.clone(),
            settings.worker.webhint_version.clone(),
        )),
        Arc::clone(&time_source),
        catalog,
        ResultPacker::new(settings.queue.max_message_size),
    ));

    let sync_service = Arc::new(SyncService::new(
        stores.jobs,
        issue_reporter,
        Arc::new(TracingTelemetry),
        locks,
    ));

    tracing::info!(
        workers = settings.worker.concurrency,
        sync = settings.sync.concurrency,
        "Spawning background tasks"
    );

    let workers = (0..settings.worker.concurrency.max(1)).map(|index| {
        let service = Arc::clone(&worker_service);
        let queue = Arc::clone(&work_queue);
        let handle = tokio::spawn(async move { service.consume(queue.as_ref()).await });
        async move {
            handle
                .await
                .with_context(|| format!("worker {index} panicked"))?
                .with_context(|| format!("worker {index} failed"))
        }
    });
    let mut workers = Box::pin(try_join_all(workers));

    let sync_tasks: Vec<_> = (0..settings.sync.concurrency.max(1))
        .map(|_| {
            let service = Arc::clone(&sync_service);
            let queue = Arc::clone(&results_queue);
            tokio::spawn(async move { service.consume(queue.as_ref()).await })
        })
        .collect();

    let router = create_router(AppState::new(scanner_service));
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    let workers_done = tokio::select! {
        served = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()) => {
            served?;
            false
        }
        finished = &mut workers => {
            finished?;
            true
        }
    };

    tracing::info!("Shutting down, draining queues");
    work_queue.close().await;
    if !workers_done {
        workers.await?;
    }
    results_queue.close().await;
    for task in sync_tasks {
        if let Err(e) = task.await? {
            tracing::error!(error = %e, "Sync consumer stopped with an error");
        }
    }

    Ok(())
}

async fn build_stores(settings: &Settings) -> anyhow::Result<Stores> {
    let Some(database) = &settings.database else {
        tracing::info!("No database configured, using in-memory stores");
        return Ok(Stores {
            jobs: Arc::new(InMemoryJobStore::new()),
            configs: Arc::new(InMemoryServiceConfigStore::new()),
            locks: Arc::new(InMemoryDistributedLock::new(settings.lock.ttl())),
        });
    };

    let pool = create_pool(&database.url, database.max_connections).await?;
    run_migrations(&pool).await?;

    Ok(Stores {
        jobs: Arc::new(PgJobStore::new(pool.clone())),
        configs: Arc::new(PgServiceConfigStore::new(pool.clone())),
        locks: Arc::new(PgDistributedLock::new(pool, settings.lock.ttl())),
    })
}

async fn seed_service_config(
    store: &dyn ServiceConfigStore,
    seed: &ServiceSeedSettings,
) -> anyhow::Result<()> {
    if let Some(active) = store.get_active().await? {
        tracing::info!(name = %active.name, "Active service config found");
        return Ok(());
    }

    if store.get(&seed.name).await?.is_none() {
        let raw = tokio::fs::read_to_string(&seed.configs_path)
            .await
            .with_context(|| format!("Failed to read {}", seed.configs_path))?;
        let configs: Vec<HintConfig> = serde_json::from_str(&raw)?;
        store
            .add(&ServiceConfig::new(
                seed.name.clone(),
                seed.job_cache_time,
                seed.job_run_time,
                configs,
            ))
            .await?;
    }

    let active = store.activate(&seed.name).await?;
    tracing::info!(name = %active.name, configs = active.webhint_configs.len(), "Service config activated");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
