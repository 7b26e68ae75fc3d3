use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::application::ports::{JobDateField, JobStore, RepositoryError, ServiceConfigStore};
use crate::domain::{Job, JobId, NewJob, ServiceConfig};

/// Process-local job store for tests and single-instance runs.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl JobStore for InMemoryJobStore {
    async fn add(&self, new_job: NewJob) -> Result<Job, RepositoryError> {
        let job = Job::create(new_job);
        self.jobs.lock().await.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.lock().await.get(&id).cloned())
    }

    async fn get_latest_by_url(&self, url: &str) -> Result<Vec<Job>, RepositoryError> {
        let jobs = self.jobs.lock().await;
        let latest = jobs
            .values()
            .filter(|job| job.url == url)
            .max_by_key(|job| job.queued)
            .cloned();
        Ok(latest.into_iter().collect())
    }

    async fn get_by_date_range(
        &self,
        field: JobDateField,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Job>, RepositoryError> {
        let jobs = self.jobs.lock().await;
        let mut found: Vec<Job> = jobs
            .values()
            .filter(|job| {
                field
                    .value_of(job)
                    .is_some_and(|value| value >= from && value < to)
            })
            .cloned()
            .collect();
        found.sort_by_key(|job| field.value_of(job));
        Ok(found)
    }

    async fn update(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.lock().await;
        match jobs.get_mut(&job.id) {
            Some(stored) => {
                *stored = job.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(job.id.to_string())),
        }
    }
}

#[derive(Default)]
pub struct InMemoryServiceConfigStore {
    configs: Mutex<Vec<ServiceConfig>>,
}

impl InMemoryServiceConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one already active configuration.
    pub fn with_active(mut config: ServiceConfig) -> Self {
        config.active = true;
        Self {
            configs: Mutex::new(vec![config]),
        }
    }
}

#[async_trait::async_trait]
impl ServiceConfigStore for InMemoryServiceConfigStore {
    async fn add(&self, config: &ServiceConfig) -> Result<(), RepositoryError> {
        let mut configs = self.configs.lock().await;
        if configs.iter().any(|c| c.name == config.name) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "service config {} already exists",
                config.name
            )));
        }
        configs.push(config.clone());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<ServiceConfig>, RepositoryError> {
        let configs = self.configs.lock().await;
        Ok(configs.iter().find(|c| c.name == name).cloned())
    }

    async fn get_active(&self) -> Result<Option<ServiceConfig>, RepositoryError> {
        let configs = self.configs.lock().await;
        Ok(configs.iter().find(|c| c.active).cloned())
    }

    async fn list(&self) -> Result<Vec<ServiceConfig>, RepositoryError> {
        Ok(self.configs.lock().await.clone())
    }

    async fn activate(&self, name: &str) -> Result<ServiceConfig, RepositoryError> {
        let mut configs = self.configs.lock().await;
        if !configs.iter().any(|c| c.name == name) {
            return Err(RepositoryError::NotFound(format!("service config {name}")));
        }
        for config in configs.iter_mut() {
            config.active = config.name == name;
        }
        configs
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("service config {name}")))
    }
}
