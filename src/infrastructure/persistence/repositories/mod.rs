mod in_memory_repository;
mod pg_job_store;
mod pg_service_config_store;

pub use in_memory_repository::{InMemoryJobStore, InMemoryServiceConfigStore};
pub use pg_job_store::PgJobStore;
pub use pg_service_config_store::PgServiceConfigStore;
