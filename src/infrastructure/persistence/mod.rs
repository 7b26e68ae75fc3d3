mod locks;
mod pg_pool;
mod repositories;

pub use locks::{InMemoryDistributedLock, PgDistributedLock};
pub use pg_pool::{create_pool, run_migrations};
pub use repositories::{InMemoryJobStore, InMemoryServiceConfigStore, PgJobStore, PgServiceConfigStore};
