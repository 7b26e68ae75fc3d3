mod in_memory_lock;
mod pg_distributed_lock;

pub use in_memory_lock::InMemoryDistributedLock;
pub use pg_distributed_lock::PgDistributedLock;
