mod in_memory_queue;

pub use in_memory_queue::InMemoryQueue;
