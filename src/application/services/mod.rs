mod clock;
mod hint_planner;
mod lock_manager;
mod result_packer;
mod retry;
mod scanner_service;
mod sync_service;
mod worker_service;

pub use clock::consistent_time;
pub use hint_planner::{normalize_hints, plan_hints};
pub use lock_manager::LockManager;
pub use result_packer::{DEFAULT_MAX_MESSAGE_SIZE, ResultPacker, envelope_size};
pub use retry::{RetryPolicy, retry};
pub use scanner_service::{ScannerError, ScannerService, is_active_job};
pub use sync_service::{SyncError, SyncService};
pub use worker_service::{
    DEFAULT_RUN_TIME, WorkerError, WorkerService, apply_failure, apply_findings,
};
