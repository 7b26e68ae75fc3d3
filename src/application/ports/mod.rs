mod analysis_runner;
mod distributed_lock;
mod hint_catalog;
mod issue_reporter;
mod job_store;
mod message_queue;
mod repository_error;
mod service_config_store;
mod telemetry;
mod time_source;

pub use analysis_runner::{AnalysisFailure, AnalysisRunner, Analyzer};
pub use distributed_lock::{DistributedLock, LockError, LockHandle};
pub use hint_catalog::HintCatalog;
pub use issue_reporter::{IssueData, IssueErrorType, IssueReporter, IssueReporterError};
pub use job_store::{JobDateField, JobStore};
pub use message_queue::{BODY_TOO_LARGE_MESSAGE, MessageQueue, QueueError};
pub use repository_error::RepositoryError;
pub use service_config_store::ServiceConfigStore;
pub use telemetry::{Telemetry, TelemetryEvent};
pub use time_source::TimeSource;
