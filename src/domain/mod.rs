mod error_payload;
mod hint;
mod hint_config;
mod job;
mod job_id;
mod job_status;
mod messages;
mod part_info;
mod service_config;

pub use error_payload::ErrorPayload;
pub use hint::{
    GENERIC_ERROR_MESSAGE, Hint, HintStatus, Location, Problem, SLOW_RETURN_MARKER, Severity,
    TIMEOUT_MESSAGE, TOO_MANY_ERRORS_MESSAGE,
};
pub use hint_config::{HintConfig, HintSetting, HintSeverity};
pub use job::{Job, NewJob};
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use messages::{QueueMessage, ResultMessage, WorkUnit};
pub use part_info::PartInfo;
pub use service_config::ServiceConfig;
