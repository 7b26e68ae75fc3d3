mod error_response;
mod health;
mod jobs;

pub use error_response::{ErrorResponse, error_response};
pub use health::health_handler;
pub use jobs::{CreateJobRequest, create_job_handler, job_status_handler};
