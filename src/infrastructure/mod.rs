pub mod analyzer;
pub mod catalog;
pub mod issues;
pub mod observability;
pub mod persistence;
pub mod queue;
pub mod telemetry;
pub mod time;
