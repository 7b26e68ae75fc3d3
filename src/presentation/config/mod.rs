mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, GithubSection, HintsSettings, LockSettings, LoggingSettings, NtpSettings,
    QueueSettings, ServerSettings, ServiceSeedSettings, Settings, SyncSettings, WorkerSettings,
};
