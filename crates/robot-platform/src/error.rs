use thiserror::Error;

pub type Result<T, E = PlatformError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("service error: {0}")]
    Service(String),
    #[error("no data stored under key: {0}")]
    UnknownKey(String),
    #[error("module {module} is already subscribed to {event}")]
    AlreadySubscribed { event: String, module: String },
    #[error("module {module} is not subscribed to {event}")]
    NotSubscribed { event: String, module: String },
    #[error("platform unavailable: {0}")]
    Unavailable(&'static str),
}
