use robot_platform::PlatformError;
use thiserror::Error;

pub type Result<T, E = BridgeError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("unexpected {event} payload at {path:?}: {reason}")]
    PayloadShape {
        event: String,
        path: Vec<usize>,
        reason: &'static str,
    },
    #[error("platform rejected {op} for {name:?}")]
    Rejected { op: &'static str, name: String },
    #[error("vocabulary must contain at least one word")]
    EmptyVocabulary,
}
