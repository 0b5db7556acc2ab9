//! robot-platform: capability traits for the humanoid robot platform
//!
//! The vendor services a behavior needs (event bus, shared memory, face detection,
//! speech recognition, speech output, motion) are modelled as object-safe traits.
//! Callers receive explicit handles at construction instead of looking proxies up
//! from process-wide state. The default build enables a `mock` backend that runs
//! entirely in-process so binaries and tests work without a robot.

mod types;
pub use types::{EventCallback, EventNotice, PlatformValue, Timestamp};

mod error;
pub use error::{PlatformError, Result};

mod traits;
pub use traits::{
    Capabilities, EventBus, FaceDetection, MemoryStore, Motion, SpeechRecognition, TextToSpeech,
};

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::{face_payload, MockPlatform};
