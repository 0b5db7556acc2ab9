use std::sync::Arc;

use crate::{EventCallback, PlatformValue, Result};

/// Named asynchronous notifications.
pub trait EventBus: Send + Sync {
    /// Bind `callback` to `event` under `module`. At most one subscription
    /// exists per (module, event) pair.
    fn subscribe(&self, event: &str, module: &str, callback: EventCallback) -> Result<()>;

    /// Remove the subscription of `module` to `event`.
    fn unsubscribe(&self, event: &str, module: &str) -> Result<()>;
}

/// Shared key/value memory the platform writes event payloads into.
pub trait MemoryStore: Send + Sync {
    fn get_data(&self, key: &str) -> Result<PlatformValue>;
}

pub trait FaceDetection: Send + Sync {
    fn set_recognition_enabled(&self, enabled: bool) -> Result<()>;

    /// Learn the face currently in view under `name`. Returns `false` if the
    /// platform could not learn it.
    fn learn_face(&self, name: &str) -> Result<bool>;

    fn forget_person(&self, name: &str) -> Result<bool>;

    fn clear_database(&self) -> Result<()>;
}

pub trait SpeechRecognition: Send + Sync {
    /// Pause (`true`) or resume (`false`) the recognition engine.
    fn pause(&self, paused: bool) -> Result<()>;

    fn set_vocabulary(&self, words: &[String], word_spotting: bool) -> Result<()>;

    fn set_audio_expression(&self, enabled: bool) -> Result<()>;

    fn set_visual_expression(&self, enabled: bool) -> Result<()>;
}

pub trait TextToSpeech: Send + Sync {
    fn say(&self, text: &str) -> Result<()>;
}

pub trait Motion: Send + Sync {
    /// Set stiffness of a joint chain (e.g. "Body"), in `0.0..=1.0`.
    fn set_stiffness(&self, chain: &str, stiffness: f32) -> Result<()>;
}

/// Every capability handle a behavior may need, owned explicitly.
#[derive(Clone)]
pub struct Capabilities {
    pub bus: Arc<dyn EventBus>,
    pub memory: Arc<dyn MemoryStore>,
    pub faces: Arc<dyn FaceDetection>,
    pub speech: Arc<dyn SpeechRecognition>,
    pub tts: Arc<dyn TextToSpeech>,
    pub motion: Arc<dyn Motion>,
}
