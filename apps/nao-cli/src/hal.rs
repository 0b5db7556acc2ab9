use anyhow::{Context, Result};
use event_bridge::{BlockingEventAdapter, FaceSource, TouchSource, WordSource};
use robot_platform::{Capabilities, Motion, TextToSpeech};
use std::sync::Arc;
use tracing::warn;

use crate::config::BridgeConfig;

/// Script-level robot calls. Owns one adapter per event source it listens to.
pub struct Hal {
    tts: Arc<dyn TextToSpeech>,
    motion: Arc<dyn Motion>,
    faces: BlockingEventAdapter<FaceSource>,
    words: BlockingEventAdapter<WordSource>,
    touch: BlockingEventAdapter<TouchSource>,
}

impl Hal {
    /// Subscribe every adapter under the configured module name. If any step
    /// fails, the subscriptions made so far are released again.
    pub fn new(caps: &Capabilities, config: &BridgeConfig) -> Result<Self> {
        let module = config.module_name.as_str();

        let face_source = FaceSource::new(caps.faces.clone()).context("resetting face database")?;
        let faces = BlockingEventAdapter::new(
            caps.bus.clone(),
            caps.memory.clone(),
            face_source,
            module,
        )
        .context("subscribing to face recognition")?;

        let words = match Self::word_adapter(caps, config) {
            Ok(words) => words,
            Err(err) => {
                release([faces.teardown()]);
                return Err(err);
            }
        };

        let touch = match BlockingEventAdapter::new(
            caps.bus.clone(),
            caps.memory.clone(),
            TouchSource::new(config.touch_sensor.clone()),
            module,
        ) {
            Ok(touch) => touch,
            Err(err) => {
                release([faces.teardown(), words.teardown()]);
                return Err(err)
                    .with_context(|| format!("subscribing to {}", config.touch_sensor));
            }
        };

        Ok(Self {
            tts: caps.tts.clone(),
            motion: caps.motion.clone(),
            faces,
            words,
            touch,
        })
    }

    fn word_adapter(
        caps: &Capabilities,
        config: &BridgeConfig,
    ) -> Result<BlockingEventAdapter<WordSource>> {
        let word_source = WordSource::with_vocabulary(
            caps.speech.clone(),
            config.vocabulary.clone(),
            config.word_spotting,
        )
        .context("loading vocabulary")?;
        BlockingEventAdapter::new(
            caps.bus.clone(),
            caps.memory.clone(),
            word_source,
            config.module_name.as_str(),
        )
        .context("subscribing to word recognition")
    }

    pub fn say(&self, text: &str) -> Result<()> {
        self.tts
            .say(text)
            .with_context(|| format!("saying {text:?}"))
    }

    pub fn stiffness(&self, chain: &str, value: f32) -> Result<()> {
        self.motion
            .set_stiffness(chain, value)
            .with_context(|| format!("setting stiffness of {chain}"))
    }

    pub fn wait_for_touch(&self) -> Result<String> {
        self.touch.wait_for_event().context("waiting for touch")
    }

    /// Returns whether the platform learned the face.
    pub fn learn_face(&self, name: &str) -> Result<bool> {
        self.faces
            .learn_face(name)
            .with_context(|| format!("learning face {name:?}"))
    }

    /// Returns whether the person was known.
    pub fn forget_face(&self, name: &str) -> Result<bool> {
        self.faces
            .forget_face(name)
            .with_context(|| format!("forgetting face {name:?}"))
    }

    pub fn recognize_face(&self) -> Result<String> {
        self.faces.recognize_face().context("recognizing face")
    }

    pub fn recognize_word(&self, vocabulary: &[String]) -> Result<String> {
        self.words
            .recognize_word_from(vocabulary)
            .context("recognizing word")
    }

    pub fn vocabulary(&self) -> Vec<String> {
        self.words.source().vocabulary()
    }

    /// Unsubscribe every adapter, reporting the first failure.
    pub fn shutdown(&self) -> Result<()> {
        let results = [
            self.faces.teardown(),
            self.words.teardown(),
            self.touch.teardown(),
        ];
        let mut first = None;
        for err in results.into_iter().filter_map(|r| r.err()) {
            warn!(error = %err, "teardown failed");
            first.get_or_insert(err);
        }
        match first {
            Some(err) => Err(err).context("unsubscribing"),
            None => Ok(()),
        }
    }
}

fn release<const N: usize>(teardowns: [event_bridge::Result<()>; N]) {
    for err in teardowns.into_iter().filter_map(|r| r.err()) {
        warn!(error = %err, "could not release subscription after failed setup");
    }
}
