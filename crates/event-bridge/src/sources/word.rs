use std::sync::Arc;

use parking_lot::Mutex;
use robot_platform::{EventNotice, MemoryStore, SpeechRecognition};
use tracing::info;

use crate::payload;
use crate::{BlockingEventAdapter, BridgeError, Decoded, EventSource, Result};

pub const WORD_EVENT: &str = "WordRecognized";
const LAST_WORD_KEY: &str = "LastWordRecognized";
const SPOTTING_MARKER: &str = "<...>";

pub const DEFAULT_VOCABULARY: &[&str] = &["roberta"];

struct WordState {
    vocabulary: Vec<String>,
    listening: bool,
}

/// Speech recognition restricted to a small vocabulary. The engine only runs
/// while a waiter is blocked; otherwise it stays paused.
pub struct WordSource {
    speech: Arc<dyn SpeechRecognition>,
    word_spotting: bool,
    state: Mutex<WordState>,
}

impl WordSource {
    pub fn new(speech: Arc<dyn SpeechRecognition>) -> Result<Self> {
        let vocabulary = DEFAULT_VOCABULARY.iter().map(|w| w.to_string()).collect();
        Self::with_vocabulary(speech, vocabulary, true)
    }

    /// Load `vocabulary` and silence the robot's own feedback (beeps, eye LEDs)
    /// while listening.
    pub fn with_vocabulary(
        speech: Arc<dyn SpeechRecognition>,
        vocabulary: Vec<String>,
        word_spotting: bool,
    ) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(BridgeError::EmptyVocabulary);
        }
        speech.pause(true)?;
        speech.set_vocabulary(&vocabulary, word_spotting)?;
        speech.set_audio_expression(false)?;
        speech.set_visual_expression(false)?;
        speech.pause(false)?;
        Ok(Self {
            speech,
            word_spotting,
            state: Mutex::new(WordState {
                vocabulary,
                listening: true,
            }),
        })
    }

    pub fn vocabulary(&self) -> Vec<String> {
        self.state.lock().vocabulary.clone()
    }

    /// Replace the vocabulary. The engine is paused around the change and
    /// resumed only if it was listening before.
    pub fn set_vocabulary(&self, words: &[String]) -> Result<()> {
        if words.is_empty() {
            return Err(BridgeError::EmptyVocabulary);
        }
        let mut state = self.state.lock();
        self.speech.pause(true)?;
        let applied = self.speech.set_vocabulary(words, self.word_spotting);
        if applied.is_ok() {
            state.vocabulary = words.to_vec();
            info!(words = ?state.vocabulary, "vocabulary updated");
        }
        let resumed = if state.listening {
            self.speech.pause(false)
        } else {
            Ok(())
        };
        applied?;
        Ok(resumed?)
    }

    pub fn pause(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.speech.pause(true)?;
        state.listening = false;
        Ok(())
    }

    pub fn resume(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.speech.pause(false)?;
        state.listening = true;
        Ok(())
    }

    pub fn set_visual_expression(&self, enabled: bool) -> Result<()> {
        Ok(self.speech.set_visual_expression(enabled)?)
    }

    pub fn set_audio_expression(&self, enabled: bool) -> Result<()> {
        Ok(self.speech.set_audio_expression(enabled)?)
    }
}

/// Strip the markers word spotting puts around the recognized word.
fn strip_spotting_markers(raw: &str) -> String {
    raw.split_whitespace()
        .filter(|token| *token != SPOTTING_MARKER)
        .collect::<Vec<_>>()
        .join(" ")
}

impl EventSource for WordSource {
    type Payload = String;
    type Params = [String];

    fn event_name(&self) -> &str {
        WORD_EVENT
    }

    fn enable(&self) -> Result<()> {
        self.resume()
    }

    fn disable(&self) -> Result<()> {
        self.pause()
    }

    fn configure(&self, params: &[String]) -> Result<()> {
        self.set_vocabulary(params)
    }

    fn decode(&self, _notice: &EventNotice, memory: &dyn MemoryStore) -> Result<Decoded<String>> {
        let data = memory.get_data(LAST_WORD_KEY)?;
        if payload::is_empty(&data) {
            return Ok(Decoded::Clear);
        }
        let word = strip_spotting_markers(&payload::string_at(LAST_WORD_KEY, &data, &[0])?);
        if word.is_empty() {
            return Ok(Decoded::Clear);
        }
        Ok(Decoded::Ready(word))
    }
}

impl BlockingEventAdapter<WordSource> {
    /// Load `vocabulary` and block until one of its words is heard.
    pub fn recognize_word_from(&self, vocabulary: &[String]) -> Result<String> {
        self.configure(vocabulary)?;
        self.wait_for_event()
    }
}
