use crate::{
    Capabilities, EventBus, EventCallback, EventNotice, FaceDetection, MemoryStore, Motion,
    PlatformError, PlatformValue, Result, SpeechRecognition, TextToSpeech, Timestamp,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use time::OffsetDateTime;
use tracing::{debug, trace};

const FACE_EVENT: &str = "FaceDetected";
const WORD_EVENT: &str = "WordRecognized";
const LAST_WORD_KEY: &str = "LastWordRecognized";
const WORD_CONFIDENCE: f64 = 0.62;
const FACE_SCORE: f64 = 0.81;

/// Builds a `FaceDetected` payload holding a single face labelled `label`.
///
/// Layout: `[timestamp, [[shape_info, extra_info], reco_info], camera_pose_torso,
/// camera_pose_robot, camera]`, where `extra_info = [face_id, score, label, ...]`.
/// An empty label means the face was seen but not recognized.
pub fn face_payload(face_id: u64, label: &str, at: OffsetDateTime) -> PlatformValue {
    let score = if label.is_empty() { 0.0 } else { FACE_SCORE };
    let reco_status = if label.is_empty() { 3 } else { 2 };
    let reco_labels: Vec<&str> = if label.is_empty() { vec![] } else { vec![label] };
    json!([
        [at.unix_timestamp(), at.microsecond()],
        [
            [
                [0, 0.0, 0.0, 0.12, 0.12],
                [face_id, score, label, [0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]
            ],
            [reco_status, reco_labels]
        ],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        0
    ])
}

type Subscribers = HashMap<String, Vec<(String, EventCallback)>>;

#[derive(Default)]
struct FaceState {
    recognition_enabled: bool,
    known: BTreeSet<String>,
    next_id: u64,
}

struct SpeechState {
    paused: bool,
    vocabulary: Vec<String>,
    word_spotting: bool,
    audio_expression: bool,
    visual_expression: bool,
}

impl Default for SpeechState {
    fn default() -> Self {
        Self {
            paused: false,
            vocabulary: Vec::new(),
            word_spotting: false,
            audio_expression: true,
            visual_expression: true,
        }
    }
}

#[derive(Default)]
struct Shared {
    memory: Mutex<HashMap<String, PlatformValue>>,
    subscribers: Mutex<Subscribers>,
    faces: Mutex<FaceState>,
    speech: Mutex<SpeechState>,
    spoken: Mutex<Vec<String>>,
    stiffness: Mutex<HashMap<String, f32>>,
    journal: Mutex<Vec<String>>,
}

impl Shared {
    fn record(&self, entry: String) {
        trace!(%entry, "mock platform call");
        self.journal.lock().push(entry);
    }
}

enum Delivery {
    Event {
        key: String,
        value: PlatformValue,
        at: OffsetDateTime,
    },
    Flush(mpsc::Sender<()>),
}

/// An in-process robot. Events are delivered to subscribers from a dedicated
/// thread, like the vendor's event loop, never from the caller's thread.
pub struct MockPlatform {
    shared: Arc<Shared>,
    tx: Mutex<Option<mpsc::Sender<Delivery>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        let (tx, rx) = mpsc::channel();
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("mock-platform-events".to_string())
            .spawn(move || deliver_loop(worker_shared, rx))
            .ok();
        Self {
            shared,
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(worker),
        }
    }

    /// Bundle this platform into capability handles.
    pub fn capabilities(self: &Arc<Self>) -> Capabilities {
        Capabilities {
            bus: self.clone(),
            memory: self.clone(),
            faces: self.clone(),
            speech: self.clone(),
            tts: self.clone(),
            motion: self.clone(),
        }
    }

    /// Write `value` under `key` without raising an event.
    pub fn insert_data(&self, key: &str, value: PlatformValue) {
        self.shared.memory.lock().insert(key.to_string(), value);
    }

    /// Write `value` under `key` and notify every subscriber of `key`.
    pub fn raise_event(&self, key: &str, value: PlatformValue) {
        self.insert_data(key, value.clone());
        let tx = self.tx.lock();
        match tx.as_ref() {
            Some(tx) => {
                let delivery = Delivery::Event {
                    key: key.to_string(),
                    value,
                    at: OffsetDateTime::now_utc(),
                };
                if tx.send(delivery).is_err() {
                    debug!(event = key, "delivery thread gone; event dropped");
                }
            }
            None => debug!(event = key, "platform shut down; event dropped"),
        }
    }

    /// Block until every event raised so far has been delivered.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        let sent = match self.tx.lock().as_ref() {
            Some(tx) => tx.send(Delivery::Flush(ack_tx)).is_ok(),
            None => false,
        };
        if sent {
            let _ = ack_rx.recv();
        }
    }

    /// Put a face in front of the camera. Raises `FaceDetected` only while
    /// recognition is enabled; unknown faces carry an empty label.
    pub fn show_face(&self, name: &str) -> bool {
        let (id, label) = {
            let mut faces = self.shared.faces.lock();
            if !faces.recognition_enabled {
                return false;
            }
            faces.next_id += 1;
            let label = if faces.known.contains(name) { name } else { "" };
            (faces.next_id, label.to_string())
        };
        self.raise_event(FACE_EVENT, face_payload(id, &label, OffsetDateTime::now_utc()));
        true
    }

    /// Take every face out of view. The platform reports this as an empty payload.
    pub fn hide_faces(&self) -> bool {
        if !self.shared.faces.lock().recognition_enabled {
            return false;
        }
        self.raise_event(FACE_EVENT, json!([]));
        true
    }

    /// Speak `word` near the microphones. Raises `WordRecognized` when the
    /// engine is running and the word is in the vocabulary.
    pub fn hear(&self, word: &str) -> bool {
        let recognized = {
            let speech = self.shared.speech.lock();
            if speech.paused {
                return false;
            }
            let Some(entry) = speech
                .vocabulary
                .iter()
                .find(|w| w.eq_ignore_ascii_case(word))
            else {
                return false;
            };
            if speech.word_spotting {
                format!("<...> {entry} <...>")
            } else {
                entry.clone()
            }
        };
        let value = json!([recognized, WORD_CONFIDENCE]);
        self.insert_data(LAST_WORD_KEY, value.clone());
        self.raise_event(WORD_EVENT, value);
        true
    }

    /// Press and release a tactile sensor.
    pub fn touch(&self, sensor: &str) {
        self.raise_event(sensor, json!(1.0));
        self.raise_event(sensor, json!(0.0));
    }

    pub fn spoken(&self) -> Vec<String> {
        self.shared.spoken.lock().clone()
    }

    pub fn stiffness_of(&self, chain: &str) -> Option<f32> {
        self.shared.stiffness.lock().get(chain).copied()
    }

    pub fn recognition_enabled(&self) -> bool {
        self.shared.faces.lock().recognition_enabled
    }

    pub fn known_faces(&self) -> Vec<String> {
        self.shared.faces.lock().known.iter().cloned().collect()
    }

    pub fn asr_paused(&self) -> bool {
        self.shared.speech.lock().paused
    }

    pub fn vocabulary(&self) -> Vec<String> {
        self.shared.speech.lock().vocabulary.clone()
    }

    pub fn expressions(&self) -> (bool, bool) {
        let speech = self.shared.speech.lock();
        (speech.audio_expression, speech.visual_expression)
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.shared
            .subscribers
            .lock()
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Capability calls made so far, in order (e.g. `asr.pause(true)`).
    pub fn journal(&self) -> Vec<String> {
        self.shared.journal.lock().clone()
    }
}

impl Drop for MockPlatform {
    fn drop(&mut self) {
        self.tx.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

fn deliver_loop(shared: Arc<Shared>, rx: mpsc::Receiver<Delivery>) {
    for delivery in rx {
        match delivery {
            Delivery::Event { key, value, at } => {
                let targets = shared
                    .subscribers
                    .lock()
                    .get(&key)
                    .cloned()
                    .unwrap_or_default();
                for (module, callback) in targets {
                    let notice = EventNotice {
                        key: key.clone(),
                        value: value.clone(),
                        message: module,
                        timestamp: Some(Timestamp(at)),
                    };
                    callback(&notice);
                }
            }
            Delivery::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

impl EventBus for MockPlatform {
    fn subscribe(&self, event: &str, module: &str, callback: EventCallback) -> Result<()> {
        let mut subscribers = self.shared.subscribers.lock();
        let entries = subscribers.entry(event.to_string()).or_default();
        if entries.iter().any(|(m, _)| m == module) {
            return Err(PlatformError::AlreadySubscribed {
                event: event.to_string(),
                module: module.to_string(),
            });
        }
        entries.push((module.to_string(), callback));
        debug!(event, module, "subscribed");
        Ok(())
    }

    fn unsubscribe(&self, event: &str, module: &str) -> Result<()> {
        let mut subscribers = self.shared.subscribers.lock();
        let not_subscribed = || PlatformError::NotSubscribed {
            event: event.to_string(),
            module: module.to_string(),
        };
        let entries = subscribers.get_mut(event).ok_or_else(not_subscribed)?;
        let idx = entries
            .iter()
            .position(|(m, _)| m == module)
            .ok_or_else(not_subscribed)?;
        entries.remove(idx);
        if entries.is_empty() {
            subscribers.remove(event);
        }
        debug!(event, module, "unsubscribed");
        Ok(())
    }
}

impl MemoryStore for MockPlatform {
    fn get_data(&self, key: &str) -> Result<PlatformValue> {
        self.shared
            .memory
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| PlatformError::UnknownKey(key.to_string()))
    }
}

impl FaceDetection for MockPlatform {
    fn set_recognition_enabled(&self, enabled: bool) -> Result<()> {
        self.shared.record(format!("faces.recognition({enabled})"));
        self.shared.faces.lock().recognition_enabled = enabled;
        Ok(())
    }

    fn learn_face(&self, name: &str) -> Result<bool> {
        self.shared.record(format!("faces.learn({name})"));
        if name.trim().is_empty() {
            return Ok(false);
        }
        self.shared.faces.lock().known.insert(name.to_string());
        Ok(true)
    }

    fn forget_person(&self, name: &str) -> Result<bool> {
        self.shared.record(format!("faces.forget({name})"));
        Ok(self.shared.faces.lock().known.remove(name))
    }

    fn clear_database(&self) -> Result<()> {
        self.shared.record("faces.clear()".to_string());
        self.shared.faces.lock().known.clear();
        Ok(())
    }
}

impl SpeechRecognition for MockPlatform {
    fn pause(&self, paused: bool) -> Result<()> {
        self.shared.record(format!("asr.pause({paused})"));
        self.shared.speech.lock().paused = paused;
        Ok(())
    }

    fn set_vocabulary(&self, words: &[String], word_spotting: bool) -> Result<()> {
        self.shared.record(format!("asr.vocabulary({})", words.join(",")));
        let mut speech = self.shared.speech.lock();
        if !speech.paused {
            return Err(PlatformError::Service(
                "vocabulary can only be changed while the engine is paused".to_string(),
            ));
        }
        speech.vocabulary = words.to_vec();
        speech.word_spotting = word_spotting;
        Ok(())
    }

    fn set_audio_expression(&self, enabled: bool) -> Result<()> {
        self.shared.record(format!("asr.audio_expression({enabled})"));
        self.shared.speech.lock().audio_expression = enabled;
        Ok(())
    }

    fn set_visual_expression(&self, enabled: bool) -> Result<()> {
        self.shared.record(format!("asr.visual_expression({enabled})"));
        self.shared.speech.lock().visual_expression = enabled;
        Ok(())
    }
}

impl TextToSpeech for MockPlatform {
    fn say(&self, text: &str) -> Result<()> {
        debug!(text, "say");
        self.shared.spoken.lock().push(text.to_string());
        Ok(())
    }
}

impl Motion for MockPlatform {
    fn set_stiffness(&self, chain: &str, stiffness: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&stiffness) {
            return Err(PlatformError::Service(format!(
                "stiffness {stiffness} for {chain} outside 0.0..=1.0"
            )));
        }
        self.shared.record(format!("motion.stiffness({chain}, {stiffness})"));
        self.shared
            .stiffness
            .lock()
            .insert(chain.to_string(), stiffness);
        Ok(())
    }
}
