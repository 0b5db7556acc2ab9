use std::sync::Arc;

use robot_platform::{EventNotice, FaceDetection, MemoryStore};
use tracing::info;

use crate::payload;
use crate::{BlockingEventAdapter, BridgeError, Decoded, EventSource, Result};

pub const FACE_EVENT: &str = "FaceDetected";

/// Face info list -> first face -> extra info -> label.
const LABEL_PATH: [usize; 4] = [1, 0, 1, 2];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaceCommand {
    Learn(String),
    Forget(String),
}

/// Face recognition events. The payload is the recognized label; a face that
/// is seen but not known yields an empty label.
pub struct FaceSource {
    faces: Arc<dyn FaceDetection>,
}

impl FaceSource {
    /// Wrap the face detection service, starting from an empty face database.
    pub fn new(faces: Arc<dyn FaceDetection>) -> Result<Self> {
        faces.clear_database()?;
        Ok(Self { faces })
    }

    pub fn learn_face(&self, name: &str) -> Result<bool> {
        let learned = self.faces.learn_face(name)?;
        info!(name, learned, "learn face");
        Ok(learned)
    }

    pub fn forget_face(&self, name: &str) -> Result<bool> {
        let forgotten = self.faces.forget_person(name)?;
        info!(name, forgotten, "forget face");
        Ok(forgotten)
    }
}

impl EventSource for FaceSource {
    type Payload = String;
    type Params = FaceCommand;

    fn event_name(&self) -> &str {
        FACE_EVENT
    }

    fn enable(&self) -> Result<()> {
        Ok(self.faces.set_recognition_enabled(true)?)
    }

    fn disable(&self) -> Result<()> {
        Ok(self.faces.set_recognition_enabled(false)?)
    }

    fn configure(&self, params: &FaceCommand) -> Result<()> {
        let (op, name, accepted) = match params {
            FaceCommand::Learn(name) => ("learn_face", name, self.learn_face(name)?),
            FaceCommand::Forget(name) => ("forget_face", name, self.forget_face(name)?),
        };
        if !accepted {
            return Err(BridgeError::Rejected {
                op,
                name: name.clone(),
            });
        }
        Ok(())
    }

    fn decode(&self, _notice: &EventNotice, memory: &dyn MemoryStore) -> Result<Decoded<String>> {
        let data = memory.get_data(FACE_EVENT)?;
        if payload::is_empty(&data) {
            return Ok(Decoded::Clear);
        }
        let label = payload::string_at(FACE_EVENT, &data, &LABEL_PATH)?;
        Ok(Decoded::Ready(label))
    }
}

impl BlockingEventAdapter<FaceSource> {
    /// Returns the platform's verdict; `false` is not an error here. Use
    /// [`configure`](Self::configure) with a [`FaceCommand`] to treat it as one.
    pub fn learn_face(&self, name: &str) -> Result<bool> {
        self.source().learn_face(name)
    }

    pub fn forget_face(&self, name: &str) -> Result<bool> {
        self.source().forget_face(name)
    }

    /// Block until a face is seen and return its label.
    pub fn recognize_face(&self) -> Result<String> {
        self.wait_for_event()
    }
}
