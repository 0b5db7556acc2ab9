//! event-bridge: blocking access to callback-based robot events
//!
//! The platform pushes events to subscribed callbacks on its own thread. A
//! [`BlockingEventAdapter`] subscribes once, keeps only the latest decoded
//! payload in a size-1 [`LatestSlot`], and lets the caller block until a fresh
//! event arrives. Concrete sources cover face recognition, word recognition and
//! tactile sensors.

mod error;
pub use error::{BridgeError, Result};

mod slot;
pub use slot::LatestSlot;

pub mod payload;

mod source;
pub use source::{Decoded, EventSource};

mod adapter;
pub use adapter::BlockingEventAdapter;

mod sources;
pub use sources::{
    FaceCommand, FaceSource, TouchSource, WordSource, DEFAULT_TOUCH_SENSOR, DEFAULT_VOCABULARY,
    FACE_EVENT, WORD_EVENT,
};
