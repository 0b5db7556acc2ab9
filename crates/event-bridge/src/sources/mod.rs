mod face;
pub use face::{FaceCommand, FaceSource, FACE_EVENT};

mod word;
pub use word::{WordSource, DEFAULT_VOCABULARY, WORD_EVENT};

mod touch;
pub use touch::{TouchSource, DEFAULT_TOUCH_SENSOR};
