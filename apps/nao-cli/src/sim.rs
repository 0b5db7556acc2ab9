//! Drives the mock platform the way a person in front of the robot would.

use robot_platform::MockPlatform;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stimulus {
    Face(String),
    Word(String),
    Touch(String),
}

impl Stimulus {
    /// Returns whether the platform turned the stimulus into an event.
    fn apply(&self, platform: &MockPlatform) -> bool {
        let delivered = match self {
            Stimulus::Face(name) => platform.show_face(name),
            Stimulus::Word(word) => platform.hear(word),
            Stimulus::Touch(sensor) => {
                platform.touch(sensor);
                true
            }
        };
        if delivered {
            debug!(stimulus = ?self, "stimulus delivered");
        }
        delivered
    }
}

/// Repeats a set of stimuli at a fixed interval until stopped. The platform
/// only turns a stimulus into an event while the matching detector is on, so
/// repetition is harmless.
pub struct StimulusDriver {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StimulusDriver {
    pub fn start(platform: Arc<MockPlatform>, stimuli: Vec<Stimulus>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::SeqCst) {
                for stimulus in &stimuli {
                    stimulus.apply(&platform);
                }
                thread::sleep(interval);
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StimulusDriver {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robot_platform::{EventBus, EventCallback, EventNotice, MemoryStore};
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn repeats_until_stopped() {
        let platform = Arc::new(MockPlatform::new());
        let presses = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&presses);
        let callback: EventCallback = Arc::new(move |notice: &EventNotice| {
            if notice.value.as_f64() == Some(1.0) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        platform
            .subscribe("RearTactilTouched", "probe", callback)
            .unwrap();

        let driver = StimulusDriver::start(
            platform.clone(),
            vec![Stimulus::Touch("RearTactilTouched".to_string())],
            Duration::from_millis(5),
        );
        thread::sleep(Duration::from_millis(60));
        driver.stop();
        platform.flush();

        let seen = presses.load(Ordering::SeqCst);
        assert!(seen >= 2, "only {seen} presses");
        thread::sleep(Duration::from_millis(30));
        platform.flush();
        assert_eq!(presses.load(Ordering::SeqCst), seen);
        assert_eq!(
            platform.get_data("RearTactilTouched").unwrap().as_f64(),
            Some(0.0)
        );
    }

    #[test]
    fn words_outside_the_vocabulary_are_not_delivered() {
        let platform = Arc::new(MockPlatform::new());
        assert!(!Stimulus::Word("banana".to_string()).apply(&platform));
    }
}
