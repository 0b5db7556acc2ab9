use std::sync::atomic::{AtomicBool, Ordering};

use robot_platform::{EventNotice, MemoryStore};

use crate::{Decoded, EventSource, Result};

pub const DEFAULT_TOUCH_SENSOR: &str = "FrontTactilTouched";

/// A tactile sensor. The sensor value is `1.0` while pressed and `0.0` once
/// released; only presses that happen while a waiter is blocked count.
pub struct TouchSource {
    sensor: String,
    armed: AtomicBool,
}

impl Default for TouchSource {
    fn default() -> Self {
        Self::new(DEFAULT_TOUCH_SENSOR)
    }
}

impl TouchSource {
    pub fn new(sensor: impl Into<String>) -> Self {
        Self {
            sensor: sensor.into(),
            armed: AtomicBool::new(false),
        }
    }

    pub fn sensor(&self) -> &str {
        &self.sensor
    }
}

fn is_pressed(notice: &EventNotice) -> bool {
    notice
        .value
        .as_f64()
        .map(|v| v > 0.5)
        .or_else(|| notice.value.as_bool())
        .unwrap_or(false)
}

impl EventSource for TouchSource {
    type Payload = String;
    type Params = ();

    fn event_name(&self) -> &str {
        &self.sensor
    }

    fn enable(&self) -> Result<()> {
        self.armed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disable(&self) -> Result<()> {
        self.armed.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn configure(&self, _params: &()) -> Result<()> {
        Ok(())
    }

    fn decode(&self, notice: &EventNotice, _memory: &dyn MemoryStore) -> Result<Decoded<String>> {
        if !self.armed.load(Ordering::SeqCst) || !is_pressed(notice) {
            return Ok(Decoded::Ignore);
        }
        Ok(Decoded::Ready(self.sensor.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockingEventAdapter;
    use robot_platform::MockPlatform;
    use serde_json::json;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn press_values() {
        let n = |v| EventNotice::new(DEFAULT_TOUCH_SENSOR, v, "touch");
        assert!(is_pressed(&n(json!(1.0))));
        assert!(is_pressed(&n(json!(1))));
        assert!(is_pressed(&n(json!(true))));
        assert!(!is_pressed(&n(json!(0.0))));
        assert!(!is_pressed(&n(json!(null))));
    }

    #[test]
    fn touches_while_idle_are_ignored() {
        let platform = Arc::new(MockPlatform::new());
        let adapter = BlockingEventAdapter::new(
            platform.clone(),
            platform.clone(),
            TouchSource::default(),
            "touch",
        )
        .unwrap();
        platform.touch(DEFAULT_TOUCH_SENSOR);
        platform.flush();
        assert!(!adapter.is_ready());
    }

    #[test]
    fn press_releases_waiter() {
        let platform = Arc::new(MockPlatform::new());
        let adapter = Arc::new(
            BlockingEventAdapter::new(
                platform.clone(),
                platform.clone(),
                TouchSource::new("RearTactilTouched"),
                "touch",
            )
            .unwrap(),
        );
        let (tx, rx) = mpsc::channel();
        {
            let adapter = Arc::clone(&adapter);
            thread::spawn(move || {
                let _ = tx.send(adapter.wait_for_event().ok());
            });
        }

        let mut received = None;
        for _ in 0..100 {
            platform.touch("FrontTactilTouched");
            platform.touch("RearTactilTouched");
            if let Ok(v) = rx.recv_timeout(Duration::from_millis(20)) {
                received = v;
                break;
            }
        }
        assert_eq!(received.as_deref(), Some("RearTactilTouched"));
    }
}
