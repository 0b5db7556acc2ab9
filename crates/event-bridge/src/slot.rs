use parking_lot::{Condvar, Mutex};

/// Single-producer/single-consumer handoff of capacity one.
///
/// Publishing overwrites any unread value; taking empties the slot. The value
/// only moves in and out under the lock, so a reader never observes a partial
/// write.
pub struct LatestSlot<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Store `value` and wake a waiting reader. Returns `true` if an unread
    /// value was overwritten.
    pub fn publish(&self, value: T) -> bool {
        let replaced = self.value.lock().replace(value).is_some();
        self.ready.notify_one();
        replaced
    }

    /// Drop any unread value.
    pub fn clear(&self) {
        self.value.lock().take();
    }

    pub fn is_ready(&self) -> bool {
        self.value.lock().is_some()
    }

    pub fn try_take(&self) -> Option<T> {
        self.value.lock().take()
    }

    /// Block until a value is published, then take it. Waits forever if
    /// nothing is ever published.
    pub fn take(&self) -> T {
        let mut value = self.value.lock();
        loop {
            if let Some(v) = value.take() {
                return v;
            }
            self.ready.wait(&mut value);
        }
    }
}
