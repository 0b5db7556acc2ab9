use robot_platform::{EventNotice, MemoryStore};

use crate::Result;

/// Outcome of decoding one platform notification.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded<T> {
    /// A fresh payload; wakes a pending waiter.
    Ready(T),
    /// The platform reported "nothing detected"; any unread payload is dropped.
    Clear,
    /// Not relevant to waiters (e.g. a sensor release).
    Ignore,
}

/// A named platform event together with the knowledge of how to switch it on
/// and off, configure it, and read its payload.
pub trait EventSource: Send + Sync + 'static {
    type Payload: Send + 'static;
    type Params: ?Sized;

    fn event_name(&self) -> &str;

    /// Start producing events. Called before a waiter blocks.
    fn enable(&self) -> Result<()> {
        Ok(())
    }

    /// Stop producing events. Called once a waiter has its payload.
    fn disable(&self) -> Result<()> {
        Ok(())
    }

    /// Apply parameters; later events reflect them.
    fn configure(&self, params: &Self::Params) -> Result<()>;

    /// Runs on the platform's delivery thread.
    fn decode(
        &self,
        notice: &EventNotice,
        memory: &dyn MemoryStore,
    ) -> Result<Decoded<Self::Payload>>;
}
