use std::sync::{Arc, Weak};

use robot_platform::{EventBus, EventCallback, EventNotice, MemoryStore};
use tracing::{debug, info, warn};

use crate::{Decoded, EventSource, LatestSlot, Result};

/// Turns a push-style platform event into a pull-style blocking call.
///
/// Lifecycle per instance is `Idle -> AwaitingEvent -> EventReady -> Idle`:
/// [`wait_for_event`](Self::wait_for_event) enters `AwaitingEvent`, the platform
/// callback moves to `EventReady`, and the waiter consumes the payload. There
/// is no way out of `AwaitingEvent` other than an event arriving.
pub struct BlockingEventAdapter<S: EventSource> {
    bus: Arc<dyn EventBus>,
    memory: Arc<dyn MemoryStore>,
    source: Arc<S>,
    slot: Arc<LatestSlot<S::Payload>>,
    module: String,
}

impl<S: EventSource> BlockingEventAdapter<S> {
    /// Subscribe `source` under `module` and leave detection disabled.
    pub fn new(
        bus: Arc<dyn EventBus>,
        memory: Arc<dyn MemoryStore>,
        source: S,
        module: impl Into<String>,
    ) -> Result<Self> {
        let module = module.into();
        let source = Arc::new(source);
        let slot = Arc::new(LatestSlot::new());

        // The platform owns the callback; it holds weak handles only so a
        // dropped adapter does not keep itself alive through the subscription.
        let callback = callback_for(
            Arc::downgrade(&source),
            Arc::downgrade(&slot),
            Arc::downgrade(&memory),
        );
        bus.subscribe(source.event_name(), &module, callback)?;
        if let Err(err) = source.disable() {
            let _ = bus.unsubscribe(source.event_name(), &module);
            return Err(err);
        }
        info!(event = source.event_name(), module = %module, "event adapter subscribed");

        Ok(Self {
            bus,
            memory,
            source,
            slot,
            module,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn event_name(&self) -> &str {
        self.source.event_name()
    }

    /// Apply source parameters. Platform errors propagate unchanged.
    pub fn configure(&self, params: &S::Params) -> Result<()> {
        self.source.configure(params)
    }

    /// Block until a fresh event arrives and return its payload.
    ///
    /// Anything received before the call is discarded. Detection is enabled
    /// for the duration of the wait and disabled again afterwards; a failure to
    /// disable is logged and the payload is still returned. Never returns if
    /// the platform never fires.
    pub fn wait_for_event(&self) -> Result<S::Payload> {
        self.slot.clear();
        self.source.enable()?;
        debug!(event = self.event_name(), "awaiting event");
        let payload = self.slot.take();
        if let Err(err) = self.source.disable() {
            warn!(event = self.event_name(), error = %err, "could not disable detection");
        }
        debug!(event = self.event_name(), "event consumed");
        Ok(payload)
    }

    /// Feed one notification through the source decoder, as the platform
    /// callback does.
    pub fn on_event(&self, notice: &EventNotice) {
        deliver(self.source.as_ref(), &self.slot, self.memory.as_ref(), notice);
    }

    /// `true` while an unread payload is held.
    pub fn is_ready(&self) -> bool {
        self.slot.is_ready()
    }

    /// Take the unread payload, if any, without blocking.
    pub fn try_take(&self) -> Option<S::Payload> {
        self.slot.try_take()
    }

    /// Cancel the subscription. A second call reports whatever the platform
    /// reports for an unknown subscription.
    pub fn teardown(&self) -> Result<()> {
        self.bus.unsubscribe(self.event_name(), &self.module)?;
        info!(event = self.event_name(), module = %self.module, "event adapter unsubscribed");
        Ok(())
    }
}

fn callback_for<S: EventSource>(
    source: Weak<S>,
    slot: Weak<LatestSlot<S::Payload>>,
    memory: Weak<dyn MemoryStore>,
) -> EventCallback {
    Arc::new(move |notice: &EventNotice| {
        let (Some(source), Some(slot), Some(memory)) =
            (source.upgrade(), slot.upgrade(), memory.upgrade())
        else {
            debug!(event = %notice.key, "adapter gone; notification ignored");
            return;
        };
        deliver(source.as_ref(), &slot, memory.as_ref(), notice);
    })
}

fn deliver<S: EventSource>(
    source: &S,
    slot: &LatestSlot<S::Payload>,
    memory: &dyn MemoryStore,
    notice: &EventNotice,
) {
    match source.decode(notice, memory) {
        Ok(Decoded::Ready(payload)) => {
            if slot.publish(payload) {
                debug!(event = %notice.key, "unread event overwritten");
            }
        }
        Ok(Decoded::Clear) => {
            slot.clear();
            debug!(event = %notice.key, "detection cleared");
        }
        Ok(Decoded::Ignore) => {}
        Err(err) => warn!(event = %notice.key, error = %err, "dropping undecodable event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BridgeError;
    use robot_platform::{MockPlatform, PlatformError};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    const PROBE: &str = "Probe";

    /// Strings are payloads, empty strings clear, anything else is ignored.
    #[derive(Default)]
    struct ProbeSource {
        enabled: AtomicBool,
        enables: AtomicUsize,
        configured: AtomicUsize,
        refuse_disable: AtomicBool,
    }

    impl EventSource for ProbeSource {
        type Payload = String;
        type Params = ();

        fn event_name(&self) -> &str {
            PROBE
        }

        fn enable(&self) -> Result<()> {
            self.enabled.store(true, Ordering::SeqCst);
            self.enables.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn disable(&self) -> Result<()> {
            if self.refuse_disable.load(Ordering::SeqCst) {
                return Err(PlatformError::Service("detector stuck".to_string()).into());
            }
            self.enabled.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn configure(&self, _params: &()) -> Result<()> {
            self.configured.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn decode(
            &self,
            notice: &EventNotice,
            _memory: &dyn MemoryStore,
        ) -> Result<Decoded<String>> {
            Ok(match notice.value.as_str() {
                Some("") => Decoded::Clear,
                Some(s) => Decoded::Ready(s.to_string()),
                None => Decoded::Ignore,
            })
        }
    }

    fn setup() -> (Arc<MockPlatform>, Arc<BlockingEventAdapter<ProbeSource>>) {
        let platform = Arc::new(MockPlatform::new());
        let adapter = BlockingEventAdapter::new(
            platform.clone(),
            platform.clone(),
            ProbeSource::default(),
            "probe-module",
        )
        .unwrap();
        (platform, Arc::new(adapter))
    }

    fn spawn_waiter(
        adapter: &Arc<BlockingEventAdapter<ProbeSource>>,
    ) -> mpsc::Receiver<String> {
        let enables_before = adapter.source().enables.load(Ordering::SeqCst);
        let (tx, rx) = mpsc::channel();
        let waiter = Arc::clone(adapter);
        thread::spawn(move || {
            if let Ok(v) = waiter.wait_for_event() {
                let _ = tx.send(v);
            }
        });
        // Once detection is enabled the waiter has already discarded stale state.
        let deadline = Instant::now() + Duration::from_secs(5);
        while adapter.source().enables.load(Ordering::SeqCst) == enables_before {
            assert!(Instant::now() < deadline, "waiter never enabled detection");
            thread::sleep(Duration::from_millis(2));
        }
        rx
    }

    #[test]
    fn subscribe_fire_wait_returns_payload() {
        let (platform, adapter) = setup();
        assert_eq!(platform.subscriber_count(PROBE), 1);
        assert!(!adapter.source().enabled.load(Ordering::SeqCst));

        let rx = spawn_waiter(&adapter);
        platform.raise_event(PROBE, json!("alice"));

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "alice");
        assert!(!adapter.is_ready());
        assert!(!adapter.source().enabled.load(Ordering::SeqCst));
    }

    #[test]
    fn payload_survives_failed_disable() {
        let (platform, adapter) = setup();
        adapter.source().refuse_disable.store(true, Ordering::SeqCst);

        let rx = spawn_waiter(&adapter);
        platform.raise_event(PROBE, json!("grace"));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "grace");
        assert!(!adapter.is_ready());
    }

    #[test]
    fn empty_payload_keeps_waiter_blocked() {
        let (platform, adapter) = setup();
        let rx = spawn_waiter(&adapter);

        platform.raise_event(PROBE, json!(""));
        platform.flush();
        assert!(!adapter.is_ready());
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());

        platform.raise_event(PROBE, json!("bob"));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "bob");
    }

    #[test]
    fn clear_notification_drops_unread_payload() {
        let (platform, adapter) = setup();
        platform.raise_event(PROBE, json!("carol"));
        platform.flush();
        assert!(adapter.is_ready());

        platform.raise_event(PROBE, json!(""));
        platform.flush();
        assert!(!adapter.is_ready());
        assert_eq!(adapter.try_take(), None);
    }

    #[test]
    fn ignored_notifications_do_not_touch_state() {
        let (platform, adapter) = setup();
        platform.raise_event(PROBE, json!("dave"));
        platform.raise_event(PROBE, json!(0.0));
        platform.flush();
        assert_eq!(adapter.try_take().as_deref(), Some("dave"));
    }

    #[test]
    fn second_wait_needs_a_new_event() {
        let (platform, adapter) = setup();
        let rx = spawn_waiter(&adapter);
        platform.raise_event(PROBE, json!("first"));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "first");

        // Arrives while idle: must not satisfy the next wait.
        platform.raise_event(PROBE, json!("stale"));
        platform.flush();

        let rx = spawn_waiter(&adapter);
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
        platform.raise_event(PROBE, json!("second"));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "second");
    }

    #[test]
    fn last_event_wins_when_unread() {
        let (platform, adapter) = setup();
        for name in ["a", "b", "c"] {
            platform.raise_event(PROBE, json!(name));
        }
        platform.flush();
        assert_eq!(adapter.try_take().as_deref(), Some("c"));
    }

    #[test]
    fn concurrent_events_never_corrupt_payload() {
        let (platform, adapter) = setup();
        let producers: Vec<_> = (0..3)
            .map(|p| {
                let platform = Arc::clone(&platform);
                thread::spawn(move || {
                    for i in 0..300 {
                        platform.raise_event(PROBE, json!(format!("p{p}-{i}-p{p}")));
                    }
                })
            })
            .collect();

        for _ in 0..5 {
            let rx = spawn_waiter(&adapter);
            platform.raise_event(PROBE, json!("m-0-m"));
            let v = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            let parts: Vec<&str> = v.split('-').collect();
            assert_eq!(parts.len(), 3, "malformed payload {v}");
            assert_eq!(parts[0], parts[2], "torn payload {v}");
        }
        for p in producers {
            p.join().unwrap();
        }
    }

    #[test]
    fn direct_on_event_matches_callback_path() {
        let (_platform, adapter) = setup();
        adapter.on_event(&EventNotice::new(PROBE, json!("erin"), "probe-module"));
        assert!(adapter.is_ready());
        adapter.on_event(&EventNotice::new(PROBE, json!(""), "probe-module"));
        assert!(!adapter.is_ready());
    }

    #[test]
    fn configure_reaches_source() {
        let (_platform, adapter) = setup();
        adapter.configure(&()).unwrap();
        assert_eq!(adapter.source().configured.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_subscription_is_rejected() {
        let (platform, _adapter) = setup();
        let err = BlockingEventAdapter::new(
            platform.clone(),
            platform.clone(),
            ProbeSource::default(),
            "probe-module",
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            BridgeError::Platform(PlatformError::AlreadySubscribed { .. })
        ));
    }

    #[test]
    fn teardown_stops_delivery() {
        let (platform, adapter) = setup();
        adapter.teardown().unwrap();
        assert_eq!(platform.subscriber_count(PROBE), 0);

        platform.raise_event(PROBE, json!("frank"));
        platform.flush();
        assert!(!adapter.is_ready());

        assert!(matches!(
            adapter.teardown(),
            Err(BridgeError::Platform(PlatformError::NotSubscribed { .. }))
        ));
    }

    #[test]
    fn dropped_adapter_ignores_late_events() {
        let (platform, adapter) = setup();
        drop(adapter);
        platform.raise_event(PROBE, json!("ghost"));
        platform.flush();
        assert_eq!(platform.subscriber_count(PROBE), 1);
    }
}
