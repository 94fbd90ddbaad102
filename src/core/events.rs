use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Notifications for the embedding host, fired after a resource was
/// materialized or read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    FileLoaded(String),
    FileLoadFailed(String),
    BinaryFileLoaded { name: String, data: Vec<u8> },
    ListResource(String),
}

pub trait EventSink {
    fn send_event(&self, event: CacheEvent);
}

/// Channel-backed sink; the receiving half is drained by the host.
#[derive(Debug, Clone)]
pub struct EventProxy {
    sender: UnboundedSender<CacheEvent>,
}

impl EventProxy {
    pub fn new() -> (EventProxy, UnboundedReceiver<CacheEvent>) {
        let (sender, receiver) = unbounded();
        (EventProxy { sender }, receiver)
    }
}

impl EventSink for EventProxy {
    fn send_event(&self, event: CacheEvent) {
        if let Err(err) = self.sender.unbounded_send(event) {
            debug!("Event receiver gone, dropping {:?}", err.into_inner());
        }
    }
}

/// Pulls every event currently buffered in `receiver` without blocking.
pub fn drain_events(receiver: &mut UnboundedReceiver<CacheEvent>) -> Vec<CacheEvent> {
    let mut events = vec![];
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
