//! Händelser till UI-lagret
//!
//! Ägs av tjänsterna (ingen global). Prenumeranter får en egen mottagare.

use tokio::sync::broadcast;

/// Kapacitet innan långsamma mottagare börjar tappa händelser
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// Lokala samlingar har ändrats
    StoreChanged,
    SyncStarted,
    SyncEnded,
    /// Nätverks- eller tolkningsfel vid push/pull
    SyncFailed,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Skicka en händelse. Utan prenumeranter händer ingenting.
    pub fn emit(&self, event: StoreEvent) {
        tracing::trace!("Händelse: {:?}", event);
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
pub(crate) fn drain(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
