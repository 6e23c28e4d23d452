//! Structural change notifications
//!
//! Events carry identifiers only; listeners re-query the registry for
//! payloads. Delivery is a plain `mpsc` channel per subscriber.

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

/// What a workspace was created for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceKind {
    Normal,
    Algorithm,
}

impl fmt::Display for WorkspaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceKind::Normal => write!(f, "Normal"),
            WorkspaceKind::Algorithm => write!(f, "Algorithm"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructureEvent {
    WorkspaceCreated {
        workspace: String,
        kind: WorkspaceKind,
    },
    ChannelsAdded {
        workspace: String,
        channels: Vec<String>,
    },
    SignalAdded {
        workspace: String,
        signal: String,
        channels: Vec<String>,
    },
    /// `channels` lists every channel holding the signal after the change
    SignalChanged {
        workspace: String,
        signal: String,
        channels: Vec<String>,
    },
    SignalRemoved {
        workspace: String,
        signal: String,
    },
    AllRemoved,
}

/// Fan-out of structural events to every live subscriber
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Sender<StructureEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<StructureEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Send to every subscriber; dropped receivers are forgotten
    pub fn emit(&mut self, event: StructureEvent) {
        log::debug!("structure event: {:?}", event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut bus = EventBus::new();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        drop(dropped);

        bus.emit(StructureEvent::AllRemoved);

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), StructureEvent::AllRemoved);
    }
}
