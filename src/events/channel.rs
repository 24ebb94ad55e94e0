//! Event channel implementation using crossbeam-channel.
//!
//! Progress is advisory: a sender never blocks the pipeline. On a bounded
//! channel that is full, the event is dropped.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use super::Event;

/// Sends events from the core library.
///
/// Thin wrapper around crossbeam's Sender that can be cloned and shared
/// across rayon workers.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Create a new EventSender from a raw crossbeam sender.
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Send an event without blocking.
    ///
    /// Returns `false` if the event was dropped, either because the
    /// channel is full or because the receiver is gone.
    pub fn send(&self, event: Event) -> bool {
        match self.inner.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Receives events from the core library.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Returns an iterator over received events
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Create a bounded event channel with the specified capacity.
    ///
    /// Updates beyond the capacity are dropped until the consumer catches up.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        EventChannel
    }
}

/// A sender whose receiver is already gone. Every event is discarded.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FileProgress, PipelineEvent, PipelinePhase};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Progress(FileProgress {
                phase: PipelinePhase::Collecting,
                completed: 5,
                total: 25,
                current_path: PathBuf::from("/test"),
            }));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Progress(p) => assert_eq!(p.completed, 5),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_discards() {
        let sender = null_sender();
        assert!(!sender.send(Event::Pipeline(PipelineEvent::Cancelled)));
    }

    #[test]
    fn full_bounded_channel_drops_instead_of_blocking() {
        let (sender, receiver) = EventChannel::bounded(2);

        assert!(sender.send(Event::Pipeline(PipelineEvent::Cancelled)));
        assert!(sender.send(Event::Pipeline(PipelineEvent::Cancelled)));
        assert!(!sender.send(Event::Pipeline(PipelineEvent::Cancelled)));

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }
}
