//! Event Queue
//!
//! Bounded mailbox between the radio callback context (any number of
//! producers) and the single bridge task (the consumer). Producers never
//! block: on overflow the event is dropped and counted.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration};

use crate::types::{Payload, PeerAddress, SendStatus};

/// Event handed from radio callbacks to the bridge task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueEvent {
    /// The driver confirmed or denied delivery of one send
    SendResult {
        /// Destination of the send
        peer: PeerAddress,
        /// Delivery outcome
        status: SendStatus,
        /// Sequence of the send this completes, 0 if none was in flight
        sequence: u32,
    },
    /// A datagram arrived
    ReceiveResult {
        /// Sender address
        peer: PeerAddress,
        /// Datagram bytes, owned by the event
        payload: Payload,
    },
}

impl QueueEvent {
    /// Peer the event concerns
    #[must_use]
    pub const fn peer(&self) -> PeerAddress {
        match self {
            Self::SendResult { peer, .. } | Self::ReceiveResult { peer, .. } => *peer,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for QueueEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::SendResult {
                peer,
                status,
                sequence,
            } => defmt::write!(f, "SendResult({}, {}, #{})", peer, status, sequence),
            Self::ReceiveResult { peer, payload } => {
                defmt::write!(f, "ReceiveResult({}, {} bytes)", peer, payload.len());
            }
        }
    }
}

/// Bounded FIFO of [`QueueEvent`]s with an overflow counter
pub struct EventQueue<const N: usize> {
    channel: Channel<CriticalSectionRawMutex, QueueEvent, N>,
    dropped: AtomicU32,
}

impl<const N: usize> EventQueue<N> {
    /// Create an empty queue
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue without blocking, returns `false` (and counts a drop) when full
    pub fn enqueue(&self, event: QueueEvent) -> bool {
        if self.channel.try_send(event).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Wait up to `timeout` for the next event
    pub async fn dequeue(&self, timeout: Duration) -> Option<QueueEvent> {
        with_timeout(timeout, self.channel.receive()).await.ok()
    }

    /// Take the next event if one is queued
    pub fn try_dequeue(&self) -> Option<QueueEvent> {
        self.channel.try_receive().ok()
    }

    /// Discard every queued event, returns how many were discarded
    pub fn clear(&self) -> usize {
        let mut discarded = 0;
        while self.channel.try_receive().is_ok() {
            discarded += 1;
        }
        discarded
    }

    /// Number of queued events
    #[must_use]
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    /// Check if no events are queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Configured capacity
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Events dropped on overflow since creation
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
