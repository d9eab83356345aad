//! Radio driver boundary
//!
//! [`RadioDriver`] is the seam between the transport and a concrete radio
//! stack. The driver owns its own peer table and fires completions through
//! the [`RadioCallbacks`] handed to it at registration. Callbacks run in the
//! driver's callback context, where nothing may block: every path through
//! them is a non-blocking enqueue or an atomic update.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::{ESPNOW_MAX_PAYLOAD, EVENT_QUEUE_SIZE};
use crate::error::DriverError;
use crate::radio::peer::PeerEntry;
use crate::radio::queue::{EventQueue, QueueEvent};
use crate::types::{CipherKey, Payload, PeerAddress, SendStatus};

/// Sequence value meaning "no send in flight"
pub const NO_SEQUENCE: u32 = 0;

/// Operations the transport needs from a radio stack
///
/// `'q` is the lifetime of the [`RadioContext`] the callbacks point into.
pub trait RadioDriver<'q> {
    /// Bring the radio stack up
    fn start(&mut self) -> Result<(), DriverError>;

    /// Register the send/receive callbacks
    fn register_callbacks(&mut self, callbacks: RadioCallbacks<'q>) -> Result<(), DriverError>;

    /// Drop the registered callbacks; no completion fires afterwards
    fn unregister_callbacks(&mut self);

    /// Install the primary master key
    fn set_primary_key(&mut self, key: &CipherKey) -> Result<(), DriverError>;

    /// Add a peer to the driver's table
    fn add_peer(&mut self, entry: &PeerEntry) -> Result<(), DriverError>;

    /// Check the driver's table for a peer
    fn peer_exists(&self, peer: PeerAddress) -> bool;

    /// Hand a datagram to the stack; completion is reported asynchronously
    fn send(&mut self, peer: PeerAddress, payload: &[u8]) -> Result<(), DriverError>;

    /// Shut the radio stack down
    fn stop(&mut self);
}

/// State shared between the radio callback context and the bridge task
///
/// Constructed once at boot (or per test) and borrowed by the transport and
/// its callbacks; replaces module-level globals.
pub struct RadioContext {
    queue: EventQueue<EVENT_QUEUE_SIZE>,
    in_flight: AtomicU32,
    rx_rejected: AtomicU32,
}

impl RadioContext {
    /// Create an empty context
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: EventQueue::new(),
            in_flight: AtomicU32::new(NO_SEQUENCE),
            rx_rejected: AtomicU32::new(0),
        }
    }

    /// The event queue
    #[must_use]
    pub const fn queue(&self) -> &EventQueue<EVENT_QUEUE_SIZE> {
        &self.queue
    }

    /// Sequence of the send awaiting completion, if any
    #[must_use]
    pub fn in_flight(&self) -> Option<u32> {
        match self.in_flight.load(Ordering::Acquire) {
            NO_SEQUENCE => None,
            seq => Some(seq),
        }
    }

    /// Received datagrams rejected by header or length validation
    #[must_use]
    pub fn rx_rejected(&self) -> u32 {
        self.rx_rejected.load(Ordering::Relaxed)
    }

    /// Claim the in-flight slot for `sequence`, `false` if already taken
    pub(crate) fn begin_send(&self, sequence: u32) -> bool {
        self.in_flight
            .compare_exchange(NO_SEQUENCE, sequence, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the in-flight slot if it still holds `sequence`
    pub(crate) fn end_send(&self, sequence: u32) -> bool {
        self.in_flight
            .compare_exchange(sequence, NO_SEQUENCE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the in-flight slot unconditionally
    pub(crate) fn reset_in_flight(&self) -> Option<u32> {
        match self.in_flight.swap(NO_SEQUENCE, Ordering::AcqRel) {
            NO_SEQUENCE => None,
            seq => Some(seq),
        }
    }
}

impl Default for RadioContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Send/receive handlers the driver invokes from its callback context
#[derive(Clone, Copy)]
pub struct RadioCallbacks<'q> {
    context: &'q RadioContext,
}

impl<'q> RadioCallbacks<'q> {
    /// Create callbacks feeding `context`
    #[must_use]
    pub const fn new(context: &'q RadioContext) -> Self {
        Self { context }
    }

    /// Send-completion handler
    ///
    /// Tags the completion with the in-flight sequence (0 if the send was
    /// already abandoned) and enqueues it. Returns `false` if it was dropped.
    pub fn on_send_complete(&self, peer: PeerAddress, status: SendStatus) -> bool {
        let sequence = self.context.reset_in_flight().unwrap_or(NO_SEQUENCE);
        self.context.queue.enqueue(QueueEvent::SendResult {
            peer,
            status,
            sequence,
        })
    }

    /// Receive handler
    ///
    /// Validates the sender header and payload length, copies the payload
    /// into a buffer owned by the event and enqueues it. The driver's buffer
    /// is never retained. Returns `false` if the datagram was rejected or
    /// dropped.
    pub fn on_receive(&self, src: &[u8], data: &[u8]) -> bool {
        let Some(peer) = PeerAddress::from_slice(src) else {
            self.context.rx_rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        if data.is_empty() || data.len() > ESPNOW_MAX_PAYLOAD {
            self.context.rx_rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        let Ok(payload) = Payload::from_slice(data) else {
            self.context.rx_rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        self.context
            .queue
            .enqueue(QueueEvent::ReceiveResult { peer, payload })
    }
}
