//! Radio Transport
//!
//! Owns the radio driver and the peer registry. Sends are fire-and-forget
//! from the caller's point of view: `send` returns a sequence number and the
//! matching `SendResult` arrives later through the event queue.
//!
//! Only one send may be in flight at a time. The ESP-NOW completion
//! callback carries no request identity, so the in-flight slot is what ties
//! a completion back to its sequence.

use crate::config::ESPNOW_MAX_PAYLOAD;
use crate::error::{InitError, PeerError, SendError};
use crate::radio::driver::{RadioCallbacks, RadioContext, RadioDriver, NO_SEQUENCE};
use crate::radio::peer::{PeerEntry, PeerRegistry};
use crate::types::{CipherKey, PeerAddress};

/// Radio transport over a driver `D`
pub struct RadioTransport<'q, D> {
    driver: D,
    context: &'q RadioContext,
    peers: PeerRegistry,
    next_sequence: u32,
}

impl<'q, D: RadioDriver<'q>> RadioTransport<'q, D> {
    /// Start the radio, register callbacks, install the primary key and
    /// register the broadcast peer
    pub fn initialize(
        mut driver: D,
        context: &'q RadioContext,
        shared_key: &CipherKey,
    ) -> Result<Self, InitError> {
        driver.start().map_err(InitError::DriverInitFailed)?;
        driver
            .register_callbacks(RadioCallbacks::new(context))
            .map_err(InitError::CallbackRegistration)?;
        driver
            .set_primary_key(shared_key)
            .map_err(InitError::PrimaryKey)?;

        let mut peers = PeerRegistry::new();
        peers
            .add_peer(&mut driver, PeerEntry::broadcast())
            .map_err(InitError::BroadcastPeer)?;

        info!("radio transport up, broadcast peer registered");
        Ok(Self {
            driver,
            context,
            peers,
            next_sequence: 1,
        })
    }

    /// Register a peer
    pub fn add_peer(&mut self, entry: PeerEntry) -> Result<(), PeerError> {
        self.peers.add_peer(&mut self.driver, entry)?;
        debug!("peer {} added on channel {}", entry.address, entry.channel);
        Ok(())
    }

    /// Check the driver's peer table
    #[must_use]
    pub fn has_peer(&self, peer: PeerAddress) -> bool {
        self.driver.peer_exists(peer)
    }

    /// Registered peers
    #[must_use]
    pub const fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    /// Underlying radio driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Shared radio context
    #[must_use]
    pub const fn context(&self) -> &'q RadioContext {
        self.context
    }

    /// Submit a datagram, returns the sequence its `SendResult` will carry
    pub fn send(&mut self, peer: PeerAddress, payload: &[u8]) -> Result<u32, SendError> {
        if payload.is_empty() {
            return Err(SendError::EmptyPayload);
        }
        if payload.len() > ESPNOW_MAX_PAYLOAD {
            return Err(SendError::PayloadTooLarge(payload.len()));
        }
        if !self.driver.peer_exists(peer) {
            return Err(SendError::UnknownPeer);
        }

        if self.is_busy() {
            return Err(SendError::InFlight);
        }

        let sequence = self.allocate_sequence();
        // Claimed before handing off: the driver may complete synchronously
        if !self.context.begin_send(sequence) {
            return Err(SendError::InFlight);
        }
        if let Err(e) = self.driver.send(peer, payload) {
            self.context.end_send(sequence);
            return Err(SendError::TransientSendFailure(e));
        }

        trace!("send #{} to {} ({} bytes)", sequence, peer, payload.len());
        Ok(sequence)
    }

    /// Give up on an in-flight send so its late completion reads as stale
    pub fn abandon(&mut self, sequence: u32) -> bool {
        self.context.end_send(sequence)
    }

    /// Check if a send is awaiting completion
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.context.in_flight().is_some()
    }

    /// Tear the radio down and hand the driver back
    ///
    /// Must only run with no send in flight; a pending completion is lost.
    pub fn deinitialize(mut self) -> D {
        if let Some(sequence) = self.context.reset_in_flight() {
            warn!("deinitialize with send #{} in flight, completion lost", sequence);
        }
        self.driver.unregister_callbacks();
        self.driver.stop();
        let discarded = self.context.queue().clear();
        info!("radio transport down, {} queued events released", discarded);
        self.driver
    }

    fn allocate_sequence(&mut self) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        if self.next_sequence == NO_SEQUENCE {
            self.next_sequence = 1;
        }
        sequence
    }
}
