//! Radio echo responder
//!
//! Link diagnostic mode: every datagram is sent straight back to whoever
//! sent it. Unknown senders are registered on first contact. When the link
//! is quiet a numbered beacon goes out on broadcast so other nodes can find
//! this one.

use embedded_hal::digital::OutputPin;
use heapless::Deque;

use crate::config::{BridgeConfig, ECHO_BACKLOG_SIZE};
use crate::error::SendError;
use crate::hal::gpio::StatusLed;
use crate::radio::{PeerEntry, QueueEvent, RadioDriver, RadioTransport};
use crate::types::{Payload, PeerAddress};

/// Prefix of every beacon datagram
pub const BEACON_MAGIC: &[u8; 8] = b"MBR-ECHO";

/// Beacon length: magic plus big-endian counter
pub const BEACON_LEN: usize = BEACON_MAGIC.len() + core::mem::size_of::<u32>();

/// Echo counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EchoStats {
    /// Datagrams received
    pub received: u32,
    /// Replies handed to the transport
    pub echoed: u32,
    /// Replies held behind another send
    pub queued: u32,
    /// Replies lost to a full backlog
    pub backlog_drops: u32,
    /// Sends the link confirmed
    pub delivered: u32,
    /// Sends the link reported as failed
    pub failed: u32,
    /// Sends abandoned without a completion
    pub send_timeouts: u32,
    /// Sends the transport refused
    pub send_errors: u32,
    /// Peers registered on first contact
    pub peers_learned: u32,
    /// Beacons broadcast
    pub beacons: u32,
}

/// Echo-mode task state
///
/// One send is in flight at a time. Replies that arrive meanwhile wait in a
/// bounded backlog and go out, oldest first, as each completion comes back.
pub struct EchoResponder<'q, D, P> {
    transport: RadioTransport<'q, D>,
    led: StatusLed<P>,
    config: BridgeConfig,
    backlog: Deque<(PeerAddress, Payload), ECHO_BACKLOG_SIZE>,
    in_flight: Option<u32>,
    stats: EchoStats,
}

impl<'q, D, P> EchoResponder<'q, D, P>
where
    D: RadioDriver<'q>,
    P: OutputPin,
{
    /// Create a responder over an initialized transport
    pub fn new(transport: RadioTransport<'q, D>, led: StatusLed<P>, config: BridgeConfig) -> Self {
        Self {
            transport,
            led,
            config,
            backlog: Deque::new(),
            in_flight: None,
            stats: EchoStats::default(),
        }
    }

    /// Run the echo loop forever
    pub async fn run(&mut self) -> ! {
        let queue = self.transport.context().queue();
        info!("radio echo running, beacon every {} ms", self.config.beacon_interval.as_millis());

        loop {
            match queue.dequeue(self.config.beacon_interval).await {
                Some(event) => self.handle_event(event),
                None => self.idle(),
            }
        }
    }

    /// Process one dequeued event
    pub fn handle_event(&mut self, event: QueueEvent) {
        match event {
            QueueEvent::ReceiveResult { peer, payload } => self.echo(peer, payload),
            QueueEvent::SendResult {
                peer,
                status,
                sequence,
            } => {
                if status.is_delivered() {
                    self.stats.delivered += 1;
                } else {
                    self.stats.failed += 1;
                }
                if self.in_flight == Some(sequence) {
                    self.in_flight = None;
                    self.send_next();
                } else {
                    debug!("stale completion #{} from {}", sequence, peer);
                }
            }
        }
    }

    /// Quiet link: give up on a send that never completed, then send the
    /// oldest held reply or, with nothing held, a beacon
    pub fn idle(&mut self) {
        if let Some(sequence) = self.in_flight.take() {
            self.transport.abandon(sequence);
            self.stats.send_timeouts += 1;
            warn!("send #{} never completed, abandoned", sequence);
        }

        if !self.backlog.is_empty() {
            self.send_next();
        } else if let Err(e) = self.beacon() {
            debug!("beacon skipped: {}", e);
        }
    }

    /// Broadcast a numbered beacon
    pub fn beacon(&mut self) -> Result<u32, SendError> {
        if self.in_flight.is_some() {
            return Err(SendError::InFlight);
        }

        let mut beacon = [0u8; BEACON_LEN];
        let (magic, counter) = beacon.split_at_mut(BEACON_MAGIC.len());
        magic.copy_from_slice(BEACON_MAGIC);
        counter.copy_from_slice(&self.stats.beacons.to_be_bytes());

        let sequence = self.transport.send(PeerAddress::BROADCAST, &beacon)?;
        self.in_flight = Some(sequence);
        self.stats.beacons += 1;
        Ok(sequence)
    }

    fn echo(&mut self, peer: PeerAddress, payload: Payload) {
        self.stats.received += 1;
        self.led.toggle();

        if !self.transport.has_peer(peer) {
            match self
                .transport
                .add_peer(PeerEntry::unencrypted(peer, self.config.channel))
            {
                Ok(()) => {
                    self.stats.peers_learned += 1;
                    info!("learned peer {}", peer);
                }
                Err(e) => {
                    warn!("cannot register {}: {}", peer, e);
                    self.stats.send_errors += 1;
                    return;
                }
            }
        }

        if self.in_flight.is_none() && self.backlog.is_empty() {
            self.send_reply(peer, &payload);
            return;
        }
        if self.backlog.push_back((peer, payload)).is_ok() {
            self.stats.queued += 1;
        } else {
            self.stats.backlog_drops += 1;
            warn!("echo backlog full, reply to {} dropped", peer);
        }
    }

    fn send_next(&mut self) {
        while self.in_flight.is_none() {
            let Some((peer, payload)) = self.backlog.pop_front() else {
                break;
            };
            self.send_reply(peer, &payload);
        }
    }

    fn send_reply(&mut self, peer: PeerAddress, payload: &[u8]) {
        match self.transport.send(peer, payload) {
            Ok(sequence) => {
                self.in_flight = Some(sequence);
                self.stats.echoed += 1;
            }
            Err(e) => {
                self.stats.send_errors += 1;
                warn!("echo to {} dropped: {}", peer, e);
            }
        }
    }

    /// Counters
    #[must_use]
    pub const fn stats(&self) -> EchoStats {
        self.stats
    }

    /// Replies waiting for the link
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Underlying transport
    #[must_use]
    pub const fn transport(&self) -> &RadioTransport<'q, D> {
        &self.transport
    }

    /// Status LED
    #[must_use]
    pub const fn led(&self) -> &StatusLed<P> {
        &self.led
    }
}
