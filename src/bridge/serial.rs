//! Serial Bridge Task
//!
//! Sole consumer of the event queue and sole writer of the UART. Each cycle
//! races a queue dequeue (timeout = Modbus inter-frame silence) against a
//! UART read, then checks whether the buffered UART bytes form a complete
//! frame that can go out over the radio.
//!
//! Only one send is in flight at a time. A frame that completes while a send
//! is pending moves to a one-frame ready slot, so the next UART bytes always
//! start a new frame. A further frame that completes while the slot is still
//! occupied is dropped and counted.

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use embedded_io_async::{Read, Write};

use crate::config::{BridgeConfig, UART_READ_CHUNK};
use crate::hal::gpio::StatusLed;
use crate::modbus::{FrameAccumulator, FramePoll, ModbusFrame};
use crate::radio::{QueueEvent, RadioDriver, RadioTransport};
use crate::types::{Payload, PeerAddress, SendStatus};

/// A frame handed to the transport and awaiting its `SendResult`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Destination
    pub peer: PeerAddress,
    /// Frame bytes, held until the send completes or times out
    pub payload: Payload,
    /// Sequence the completion will carry
    pub sequence: u32,
    /// When the send was issued
    pub issued_at: Instant,
}

impl OutboundRequest {
    /// Check if the completion is overdue
    #[must_use]
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.issued_at) >= timeout
    }
}

/// Bridge counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Frames delivered over the radio
    pub frames_to_radio: u32,
    /// Datagrams written to the UART
    pub frames_to_uart: u32,
    /// Sends the link reported as failed
    pub send_failures: u32,
    /// Sends abandoned without a completion
    pub send_timeouts: u32,
    /// Frames the transport refused
    pub send_errors: u32,
    /// Completions matching no pending request
    pub stale_completions: u32,
    /// Frames too long for one datagram
    pub oversize_frames: u32,
    /// Frames dropped because the ready slot was occupied
    pub frames_dropped_busy: u32,
    /// Failed UART writes
    pub uart_write_errors: u32,
    /// Failed UART reads
    pub uart_read_errors: u32,
}

/// Modbus-over-radio bridge
pub struct SerialBridge<'q, D, P> {
    transport: RadioTransport<'q, D>,
    framer: FrameAccumulator,
    ready: Option<ModbusFrame>,
    pending: Option<OutboundRequest>,
    led: StatusLed<P>,
    config: BridgeConfig,
    stats: BridgeStats,
}

impl<'q, D, P> SerialBridge<'q, D, P>
where
    D: RadioDriver<'q>,
    P: OutputPin,
{
    /// Create a bridge over an initialized transport
    pub fn new(transport: RadioTransport<'q, D>, led: StatusLed<P>, config: BridgeConfig) -> Self {
        Self {
            transport,
            framer: FrameAccumulator::new(config.frame_silence),
            ready: None,
            pending: None,
            led,
            config,
            stats: BridgeStats::default(),
        }
    }

    /// Run the bridge loop forever
    pub async fn run<R: Read, W: Write>(&mut self, rx: &mut R, tx: &mut W) -> ! {
        let queue = self.transport.context().queue();
        let mut chunk = [0u8; UART_READ_CHUNK];

        info!(
            "modbus bridge running, target {}, silence {} us",
            self.config.target,
            self.config.frame_silence.as_micros()
        );

        loop {
            let woke = select(queue.dequeue(self.config.poll_interval()), rx.read(&mut chunk)).await;
            match woke {
                Either::First(Some(event)) => self.handle_event(event, tx).await,
                Either::First(None) => {}
                Either::Second(Ok(n)) => {
                    self.ingest(&chunk[..n], Instant::now());
                }
                Either::Second(Err(_)) => {
                    self.stats.uart_read_errors += 1;
                    warn!("uart read failed");
                }
            }
            self.poll(Instant::now());
        }
    }

    /// Process one dequeued event
    pub async fn handle_event<W: Write>(&mut self, event: QueueEvent, uart: &mut W) {
        match event {
            QueueEvent::ReceiveResult { peer, payload } => {
                // The datagram is already a complete Modbus frame
                let written = match uart.write_all(&payload).await {
                    Ok(()) => uart.flush().await,
                    Err(e) => Err(e),
                };
                if written.is_ok() {
                    self.stats.frames_to_uart += 1;
                    self.led.toggle();
                    debug!("{} bytes from {} to uart", payload.len(), peer);
                } else {
                    self.stats.uart_write_errors += 1;
                    warn!("uart write of {} bytes from {} failed", payload.len(), peer);
                }
            }
            QueueEvent::SendResult {
                peer,
                status,
                sequence,
            } => self.complete(peer, status, sequence),
        }
    }

    /// Feed bytes read from the UART
    pub fn ingest(&mut self, bytes: &[u8], now: Instant) -> usize {
        // Bytes after a full silence start a new frame
        self.close_frame(now);
        self.framer.push(bytes, now)
    }

    /// Housekeeping: expire the pending send, forward a finished frame
    pub fn poll(&mut self, now: Instant) {
        if let Some(request) = &self.pending {
            if request.is_expired(now, self.config.send_timeout) {
                let sequence = request.sequence;
                self.transport.abandon(sequence);
                self.pending = None;
                self.stats.send_timeouts += 1;
                warn!("send #{} timed out, frame dropped", sequence);
            }
        }
        self.close_frame(now);
    }

    fn close_frame(&mut self, now: Instant) {
        self.flush_ready(now);
        if self.ready.is_some() {
            if self.framer.is_complete(now) {
                let len = self.framer.len();
                self.framer.clear();
                self.stats.frames_dropped_busy += 1;
                warn!("uart frame of {} bytes dropped, previous frame still waiting", len);
            }
            return;
        }

        match self.framer.poll(now) {
            FramePoll::Idle | FramePoll::Pending => {}
            FramePoll::Overrun(len) => {
                self.stats.oversize_frames += 1;
                warn!("uart frame of {} bytes overran the buffer, dropped", len);
            }
            FramePoll::Ready(frame) => {
                self.ready = Some(frame);
                self.flush_ready(now);
            }
        }
    }

    fn flush_ready(&mut self, now: Instant) {
        if self.pending.is_some() {
            return;
        }
        if let Some(frame) = self.ready.take() {
            self.forward(&frame, now);
        }
    }

    fn forward(&mut self, frame: &ModbusFrame, now: Instant) {
        let Ok(payload) = Payload::from_slice(frame) else {
            self.stats.oversize_frames += 1;
            warn!("uart frame of {} bytes exceeds a datagram, dropped", frame.len());
            return;
        };

        let peer = self.config.target;
        match self.transport.send(peer, &payload) {
            Ok(sequence) => {
                debug!("frame #{} ({} bytes) to {}", sequence, payload.len(), peer);
                self.pending = Some(OutboundRequest {
                    peer,
                    payload,
                    sequence,
                    issued_at: now,
                });
            }
            Err(e) => {
                self.stats.send_errors += 1;
                warn!("frame to {} dropped: {}", peer, e);
            }
        }
    }

    fn complete(&mut self, peer: PeerAddress, status: SendStatus, sequence: u32) {
        let matched = self
            .pending
            .as_ref()
            .is_some_and(|request| request.sequence == sequence);
        if !matched {
            self.stats.stale_completions += 1;
            debug!("stale completion #{} from {}", sequence, peer);
            return;
        }

        self.pending = None;
        if status.is_delivered() {
            self.stats.frames_to_radio += 1;
            self.led.toggle();
        } else {
            // No retry here: the Modbus master times out and retries
            self.stats.send_failures += 1;
            warn!("frame #{} to {} not delivered, dropped", sequence, peer);
        }
    }

    /// Request awaiting completion
    #[must_use]
    pub const fn pending(&self) -> Option<&OutboundRequest> {
        self.pending.as_ref()
    }

    /// Counters
    #[must_use]
    pub const fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Bytes buffered towards the next frame
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.framer.len()
    }

    /// Complete frame waiting for the pending send to clear
    #[must_use]
    pub fn ready(&self) -> Option<&[u8]> {
        self.ready.as_deref()
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

    /// Stop bridging and hand back the transport
    pub fn into_transport(self) -> RadioTransport<'q, D> {
        self.transport
    }
}
