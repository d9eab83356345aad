//! Modbus RTU framing
//!
//! Frame-boundary detection for the UART side. RTU frames carry no
//! delimiter: a frame ends when the line stays silent for 3.5 character
//! times (t3.5). The bridge only cares about the byte extent of a frame,
//! never about its contents or CRC.

use embassy_time::{Duration, Instant};
use heapless::Vec;

use crate::config::MODBUS_MAX_ADU;
use crate::hal::uart::UartConfig;

/// One complete Modbus RTU frame as read from the UART
pub type ModbusFrame = Vec<u8, MODBUS_MAX_ADU>;

/// Above this baud rate Modbus RTU fixes t3.5 at 1750 µs
const FIXED_SILENCE_BAUD: u32 = 19_200;

/// Fixed t3.5 for high baud rates
const FIXED_SILENCE_US: u64 = 1_750;

/// Inter-frame silence (t3.5) for a line configuration
#[must_use]
pub fn silence_interval(uart: &UartConfig) -> Duration {
    if uart.baud_rate == 0 || uart.baud_rate > FIXED_SILENCE_BAUD {
        return Duration::from_micros(FIXED_SILENCE_US);
    }
    // 3.5 chars = 7 half-chars, rounded up
    let half_char_bits = u64::from(uart.bits_per_char()) * 7;
    let micros = (half_char_bits * 1_000_000).div_ceil(2 * u64::from(uart.baud_rate));
    Duration::from_micros(micros)
}

/// Result of polling the accumulator for a frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FramePoll {
    /// No bytes buffered
    Idle,
    /// Bytes buffered, line not yet silent long enough
    Pending,
    /// A complete frame
    Ready(ModbusFrame),
    /// The frame outgrew the ADU limit and was discarded (byte count seen)
    Overrun(usize),
}

/// Accumulates UART bytes into Modbus RTU frames
pub struct FrameAccumulator {
    /// Bytes of the frame in progress
    buffer: ModbusFrame,
    /// Arrival time of the most recent byte
    last_byte_at: Option<Instant>,
    /// Bytes dropped after the buffer filled
    overrun: usize,
    /// Silence that terminates a frame
    silence: Duration,
}

impl FrameAccumulator {
    /// Create an accumulator terminating frames after `silence`
    #[must_use]
    pub const fn new(silence: Duration) -> Self {
        Self {
            buffer: Vec::new(),
            last_byte_at: None,
            overrun: 0,
            silence,
        }
    }

    /// Feed received bytes, returns how many were buffered
    pub fn push(&mut self, bytes: &[u8], now: Instant) -> usize {
        if bytes.is_empty() {
            return 0;
        }
        self.last_byte_at = Some(now);

        let room = MODBUS_MAX_ADU - self.buffer.len();
        let take = bytes.len().min(room);
        // Cannot fail: `take` fits the remaining capacity
        let _ = self.buffer.extend_from_slice(&bytes[..take]);
        self.overrun += bytes.len() - take;
        take
    }

    /// Take the buffered frame once the line has been silent long enough
    pub fn poll(&mut self, now: Instant) -> FramePoll {
        if self.last_byte_at.is_none() {
            return FramePoll::Idle;
        }
        if !self.is_complete(now) {
            return FramePoll::Pending;
        }

        self.last_byte_at = None;
        if self.overrun > 0 {
            let seen = self.buffer.len() + self.overrun;
            self.clear();
            return FramePoll::Overrun(seen);
        }
        FramePoll::Ready(core::mem::take(&mut self.buffer))
    }

    /// Check if the buffered bytes have been followed by a full silence
    #[must_use]
    pub fn is_complete(&self, now: Instant) -> bool {
        self.last_byte_at
            .is_some_and(|last| now.saturating_duration_since(last) >= self.silence)
    }

    /// Discard any partial frame
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_byte_at = None;
        self.overrun = 0;
    }

    /// Number of bytes buffered
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing is buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.overrun == 0
    }

    /// Silence that terminates a frame
    #[must_use]
    pub const fn silence(&self) -> Duration {
        self.silence
    }
}
