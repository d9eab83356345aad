//! Shared test doubles
//!
//! An in-memory radio driver, a scripted UART and a no-op LED pin, enough to
//! drive the transport and both bridge tasks on the host.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};

use espnow_modbus_bridge::error::DriverError;
use espnow_modbus_bridge::radio::{PeerEntry, RadioCallbacks, RadioDriver};
use espnow_modbus_bridge::types::{CipherKey, PeerAddress, SendStatus};

/// Peer used across the tests
pub const PEER_A: PeerAddress = PeerAddress::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);

/// Second peer
pub const PEER_B: PeerAddress = PeerAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01]);

/// Key used across the tests
pub const TEST_KEY: CipherKey = CipherKey::new(*b"0123456789abcdef");

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Mock radio
// ============================================================================

/// In-memory radio stack
///
/// Records every call. With `auto_complete` set, each accepted send fires
/// its completion synchronously from inside `send`, the way a fast link
/// would.
pub struct MockRadio<'q> {
    pub started: bool,
    pub stopped: bool,
    pub fail_start: bool,
    pub fail_callbacks: bool,
    pub fail_primary_key: bool,
    pub busy: bool,
    pub peer_capacity: usize,
    pub auto_complete: Option<SendStatus>,
    pub callbacks: Option<RadioCallbacks<'q>>,
    pub primary_key: Option<CipherKey>,
    pub peers: Vec<PeerEntry>,
    pub sent: Vec<(PeerAddress, Vec<u8>)>,
}

impl<'q> MockRadio<'q> {
    pub fn new() -> Self {
        Self {
            started: false,
            stopped: false,
            fail_start: false,
            fail_callbacks: false,
            fail_primary_key: false,
            busy: false,
            peer_capacity: 20,
            auto_complete: None,
            callbacks: None,
            primary_key: None,
            peers: Vec::new(),
            sent: Vec::new(),
        }
    }

    /// Radio that completes every send with `status`
    pub fn completing(status: SendStatus) -> Self {
        Self {
            auto_complete: Some(status),
            ..Self::new()
        }
    }

    /// Registered callbacks, as the stack would invoke them
    pub fn callbacks(&self) -> RadioCallbacks<'q> {
        self.callbacks.expect("callbacks registered")
    }
}

impl<'q> RadioDriver<'q> for MockRadio<'q> {
    fn start(&mut self) -> Result<(), DriverError> {
        if self.fail_start {
            return Err(DriverError::Other(-1));
        }
        self.started = true;
        Ok(())
    }

    fn register_callbacks(&mut self, callbacks: RadioCallbacks<'q>) -> Result<(), DriverError> {
        if self.fail_callbacks {
            return Err(DriverError::NotStarted);
        }
        self.callbacks = Some(callbacks);
        Ok(())
    }

    fn unregister_callbacks(&mut self) {
        self.callbacks = None;
    }

    fn set_primary_key(&mut self, key: &CipherKey) -> Result<(), DriverError> {
        if self.fail_primary_key {
            return Err(DriverError::Other(0x3066));
        }
        self.primary_key = Some(*key);
        Ok(())
    }

    fn add_peer(&mut self, entry: &PeerEntry) -> Result<(), DriverError> {
        if self.peers.iter().any(|p| p.address == entry.address) {
            return Err(DriverError::PeerExists);
        }
        if self.peers.len() >= self.peer_capacity {
            return Err(DriverError::PeerTableFull);
        }
        self.peers.push(*entry);
        Ok(())
    }

    fn peer_exists(&self, peer: PeerAddress) -> bool {
        self.peers.iter().any(|p| p.address == peer)
    }

    fn send(&mut self, peer: PeerAddress, payload: &[u8]) -> Result<(), DriverError> {
        if !self.started {
            return Err(DriverError::NotStarted);
        }
        if self.busy {
            return Err(DriverError::Busy);
        }
        self.sent.push((peer, payload.to_vec()));
        if let (Some(status), Some(callbacks)) = (self.auto_complete, self.callbacks) {
            callbacks.on_send_complete(peer, status);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.started = false;
        self.stopped = true;
    }
}

// ============================================================================
// Mock UART
// ============================================================================

/// Scripted UART: reads pop queued chunks, writes are recorded
///
/// Once the script is exhausted a read never completes, like an idle line.
#[derive(Default)]
pub struct MockUart {
    pub rx: VecDeque<Vec<u8>>,
    pub tx: Vec<u8>,
    pub writes: usize,
    pub fail_writes: bool,
}

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// UART whose reads deliver `chunks` in order
    pub fn with_rx(chunks: &[&[u8]]) -> Self {
        Self {
            rx: chunks.iter().map(|c| c.to_vec()).collect(),
            ..Self::default()
        }
    }
}

impl ErrorType for MockUart {
    type Error = ErrorKind;
}

impl Read for MockUart {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.rx.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            None => core::future::pending().await,
        }
    }
}

impl Write for MockUart {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(ErrorKind::Other);
        }
        self.tx.extend_from_slice(buf);
        self.writes += 1;
        Ok(buf.len())
    }
}

// ============================================================================
// LED pin
// ============================================================================

/// Output pin that only remembers its level
#[derive(Default)]
pub struct NoopPin {
    pub high: bool,
}

impl PinErrorType for NoopPin {
    type Error = Infallible;
}

impl OutputPin for NoopPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}
