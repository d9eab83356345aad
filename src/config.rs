//! System configuration and hardware constants
//!
//! Compile-time constants for the bridge hardware and link parameters,
//! plus the runtime [`BridgeConfig`] handed to the bridge tasks at boot.
//! All pin mappings, line settings and queue sizes are centralized here.

use embassy_time::Duration;

use crate::hal::uart::UartConfig;
use crate::modbus::silence_interval;
use crate::types::{BridgeMode, CipherKey, PeerAddress};

/// Modbus UART baud rate
pub const UART_BAUD_RATE: u32 = 9600;

/// UART driver receive ring size in bytes
pub const UART_RX_BUFFER_SIZE: usize = 256;

/// Chunk size for a single UART read
pub const UART_READ_CHUNK: usize = 64;

/// Maximum ESP-NOW datagram payload in bytes
pub const ESPNOW_MAX_PAYLOAD: usize = 250;

/// ESP-NOW key length (primary and local master keys)
pub const ESPNOW_KEY_LEN: usize = 16;

/// Maximum number of peers the ESP-NOW stack tracks
pub const MAX_PEERS: usize = 20;

/// Highest 2.4 GHz Wi-Fi channel a peer may be pinned to
pub const MAX_WIFI_CHANNEL: u8 = 14;

/// Event queue depth between radio callbacks and the bridge task
pub const EVENT_QUEUE_SIZE: usize = 6;

/// Outbound datagram queue depth inside the radio driver adapter
pub const RADIO_TX_QUEUE_SIZE: usize = 2;

/// Maximum Modbus RTU ADU length
pub const MODBUS_MAX_ADU: usize = 256;

/// Default ESP-NOW channel for provisioned and learned peers
pub const DEFAULT_CHANNEL: u8 = 1;

/// Primary master key installed at radio initialization
pub const PRIMARY_MASTER_KEY: CipherKey = CipherKey::new(*b"pmk1234567890123");

/// Time allowed for a send completion before the request is abandoned
pub const SEND_TIMEOUT_MS: u64 = 200;

/// Idle period after which echo mode broadcasts a beacon
pub const ECHO_BEACON_INTERVAL_MS: u64 = 1000;

/// Echo replies held while another send is in flight
pub const ECHO_BACKLOG_SIZE: usize = 4;

/// Settling delay between radio and UART bring-up
pub const STARTUP_SETTLE_MS: u64 = 1500;

/// Heap reserved for the Wi-Fi stack
pub const HEAP_SIZE: usize = 72 * 1024;

/// Bridge mode selected at boot
pub const BOOT_MODE: BridgeMode = BridgeMode::ModbusOverRadio;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments (ESP32 DevKit)

    /// Status / activity LED
    pub const LED_STATUS: u8 = 2;

    /// UART2 TX towards the RS-485 transceiver
    pub const UART_TX: u8 = 17;

    /// UART2 RX from the RS-485 transceiver
    pub const UART_RX: u8 = 16;
}

/// Runtime configuration for the bridge tasks
///
/// Built once at boot from the constants above and passed by value to
/// whichever task the selected [`BridgeMode`] spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Peer that UART frames are forwarded to
    pub target: PeerAddress,
    /// Channel used for learned and provisioned peers
    pub channel: u8,
    /// Primary master key for the radio stack
    pub primary_key: CipherKey,
    /// UART line settings
    pub uart: UartConfig,
    /// Inter-frame silence that terminates a Modbus frame
    pub frame_silence: Duration,
    /// Time allowed for a send completion
    pub send_timeout: Duration,
    /// Echo-mode beacon period
    pub beacon_interval: Duration,
}

impl BridgeConfig {
    /// Configuration forwarding to a specific peer instead of broadcast
    #[must_use]
    pub fn with_target(self, target: PeerAddress) -> Self {
        Self { target, ..self }
    }

    /// Dequeue timeout for the bridge loop (the silence window, at least 1 ms)
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        if self.frame_silence < Duration::from_millis(1) {
            Duration::from_millis(1)
        } else {
            self.frame_silence
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let uart = UartConfig::default();
        Self {
            target: PeerAddress::BROADCAST,
            channel: DEFAULT_CHANNEL,
            primary_key: PRIMARY_MASTER_KEY,
            uart,
            frame_silence: silence_interval(&uart),
            send_timeout: Duration::from_millis(SEND_TIMEOUT_MS),
            beacon_interval: Duration::from_millis(ECHO_BEACON_INTERVAL_MS),
        }
    }
}
