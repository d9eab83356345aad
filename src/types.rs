//! Shared types used across the bridge
//!
//! Domain newtypes for link addresses, keys and datagram payloads.

use core::fmt;

use crate::config::{ESPNOW_KEY_LEN, ESPNOW_MAX_PAYLOAD};

/// Owned datagram payload, sized to the ESP-NOW maximum
pub type Payload = heapless::Vec<u8, ESPNOW_MAX_PAYLOAD>;

/// 6-byte wireless hardware address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerAddress([u8; 6]);

impl PeerAddress {
    /// The all-peers broadcast address
    pub const BROADCAST: Self = Self([0xFF; 6]);

    /// Length of an address in bytes
    pub const LEN: usize = 6;

    /// Create an address from its octets
    #[must_use]
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Parse an address from a raw header slice, `None` unless exactly 6 bytes
    #[must_use]
    pub fn from_slice(raw: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = raw.try_into().ok()?;
        Some(Self(octets))
    }

    /// Get the address octets
    #[must_use]
    pub const fn octets(self) -> [u8; 6] {
        self.0
    }

    /// Check if this is the broadcast address
    #[must_use]
    pub const fn is_broadcast(self) -> bool {
        let o = self.0;
        o[0] == 0xFF && o[1] == 0xFF && o[2] == 0xFF && o[3] == 0xFF && o[4] == 0xFF && o[5] == 0xFF
    }
}

impl From<[u8; 6]> for PeerAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl fmt::Debug for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerAddress({self})")
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PeerAddress {
    fn format(&self, f: defmt::Formatter) {
        let o = self.0;
        defmt::write!(
            f,
            "{=u8:02x}:{=u8:02x}:{=u8:02x}:{=u8:02x}:{=u8:02x}:{=u8:02x}",
            o[0],
            o[1],
            o[2],
            o[3],
            o[4],
            o[5]
        );
    }
}

/// 16-byte symmetric key (ESP-NOW primary or local master key)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CipherKey([u8; ESPNOW_KEY_LEN]);

impl CipherKey {
    /// Create a key from raw bytes
    #[must_use]
    pub const fn new(bytes: [u8; ESPNOW_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the key bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ESPNOW_KEY_LEN] {
        &self.0
    }
}

// Key material stays out of logs
impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey(..)")
    }
}

/// Delivery outcome reported by the radio driver for one send
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendStatus {
    /// The link layer acknowledged the datagram
    Delivered,
    /// The link layer gave up on the datagram
    Failed,
}

impl SendStatus {
    /// Check if the datagram was delivered
    #[must_use]
    pub const fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl From<bool> for SendStatus {
    fn from(delivered: bool) -> Self {
        if delivered {
            Self::Delivered
        } else {
            Self::Failed
        }
    }
}

/// Bridge operating mode, chosen once at boot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BridgeMode {
    /// Forward Modbus RTU frames between the UART and the radio link
    #[default]
    ModbusOverRadio,
    /// Link diagnostic: echo every datagram back to its sender
    RadioEcho,
}

impl BridgeMode {
    /// Pick the mode from the boot-time Modbus flag
    #[must_use]
    pub const fn from_flag(modbus_enabled: bool) -> Self {
        if modbus_enabled {
            Self::ModbusOverRadio
        } else {
            Self::RadioEcho
        }
    }

    /// Name of the task that runs this mode
    #[must_use]
    pub const fn task_name(self) -> &'static str {
        match self {
            Self::ModbusOverRadio => "modbus_communication",
            Self::RadioEcho => "espnow_communication",
        }
    }
}

impl fmt::Display for BridgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ModbusOverRadio => "modbus-over-radio",
            Self::RadioEcho => "radio-echo",
        })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BridgeMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ModbusOverRadio => defmt::write!(f, "modbus-over-radio"),
            Self::RadioEcho => defmt::write!(f, "radio-echo"),
        }
    }
}
