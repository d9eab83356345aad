//! Peer Registry
//!
//! Known link peers and their session parameters. Every addition is also
//! installed into the driver's own peer table, which the transport consults
//! before each send.

use heapless::Vec;

use crate::config::{MAX_PEERS, MAX_WIFI_CHANNEL};
use crate::error::{DriverError, PeerError};
use crate::radio::driver::RadioDriver;
use crate::types::{CipherKey, PeerAddress};

/// One registered peer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerEntry {
    /// Peer hardware address
    pub address: PeerAddress,
    /// Wi-Fi channel (0 = whatever channel the station is on)
    pub channel: u8,
    /// Encrypt traffic to this peer
    pub encrypted: bool,
    /// Local master key, required when `encrypted`
    pub key: Option<CipherKey>,
}

impl PeerEntry {
    /// Unencrypted peer on `channel`
    #[must_use]
    pub const fn unencrypted(address: PeerAddress, channel: u8) -> Self {
        Self {
            address,
            channel,
            encrypted: false,
            key: None,
        }
    }

    /// Encrypted peer on `channel` using `key`
    #[must_use]
    pub const fn encrypted(address: PeerAddress, channel: u8, key: CipherKey) -> Self {
        Self {
            address,
            channel,
            encrypted: true,
            key: Some(key),
        }
    }

    /// The broadcast peer, always unencrypted on the current channel
    #[must_use]
    pub const fn broadcast() -> Self {
        Self::unencrypted(PeerAddress::BROADCAST, 0)
    }

    fn validate(&self) -> Result<(), PeerError> {
        if self.channel > MAX_WIFI_CHANNEL {
            return Err(PeerError::InvalidChannel(self.channel));
        }
        if self.encrypted && self.key.is_none() {
            return Err(PeerError::MissingKey);
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PeerEntry {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Peer({}, ch {}, enc {})",
            self.address,
            self.channel,
            self.encrypted
        );
    }
}

/// Set of registered peers, bounded by the link-layer limit
#[derive(Clone, Debug, Default)]
pub struct PeerRegistry {
    entries: Vec<PeerEntry, MAX_PEERS>,
}

impl PeerRegistry {
    /// Create an empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a peer here and in the driver's table
    ///
    /// On error neither the registry nor the driver table is changed.
    pub fn add_peer<'q, D: RadioDriver<'q>>(
        &mut self,
        driver: &mut D,
        entry: PeerEntry,
    ) -> Result<(), PeerError> {
        entry.validate()?;
        if self.has_peer(entry.address) || driver.peer_exists(entry.address) {
            return Err(PeerError::DuplicatePeer);
        }
        if self.entries.is_full() {
            return Err(PeerError::RegistryFull);
        }

        driver.add_peer(&entry).map_err(|e| match e {
            DriverError::PeerTableFull => PeerError::RegistryFull,
            DriverError::PeerExists => PeerError::DuplicatePeer,
            other => PeerError::Driver(other),
        })?;
        self.entries
            .push(entry)
            .map_err(|_| PeerError::RegistryFull)
    }

    /// Check if an address is registered
    #[must_use]
    pub fn has_peer(&self, address: PeerAddress) -> bool {
        self.entries.iter().any(|e| e.address == address)
    }

    /// Look up a registered peer
    #[must_use]
    pub fn get(&self, address: PeerAddress) -> Option<&PeerEntry> {
        self.entries.iter().find(|e| e.address == address)
    }

    /// Iterate over registered peers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &PeerEntry> {
        self.entries.iter()
    }

    /// Number of registered peers
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no peers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
