//! Error taxonomy
//!
//! `InitError` is fatal and halts startup. `PeerError` and `SendError` are
//! recoverable: the caller logs them and carries on. Queue overflow is not
//! an error type at all, only a counter, because the producer side runs in
//! radio callback context and has nobody to report to.

use thiserror::Error;

/// Failure reported by the underlying radio stack
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// The radio stack is not running
    #[error("radio stack not started")]
    NotStarted,
    /// The driver's outbound queue has no room
    #[error("driver transmit queue full")]
    Busy,
    /// The driver's peer table is full
    #[error("driver peer table full")]
    PeerTableFull,
    /// The driver already knows this peer
    #[error("peer already present in driver table")]
    PeerExists,
    /// The driver has no such peer
    #[error("peer not present in driver table")]
    PeerNotFound,
    /// Any other stack-specific failure, with its raw code
    #[error("radio stack error {0}")]
    Other(i32),
}

/// Fatal startup failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// The radio stack could not start
    #[error("radio driver failed to start")]
    DriverInitFailed(#[source] DriverError),
    /// Callback registration was refused
    #[error("radio callback registration failed")]
    CallbackRegistration(#[source] DriverError),
    /// The primary master key was refused
    #[error("primary master key rejected")]
    PrimaryKey(#[source] DriverError),
    /// The broadcast peer could not be registered
    #[error("broadcast peer registration failed")]
    BroadcastPeer(#[source] PeerError),
}

/// Peer registration failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeerError {
    /// The address is already registered
    #[error("peer already registered")]
    DuplicatePeer,
    /// The registry reached the link-layer peer limit
    #[error("peer registry full")]
    RegistryFull,
    /// Channel outside 0..=14
    #[error("invalid channel {0}")]
    InvalidChannel(u8),
    /// Encryption requested without a local key
    #[error("encrypted peer without a local key")]
    MissingKey,
    /// The radio driver refused the peer
    #[error("driver rejected peer")]
    Driver(#[from] DriverError),
}

/// Send failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// Destination is not in the driver's peer table
    #[error("unknown peer")]
    UnknownPeer,
    /// Payload has no bytes
    #[error("empty payload")]
    EmptyPayload,
    /// Payload longer than the link maximum
    #[error("payload of {0} bytes exceeds the datagram maximum")]
    PayloadTooLarge(usize),
    /// A previous send has not completed yet
    #[error("send already in flight")]
    InFlight,
    /// The driver could not accept the datagram right now, retry later
    #[error("transient send failure")]
    TransientSendFailure(#[source] DriverError),
}
