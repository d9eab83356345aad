//! ESP-NOW Modbus Bridge Firmware Library
//!
//! Core of an ESP32 firmware that carries Modbus RTU traffic from a
//! half-duplex UART line over an ESP-NOW wireless hop, so a Modbus master
//! and its slaves can sit on opposite ends of a radio link unchanged.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     BRIDGE TASKS                             │
//! │  Serial Bridge (Modbus ↔ radio)  │  Echo Responder           │
//! │            ▲  selected once at boot by the Mode Selector     │
//! ├────────────┼────────────────────────────────────────────────┤
//! │            │        RADIO TRANSPORT LAYER                    │
//! │  Event Queue ◄── Radio Callbacks ◄── Radio Driver           │
//! │  Peer Registry ──► Radio Transport ──► Radio Driver          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  HAL / FRAMING                               │
//! │  UART line settings  │  Modbus RTU framing  │  Status LED    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Radio callbacks never block: they copy the datagram into an owned
//! buffer and try to enqueue it. The bridge task is the single consumer of
//! the queue and the single writer of the UART, so the bridge logic itself
//! needs no locking.

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

// Host builds take the critical-section implementation from the std feature
#[cfg(feature = "std")]
use critical_section as _;

// Re-export dependencies needed by the firmware binary (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Status LED and UART line settings.
pub mod hal;

/// Modbus RTU framing
///
/// Inter-frame silence detection over the UART byte stream.
pub mod modbus;

/// Radio Transport Layer
///
/// Driver boundary, peer registry, event queue and transport.
pub mod radio;

/// Bridge Tasks
///
/// Serial bridge, echo responder and mode selection.
pub mod bridge;

/// Error types
pub mod error;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::bridge::{dispatch, EchoResponder, ModeSpawner, SerialBridge};
    pub use crate::config::*;
    pub use crate::error::{DriverError, InitError, PeerError, SendError};
    pub use crate::hal::gpio::StatusLed;
    pub use crate::radio::{
        PeerEntry, QueueEvent, RadioCallbacks, RadioContext, RadioDriver, RadioTransport,
    };
    pub use crate::types::*;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};
}
