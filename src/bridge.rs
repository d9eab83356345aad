//! Bridge Tasks
//!
//! The two long-running tasks a node can run, and the boot-time selector
//! that picks exactly one of them.

pub mod echo;
pub mod mode;
pub mod serial;

pub use echo::{EchoResponder, EchoStats};
pub use mode::{dispatch, ModeSpawner};
pub use serial::{BridgeStats, OutboundRequest, SerialBridge};
