//! Radio Transport Layer
//!
//! Everything between the ESP-NOW stack and the bridge tasks: the driver
//! boundary and its callbacks, the peer registry, the event queue and the
//! transport that ties them together.

pub mod driver;
pub mod peer;
pub mod queue;
pub mod transport;

pub use driver::{RadioCallbacks, RadioContext, RadioDriver};
pub use peer::{PeerEntry, PeerRegistry};
pub use queue::{EventQueue, QueueEvent};
pub use transport::RadioTransport;
