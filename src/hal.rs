//! Hardware Abstraction Layer
//!
//! Board-independent wrappers for the two peripherals the bridge core
//! touches: the status LED pin and the Modbus UART line settings.

pub mod gpio;
pub mod uart;
