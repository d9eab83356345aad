//! UART line settings
//!
//! Fixed serial line parameters for the Modbus RTU side of the bridge.

use crate::config::UART_BAUD_RATE;

/// UART line configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UartConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits (5, 6, 7, 8)
    pub data_bits: u8,
    /// Parity
    pub parity: Parity,
    /// Stop bits (1, 2)
    pub stop_bits: StopBits,
    /// Hardware RTS/CTS flow control
    pub flow_control: bool,
}

impl UartConfig {
    /// Bits on the wire per character, start bit included
    #[must_use]
    pub const fn bits_per_char(&self) -> u32 {
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Odd | Parity::Even => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + self.data_bits as u32 + parity + stop
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: UART_BAUD_RATE,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: false,
        }
    }
}

/// Stop bits configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// Two stop bits
    Two,
}

/// Parity configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parity {
    /// No parity
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

#[cfg(feature = "defmt")]
impl defmt::Format for UartConfig {
    fn format(&self, f: defmt::Formatter) {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => 1u8,
            StopBits::Two => 2u8,
        };
        defmt::write!(f, "{} {}{}{}", self.baud_rate, self.data_bits, parity, stop);
    }
}
