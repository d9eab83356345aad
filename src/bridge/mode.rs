//! Mode Selector
//!
//! The same firmware image runs either as a wireless Modbus modem or as a
//! link-level echo. The choice is made once at boot and exactly one
//! long-running task is spawned for it.

use crate::types::BridgeMode;

/// Spawns the long-running task of each mode
///
/// Implemented by the firmware shell over the executor's spawner, and by
/// test doubles on the host.
pub trait ModeSpawner {
    /// Spawn failure
    type Error;

    /// Spawn the Modbus-over-radio bridge task
    fn spawn_modbus_bridge(&mut self) -> Result<(), Self::Error>;

    /// Spawn the radio echo task
    fn spawn_radio_echo(&mut self) -> Result<(), Self::Error>;
}

/// Spawn the single task for `mode`
pub fn dispatch<S: ModeSpawner>(mode: BridgeMode, spawner: &mut S) -> Result<(), S::Error> {
    match mode {
        BridgeMode::ModbusOverRadio => spawner.spawn_modbus_bridge()?,
        BridgeMode::RadioEcho => spawner.spawn_radio_echo()?,
    }
    info!("created task - {}", mode.task_name());
    Ok(())
}
