//! Mode Selector Tests
//!
//! Tests that exactly one long-running task is spawned per boot mode.
//! Run with: cargo test --test mode_tests

use espnow_modbus_bridge::bridge::{dispatch, ModeSpawner};
use espnow_modbus_bridge::config::BOOT_MODE;
use espnow_modbus_bridge::types::BridgeMode;

/// Records which tasks were spawned
#[derive(Default)]
struct RecordingSpawner {
    spawned: Vec<&'static str>,
    fail: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct NoTaskSlot;

impl ModeSpawner for RecordingSpawner {
    type Error = NoTaskSlot;

    fn spawn_modbus_bridge(&mut self) -> Result<(), NoTaskSlot> {
        if self.fail {
            return Err(NoTaskSlot);
        }
        self.spawned.push("modbus");
        Ok(())
    }

    fn spawn_radio_echo(&mut self) -> Result<(), NoTaskSlot> {
        if self.fail {
            return Err(NoTaskSlot);
        }
        self.spawned.push("echo");
        Ok(())
    }
}

// ============================================================================
// Dispatch Tests
// ============================================================================

#[test]
fn modbus_mode_spawns_bridge_only() {
    let mut spawner = RecordingSpawner::default();
    dispatch(BridgeMode::ModbusOverRadio, &mut spawner).unwrap();
    assert_eq!(spawner.spawned, vec!["modbus"]);
}

#[test]
fn echo_mode_spawns_echo_only() {
    let mut spawner = RecordingSpawner::default();
    dispatch(BridgeMode::RadioEcho, &mut spawner).unwrap();
    assert_eq!(spawner.spawned, vec!["echo"]);
}

#[test]
fn spawn_failure_propagates() {
    let mut spawner = RecordingSpawner {
        fail: true,
        ..RecordingSpawner::default()
    };
    assert_eq!(
        dispatch(BridgeMode::ModbusOverRadio, &mut spawner),
        Err(NoTaskSlot)
    );
    assert!(spawner.spawned.is_empty());
}

#[test]
fn boot_mode_runs_modbus_bridge() {
    let mut spawner = RecordingSpawner::default();
    dispatch(BOOT_MODE, &mut spawner).unwrap();
    assert_eq!(spawner.spawned, vec!["modbus"]);
}

// ============================================================================
// Mode Flag Tests
// ============================================================================

#[test]
fn mode_from_flag() {
    assert_eq!(BridgeMode::from_flag(true), BridgeMode::ModbusOverRadio);
    assert_eq!(BridgeMode::from_flag(false), BridgeMode::RadioEcho);
}

#[test]
fn mode_default_is_modbus() {
    assert_eq!(BridgeMode::default(), BridgeMode::ModbusOverRadio);
}

#[test]
fn mode_task_names() {
    assert_eq!(BridgeMode::ModbusOverRadio.task_name(), "modbus_communication");
    assert_eq!(BridgeMode::RadioEcho.task_name(), "espnow_communication");
}

#[test]
fn mode_display() {
    assert_eq!(BridgeMode::ModbusOverRadio.to_string(), "modbus-over-radio");
    assert_eq!(BridgeMode::RadioEcho.to_string(), "radio-echo");
}
