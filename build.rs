//! Build script for the ESP-NOW Modbus bridge firmware
//!
//! Handles:
//! - Linker scripts for the ESP32 firmware image (embedded builds only)
//! - Nothing for host builds, so `cargo test` links normally

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os("CARGO_FEATURE_EMBEDDED").is_none() {
        return;
    }

    // Xtensa images provide their own startup code
    if env::var("CARGO_CFG_TARGET_ARCH").is_ok_and(|arch| arch == "xtensa") {
        println!("cargo:rustc-link-arg-bins=-nostartfiles");
    }

    // defmt.x must precede linkall.x
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
}
