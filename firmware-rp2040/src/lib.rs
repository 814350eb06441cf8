//! LED glasses control plane for RP2040.
//!
//! This crate provides the embedded glue between the serial command link
//! and the platform-agnostic [`ControlPlane`] from [`glasses_core`].
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Receives command frames over UART (115200 baud, 8N1)
//! 2. Parses color, button and text frames as bytes arrive
//! 3. Ticks the control plane at a fixed rate and switches scenes
//! 4. Reports the active scene on the on-board LED
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | UART1 TX | 8    | Serial transmit (unused) |
//! | UART1 RX | 9    | Serial receive (command link input) |
//! | Mode     | 4    | Mode button to ground (next scene, hold to pair) |
//! | LED      | 25   | On-board LED (scene indicator) |
//!
//! The Pico has no radio, so the wireless gamepad path of the control plane
//! stays idle and scenes are driven by the mode button and the soft gamepad.
//! Holding the mode button asks for pairing, which is logged and dropped.
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with two concurrent tasks:
//!
//! - **UART Task**: Reads bytes from UART1 and queues them
//! - **Control Task**: Drains the queue into the parser and ticks the control plane
//!
//! Bytes travel between tasks over an Embassy
//! [`Channel`](embassy_sync::channel::Channel), so a burst on the link is
//! buffered while the control task is busy with a tick.
//!
//! # Modules
//!
//! - [`serial`]: Byte sources for the command link ([`UartByteSource`], [`ChannelByteSource`])
//! - [`status_led`]: Scene host that blinks the on-board LED ([`StatusLedHost`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`uart-flow-control`**: Enable hardware flow control (CTS/RTS on GPIO 10/11)
//!
//! # Re-exports
//!
//! This crate re-exports the commonly used items from [`glasses_core`] for
//! convenience, so the binary only needs to depend on this crate.

#![no_std]

pub use glasses_core::{
    pump, ButtonEvent, ByteSource, ControlConfig, ControlPlane, DigitalInput, EdgeState, Fsm,
    InputError, Inputs, Rgb, SceneChange, SceneHost, State, Text, DEFAULT_CONFIG,
};

pub mod serial;
pub mod status_led;

pub use serial::{ChannelByteSource, UartByteSource, BYTE_QUEUE_DEPTH};
pub use status_led::{LedOutput, LedState, StatusLedHost};
