//! Platform-agnostic input models, state machine and control plane for LED glasses.
//!
//! This crate turns two untrusted inputs, the serial command link and a
//! wireless HID gamepad, into edge-triggered button state that drives a set
//! of display scenes. It can be used both in embedded `no_std` environments
//! and on host for testing.
//!
//! # Overview
//!
//! - [`buttons`]: Button bitmask ([`Buttons`]) and shared edge queries ([`EdgeState`])
//! - [`gamepad`]: Physical gamepad model ([`Gamepad`], [`HidGamepadReport`])
//! - [`soft_gamepad`]: Virtual gamepad fed by [`ButtonEvent`]s ([`SoftGamepad`])
//! - [`fsm`]: Finite state machine engine ([`Fsm`], [`State`])
//! - [`hid_client`]: Wireless HID gamepad bridge ([`HidGamepadClient`], [`GattClient`])
//! - [`shake`]: Shake gesture detection ([`ShakeDetector`])
//! - [`digital_input`]: Debounced mode button ([`DigitalInput`])
//! - [`control`]: Per-cycle control loop ([`ControlPlane`], [`SceneHost`])
//! - [`input`]: Serial byte source trait ([`ByteSource`])
//!
//! The serial protocol itself lives in [`command_proto`], re-exported here.
//!
//! # Example
//!
//! ```rust
//! use glasses_core::{ControlPlane, Encode, Inputs, Rgb, SceneHost, DEFAULT_CONFIG};
//!
//! #[derive(Default)]
//! struct Scenes {
//!     active: u8,
//!     color: Rgb,
//! }
//!
//! impl SceneHost for Scenes {
//!     fn activate(&mut self, index: u8) {
//!         self.active = index;
//!     }
//!
//!     fn update(&mut self, _dt_ms: u32, _inputs: &Inputs<'_>) {}
//!
//!     fn received_color(&mut self, color: Rgb) {
//!         self.color = color;
//!     }
//! }
//!
//! let mut plane = ControlPlane::new(DEFAULT_CONFIG, Scenes::default());
//! plane.start(0, 0);
//!
//! let frame = Rgb::new(0, 0, 255).encode_to_vec::<8>().unwrap();
//! plane.receive(&frame, 10).unwrap();
//! plane.tick(16, None);
//! assert_eq!(plane.host().color, Rgb::new(0, 0, 255));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`log`**: Log through the `log` facade when `defmt` is off
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[macro_use]
mod fmt;

pub mod buttons;
pub mod control;
pub mod digital_input;
pub mod fsm;
pub mod gamepad;
pub mod hid_client;
pub mod input;
pub mod shake;
pub mod soft_gamepad;

pub use command_proto;
pub use command_proto::{
    ButtonEvent, Command, CommandId, CommandParser, Encode, EncodeError, ParseError, ParserState,
    Rgb, Text, TextFrame,
};

pub use buttons::{Buttons, EdgeState};
pub use control::{
    ControlConfig, ControlPlane, Inputs, SceneChange, SceneHost, DEFAULT_CONFIG, MAX_SCENES,
};
pub use digital_input::DigitalInput;
pub use fsm::{Fsm, State};
pub use gamepad::{accel_from_axis, Gamepad, HidGamepadReport, Report, HID_REPORT_SIZE};
pub use hid_client::{
    ConnHandle, GattClient, GattError, HidClientError, HidGamepadClient, HidInfo, NoListener,
    ReportListener,
};
pub use input::{pump, ByteSource, InputError};
pub use shake::{ShakeConfig, ShakeDetector, ShakeReading};
pub use soft_gamepad::SoftGamepad;
