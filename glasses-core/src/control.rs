//! Per-cycle control loop tying the command link and gamepads to scenes.
//!
//! Each cycle the owner feeds any serial bytes that arrived with
//! [`ControlPlane::receive`] and then calls [`ControlPlane::tick`]. A tick
//! times out stalled frames, commits soft button events, updates the physical
//! gamepad and the shake detector, runs the active scene and finally handles
//! scene and brightness selection.
//!
//! Selection looks at the mode button first. A release moves to the next
//! scene; holding it for [`ControlConfig::pairing_hold_ms`] starts pairing
//! instead, and the release that ends that hold is ignored. Only when the
//! mode button is idle do the soft gamepad and the shake detector get a say.

use command_proto::{ButtonEvent, Command, CommandParser, ParseError, Rgb, Text};

use crate::buttons::EdgeState;
use crate::digital_input::DigitalInput;
use crate::gamepad::{Gamepad, HidGamepadReport};
use crate::shake::{ShakeConfig, ShakeDetector, ShakeReading};
use crate::soft_gamepad::SoftGamepad;

/// Maximum number of scenes a host can expose.
pub const MAX_SCENES: usize = 16;

/// Run-time settings of the control plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    /// A partial frame with no new byte for longer than this is dropped.
    pub command_timeout_ms: u32,
    /// Brightness change per up/down press.
    pub brightness_step: u8,
    /// Number of scenes to cycle through, `1..=MAX_SCENES`.
    pub scene_count: u8,
    /// Starting brightness of each scene.
    pub initial_brightness: [u8; MAX_SCENES],
    /// Debounce time of the mode button.
    pub mode_debounce_ms: u32,
    /// How long the mode button must be held to start pairing.
    pub pairing_hold_ms: u32,
    pub shake: ShakeConfig,
}

/// Default configuration.
pub const DEFAULT_CONFIG: ControlConfig = ControlConfig {
    command_timeout_ms: 1000,
    brightness_step: 32,
    scene_count: 7,
    initial_brightness: [
        192, 159, 128, 96, 32, 64, 96, 128, 128, 128, 128, 128, 128, 128, 128, 128,
    ],
    mode_debounce_ms: 15,
    pairing_hold_ms: 3000,
    shake: ShakeConfig::DEFAULT,
};

impl Default for ControlConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

/// Read-only view of the inputs handed to the active scene.
#[derive(Clone, Copy, Debug)]
pub struct Inputs<'a> {
    pub gamepad: &'a Gamepad,
    pub soft: &'a SoftGamepad,
    pub gamepad_connected: bool,
}

/// Owner of the scenes, driven by the control plane.
pub trait SceneHost {
    /// Replace the active scene with scene `index`.
    fn activate(&mut self, index: u8);

    /// Advance the active scene by `dt_ms`.
    fn update(&mut self, dt_ms: u32, inputs: &Inputs<'_>);

    fn gamepad_connected(&mut self) {}

    fn gamepad_disconnected(&mut self) {}

    fn received_color(&mut self, _color: Rgb) {}

    fn received_text(&mut self, _text: &Text) {}

    /// Brightness of the active scene, sent on activation and on every step.
    fn brightness_changed(&mut self, _level: u8) {}

    /// The mode button was held long enough to ask for a new gamepad.
    fn pairing_started(&mut self) {}

    /// Pairing was left with the mode button or completed.
    fn pairing_stopped(&mut self) {}
}

/// Scene-level action taken at the end of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SceneChange {
    Next,
    Previous,
    BrightnessUp,
    BrightnessDown,
    PairingStarted,
    PairingStopped,
}

/// The control plane.
pub struct ControlPlane<H> {
    config: ControlConfig,
    host: H,
    parser: CommandParser,
    soft: SoftGamepad,
    gamepad: Gamepad,
    shake: ShakeDetector,
    gamepad_connected: bool,
    scene_index: u8,
    brightness: [u8; MAX_SCENES],
    mode_button: DigitalInput,
    mode_level: bool,
    pairing: bool,
    pairing_held_ms: u32,
    ignore_mode_release: bool,
    last_rx_ms: u32,
    last_tick_ms: u32,
}

impl<H: SceneHost> ControlPlane<H> {
    /// Create a control plane. `scene_count` is clamped to `1..=MAX_SCENES`.
    #[must_use]
    pub fn new(mut config: ControlConfig, host: H) -> Self {
        config.scene_count = config.scene_count.clamp(1, MAX_SCENES as u8);
        Self {
            config,
            host,
            parser: CommandParser::new(),
            soft: SoftGamepad::new(),
            gamepad: Gamepad::new(),
            shake: ShakeDetector::new(config.shake),
            gamepad_connected: false,
            scene_index: 0,
            brightness: config.initial_brightness,
            mode_button: DigitalInput::new(config.mode_debounce_ms),
            mode_level: false,
            pairing: false,
            pairing_held_ms: 0,
            ignore_mode_release: false,
            last_rx_ms: 0,
            last_tick_ms: 0,
        }
    }

    /// Activate the first scene and start timing from `now_ms`.
    pub fn start(&mut self, scene_index: u8, now_ms: u32) {
        self.scene_index = scene_index % self.config.scene_count;
        self.last_tick_ms = now_ms;
        self.last_rx_ms = now_ms;
        self.mode_button.begin(self.mode_level, now_ms);
        self.activate_current();
    }

    /// Feed one serial byte received at `now_ms`.
    ///
    /// A completed frame is dispatched right away: button events go to the
    /// soft gamepad, colors and text to the host.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the byte completed a rejected frame. The
    /// parser is already reset when this returns.
    pub fn receive_byte(&mut self, byte: u8, now_ms: u32) -> Result<(), ParseError> {
        self.last_rx_ms = now_ms;
        if !self.parser.feed(byte).is_terminal() {
            return Ok(());
        }
        match self.parser.take() {
            Some(command) => self.dispatch(command),
            None => Ok(()),
        }
    }

    /// Feed a chunk of serial bytes received at `now_ms`.
    ///
    /// Stops at the first rejected frame; the rest of the chunk is discarded.
    ///
    /// # Errors
    ///
    /// Returns the first parse error in the chunk.
    pub fn receive(&mut self, bytes: &[u8], now_ms: u32) -> Result<(), ParseError> {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Err(err) = self.receive_byte(byte, now_ms) {
                debug!("flushing {} bytes after error", bytes.len() - i - 1);
                return Err(err);
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> Result<(), ParseError> {
        match command {
            Command::Button(event) => {
                debug!(
                    "button event: index {}, pressed {}",
                    event.index(),
                    event.is_pressed()
                );
                self.soft.event(event);
            }
            Command::Color(color) => {
                debug!("color: r {} g {} b {}", color.r, color.g, color.b);
                self.host.received_color(color);
            }
            Command::Text(text) => {
                debug!("text of {} bytes", text.len());
                self.host.received_text(&text);
            }
            Command::Error(err) => {
                warn!("command error: {}", err);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Inject a button event as if it came over the command link.
    pub fn button_event(&mut self, event: ButtonEvent) {
        self.soft.event(event);
    }

    /// Record a gamepad connection change and notify the host.
    pub fn set_gamepad_connected(&mut self, connected: bool) {
        if connected == self.gamepad_connected {
            return;
        }
        self.gamepad_connected = connected;
        if connected {
            info!("gamepad connected");
            self.shake.reset(true);
            self.host.gamepad_connected();
        } else {
            info!("gamepad disconnected");
            self.gamepad.reset();
            self.host.gamepad_disconnected();
        }
    }

    /// Record the raw level of the mode button, `true` while pressed.
    ///
    /// The level is sampled and debounced on every tick.
    pub fn set_mode_button(&mut self, down: bool) {
        self.mode_level = down;
    }

    /// Leave pairing mode, e.g. once the radio has bonded with a gamepad.
    pub fn end_pairing(&mut self) {
        if self.pairing {
            info!("pairing finished");
            self.pairing = false;
            self.host.pairing_stopped();
        }
    }

    /// Run one control cycle at `now_ms`.
    ///
    /// `report` is the last-known wireless gamepad report, or `None` while no
    /// gamepad is discovered. A tick with no elapsed time does nothing.
    pub fn tick(&mut self, now_ms: u32, report: Option<&HidGamepadReport>) -> Option<SceneChange> {
        let dt = now_ms.wrapping_sub(self.last_tick_ms);
        if dt == 0 {
            return None;
        }
        self.last_tick_ms = now_ms;

        self.check_timeout(now_ms);
        self.soft.update();

        if let Some(raw) = report {
            self.gamepad.update(raw);
            self.shake.update(
                now_ms,
                ShakeReading::from(self.gamepad.previous_report()),
                ShakeReading::from(self.gamepad.report()),
            );
        }

        let inputs = Inputs {
            gamepad: &self.gamepad,
            soft: &self.soft,
            gamepad_connected: self.gamepad_connected,
        };
        self.host.update(dt, &inputs);

        self.mode_button.update(self.mode_level, now_ms);
        self.select_scene(dt)
    }

    fn check_timeout(&mut self, now_ms: u32) {
        if !self.parser.is_busy() {
            return;
        }
        if now_ms.wrapping_sub(self.last_rx_ms) > self.config.command_timeout_ms {
            warn!("command timed out waiting for data");
            self.last_rx_ms = now_ms;
            self.parser.reset();
        }
    }

    fn select_scene(&mut self, dt: u32) -> Option<SceneChange> {
        if self.mode_button.was_pressed() {
            self.pairing_held_ms = 0;
            if self.pairing {
                info!("leaving pairing mode");
                self.pairing = false;
                self.ignore_mode_release = true;
                self.host.pairing_stopped();
                return Some(SceneChange::PairingStopped);
            }
            self.ignore_mode_release = false;
            None
        } else if self.mode_button.was_released() {
            if self.ignore_mode_release {
                self.ignore_mode_release = false;
                return None;
            }
            self.next_scene();
            Some(SceneChange::Next)
        } else if self.mode_button.is_down() && !self.pairing {
            let was_short = self.pairing_held_ms < self.config.pairing_hold_ms;
            self.pairing_held_ms = self.pairing_held_ms.saturating_add(dt);
            if was_short && self.pairing_held_ms >= self.config.pairing_hold_ms {
                info!("entering pairing mode");
                self.pairing = true;
                self.ignore_mode_release = true;
                self.host.pairing_started();
                return Some(SceneChange::PairingStarted);
            }
            None
        } else if self.soft.rose(SoftGamepad::RIGHT) || self.shake.shake_detected() {
            self.next_scene();
            Some(SceneChange::Next)
        } else if self.soft.rose(SoftGamepad::LEFT) {
            self.previous_scene();
            Some(SceneChange::Previous)
        } else if self.soft.rose(SoftGamepad::UP) {
            self.step_brightness(true);
            Some(SceneChange::BrightnessUp)
        } else if self.soft.rose(SoftGamepad::DOWN) {
            self.step_brightness(false);
            Some(SceneChange::BrightnessDown)
        } else {
            None
        }
    }

    /// Switch to the next scene, wrapping to the first.
    pub fn next_scene(&mut self) {
        self.scene_index = (self.scene_index + 1) % self.config.scene_count;
        self.change_scene();
    }

    /// Switch to the previous scene, wrapping to the last.
    pub fn previous_scene(&mut self) {
        self.scene_index = self
            .scene_index
            .checked_sub(1)
            .unwrap_or(self.config.scene_count - 1);
        self.change_scene();
    }

    fn change_scene(&mut self) {
        self.shake.reset(false);
        self.soft.reset();
        self.activate_current();
    }

    fn activate_current(&mut self) {
        info!("activating scene {}", self.scene_index);
        self.host.activate(self.scene_index);
        self.host.brightness_changed(self.brightness());
    }

    fn step_brightness(&mut self, up: bool) {
        let step = self.config.brightness_step;
        let level = &mut self.brightness[usize::from(self.scene_index)];
        *level = if up {
            level.saturating_add(step)
        } else {
            level.saturating_sub(step)
        };
        let level = *level;
        debug!("scene {} brightness {}", self.scene_index, level);
        self.host.brightness_changed(level);
    }

    #[inline]
    #[must_use]
    pub fn scene_index(&self) -> u8 {
        self.scene_index
    }

    /// Brightness of the active scene.
    #[inline]
    #[must_use]
    pub fn brightness(&self) -> u8 {
        self.brightness[usize::from(self.scene_index)]
    }

    #[inline]
    #[must_use]
    pub fn is_pairing(&self) -> bool {
        self.pairing
    }

    #[inline]
    #[must_use]
    pub fn mode_button(&self) -> &DigitalInput {
        &self.mode_button
    }

    #[inline]
    #[must_use]
    pub fn is_gamepad_connected(&self) -> bool {
        self.gamepad_connected
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    #[inline]
    #[must_use]
    pub fn soft_gamepad(&self) -> &SoftGamepad {
        &self.soft
    }

    #[inline]
    #[must_use]
    pub fn gamepad(&self) -> &Gamepad {
        &self.gamepad
    }

    #[inline]
    #[must_use]
    pub fn shake_detector(&self) -> &ShakeDetector {
        &self.shake
    }

    #[inline]
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Decompose into the host.
    pub fn into_host(self) -> H {
        self.host
    }
}
