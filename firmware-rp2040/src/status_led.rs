//! Scene host that reports the control plane on the on-board LED.
//!
//! Activating scene `n` blinks the LED `n + 1` times. A received color or
//! text frame gives a short pulse, and the LED stays lit while any soft
//! gamepad button is held.

use embedded_hal::digital::OutputPin;
use glasses_core::{EdgeState, Fsm, Inputs, Rgb, SceneHost, State, Text};

/// Half period of a scene blink.
const BLINK_HALF_PERIOD_MS: u32 = 150;

/// Length of the pulse shown for a received frame.
const PULSE_MS: u32 = 60;

/// What the LED states want the pin to show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, defmt::Format)]
pub struct LedOutput {
    /// Set by the active state.
    pub lit: bool,
    /// Set while a soft gamepad button is held.
    pub held: bool,
}

impl LedOutput {
    #[inline]
    #[must_use]
    pub fn level(&self) -> bool {
        self.lit || self.held
    }
}

/// LED patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum LedState {
    Idle,
    /// `toggles` half periods left, each `BLINK_HALF_PERIOD_MS` long.
    Blink { toggles: u8, elapsed_ms: u32 },
    Pulse { left_ms: u32 },
}

impl LedState {
    /// Blink pattern for scene `index`.
    #[must_use]
    pub fn blink(index: u8) -> Self {
        Self::Blink {
            toggles: index.saturating_add(1).saturating_mul(2),
            elapsed_ms: 0,
        }
    }

    #[must_use]
    pub const fn pulse() -> Self {
        Self::Pulse { left_ms: PULSE_MS }
    }
}

impl State for LedState {
    type Context = LedOutput;

    fn enter(&mut self, ctx: &mut LedOutput) {
        ctx.lit = !matches!(self, Self::Idle);
    }

    fn update(&mut self, ctx: &mut LedOutput, dt_ms: u32) {
        match self {
            Self::Idle => {}
            Self::Blink {
                toggles,
                elapsed_ms,
            } => {
                *elapsed_ms = elapsed_ms.saturating_add(dt_ms);
                while *toggles > 0 && *elapsed_ms >= BLINK_HALF_PERIOD_MS {
                    *elapsed_ms -= BLINK_HALF_PERIOD_MS;
                    *toggles -= 1;
                    ctx.lit = !ctx.lit;
                }
            }
            Self::Pulse { left_ms } => {
                *left_ms = left_ms.saturating_sub(dt_ms);
            }
        }
    }

    fn transition(&mut self, _ctx: &mut LedOutput) -> Option<Self> {
        match *self {
            Self::Blink { toggles: 0, .. } | Self::Pulse { left_ms: 0 } => Some(Self::Idle),
            _ => None,
        }
    }

    fn exit(&mut self, ctx: &mut LedOutput) {
        ctx.lit = false;
    }
}

/// [`SceneHost`] driving a single LED.
pub struct StatusLedHost<P> {
    led: P,
    fsm: Fsm<LedState>,
    output: LedOutput,
}

impl<P: OutputPin> StatusLedHost<P> {
    #[must_use]
    pub fn new(led: P) -> Self {
        Self {
            led,
            fsm: Fsm::new(),
            output: LedOutput::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> Option<&LedState> {
        self.fsm.current()
    }

    fn goto(&mut self, next: LedState) {
        self.fsm.goto_state(&mut self.output, Some(next));
        self.apply();
    }

    fn apply(&mut self) {
        let result = if self.output.level() {
            self.led.set_high()
        } else {
            self.led.set_low()
        };
        if result.is_err() {
            defmt::warn!("status LED write failed");
        }
    }
}

impl<P: OutputPin> SceneHost for StatusLedHost<P> {
    fn activate(&mut self, index: u8) {
        defmt::info!("Scene {}", index);
        self.goto(LedState::blink(index));
    }

    fn update(&mut self, dt_ms: u32, inputs: &Inputs<'_>) {
        self.output.held = !inputs.soft.buttons().is_empty();
        self.fsm.update(&mut self.output, dt_ms);
        self.fsm.transition(&mut self.output);
        self.apply();
    }

    fn received_color(&mut self, color: Rgb) {
        defmt::info!("Color {}", color);
        // Keep a scene blink readable.
        if !matches!(self.fsm.current(), Some(LedState::Blink { .. })) {
            self.goto(LedState::pulse());
        }
    }

    fn received_text(&mut self, text: &Text) {
        match text.as_str() {
            Some(s) => defmt::info!("Text {=str} (truncated: {})", s, text.is_truncated()),
            None => defmt::warn!("Text with {} bytes of invalid UTF-8", text.len()),
        }
        if !matches!(self.fsm.current(), Some(LedState::Blink { .. })) {
            self.goto(LedState::pulse());
        }
    }

    fn brightness_changed(&mut self, level: u8) {
        defmt::info!("Brightness {}", level);
    }
}
