//! Virtual gamepad driven by button events from the command link.

use command_proto::ButtonEvent;

use crate::buttons::{Buttons, EdgeState};

/// Gamepad whose buttons are pressed and released by [`ButtonEvent`]s.
///
/// Events accumulate as pending bits and become visible on the next
/// [`update`](Self::update). If a press and a release of the same button
/// arrive within one cycle, the press wins.
///
/// # Example
///
/// ```
/// use glasses_core::{ButtonEvent, EdgeState, SoftGamepad};
///
/// let mut pad = SoftGamepad::new();
/// pad.event(ButtonEvent::new(7, true));
/// assert!(!pad.is_down(SoftGamepad::RIGHT));
/// pad.update();
/// assert!(pad.rose(SoftGamepad::RIGHT));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SoftGamepad {
    buttons: Buttons,
    previous: Buttons,
    pending_pressed: Buttons,
    pending_released: Buttons,
}

impl SoftGamepad {
    pub const BUTTON_1: Buttons = Buttons(1 << 0);
    pub const BUTTON_2: Buttons = Buttons(1 << 1);
    pub const BUTTON_3: Buttons = Buttons(1 << 2);
    pub const BUTTON_4: Buttons = Buttons(1 << 3);
    pub const UP: Buttons = Buttons(1 << 4);
    pub const DOWN: Buttons = Buttons(1 << 5);
    pub const LEFT: Buttons = Buttons(1 << 6);
    pub const RIGHT: Buttons = Buttons(1 << 7);

    #[must_use]
    pub const fn new() -> Self {
        Self {
            buttons: Buttons::NONE,
            previous: Buttons::NONE,
            pending_pressed: Buttons::NONE,
            pending_released: Buttons::NONE,
        }
    }

    /// Record a press or release for the next update.
    ///
    /// Events with an index outside the bitmask, including the invalid
    /// event, are dropped.
    pub fn event(&mut self, event: ButtonEvent) {
        let Some(mask) = Buttons::from_index(event.index()) else {
            warn!("dropping button event with index {}", event.index());
            return;
        };
        if event.is_pressed() {
            self.pending_pressed |= mask;
        } else {
            self.pending_released |= mask;
        }
    }

    /// Commit pending events. Call exactly once per control cycle.
    pub fn update(&mut self) {
        self.previous = self.buttons;
        self.buttons &= !self.pending_released;
        self.buttons |= self.pending_pressed;
        self.pending_released = Buttons::NONE;
        self.pending_pressed = Buttons::NONE;
    }

    /// Clear current, previous and pending state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// `true` if events are waiting for the next update.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !(self.pending_pressed | self.pending_released).is_empty()
    }
}

impl EdgeState for SoftGamepad {
    #[inline]
    fn buttons(&self) -> Buttons {
        self.buttons
    }

    #[inline]
    fn previous_buttons(&self) -> Buttons {
        self.previous
    }
}
