//! Debounced two-level input, such as a push button on a GPIO.

/// Default time a new level must hold before it is accepted.
pub const DEBOUNCE_MS: u32 = 15;

/// A debounced digital input sampled once per control cycle.
///
/// `update` takes the raw level already converted to "is down", so pull-up
/// wiring is resolved by the caller. Edges are visible until the next
/// `update`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DigitalInput {
    debounce_ms: u32,
    state: bool,
    last_state: bool,
    raw_last: bool,
    raw_changed_ms: u32,
}

impl DigitalInput {
    #[must_use]
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            state: false,
            last_state: false,
            raw_last: false,
            raw_changed_ms: 0,
        }
    }

    /// Take `down` as the settled level without debouncing or edges.
    pub fn begin(&mut self, down: bool, now_ms: u32) {
        self.state = down;
        self.last_state = down;
        self.raw_last = down;
        self.raw_changed_ms = now_ms;
    }

    /// Sample the raw level at `now_ms`.
    pub fn update(&mut self, down: bool, now_ms: u32) {
        self.last_state = self.state;

        if down != self.raw_last {
            self.raw_changed_ms = now_ms;
        }
        self.raw_last = down;

        if now_ms.wrapping_sub(self.raw_changed_ms) > self.debounce_ms {
            self.state = down;
        }
    }

    #[inline]
    #[must_use]
    pub fn is_down(&self) -> bool {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        self.state != self.last_state
    }

    #[inline]
    #[must_use]
    pub fn was_pressed(&self) -> bool {
        self.changed() && self.state
    }

    #[inline]
    #[must_use]
    pub fn was_released(&self) -> bool {
        self.changed() && !self.state
    }
}

impl Default for DigitalInput {
    fn default() -> Self {
        Self::new(DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_accepted_after_debounce() {
        let mut input = DigitalInput::default();
        input.update(true, 100);
        assert!(!input.is_down());
        input.update(true, 115);
        assert!(!input.is_down());
        input.update(true, 116);
        assert!(input.is_down());
        assert!(input.was_pressed());
        input.update(true, 130);
        assert!(input.is_down());
        assert!(!input.was_pressed());
    }

    #[test]
    fn test_bounce_restarts_debounce() {
        let mut input = DigitalInput::default();
        input.update(true, 0);
        input.update(false, 10);
        input.update(true, 20);
        input.update(true, 30);
        assert!(!input.is_down());
        input.update(true, 36);
        assert!(input.was_pressed());
    }

    #[test]
    fn test_release_edge() {
        let mut input = DigitalInput::default();
        input.begin(true, 0);
        assert!(input.is_down());
        assert!(!input.changed());
        input.update(false, 50);
        input.update(false, 70);
        assert!(input.was_released());
        assert!(!input.was_pressed());
        input.update(false, 80);
        assert!(!input.changed());
    }

    #[test]
    fn test_short_glitch_ignored() {
        let mut input = DigitalInput::default();
        input.update(true, 100);
        input.update(false, 105);
        input.update(false, 200);
        assert!(!input.is_down());
        assert!(!input.changed());
    }
}
