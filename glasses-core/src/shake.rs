//! Shake gesture detection from consecutive accelerometer readings.

use heapless::Deque;

use crate::gamepad::Report;

/// Maximum number of jumps tracked at once.
pub const MAX_SHAKE_EVENTS: usize = 8;

/// One accelerometer sample.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShakeReading {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

impl ShakeReading {
    #[must_use]
    pub const fn new(x: u16, y: u16, z: u16) -> Self {
        Self { x, y, z }
    }
}

impl From<&Report> for ShakeReading {
    fn from(r: &Report) -> Self {
        Self::new(r.ax, r.ay, r.az)
    }
}

/// Detector tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShakeConfig {
    /// Jumps needed inside the window to report a shake.
    pub shake_count: u8,
    /// Minimum x-axis difference between readings that counts as a jump.
    pub threshold: u16,
    /// Quiet period after a jump during which readings are ignored.
    pub debounce_ms: u32,
    /// Lifetime of a recorded jump.
    pub event_timeout_ms: u32,
}

impl ShakeConfig {
    pub const DEFAULT: Self = Self {
        shake_count: 3,
        threshold: 300,
        debounce_ms: 200,
        event_timeout_ms: 1200,
    };
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `true` if tick `a` is strictly before tick `b`, tolerating wrap-around.
#[inline]
fn is_before(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// Counts large accelerometer jumps inside a sliding window.
///
/// Only the x axis is compared.
#[derive(Clone, Debug)]
pub struct ShakeDetector {
    config: ShakeConfig,
    /// Expiry tick of each recorded jump, oldest first.
    events: Deque<u32, MAX_SHAKE_EVENTS>,
    debounce_until: Option<u32>,
}

impl ShakeDetector {
    #[must_use]
    pub const fn new(config: ShakeConfig) -> Self {
        Self {
            config,
            events: Deque::new(),
            debounce_until: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ShakeConfig {
        &self.config
    }

    /// Drop recorded jumps, and the debounce timer if `reset_debounce` is set.
    pub fn reset(&mut self, reset_debounce: bool) {
        self.events.clear();
        if reset_debounce {
            self.debounce_until = None;
        }
    }

    /// Compare two consecutive readings taken around `now_ms`.
    pub fn update(&mut self, now_ms: u32, previous: ShakeReading, current: ShakeReading) {
        if let Some(until) = self.debounce_until {
            if is_before(now_ms, until) {
                return;
            }
            self.debounce_until = None;
        }

        let diff = current.x.abs_diff(previous.x);
        if diff >= self.config.threshold {
            if self.events.is_full() {
                self.events.pop_front();
            }
            let _ = self
                .events
                .push_back(now_ms.wrapping_add(self.config.event_timeout_ms));
            self.debounce_until = Some(now_ms.wrapping_add(self.config.debounce_ms));
            trace!("shake jump {} at {}, {} pending", diff, now_ms, self.events.len());
        }

        while let Some(&expiry) = self.events.front() {
            if !is_before(expiry, now_ms) {
                break;
            }
            self.events.pop_front();
        }
    }

    /// Number of live jumps.
    #[inline]
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    #[inline]
    #[must_use]
    pub fn shake_detected(&self) -> bool {
        self.events.len() >= usize::from(self.config.shake_count)
    }
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new(ShakeConfig::DEFAULT)
    }
}
