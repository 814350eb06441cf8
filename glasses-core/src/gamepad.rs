//! Physical gamepad model fed by wireless HID reports.

use crate::buttons::{Buttons, EdgeState};

/// Size of a raw HID gamepad report.
pub const HID_REPORT_SIZE: usize = 11;

/// Upper bound of the rescaled accelerometer range.
pub const ACCEL_MAX: u16 = 1024;

/// Raw HID gamepad report as sent by the remote peer.
///
/// Wire layout, little-endian:
///
/// ```text
/// x y z rz rx ry : i8
/// hat            : u8
/// buttons        : u32
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidGamepadReport {
    pub x: i8,
    pub y: i8,
    pub z: i8,
    pub rz: i8,
    pub rx: i8,
    pub ry: i8,
    pub hat: u8,
    pub buttons: u32,
}

impl HidGamepadReport {
    /// Decode a notification payload.
    ///
    /// Short payloads are zero-filled, extra bytes are ignored.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut raw = [0u8; HID_REPORT_SIZE];
        let len = data.len().min(HID_REPORT_SIZE);
        raw[..len].copy_from_slice(&data[..len]);

        Self {
            x: raw[0] as i8,
            y: raw[1] as i8,
            z: raw[2] as i8,
            rz: raw[3] as i8,
            rx: raw[4] as i8,
            ry: raw[5] as i8,
            hat: raw[6],
            buttons: u32::from_le_bytes([raw[7], raw[8], raw[9], raw[10]]),
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HID_REPORT_SIZE] {
        let b = self.buttons.to_le_bytes();
        [
            self.x as u8,
            self.y as u8,
            self.z as u8,
            self.rz as u8,
            self.rx as u8,
            self.ry as u8,
            self.hat,
            b[0],
            b[1],
            b[2],
            b[3],
        ]
    }
}

/// Rescale a signed axis from `-127..=127` to `0..=1024`.
///
/// `-128` is clamped to 0.
#[inline]
#[must_use]
pub const fn accel_from_axis(value: i8) -> u16 {
    let scaled = (value as i32 + 127) * ACCEL_MAX as i32 / 254;
    if scaled < 0 {
        0
    } else if scaled > ACCEL_MAX as i32 {
        ACCEL_MAX
    } else {
        scaled as u16
    }
}

/// Normalized snapshot of the physical gamepad.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    pub x: i8,
    pub y: i8,
    pub ax: u16,
    pub ay: u16,
    pub az: u16,
    pub buttons: Buttons,
}

impl Report {
    pub const NEUTRAL: Self = Self {
        x: 0,
        y: 0,
        ax: 0,
        ay: 0,
        az: 0,
        buttons: Buttons::NONE,
    };
}

impl From<&HidGamepadReport> for Report {
    fn from(r: &HidGamepadReport) -> Self {
        Self {
            x: r.x,
            y: r.y,
            ax: accel_from_axis(r.rx),
            ay: accel_from_axis(r.ry),
            az: accel_from_axis(r.rz),
            buttons: Buttons(r.buttons),
        }
    }
}

/// Current and previous reports of the wireless gamepad.
///
/// # Example
///
/// ```
/// use glasses_core::{EdgeState, Gamepad, HidGamepadReport};
///
/// let mut gamepad = Gamepad::new();
/// let raw = HidGamepadReport { buttons: Gamepad::BUTTON_C.raw(), ..Default::default() };
/// gamepad.update(&raw);
/// assert!(gamepad.rose(Gamepad::BUTTON_C));
/// ```
#[derive(Clone, Copy, Default, Debug)]
pub struct Gamepad {
    report: Report,
    previous: Report,
}

impl Gamepad {
    /// Nunchuck C button.
    pub const BUTTON_C: Buttons = Buttons(1 << 2);
    /// Nunchuck Z button.
    pub const BUTTON_Z: Buttons = Buttons(1 << 5);

    #[must_use]
    pub const fn new() -> Self {
        Self {
            report: Report::NEUTRAL,
            previous: Report::NEUTRAL,
        }
    }

    /// Zero both snapshots.
    pub fn reset(&mut self) {
        self.report = Report::NEUTRAL;
        self.previous = Report::NEUTRAL;
    }

    /// Shift the current report into previous and store the new one.
    pub fn update(&mut self, raw: &HidGamepadReport) {
        self.previous = self.report;
        self.report = Report::from(raw);
    }

    #[inline]
    #[must_use]
    pub fn report(&self) -> &Report {
        &self.report
    }

    #[inline]
    #[must_use]
    pub fn previous_report(&self) -> &Report {
        &self.previous
    }

    /// `true` if the stick moved since the previous report.
    #[inline]
    #[must_use]
    pub fn stick_changed(&self) -> bool {
        self.report.x != self.previous.x || self.report.y != self.previous.y
    }
}

impl EdgeState for Gamepad {
    #[inline]
    fn buttons(&self) -> Buttons {
        self.report.buttons
    }

    #[inline]
    fn previous_buttons(&self) -> Buttons {
        self.previous.buttons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_mapping() {
        assert_eq!(accel_from_axis(-127), 0);
        assert_eq!(accel_from_axis(-128), 0);
        assert_eq!(accel_from_axis(0), 512);
        assert_eq!(accel_from_axis(127), 1024);
        assert_eq!(accel_from_axis(64), 770);
    }

    #[test]
    fn test_report_from_bytes() {
        let data = [0x05, 0xFB, 0, 0, 0x7F, 0x81, 0x08, 0x24, 0x00, 0x00, 0x80];
        let raw = HidGamepadReport::from_bytes(&data);
        assert_eq!(raw.x, 5);
        assert_eq!(raw.y, -5);
        assert_eq!(raw.rx, 127);
        assert_eq!(raw.ry, -127);
        assert_eq!(raw.hat, 8);
        assert_eq!(raw.buttons, 0x8000_0024);
        assert_eq!(raw.to_bytes(), data);
    }

    #[test]
    fn test_short_report_zero_fills() {
        let raw = HidGamepadReport::from_bytes(&[1, 2]);
        assert_eq!(raw.x, 1);
        assert_eq!(raw.y, 2);
        assert_eq!(raw.buttons, 0);
        assert_eq!(HidGamepadReport::from_bytes(&[]), HidGamepadReport::default());
    }

    #[test]
    fn test_long_report_truncates() {
        let mut data = [0u8; 16];
        data[10] = 0x01;
        data[15] = 0xFF;
        let raw = HidGamepadReport::from_bytes(&data);
        assert_eq!(raw.buttons, 0x0100_0000);
    }

    #[test]
    fn test_update_shifts_reports() {
        let mut gamepad = Gamepad::new();
        let first = HidGamepadReport {
            x: 10,
            rx: 127,
            buttons: Gamepad::BUTTON_Z.raw(),
            ..Default::default()
        };
        gamepad.update(&first);
        assert_eq!(gamepad.report().x, 10);
        assert_eq!(gamepad.report().ax, 1024);
        assert_eq!(gamepad.previous_report(), &Report::NEUTRAL);
        assert!(gamepad.stick_changed());
        assert!(gamepad.rose(Gamepad::BUTTON_Z));

        gamepad.update(&first);
        assert!(!gamepad.stick_changed());
        assert!(gamepad.held(Gamepad::BUTTON_Z));
        assert!(!gamepad.rose(Gamepad::BUTTON_Z));

        gamepad.update(&HidGamepadReport::default());
        assert!(gamepad.fell(Gamepad::BUTTON_Z));
        assert!(gamepad.is_up(Gamepad::BUTTON_C | Gamepad::BUTTON_Z));
    }

    #[test]
    fn test_queries_are_stable_between_updates() {
        let mut gamepad = Gamepad::new();
        gamepad.update(&HidGamepadReport {
            buttons: Gamepad::BUTTON_C.raw(),
            ..Default::default()
        });
        for _ in 0..3 {
            assert!(gamepad.rose(Gamepad::BUTTON_C));
            assert!(gamepad.changed(Gamepad::BUTTON_C));
        }
    }

    #[test]
    fn test_reset() {
        let mut gamepad = Gamepad::new();
        gamepad.update(&HidGamepadReport {
            y: -3,
            buttons: 0xFF,
            ..Default::default()
        });
        gamepad.reset();
        assert_eq!(gamepad.report(), &Report::NEUTRAL);
        assert_eq!(gamepad.previous_report(), &Report::NEUTRAL);
    }
}
