//! Values decoded from command frames: [`ButtonEvent`], [`Rgb`] and [`Text`].

use heapless::Vec;

/// Size of the parameter buffer, including the terminator slot of a text frame.
pub const PARAM_BUFFER_SIZE: usize = 128;

/// Maximum number of payload bytes a text frame can carry.
pub const TEXT_CAPACITY: usize = PARAM_BUFFER_SIZE - 1;

/// Index carried by an event that was never decoded from a frame.
pub const INVALID_INDEX: u8 = 0xFF;

/// A single press or release of a numbered button.
///
/// Events are immutable once built. [`ButtonEvent::default`] yields the
/// invalid event, whose index is [`INVALID_INDEX`].
///
/// # Example
///
/// ```
/// use command_proto::ButtonEvent;
///
/// let event = ButtonEvent::new(1, true);
/// assert!(event.is_valid());
/// assert!(!ButtonEvent::default().is_valid());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    index: u8,
    pressed: bool,
}

impl ButtonEvent {
    /// The event produced when no button frame has been decoded.
    pub const INVALID: Self = Self {
        index: INVALID_INDEX,
        pressed: false,
    };

    #[inline]
    #[must_use]
    pub const fn new(index: u8, pressed: bool) -> Self {
        Self { index, pressed }
    }

    /// Zero-based button index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self.index
    }

    /// `true` for a press, `false` for a release.
    #[inline]
    #[must_use]
    pub const fn is_pressed(self) -> bool {
        self.pressed
    }

    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.index != INVALID_INDEX
    }
}

impl Default for ButtonEvent {
    fn default() -> Self {
        Self::INVALID
    }
}

/// 24-bit color carried by a color command.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    #[must_use]
    pub const fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Pack as `0x00RRGGBB`.
    #[inline]
    #[must_use]
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Payload of a text frame.
///
/// The payload is raw bytes; the protocol does not promise UTF-8.
/// `truncated` is set when the sender overran [`TEXT_CAPACITY`] and the frame
/// was force-completed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Text {
    bytes: Vec<u8, TEXT_CAPACITY>,
    truncated: bool,
}

impl Text {
    /// Build a text payload, keeping at most [`TEXT_CAPACITY`] bytes.
    ///
    /// Longer input is cut and marked as truncated.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        let len = data.len().min(TEXT_CAPACITY);
        let mut bytes = Vec::new();
        // Cannot fail: `len` never exceeds the capacity.
        let _ = bytes.extend_from_slice(&data[..len]);
        Self {
            bytes,
            truncated: len < data.len(),
        }
    }

    pub(crate) fn with_truncation(data: &[u8], truncated: bool) -> Self {
        let mut text = Self::from_bytes(data);
        text.truncated |= truncated;
        text
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The payload as a string slice, if it is valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}
