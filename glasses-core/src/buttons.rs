//! Button bitmask and the edge queries shared by both gamepad models.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not};

/// Button state represented as a 32-bit field.
///
/// # Example
///
/// ```
/// use glasses_core::Buttons;
///
/// let buttons = Buttons::bit(0) | Buttons::bit(4);
/// assert!(buttons.contains(Buttons::bit(4)));
/// assert!(buttons.intersects(Buttons::bit(0) | Buttons::bit(1)));
/// assert!(!buttons.contains(Buttons::bit(1)));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u32);

impl Buttons {
    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Number of addressable buttons.
    pub const BITS: u8 = 32;

    /// Single-bit mask for `index`. `index` must be below [`Self::BITS`].
    #[inline]
    #[must_use]
    pub const fn bit(index: u8) -> Self {
        Self(1 << index)
    }

    /// Single-bit mask for `index`, or `None` if it is out of range.
    #[inline]
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < Self::BITS {
            Some(Self::bit(index))
        } else {
            None
        }
    }

    /// Check if all the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Check if any of the given button(s) is pressed.
    #[inline]
    #[must_use]
    pub const fn intersects(self, button: Buttons) -> bool {
        (self.0 & button.0) != 0
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if no buttons are pressed.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Buttons {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Buttons {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitXor for Buttons {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for Buttons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Edge queries over a current/previous pair of button snapshots.
///
/// Every query takes a mask and is true if any bit of the mask satisfies it.
/// The answers only change when the implementor's `update` runs, so they are
/// stable between polls. Calling `update` twice without reading loses one
/// generation of edges.
pub trait EdgeState {
    /// Buttons in the latest snapshot.
    fn buttons(&self) -> Buttons;

    /// Buttons in the snapshot before the latest one.
    fn previous_buttons(&self) -> Buttons;

    #[inline]
    fn is_down(&self, mask: Buttons) -> bool {
        self.buttons().intersects(mask)
    }

    #[inline]
    fn is_up(&self, mask: Buttons) -> bool {
        !self.buttons().intersects(mask)
    }

    /// Pressed in both snapshots.
    #[inline]
    fn held(&self, mask: Buttons) -> bool {
        (self.buttons() & self.previous_buttons()).intersects(mask)
    }

    /// Pressed now, released before.
    #[inline]
    fn rose(&self, mask: Buttons) -> bool {
        (self.buttons() & !self.previous_buttons()).intersects(mask)
    }

    /// Released now, pressed before.
    #[inline]
    fn fell(&self, mask: Buttons) -> bool {
        (!self.buttons() & self.previous_buttons()).intersects(mask)
    }

    #[inline]
    fn changed(&self, mask: Buttons) -> bool {
        (self.buttons() ^ self.previous_buttons()).intersects(mask)
    }
}
