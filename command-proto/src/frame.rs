//! Frame encoding for command messages.
//!
//! This module provides the [`Encode`] trait, which writes [`Rgb`],
//! [`ButtonEvent`] and [`TextFrame`] values as wire frames that
//! [`CommandParser`](crate::CommandParser) accepts.
//!
//! # Frame Format
//!
//! ```text
//! !C<r><g><b><checksum>
//! !B<digit><'1'|'0'><checksum>
//! $<bytes>\n
//! ```
//!
//! The binary checksum is the bitwise NOT of the running sum.
//!
//! # Example
//!
//! ```
//! use command_proto::{Encode, Rgb};
//!
//! let mut buf = [0u8; 8];
//! let len = Rgb::new(0xFF, 0, 0).encode(&mut buf).unwrap();
//! assert_eq!(&buf[..len], b"!C\xFF\x00\x00\x9C");
//! ```

use core::fmt;

use crate::checksum::{checksum_for, RunningSum};
use crate::descriptor::{
    CommandDescriptor, BINARY_MARKER, BUTTON_COMMAND, COLOR_COMMAND, TEXT_MARKER,
    TEXT_TERMINATOR,
};
use crate::types::{ButtonEvent, Rgb, TEXT_CAPACITY};

/// Encoded size of a color frame.
pub const COLOR_FRAME_SIZE: usize = 2 + COLOR_COMMAND.param_len as usize;

/// Encoded size of a button frame.
pub const BUTTON_FRAME_SIZE: usize = 2 + BUTTON_COMMAND.param_len as usize;

/// Largest encoded text frame: marker, payload and terminator.
pub const MAX_TEXT_FRAME_SIZE: usize = TEXT_CAPACITY + 2;

/// Highest button index a single ASCII digit can carry.
pub const MAX_BUTTON_INDEX: u8 = 8;

/// Error type for encoding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The output buffer is too small to hold the frame.
    BufferTooSmall,
    /// The button index does not fit in one digit.
    InvalidButtonIndex,
    /// The text is longer than a frame can carry.
    TextTooLong,
    /// The text contains the frame terminator.
    TextContainsNewline,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::InvalidButtonIndex => write!(f, "button index out of range"),
            Self::TextTooLong => write!(f, "text too long"),
            Self::TextContainsNewline => write!(f, "text contains newline"),
        }
    }
}

/// Writes a binary frame while accumulating its running sum.
struct FrameBuf<'a> {
    buf: &'a mut [u8],
    pos: usize,
    sum: RunningSum,
}

impl<'a> FrameBuf<'a> {
    #[inline]
    fn binary(buf: &'a mut [u8], desc: &CommandDescriptor) -> Self {
        let mut fb = Self {
            buf,
            pos: 0,
            sum: RunningSum::new(),
        };
        fb.write(BINARY_MARKER);
        fb.write(desc.code);
        fb
    }

    #[inline]
    fn write(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.sum.push(byte);
        self.pos += 1;
    }

    /// Append the checksum and return the frame length.
    #[inline]
    fn finalize(self) -> usize {
        self.buf[self.pos] = checksum_for(self.sum.value());
        self.pos + 1
    }
}

/// A text payload ready to be framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFrame<'a>(pub &'a [u8]);

impl<'a> TextFrame<'a> {
    #[inline]
    #[must_use]
    pub const fn new(text: &'a str) -> Self {
        Self(text.as_bytes())
    }
}

/// Encode a value as a command frame.
pub trait Encode {
    /// Encode into `buf`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::BufferTooSmall`] if `buf` cannot hold the frame,
    /// or a value-specific error if the value has no frame representation.
    fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError>;

    /// Encode into a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::BufferTooSmall`] if `N` is not large enough.
    fn encode_to_vec<const N: usize>(&self) -> Result<heapless::Vec<u8, N>, EncodeError> {
        let mut vec = heapless::Vec::new();
        vec.resize(N, 0)
            .map_err(|_| EncodeError::BufferTooSmall)?;
        let len = self.encode(&mut vec)?;
        vec.truncate(len);
        Ok(vec)
    }
}

impl Encode for Rgb {
    fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        if buf.len() < COLOR_FRAME_SIZE {
            return Err(EncodeError::BufferTooSmall);
        }
        let mut fb = FrameBuf::binary(buf, &COLOR_COMMAND);
        fb.write(self.r);
        fb.write(self.g);
        fb.write(self.b);
        Ok(fb.finalize())
    }
}

impl Encode for ButtonEvent {
    fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        if self.index() > MAX_BUTTON_INDEX {
            return Err(EncodeError::InvalidButtonIndex);
        }
        if buf.len() < BUTTON_FRAME_SIZE {
            return Err(EncodeError::BufferTooSmall);
        }
        let mut fb = FrameBuf::binary(buf, &BUTTON_COMMAND);
        fb.write(b'0' + self.index() + 1);
        fb.write(if self.is_pressed() { b'1' } else { b'0' });
        Ok(fb.finalize())
    }
}

impl Encode for TextFrame<'_> {
    fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let text = self.0;
        if text.len() > TEXT_CAPACITY {
            return Err(EncodeError::TextTooLong);
        }
        if text.contains(&TEXT_TERMINATOR) {
            return Err(EncodeError::TextContainsNewline);
        }
        let len = text.len() + 2;
        if buf.len() < len {
            return Err(EncodeError::BufferTooSmall);
        }
        buf[0] = TEXT_MARKER;
        buf[1..=text.len()].copy_from_slice(text);
        buf[len - 1] = TEXT_TERMINATOR;
        Ok(len)
    }
}
