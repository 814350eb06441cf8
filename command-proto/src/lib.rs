//! Serial command protocol for the glasses control plane.
//!
//! This crate decodes the byte stream arriving on the command serial link.
//! Two frame families share the link:
//!
//! **Binary** - checksummed, fixed length per command code:
//! ```text
//! !C<r><g><b><checksum>       color
//! !B<digit><state><checksum>  button press/release
//! ```
//!
//! **Text** - newline terminated, up to 127 payload bytes:
//! ```text
//! $<bytes>\n
//! ```
//!
//! # Modules
//!
//! - [`types`]: Decoded values ([`ButtonEvent`], [`Rgb`], [`Text`])
//! - [`descriptor`]: Markers and the binary command table
//! - [`checksum`]: Running sum and mask check for binary frames
//! - [`parser`]: Byte-at-a-time [`CommandParser`]
//! - [`frame`]: Frame encoding ([`Encode`])
//!
//! # Example
//!
//! ```
//! use command_proto::{ButtonEvent, Command, CommandParser, Encode};
//!
//! let frame = ButtonEvent::new(2, true).encode_to_vec::<8>().unwrap();
//!
//! let mut parser = CommandParser::new();
//! for &b in &frame {
//!     parser.feed(b);
//! }
//! assert_eq!(parser.take(), Some(Command::Button(ButtonEvent::new(2, true))));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`log`**: Log through the `log` facade when `defmt` is off

#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[macro_use]
mod fmt;

pub mod checksum;
pub mod descriptor;
pub mod frame;
pub mod parser;
pub mod types;

pub use checksum::{checksum_for, is_checksum_valid, running_sum};
pub use descriptor::{
    find_binary_command, CommandDescriptor, CommandId, ParamType, SubProtocol, BINARY_COMMANDS,
    BINARY_MARKER, TEXT_MARKER, TEXT_TERMINATOR,
};
pub use frame::{Encode, EncodeError, TextFrame};
pub use parser::{Command, CommandParser, ParseError, ParserState};
pub use types::{ButtonEvent, Rgb, Text, INVALID_INDEX, PARAM_BUFFER_SIZE, TEXT_CAPACITY};
