//! Byte-at-a-time command frame parser.
//!
//! The parser recognizes two frame families:
//!
//! * binary: `'!'`, a code byte from [`BINARY_COMMANDS`](crate::descriptor::BINARY_COMMANDS),
//!   `param_len - 1` payload bytes and a checksum byte
//! * text: `'$'`, arbitrary bytes, `'\n'`
//!
//! Completion is explicit. Once a frame is complete or has failed the parser
//! stays in that terminal state and ignores further bytes until
//! [`CommandParser::reset`] or [`CommandParser::take`] is called.

use core::fmt;

use crate::checksum::{is_checksum_valid, running_sum};
use crate::descriptor::{
    find_binary_command, CommandDescriptor, CommandId, ParamType, SubProtocol, BINARY_MARKER,
    TEXT_TERMINATOR,
};
use crate::types::{ButtonEvent, Rgb, Text, PARAM_BUFFER_SIZE, TEXT_CAPACITY};

/// Reasons a frame is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// First byte of a frame was neither `'!'` nor `'$'`.
    MalformedPrefix(u8),
    /// Binary frame carried a code missing from the descriptor table.
    UnrecognizedCode(u8),
    /// Binary frame checksum did not validate. Holds the received checksum.
    ChecksumMismatch(u8),
}

impl ParseError {
    /// Short diagnostic, suitable for display on a scene.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedPrefix(_) => "Malformed prefix",
            Self::UnrecognizedCode(_) => "Unrecognized command",
            Self::ChecksumMismatch(_) => "Checksum mismatch",
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPrefix(b) => write!(f, "malformed prefix byte 0x{b:02X}"),
            Self::UnrecognizedCode(b) => write!(f, "unrecognized command code 0x{b:02X}"),
            Self::ChecksumMismatch(b) => write!(f, "checksum mismatch (received 0x{b:02X})"),
        }
    }
}

/// Externally visible parser state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    AwaitingPrefix,
    AwaitingCode,
    ReadingBinaryParams,
    ReadingText,
    /// A validated command is ready.
    Complete,
    /// The frame was rejected.
    Error,
}

impl ParserState {
    /// `true` for `Complete` and `Error`.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// A fully decoded command.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Color(Rgb),
    Button(ButtonEvent),
    Text(Text),
    Error(ParseError),
}

impl Command {
    #[must_use]
    pub const fn id(&self) -> CommandId {
        match self {
            Self::Color(_) => CommandId::Color,
            Self::Button(_) => CommandId::ButtonEvent,
            Self::Text(_) => CommandId::Text,
            Self::Error(_) => CommandId::Error,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    AwaitingPrefix,
    AwaitingCode,
    ReadingBinary(&'static CommandDescriptor),
    ReadingText,
    Complete(CommandId),
    Failed(ParseError),
}

/// Command frame parser.
///
/// Feed bytes one at a time with [`feed`](Self::feed). When the returned
/// state is terminal, read the outcome with [`command`](Self::command) or
/// [`take`](Self::take).
///
/// The parser keeps no timer. Callers that need a frame timeout check
/// [`is_busy`](Self::is_busy) and call [`reset`](Self::reset) themselves.
///
/// # Example
///
/// ```
/// use command_proto::{Command, CommandParser, ParserState};
///
/// let mut parser = CommandParser::new();
/// let mut state = ParserState::AwaitingPrefix;
/// for &b in b"$Hi\n" {
///     state = parser.feed(b);
/// }
/// assert_eq!(state, ParserState::Complete);
/// match parser.take() {
///     Some(Command::Text(text)) => assert_eq!(text.as_bytes(), b"Hi"),
///     other => panic!("unexpected {other:?}"),
/// }
/// assert!(parser.is_idle());
/// ```
pub struct CommandParser {
    stage: Stage,
    params: [u8; PARAM_BUFFER_SIZE],
    pos: usize,
    truncated: bool,
}

impl CommandParser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stage: Stage::AwaitingPrefix,
            params: [0; PARAM_BUFFER_SIZE],
            pos: 0,
            truncated: false,
        }
    }

    /// Discard any partial or finished frame.
    pub fn reset(&mut self) {
        self.stage = Stage::AwaitingPrefix;
        self.params = [0; PARAM_BUFFER_SIZE];
        self.pos = 0;
        self.truncated = false;
    }

    /// Consume one byte and return the state after it.
    pub fn feed(&mut self, byte: u8) -> ParserState {
        self.stage = match self.stage {
            Stage::AwaitingPrefix => match SubProtocol::from_marker(byte) {
                Some(SubProtocol::Binary) => Stage::AwaitingCode,
                Some(SubProtocol::Text) => Stage::ReadingText,
                None => {
                    warn!("malformed prefix byte {}", byte);
                    Stage::Failed(ParseError::MalformedPrefix(byte))
                }
            },
            Stage::AwaitingCode => match find_binary_command(byte) {
                Some(desc) => Stage::ReadingBinary(desc),
                None => {
                    warn!("unrecognized command code {}", byte);
                    Stage::Failed(ParseError::UnrecognizedCode(byte))
                }
            },
            Stage::ReadingBinary(desc) => self.read_binary_byte(desc, byte),
            Stage::ReadingText => self.read_text_byte(byte),
            terminal @ (Stage::Complete(_) | Stage::Failed(_)) => terminal,
        };
        self.state()
    }

    fn read_binary_byte(&mut self, desc: &'static CommandDescriptor, byte: u8) -> Stage {
        if self.pos + 1 >= desc.param_len as usize {
            let sum = running_sum(BINARY_MARKER, desc.code, &self.params[..self.pos]);
            if is_checksum_valid(byte, sum) {
                trace!("binary frame complete, code {}", desc.code);
                Stage::Complete(desc.id)
            } else {
                warn!("checksum mismatch, sum {} checksum {}", sum, byte);
                Stage::Failed(ParseError::ChecksumMismatch(byte))
            }
        } else {
            self.params[self.pos] = byte;
            self.pos += 1;
            Stage::ReadingBinary(desc)
        }
    }

    fn read_text_byte(&mut self, byte: u8) -> Stage {
        if byte == TEXT_TERMINATOR {
            self.params[self.pos] = 0;
            return Stage::Complete(CommandId::Text);
        }
        if self.pos >= TEXT_CAPACITY {
            // Buffer is full: close the frame and drop this byte.
            debug!("text frame truncated at {} bytes", self.pos);
            self.params[self.pos] = 0;
            self.truncated = true;
            return Stage::Complete(CommandId::Text);
        }
        self.params[self.pos] = byte;
        self.pos += 1;
        Stage::ReadingText
    }

    #[must_use]
    pub fn state(&self) -> ParserState {
        match self.stage {
            Stage::AwaitingPrefix => ParserState::AwaitingPrefix,
            Stage::AwaitingCode => ParserState::AwaitingCode,
            Stage::ReadingBinary(_) => ParserState::ReadingBinaryParams,
            Stage::ReadingText => ParserState::ReadingText,
            Stage::Complete(_) => ParserState::Complete,
            Stage::Failed(_) => ParserState::Error,
        }
    }

    /// `true` while a frame is partially received.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(
            self.stage,
            Stage::AwaitingCode | Stage::ReadingBinary(_) | Stage::ReadingText
        )
    }

    /// `true` when waiting for the first byte of a frame.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.stage == Stage::AwaitingPrefix
    }

    /// Kind of the ready command, [`CommandId::None`] while no frame is finished.
    #[must_use]
    pub fn command_id(&self) -> CommandId {
        match self.stage {
            Stage::Complete(id) => id,
            Stage::Failed(_) => CommandId::Error,
            _ => CommandId::None,
        }
    }

    /// The rejection reason, if the current frame failed.
    #[must_use]
    pub fn error(&self) -> Option<ParseError> {
        match self.stage {
            Stage::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// `true` if the finished text frame was cut at capacity.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Color of a finished color frame.
    #[must_use]
    pub fn read_color(&self) -> Option<Rgb> {
        self.binary_params(ParamType::Color)
            .map(|p| Rgb::new(p[0], p[1], p[2]))
    }

    /// Event of a finished button frame.
    ///
    /// The digit byte carries `index + 1`, so `'0'` decodes to the invalid
    /// index.
    #[must_use]
    pub fn read_button_event(&self) -> Option<ButtonEvent> {
        self.binary_params(ParamType::ButtonEvent).map(|p| {
            let index = p[0].wrapping_sub(b'0').wrapping_sub(1);
            ButtonEvent::new(index, p[1] == b'1')
        })
    }

    /// Payload of a finished text frame.
    #[must_use]
    pub fn read_text(&self) -> Option<Text> {
        match self.stage {
            Stage::Complete(CommandId::Text) => Some(Text::with_truncation(
                &self.params[..self.pos],
                self.truncated,
            )),
            _ => None,
        }
    }

    fn binary_params(&self, param_type: ParamType) -> Option<&[u8]> {
        match self.stage {
            Stage::Complete(id) => {
                let desc = crate::descriptor::BINARY_COMMANDS
                    .iter()
                    .find(|d| d.id == id && d.param_type == param_type)?;
                Some(&self.params[..desc.payload_len()])
            }
            _ => None,
        }
    }

    /// Decode the finished frame without consuming it.
    #[must_use]
    pub fn command(&self) -> Option<Command> {
        match self.stage {
            Stage::Failed(err) => Some(Command::Error(err)),
            Stage::Complete(CommandId::Color) => self.read_color().map(Command::Color),
            Stage::Complete(CommandId::ButtonEvent) => {
                self.read_button_event().map(Command::Button)
            }
            Stage::Complete(CommandId::Text) => self.read_text().map(Command::Text),
            _ => None,
        }
    }

    /// Decode the finished frame and reset for the next one.
    ///
    /// Returns `None` and leaves the parser untouched while no frame is finished.
    pub fn take(&mut self) -> Option<Command> {
        if !self.state().is_terminal() {
            return None;
        }
        let command = self.command();
        self.reset();
        command
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::checksum::checksum_for;
    use crate::descriptor::TEXT_MARKER;
    use proptest::prelude::*;

    fn feed_all(parser: &mut CommandParser, bytes: &[u8]) -> ParserState {
        let mut state = parser.state();
        for &b in bytes {
            state = parser.feed(b);
        }
        state
    }

    fn binary_frame(code: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::from([BINARY_MARKER, code]);
        frame.extend_from_slice(payload);
        frame.push(checksum_for(running_sum(BINARY_MARKER, code, payload)));
        frame
    }

    #[test]
    fn test_color_frame() {
        let mut parser = CommandParser::new();
        let state = feed_all(&mut parser, &binary_frame(b'C', &[10, 20, 30]));
        assert_eq!(state, ParserState::Complete);
        assert_eq!(parser.command_id(), CommandId::Color);
        assert_eq!(parser.read_color(), Some(Rgb::new(10, 20, 30)));
        assert_eq!(parser.take(), Some(Command::Color(Rgb::new(10, 20, 30))));
        assert!(parser.is_idle());
    }

    #[test]
    fn test_button_frame() {
        let mut parser = CommandParser::new();
        feed_all(&mut parser, &binary_frame(b'B', b"21"));
        let event = parser.read_button_event();
        assert_eq!(event, Some(ButtonEvent::new(1, true)));
        assert_eq!(parser.read_color(), None);
    }

    #[test]
    fn test_button_release_frame() {
        let mut parser = CommandParser::new();
        feed_all(&mut parser, &binary_frame(b'B', b"80"));
        assert_eq!(parser.take(), Some(Command::Button(ButtonEvent::new(7, false))));
    }

    #[test]
    fn test_button_digit_zero_is_invalid() {
        let mut parser = CommandParser::new();
        feed_all(&mut parser, &binary_frame(b'B', b"01"));
        let event = parser.read_button_event().unwrap();
        assert!(!event.is_valid());
    }

    #[test]
    fn test_text_frame() {
        let mut parser = CommandParser::new();
        assert_eq!(feed_all(&mut parser, b"$Hello\n"), ParserState::Complete);
        assert_eq!(parser.command_id(), CommandId::Text);
        let text = parser.read_text().unwrap();
        assert_eq!(text.as_str(), Some("Hello"));
        assert!(!text.is_truncated());
    }

    #[test]
    fn test_empty_text_frame() {
        let mut parser = CommandParser::new();
        feed_all(&mut parser, b"$\n");
        let text = parser.read_text().unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_unrecognized_code() {
        let mut parser = CommandParser::new();
        assert_eq!(feed_all(&mut parser, b"!Z"), ParserState::Error);
        assert_eq!(parser.command_id(), CommandId::Error);
        assert_eq!(parser.error(), Some(ParseError::UnrecognizedCode(b'Z')));

        // Terminal: further bytes are ignored, even a valid frame.
        feed_all(&mut parser, &binary_frame(b'C', &[1, 2, 3]));
        assert_eq!(parser.state(), ParserState::Error);
        assert_eq!(parser.command(), Some(Command::Error(ParseError::UnrecognizedCode(b'Z'))));

        parser.reset();
        feed_all(&mut parser, &binary_frame(b'C', &[1, 2, 3]));
        assert_eq!(parser.read_color(), Some(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn test_malformed_prefix() {
        let mut parser = CommandParser::new();
        assert_eq!(parser.feed(b'#'), ParserState::Error);
        assert_eq!(parser.error(), Some(ParseError::MalformedPrefix(b'#')));
        assert!(!parser.is_busy());
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut parser = CommandParser::new();
        let mut frame = binary_frame(b'C', &[10, 20, 30]);
        // Checksum of all ones shares bits with any non-zero sum.
        *frame.last_mut().unwrap() = 0xFF;
        assert_eq!(feed_all(&mut parser, &frame), ParserState::Error);
        assert_eq!(parser.error(), Some(ParseError::ChecksumMismatch(0xFF)));
    }

    #[test]
    fn test_single_byte_corruption_rejected() {
        // Sum 0xA0, checksum 0x5F. Red 10 -> 11 gives sum 0xA1, whose bit 0
        // is also set in the checksum.
        let mut parser = CommandParser::new();
        let mut frame = binary_frame(b'C', &[10, 20, 30]);
        frame[2] = 11;
        assert_eq!(feed_all(&mut parser, &frame), ParserState::Error);
    }

    #[test]
    fn test_subset_corruption_accepted() {
        // Sum 0xA0, checksum 0x5F. Red 10 -> 234 yields sum 0x80, whose bits
        // are a subset of 0xA0, so the mask check still passes.
        let mut parser = CommandParser::new();
        let mut frame = binary_frame(b'C', &[10, 20, 30]);
        frame[2] = 234;
        assert_eq!(feed_all(&mut parser, &frame), ParserState::Complete);
        assert_eq!(parser.read_color(), Some(Rgb::new(234, 20, 30)));
    }

    #[test]
    fn test_busy_and_idle() {
        let mut parser = CommandParser::new();
        assert!(parser.is_idle());
        assert!(!parser.is_busy());
        parser.feed(b'!');
        assert!(parser.is_busy());
        parser.feed(b'C');
        assert_eq!(parser.state(), ParserState::ReadingBinaryParams);
        assert!(parser.is_busy());
        parser.reset();
        assert!(parser.is_idle());
        assert_eq!(parser.command_id(), CommandId::None);
    }

    #[test]
    fn test_take_before_complete_keeps_state() {
        let mut parser = CommandParser::new();
        feed_all(&mut parser, b"$abc");
        assert_eq!(parser.take(), None);
        assert_eq!(parser.state(), ParserState::ReadingText);
    }

    #[test]
    fn test_text_truncation() {
        let mut parser = CommandParser::new();
        parser.feed(b'$');
        for _ in 0..TEXT_CAPACITY {
            assert_eq!(parser.feed(b'a'), ParserState::ReadingText);
        }
        assert_eq!(parser.feed(b'b'), ParserState::Complete);
        assert!(parser.is_truncated());
        let text = parser.read_text().unwrap();
        assert_eq!(text.len(), TEXT_CAPACITY);
        assert!(text.is_truncated());
        assert!(text.as_bytes().iter().all(|&b| b == b'a'));
    }

    #[test]
    fn test_text_exactly_at_capacity_not_truncated() {
        let mut parser = CommandParser::new();
        parser.feed(b'$');
        for _ in 0..TEXT_CAPACITY {
            parser.feed(b'a');
        }
        assert_eq!(parser.feed(b'\n'), ParserState::Complete);
        assert!(!parser.is_truncated());
    }

    #[test]
    fn test_back_to_back_frames_with_take() {
        let mut parser = CommandParser::new();
        let mut stream = binary_frame(b'B', b"11");
        stream.extend_from_slice(b"$ok\n");
        stream.extend_from_slice(&binary_frame(b'C', &[0xFF, 0, 0]));

        let mut commands = Vec::new();
        for &b in &stream {
            if parser.feed(b).is_terminal() {
                commands.extend(parser.take());
            }
        }
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0], Command::Button(ButtonEvent::new(0, true)));
        assert_eq!(commands[1].id(), CommandId::Text);
        assert_eq!(commands[2], Command::Color(Rgb::new(0xFF, 0, 0)));
    }

    #[test]
    fn test_error_display() {
        let text = std::format!("{}", ParseError::UnrecognizedCode(b'Z'));
        assert_eq!(text, "unrecognized command code 0x5A");
        assert_eq!(ParseError::ChecksumMismatch(0).as_str(), "Checksum mismatch");
    }

    fn outcome(parser: &mut CommandParser, bytes: &[u8]) -> (Vec<ParserState>, Option<Command>) {
        let states = bytes.iter().map(|&b| parser.feed(b)).collect();
        (states, parser.command())
    }

    fn text_frame(body: &[u8]) -> Vec<u8> {
        let mut frame = Vec::from([TEXT_MARKER]);
        frame.extend_from_slice(body);
        frame.push(TEXT_TERMINATOR);
        frame
    }

    /// One frame of any kind, cut short, or plain noise.
    fn frame_bytes() -> impl Strategy<Value = Vec<u8>> {
        prop_oneof![
            any::<(u8, u8, u8)>().prop_map(|(r, g, b)| binary_frame(b'C', &[r, g, b])),
            (b'0'..=b'9', any::<bool>()).prop_map(|(digit, pressed)| {
                binary_frame(b'B', &[digit, if pressed { b'1' } else { b'0' }])
            }),
            proptest::collection::vec(any::<u8>().prop_filter("newline", |b| *b != b'\n'), 0..160)
                .prop_map(|body| text_frame(&body)),
            (any::<(u8, u8, u8)>(), 1usize..6).prop_map(|((r, g, b), len)| {
                let mut frame = binary_frame(b'C', &[r, g, b]);
                frame.truncate(len);
                frame
            }),
            proptest::collection::vec(any::<u8>(), 0..8),
        ]
    }

    fn session() -> impl Strategy<Value = Vec<u8>> {
        (frame_bytes(), proptest::collection::vec(any::<u8>(), 0..4)).prop_map(|(mut frame, tail)| {
            frame.extend_from_slice(&tail);
            frame
        })
    }

    proptest! {
        #[test]
        fn prop_restart_is_idempotent(bytes in session()) {
            let mut parser = CommandParser::new();
            let first = outcome(&mut parser, &bytes);
            parser.reset();
            let second = outcome(&mut parser, &bytes);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_reset_mid_frame_then_replay(bytes in session(), cut in any::<proptest::sample::Index>()) {
            let mut fresh = CommandParser::new();
            let expected = outcome(&mut fresh, &bytes);

            let mut parser = CommandParser::new();
            let prefix = &bytes[..cut.index(bytes.len() + 1)];
            feed_all(&mut parser, prefix);
            parser.reset();
            prop_assert!(parser.is_idle());
            prop_assert_eq!(outcome(&mut parser, &bytes), expected);
        }

        #[test]
        fn prop_encoded_color_frames_validate(r: u8, g: u8, b: u8) {
            let mut parser = CommandParser::new();
            let state = feed_all(&mut parser, &binary_frame(b'C', &[r, g, b]));
            prop_assert_eq!(state, ParserState::Complete);
            prop_assert_eq!(parser.read_color(), Some(Rgb::new(r, g, b)));
        }

        #[test]
        fn prop_corruption_detected_iff_sum_gains_bits(r in any::<u8>(), g in any::<u8>(), b in any::<u8>(), idx in 0usize..3, flip in 1u8..=255) {
            let payload = [r, g, b];
            let sum = running_sum(BINARY_MARKER, b'C', &payload);
            let mut corrupted = payload;
            corrupted[idx] ^= flip;
            let new_sum = running_sum(BINARY_MARKER, b'C', &corrupted);

            let mut frame = binary_frame(b'C', &payload);
            frame[2 + idx] = corrupted[idx];
            let mut parser = CommandParser::new();
            let state = feed_all(&mut parser, &frame);

            let accepted = new_sum & !sum == 0;
            prop_assert_eq!(state == ParserState::Complete, accepted);
        }
    }
}
