//! Sub-protocol markers and the binary command descriptor table.

/// Marker byte opening a binary (checksummed) frame.
pub const BINARY_MARKER: u8 = b'!';

/// Marker byte opening a text (newline-terminated) frame.
pub const TEXT_MARKER: u8 = b'$';

/// Line-feed byte closing a text frame.
pub const TEXT_TERMINATOR: u8 = b'\n';

/// Command family selected by the first byte of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubProtocol {
    /// `!<code><params...><checksum>`
    Binary,
    /// `$<bytes...>\n`
    Text,
}

impl SubProtocol {
    /// Look up the family for a marker byte.
    #[inline]
    #[must_use]
    pub const fn from_marker(byte: u8) -> Option<Self> {
        match byte {
            BINARY_MARKER => Some(Self::Binary),
            TEXT_MARKER => Some(Self::Text),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn marker(self) -> u8 {
        match self {
            Self::Binary => BINARY_MARKER,
            Self::Text => TEXT_MARKER,
        }
    }
}

/// Logical kind of a decoded command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandId {
    /// No command is ready.
    #[default]
    None,
    Color,
    ButtonEvent,
    Text,
    Error,
}

/// How the parameter bytes of a command are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamType {
    /// `[digit, state]`: ASCII digit holding `index + 1`, then `'1'` or `'0'`.
    ButtonEvent,
    /// `[r, g, b]` raw bytes.
    Color,
    /// Bytes up to a line feed.
    String,
}

/// Static metadata for one binary command code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandDescriptor {
    /// Code byte following the binary marker.
    pub code: u8,
    pub id: CommandId,
    pub param_type: ParamType,
    /// Bytes following the code byte. The last of them is the checksum.
    pub param_len: u8,
}

impl CommandDescriptor {
    /// Number of payload bytes, excluding the checksum.
    #[inline]
    #[must_use]
    pub const fn payload_len(&self) -> usize {
        self.param_len.saturating_sub(1) as usize
    }
}

/// Color command: `!C<r><g><b><checksum>`.
pub const COLOR_COMMAND: CommandDescriptor = CommandDescriptor {
    code: b'C',
    id: CommandId::Color,
    param_type: ParamType::Color,
    param_len: 4,
};

/// Button command: `!B<digit><state><checksum>`.
pub const BUTTON_COMMAND: CommandDescriptor = CommandDescriptor {
    code: b'B',
    id: CommandId::ButtonEvent,
    param_type: ParamType::ButtonEvent,
    param_len: 3,
};

/// Binary commands the parser accepts. Codes must be unique.
pub static BINARY_COMMANDS: [CommandDescriptor; 2] = [COLOR_COMMAND, BUTTON_COMMAND];

/// Find the descriptor for a binary command code.
#[must_use]
pub fn find_binary_command(code: u8) -> Option<&'static CommandDescriptor> {
    BINARY_COMMANDS.iter().find(|desc| desc.code == code)
}
