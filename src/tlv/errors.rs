use std::error::Error;
use std::fmt::Display;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum StringType {
    Alphabetic,
    Alphanumeric,
    AlphanumericSpecial,
}

/// Errors from parsing a BER-TLV byte stream or a DOL template, per EMV 4.3
/// Book 3 Annex B.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DecodeError {
    /// Tag's low 5 bits signalled a continuation byte, but the continuation
    /// byte is itself an illegal terminator.
    MalformedTag,
    /// Length's leading byte used an unsupported long form (anything past
    /// 0x83) or claimed more bytes than the 32-bit cap this codec allows.
    MalformedLength,
    /// The declared value length runs past the end of the input.
    TruncatedValue { tag: u32, needed: usize, got: usize },
    BadBcd(u8),
    TemplateInternal(u32, Box<DecodeError>),
    LengthTooLong(usize, usize),
    MessageTooShort(usize, usize),
    UnsupportedChar(StringType, u8),
    NoPathRequested,
    WrongType(u32, &'static str),
    NoSuchMember(u32),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DecodeError::MalformedTag => write!(f, "malformed multi-byte tag"),
            DecodeError::MalformedLength => write!(f, "malformed BER-TLV length field"),
            DecodeError::TruncatedValue { tag, needed, got } => write!(
                f,
                "tag 0x{:04x} value truncated, needed {} bytes, got {}",
                tag, needed, got
            ),
            DecodeError::BadBcd(b) => write!(f, "Bad BCD character 0x{:1x}", b),
            DecodeError::UnsupportedChar(string_type, ch) => write!(
                f,
                "Unsupported character 0x{:02x} in {:?} string",
                ch, string_type
            ),
            DecodeError::MessageTooShort(needed, got) => {
                write!(f, "Message too short, needed {}, got {}", needed, got)
            }
            DecodeError::LengthTooLong(needed, got) => {
                write!(f, "Length too long, needed {}, got {}", needed, got)
            }
            DecodeError::TemplateInternal(tag, ref err) => {
                write!(f, "Error while processing tag 0x{:04x}: {}", tag, err)
            }
            DecodeError::NoPathRequested => write!(f, "No path requested"),
            DecodeError::WrongType(tag, wanted) => {
                write!(f, "Found 0x{:04x} but it is not {}", tag, wanted)
            }
            DecodeError::NoSuchMember(tag) => {
                write!(f, "No member of template with tag 0x{:04x}", tag)
            }
        }
    }
}

impl Error for DecodeError {}
