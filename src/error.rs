//! Top-level error aggregation, ç7. Each module owns its own error enum in
//! the teacher's hand-rolled `Display` + `std::error::Error` idiom; this type
//! is the union a kernel driver actually has to match on to decide the
//! resulting `TerminalOutcome`.

use std::error::Error;
use std::fmt::Display;

use crate::apdu::ApduError;
use crate::crypto::CryptoError;
use crate::tlv::DecodeError;
use crate::transceiver::TransportError;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum KernelError {
    /// Transport (1): fatal for the current transaction, no retry inside the kernel.
    Transport(TransportError),
    /// Protocol/Parse (2): malformed TLV, truncated value, unrecognised GPO
    /// response shape, or a required tag (like AIP) missing entirely.
    Protocol(String),
    /// Config (6): a critical DOL tag is missing from the terminal store at
    /// pre-flight, before any APDU is sent.
    ConfigIncomplete(u32),
    /// Command encoding failed (data/Le out of representable range).
    Apdu(ApduError),
    /// Crypto (5) failures never decline alone; surfaced here only when the
    /// collaborator itself is unusable (e.g. key store unreachable), which
    /// is a terminal condition rather than a TVR bit.
    Crypto(CryptoError),
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::Transport(err) => write!(f, "transport error: {err}"),
            KernelError::Protocol(msg) => write!(f, "protocol error: {msg}"),
            KernelError::ConfigIncomplete(tag) => {
                write!(f, "configuration incomplete: missing tag 0x{tag:04x}")
            }
            KernelError::Apdu(err) => write!(f, "apdu error: {err}"),
            KernelError::Crypto(err) => write!(f, "crypto error: {err}"),
        }
    }
}

impl Error for KernelError {}

impl From<TransportError> for KernelError {
    fn from(err: TransportError) -> Self {
        KernelError::Transport(err)
    }
}

impl From<DecodeError> for KernelError {
    fn from(err: DecodeError) -> Self {
        KernelError::Protocol(err.to_string())
    }
}

impl From<ApduError> for KernelError {
    fn from(err: ApduError) -> Self {
        KernelError::Apdu(err)
    }
}

impl From<CryptoError> for KernelError {
    fn from(err: CryptoError) -> Self {
        KernelError::Crypto(err)
    }
}
