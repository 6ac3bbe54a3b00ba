//! The boundary between a kernel and whatever actually talks to the card.
//! Injected, never owned: the kernel holds a `&mut dyn Transceiver` for the
//! duration of a transaction and nothing more.

use std::error::Error;
use std::fmt::Display;

use crate::apdu::{CommandApdu, ResponseApdu};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TransportError {
    /// The underlying reader/transport rejected or failed to relay the command.
    TransceiveFailure(String),
    /// The card was removed from the field mid-transaction.
    CardLost,
    /// The per-command deadline (ç4.I) elapsed before a response arrived.
    Timeout,
}

impl Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::TransceiveFailure(msg) => write!(f, "transceive failed: {msg}"),
            TransportError::CardLost => write!(f, "card lost"),
            TransportError::Timeout => write!(f, "transceive timed out"),
        }
    }
}

impl Error for TransportError {}

/// A single request/response operation over the card interface. Implementors
/// must not retry internally — the kernel decides whether and how to retry —
/// and must preserve byte-for-byte framing of whatever the card returns.
/// Per-call deadline enforcement (ç4.I) is the caller's job, not the
/// transceiver's.
pub trait Transceiver {
    fn transceive(&mut self, command: &CommandApdu) -> Result<ResponseApdu, TransportError>;
}
