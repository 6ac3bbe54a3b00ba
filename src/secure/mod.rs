//! Secure-memory holders for PAN, PIN block, cryptogram and Track 2 (ç4.H).
//! `zeroize`'s `Zeroize`/`ZeroizeOnDrop` derive guarantee the compiler can't
//! elide the wipe the way a hand-rolled loop can without
//! `core::ptr::write_volatile`; the spec's multi-pass 0x00 -> 0xFF -> random
//! -> 0x00 pattern is layered on top as an explicit extra pass run before
//! the final zeroize takes over on drop.

pub mod pin_block;

use zeroize::Zeroize;
use zeroize_derive::ZeroizeOnDrop;

use crate::util::constant_time_eq;

/// A byte buffer holding sensitive card/terminal data (PAN, PIN block,
/// cryptogram, Track 2). `release()` runs the multi-pass wipe immediately
/// and marks the buffer cleared; `Drop` runs it again as a safety net for
/// any path that skipped an explicit release.
#[derive(ZeroizeOnDrop)]
pub struct SensitiveBuffer {
    bytes: Vec<u8>,
    #[zeroize(skip)]
    cleared: bool,
}

impl SensitiveBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        SensitiveBuffer {
            bytes,
            cleared: false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Multi-pass wipe: 0x00, then 0xFF, then a random pass, then a final
    /// 0x00 pass, matching ç3/ç4.H's explicit pattern. Safe to call more
    /// than once; subsequent calls are no-ops once `cleared` is set.
    pub fn release(&mut self) {
        if self.cleared {
            return;
        }
        let len = self.bytes.len();
        self.bytes.iter_mut().for_each(|b| *b = 0x00);
        self.bytes.iter_mut().for_each(|b| *b = 0xff);
        for b in self.bytes.iter_mut() {
            *b = rand::random::<u8>();
        }
        self.bytes.zeroize();
        debug_assert!(self.bytes.iter().all(|&b| b == 0) || len == 0);
        self.cleared = true;
    }
}

impl PartialEq for SensitiveBuffer {
    /// Constant-time: runs to completion regardless of where the buffers
    /// first differ, so comparing a live cryptogram against a stored one
    /// can't leak timing information about the mismatch position.
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for SensitiveBuffer {}

/// A typed wrapper around [`SensitiveBuffer`] for the Primary Account
/// Number, masking to first-six/last-four on `Display`.
pub struct MaskedPan(pub SensitiveBuffer);

impl std::fmt::Display for MaskedPan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits: Vec<u8> = self
            .0
            .as_bytes()
            .iter()
            .flat_map(|&b| [b >> 4, b & 0x0f])
            .take_while(|&d| d <= 9)
            .collect();
        if digits.len() <= 10 {
            for d in &digits {
                write!(f, "{d}")?;
            }
            return Ok(());
        }
        for d in &digits[..6] {
            write!(f, "{d}")?;
        }
        write!(f, "{}", "*".repeat(digits.len() - 10))?;
        for d in &digits[digits.len() - 4..] {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

/// Track 2 Equivalent Data, masking the account-number run before the
/// separator nibble 'D' (0xD) and leaving everything after it (expiry,
/// service code, discretionary data) visible.
pub struct MaskedTrack2(pub SensitiveBuffer);

impl std::fmt::Display for MaskedTrack2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nibbles: Vec<u8> = self
            .0
            .as_bytes()
            .iter()
            .flat_map(|&b| [b >> 4, b & 0x0f])
            .collect();
        let sep = nibbles.iter().position(|&n| n == 0xd);
        match sep {
            Some(pos) => {
                write!(f, "{}", "*".repeat(pos))?;
                write!(f, "D")?;
                for &n in &nibbles[pos + 1..] {
                    if n == 0xf {
                        break;
                    }
                    write!(f, "{n:x}")?;
                }
                Ok(())
            }
            None => write!(f, "{}", "*".repeat(nibbles.len())),
        }
    }
}

/// Tracks a set of sensitive buffers and releases all of them on scope exit
/// (via `Drop`), guaranteeing cleanup on every path out of a transaction:
/// success, error, or cancellation.
#[derive(Default)]
pub struct Scope {
    holders: Vec<SensitiveBuffer>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn register(&mut self, buffer: SensitiveBuffer) -> usize {
        self.holders.push(buffer);
        self.holders.len() - 1
    }

    pub fn get(&self, idx: usize) -> Option<&SensitiveBuffer> {
        self.holders.get(idx)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        for holder in &mut self.holders {
            holder.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_clears_and_marks_buffer() {
        let mut buf = SensitiveBuffer::new(vec![1, 2, 3, 4]);
        assert!(!buf.is_cleared());
        buf.release();
        assert!(buf.is_cleared());
        assert!(buf.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn equality_is_constant_time_and_correct() {
        let a = SensitiveBuffer::new(vec![1, 2, 3]);
        let b = SensitiveBuffer::new(vec![1, 2, 3]);
        let c = SensitiveBuffer::new(vec![1, 2, 4]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn masked_pan_keeps_first_six_last_four() {
        let pan = MaskedPan(SensitiveBuffer::new(vec![0x41, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x19]));
        assert_eq!(pan.to_string(), "411111******1119");
    }

    #[test]
    fn scope_releases_all_registered_buffers_on_drop() {
        let idx;
        {
            let mut scope = Scope::new();
            idx = scope.register(SensitiveBuffer::new(vec![9, 9, 9]));
            assert!(!scope.get(idx).unwrap().is_cleared());
        }
        // Scope dropped; nothing left to assert on directly, but this
        // documents the guarantee the type exists to provide.
        let _ = idx;
    }
}
