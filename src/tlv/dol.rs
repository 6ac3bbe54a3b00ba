//! Data Object List parsing and materialization (PDOL/CDOL/DDOL/TDOL), EMV
//! 4.4 Book 3 section 5.4. A DOL is a list of `(tag, length)` pairs with no
//! values of its own; the terminal supplies the values when it builds the
//! command that asks the card to fill the list in.

use std::{collections::HashMap, fmt::Display};

use super::{decoders::read_tl, elements, DecodeError, Value};
use crate::util::{left_pad_zero, right_pad_space};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DOLEntry {
    pub tag: u32,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dol {
    entries: Vec<DOLEntry>,
    size: usize,
}

impl Dol {
    pub fn new_from_entries(entries: Vec<DOLEntry>) -> Self {
        let size = entries.iter().map(|entry| entry.size).sum();
        Dol { entries, size }
    }

    pub fn get_size(&self) -> usize {
        self.size
    }

    pub fn get_entries(&self) -> &[DOLEntry] {
        &self.entries
    }

    /// Check whether every entry in this DOL can be filled from `data`. Used
    /// as a pre-flight check against the critical-tag set before a GPO or
    /// GENERATE AC is even attempted: a terminal that can't supply a tag the
    /// card demands should fail fast instead of sending a half-built command.
    pub fn can_satisfy(&self, data: &HashMap<u32, Value>) -> Result<(), u32> {
        for entry in &self.entries {
            if !data.contains_key(&entry.tag) {
                return Err(entry.tag);
            }
        }
        Ok(())
    }

    /// Encode this DOL's values from `data` into the byte string the card
    /// expects, applying EMV's two padding rules: alphanumeric/alphanumeric
    /// special/alphabetic fields are right-padded with 0x20 on the right,
    /// and everything else is left-padded with zero bytes on the left.
    /// Oversized values are truncated to the entry's declared length.
    /// Tags the terminal has no value for are encoded as all-zero.
    pub fn encode(&self, data: &HashMap<u32, Value>) -> Box<[u8]> {
        let mut encoded = vec![0; self.size];
        let mut encoded_slice = encoded.as_mut_slice();
        for entry in &self.entries {
            let (dest, remaining) = encoded_slice.split_at_mut(entry.size);
            if let Some(value) = data.get(&entry.tag) {
                match value {
                    Value::Alphabetic(s) => dest.copy_from_slice(&right_pad_space(s.as_bytes(), dest.len())),
                    Value::Alphanumeric(s) => dest.copy_from_slice(&right_pad_space(s.as_bytes(), dest.len())),
                    Value::AlphanumericSpecial(s) => {
                        dest.copy_from_slice(&right_pad_space(s.as_bytes(), dest.len()))
                    }
                    Value::Binary(b) => dest.copy_from_slice(&left_pad_zero(b, dest.len())),
                    Value::DigitString(s) => {
                        dest.fill(0xff);
                        for (digits, dest) in s.chunks(2).zip(dest.iter_mut()) {
                            *dest = match digits {
                                [single] => single << 4 | 0x0f,
                                [higher, lower] => higher << 4 | lower,
                                [..] => unreachable!(),
                            }
                        }
                    }
                    Value::Numeric(number) => {
                        let mut number = *number;
                        for dest in dest.iter_mut().rev() {
                            let digits: u8 = (number % 100).try_into().unwrap();
                            number /= 100;
                            *dest = (digits / 10) << 4 | (digits % 10);
                        }
                    }
                    // Templates/DOLs should never show up as DOL-requested values.
                    Value::Template(_) | Value::Dol(_) => {}
                }
            }
            encoded_slice = remaining;
        }

        encoded.into_boxed_slice()
    }
}

impl TryFrom<&[u8]> for Dol {
    type Error = DecodeError;

    fn try_from(mut value: &[u8]) -> Result<Self, Self::Error> {
        let mut entries = Vec::new();
        let mut total_len = 0;
        while !value.is_empty() {
            let (tag, size, tl_len) = read_tl(value)?;
            entries.push(DOLEntry { tag, size });
            value = &value[tl_len..];
            total_len += size;
        }

        Ok(Dol {
            entries,
            size: total_len,
        })
    }
}

impl Display for DOLEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag_name = elements::lookup(self.tag).map_or("", |elem| elem.name);
        write!(
            f,
            "0x{:04x} (\"{}\") 0x{:x} bytes",
            self.tag, tag_name, self.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pdol_entries() {
        let raw = [0x9f, 0x02, 0x06, 0x5f, 0x2a, 0x02, 0x9a, 0x03];
        let dol = Dol::try_from(&raw[..]).unwrap();
        assert_eq!(
            dol.get_entries(),
            &[
                DOLEntry {
                    tag: 0x9f02,
                    size: 6
                },
                DOLEntry {
                    tag: 0x5f2a,
                    size: 2
                },
                DOLEntry {
                    tag: 0x9a,
                    size: 3
                },
            ]
        );
        assert_eq!(dol.get_size(), 11);
    }

    #[test]
    fn encodes_with_correct_padding_rules() {
        let raw = [0x9f, 0x1c, 0x08, 0x9f, 0x02, 0x06];
        let dol = Dol::try_from(&raw[..]).unwrap();
        let mut data = HashMap::new();
        data.insert(0x9f1c, Value::Alphanumeric("T1".to_string()));
        data.insert(0x9f02, Value::Numeric(100));

        let encoded = dol.encode(&data);
        assert_eq!(&encoded[..8], b"T1      ");
        assert_eq!(&encoded[8..], &[0x00, 0x00, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn missing_tag_encodes_as_zero() {
        let raw = [0x9a, 0x03];
        let dol = Dol::try_from(&raw[..]).unwrap();
        let data = HashMap::new();
        assert_eq!(&*dol.encode(&data), &[0x00, 0x00, 0x00]);
    }

    #[test]
    fn can_satisfy_reports_missing_tag() {
        let raw = [0x9f, 0x02, 0x06, 0x9a, 0x03];
        let dol = Dol::try_from(&raw[..]).unwrap();
        let mut data = HashMap::new();
        data.insert(0x9f02, Value::Numeric(100));
        assert_eq!(dol.can_satisfy(&data), Err(0x9a));
    }
}
