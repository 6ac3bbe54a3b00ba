//! Decode what EMV calls "BER-TLV": a TLV (Tag, Length, Value) format where
//! the tag is 1-3 bytes and selects the interpretation of the value, not just
//! its wire type, and the length is at least one byte with a long form for
//! anything past 127 bytes.
//!
//! This isn't quite BER-TLV since real BER/DER resolve the tag's meaning
//! through an ASN.1 schema; EMV just hardcodes a tag registry instead. See
//! EMV 4.4 Book 3 Annex B.

use super::dol::Dol;
use super::elements::{self, Format};
use super::errors::{DecodeError, StringType};
use super::types::{Field, Value};

/// Decode a tag, returning the tag id and the number of bytes it occupied.
///
/// If the low 5 bits of the first byte are all set, the tag continues into
/// one or two more bytes (EMV caps proprietary tags at 24 bits / 3 bytes
/// total). Each continuation byte's top bit signals whether another byte
/// follows; a continuation byte whose low 7 bits are all zero is an illegal
/// encoding (it would be indistinguishable from padding a shorter tag).
pub(super) fn read_tag(raw: &[u8]) -> Result<(u32, usize), DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::MessageTooShort(1, 0));
    }
    let first = raw[0];
    if first & 0x1f != 0x1f {
        return Ok((first as u32, 1));
    }

    let mut tag: u32 = first as u32;
    let mut idx = 1;
    loop {
        if idx > 2 {
            return Err(DecodeError::MalformedTag);
        }
        if idx >= raw.len() {
            return Err(DecodeError::MessageTooShort(idx + 1, raw.len()));
        }
        let b = raw[idx];
        if b & 0x7f == 0 {
            return Err(DecodeError::MalformedTag);
        }
        tag = (tag << 8) | b as u32;
        idx += 1;
        if b & 0x80 == 0 {
            break;
        }
    }
    Ok((tag, idx))
}

/// Decode a BER-TLV length, short or long form, returning the value and the
/// number of bytes the length field occupied. The indefinite form (a leading
/// byte of exactly 0x80) isn't used by EMV and is rejected, as is anything
/// past the `0x81`/`0x82`/`0x83` long forms.
pub(super) fn read_length(raw: &[u8]) -> Result<(usize, usize), DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::MessageTooShort(1, 0));
    }
    let first = raw[0];
    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let num_bytes = (first & 0x7f) as usize;
    if num_bytes == 0 || num_bytes > 3 {
        return Err(DecodeError::MalformedLength);
    }
    if raw.len() < 1 + num_bytes {
        return Err(DecodeError::MessageTooShort(1 + num_bytes, raw.len()));
    }

    let mut len: usize = 0;
    for &b in &raw[1..1 + num_bytes] {
        len = (len << 8) | b as usize;
    }
    Ok((len, num_bytes + 1))
}

/// Read a tag and length together, returning `(tag, value_len, bytes_consumed)`.
/// Shared by the field reader and the DOL parser, which only ever needs the
/// tag+length pair (DOL entries carry no value of their own).
pub(super) fn read_tl(raw: &[u8]) -> Result<(u32, usize, usize), DecodeError> {
    let (tag, tag_len) = read_tag(raw)?;
    let (len, len_len) = read_length(&raw[tag_len..])?;
    Ok((tag, len, tag_len + len_len))
}

/// Decode a single top-level `Field` (tag, length, and its decoded value) from
/// the front of `raw`. Does not require `raw` to be fully consumed.
pub fn read_field(raw: &[u8]) -> Result<Field, DecodeError> {
    let (tag, len, tl_len) = read_tl(raw)?;
    if raw.len() < tl_len {
        return Err(DecodeError::TruncatedValue {
            tag,
            needed: len,
            got: 0,
        });
    }
    let value_end = tl_len.saturating_add(len);
    if raw.len() < value_end {
        return Err(DecodeError::TruncatedValue {
            tag,
            needed: len,
            got: raw.len() - tl_len,
        });
    }
    let value = decode_value(tag, &raw[tl_len..value_end])
        .map_err(|err| DecodeError::TemplateInternal(tag, Box::new(err)))?;
    Ok(Field { tag, value })
}

/// Decode a run of zero or more top-level TLV objects, e.g. the data area of
/// a READ RECORD response or an FCI. Stray 0x00/0xFF padding bytes between
/// objects are silently skipped, per EMV 4.4 Book 3 Annex B5.
pub fn read_all(raw: &[u8]) -> Result<Vec<Field>, DecodeError> {
    match template(raw)? {
        Value::Template(fields) => Ok(fields),
        _ => unreachable!("template() always returns Value::Template"),
    }
}

fn decode_value(tag: u32, raw: &[u8]) -> Result<Value, DecodeError> {
    match elements::lookup(tag) {
        Some(info) => match info.format {
            Format::Binary => binary(raw),
            Format::Numeric => numeric(raw),
            Format::CompressedNumeric => compressed_numeric(raw),
            Format::Alphabetic => alphabetic(raw),
            Format::Alphanumeric => alphanumeric(raw),
            Format::AlphanumericSpecial => alphanumeric_special(raw),
            Format::Dol => Dol::try_from(raw).map(Value::Dol),
            Format::Constructed => template(raw),
        },
        // Unknown ids are a "null tag": decode the bytes, don't fail the parse.
        None => binary(raw),
    }
}

pub(super) fn alphabetic(raw: &[u8]) -> Result<Value, DecodeError> {
    for &b in raw {
        if !b.is_ascii_alphabetic() {
            return Err(DecodeError::UnsupportedChar(StringType::Alphabetic, b));
        }
    }
    Ok(Value::Alphabetic(String::from_utf8_lossy(raw).into_owned()))
}

pub(super) fn alphanumeric(raw: &[u8]) -> Result<Value, DecodeError> {
    for &b in raw {
        if !b.is_ascii_alphanumeric() {
            return Err(DecodeError::UnsupportedChar(StringType::Alphanumeric, b));
        }
    }
    Ok(Value::Alphanumeric(String::from_utf8_lossy(raw).into_owned()))
}

pub(super) fn alphanumeric_special(raw: &[u8]) -> Result<Value, DecodeError> {
    for &b in raw {
        if !(0x20..=0x7e).contains(&b) {
            return Err(DecodeError::UnsupportedChar(
                StringType::AlphanumericSpecial,
                b,
            ));
        }
    }
    Ok(Value::AlphanumericSpecial(
        String::from_utf8_lossy(raw).into_owned(),
    ))
}

pub(super) fn binary(raw: &[u8]) -> Result<Value, DecodeError> {
    Ok(Value::Binary(raw.to_vec()))
}

/// Compressed numeric (`CN`): packed BCD, left-justified, 0xF-padded. The
/// decoded digits keep their pad nibbles (0xF) so callers can tell where the
/// card's value actually ended.
pub(super) fn compressed_numeric(raw: &[u8]) -> Result<Value, DecodeError> {
    let mut digits = Vec::with_capacity(raw.len() * 2);
    for &b in raw {
        let hi = b >> 4;
        let lo = b & 0x0f;
        if hi != 0xf && hi > 9 {
            return Err(DecodeError::BadBcd(b));
        }
        if lo != 0xf && lo > 9 {
            return Err(DecodeError::BadBcd(b));
        }
        digits.push(hi);
        digits.push(lo);
    }
    Ok(Value::DigitString(digits))
}

/// Numeric (`N`): packed BCD, right-justified, zero-padded.
pub(super) fn numeric(raw: &[u8]) -> Result<Value, DecodeError> {
    let mut value: u128 = 0;
    for &b in raw {
        let hi = b >> 4;
        let lo = b & 0x0f;
        if hi > 9 || lo > 9 {
            return Err(DecodeError::BadBcd(b));
        }
        value = value * 100 + hi as u128 * 10 + lo as u128;
    }
    Ok(Value::Numeric(value))
}

fn template(raw: &[u8]) -> Result<Value, DecodeError> {
    let mut offset = 0;
    let mut fields = Vec::new();
    while offset < raw.len() {
        if raw[offset] == 0x00 || raw[offset] == 0xff {
            offset += 1;
            continue;
        }

        let (tag, len, tl_len) = read_tl(&raw[offset..])?;
        let remaining = raw.len() - offset;
        if remaining < tl_len {
            return Err(DecodeError::TruncatedValue {
                tag,
                needed: len,
                got: 0,
            });
        }
        let field_end = tl_len.saturating_add(len);
        if remaining < field_end {
            return Err(DecodeError::TruncatedValue {
                tag,
                needed: len,
                got: remaining - tl_len,
            });
        }

        let value = decode_value(tag, &raw[offset + tl_len..offset + field_end])
            .map_err(|err| DecodeError::TemplateInternal(tag, Box::new(err)))?;
        fields.push(Field { tag, value });
        offset += field_end;
    }
    Ok(Value::Template(fields))
}
