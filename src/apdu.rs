//! Command/response APDU encoding, ISO 7816-4 short and extended forms.
//! Generalizes the teacher's `exchange::ADPUCommand`/`exchange()` free
//! function into an owned command/response pair the kernel state machine can
//! build and inspect without borrowing from a transceiver.

use std::error::Error;
use std::fmt::Display;

/// The DF name PPSE SELECT always targets.
pub const PPSE_NAME: &[u8] = b"2PAY.SYS.DDF01";

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ApduError {
    DataTooLong(usize),
    LeTooLarge(usize),
}

impl Display for ApduError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApduError::DataTooLong(len) => write!(f, "command data too long: {len} bytes"),
            ApduError::LeTooLarge(le) => write!(f, "requested Le too large: {le}"),
        }
    }
}

impl Error for ApduError {}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CommandApdu {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
    /// Expected response length, `None` if no data is expected at all.
    /// `Some(256)` is this codebase's "give me everything, let the card
    /// correct me" sentinel and always wire-encodes as zero bytes.
    pub le: Option<usize>,
}

impl CommandApdu {
    pub fn encode(&self) -> Result<Vec<u8>, ApduError> {
        if self.data.len() > 65535 {
            return Err(ApduError::DataTooLong(self.data.len()));
        }
        if let Some(le) = self.le {
            if le > 65536 {
                return Err(ApduError::LeTooLarge(le));
            }
        }

        let extended = self.data.len() > 255 || matches!(self.le, Some(le) if le > 256);

        let mut raw = Vec::with_capacity(5 + self.data.len() + 3);
        raw.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2]);

        if !self.data.is_empty() {
            if extended {
                raw.push(0);
                raw.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
            } else {
                raw.push(self.data.len() as u8);
            }
        } else if extended && self.le.is_some() {
            raw.push(0);
        }
        raw.extend_from_slice(&self.data);

        if let Some(le) = self.le {
            if extended {
                let wire = if le == 65536 || le == 256 { 0u16 } else { le as u16 };
                raw.extend_from_slice(&wire.to_be_bytes());
            } else {
                let wire = if le == 256 { 0u8 } else { le as u8 };
                raw.push(wire);
            }
        }

        Ok(raw)
    }

    pub fn select(df_name: &[u8]) -> CommandApdu {
        CommandApdu {
            cla: 0x00,
            ins: 0xa4,
            p1: 0x04, // select by name
            p2: 0x00, // first or only occurrence
            data: df_name.to_vec(),
            le: Some(256),
        }
    }

    pub fn get_processing_options(pdol_data: &[u8]) -> CommandApdu {
        CommandApdu {
            cla: 0x80,
            ins: 0xa8,
            p1: 0x00,
            p2: 0x00,
            data: pdol_data.to_vec(),
            le: Some(256),
        }
    }

    pub fn read_record(sfi: u8, record: u8) -> CommandApdu {
        CommandApdu {
            cla: 0x00,
            ins: 0xb2,
            p1: record,
            p2: (sfi << 3) | 0x04,
            data: Vec::new(),
            le: Some(256),
        }
    }

    /// GENERATE AC. `ac_type` selects AAC/TC/ARQC; `cda` additionally asks
    /// the card to perform Combined Data Authentication on this cryptogram.
    pub fn generate_ac(ac_type: AcType, cda: bool, cdol_data: &[u8]) -> CommandApdu {
        let mut p1 = match ac_type {
            AcType::Aac => 0x00,
            AcType::Tc => 0x40,
            AcType::Arqc => 0x80,
        };
        if cda {
            p1 |= 0x10;
        }
        CommandApdu {
            cla: 0x80,
            ins: 0xae,
            p1,
            p2: 0x00,
            data: cdol_data.to_vec(),
            le: Some(256),
        }
    }

    /// GET DATA, one or two byte tag id.
    pub fn get_data(tag: u32) -> CommandApdu {
        let (p1, p2) = if tag <= 0xff {
            (0x9f, tag as u8)
        } else {
            ((tag >> 8) as u8, tag as u8)
        };
        CommandApdu {
            cla: 0x80,
            ins: 0xca,
            p1,
            p2,
            data: Vec::new(),
            le: Some(256),
        }
    }

    pub fn get_response(le: usize) -> CommandApdu {
        CommandApdu {
            cla: 0x00,
            ins: 0xc0,
            p1: 0x00,
            p2: 0x00,
            data: Vec::new(),
            le: Some(le),
        }
    }

    pub fn verify(data: &[u8]) -> CommandApdu {
        CommandApdu {
            cla: 0x00,
            ins: 0x20,
            p1: 0x00,
            p2: 0x80, // PIN block enciphered offline, format 2 reference
            data: data.to_vec(),
            le: None,
        }
    }

    pub fn compute_cryptographic_checksum(data: &[u8]) -> CommandApdu {
        CommandApdu {
            cla: 0x80,
            ins: 0x2a,
            p1: 0x8e,
            p2: 0x80,
            data: data.to_vec(),
            le: Some(256),
        }
    }

    /// Placeholder for issuer script processing (ERRD), out of scope for
    /// this terminal but named per the command table so callers have a
    /// uniform constructor surface even though it's never dispatched.
    pub fn errd(script: &[u8]) -> CommandApdu {
        CommandApdu {
            cla: 0x00,
            ins: 0x00,
            p1: 0x00,
            p2: 0x00,
            data: script.to_vec(),
            le: None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AcType {
    Aac,
    Tc,
    Arqc,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResponseApdu {
    pub data: Vec<u8>,
    pub sw1: u8,
    pub sw2: u8,
}

impl ResponseApdu {
    pub fn from_raw(raw: &[u8]) -> Option<ResponseApdu> {
        if raw.len() < 2 {
            return None;
        }
        let (data, trailer) = raw.split_at(raw.len() - 2);
        Some(ResponseApdu {
            data: data.to_vec(),
            sw1: trailer[0],
            sw2: trailer[1],
        })
    }

    pub fn sw(&self) -> u16 {
        (self.sw1 as u16) << 8 | self.sw2 as u16
    }

    pub fn is_success(&self) -> bool {
        self.sw() == 0x9000
    }

    /// SW1 = 0x61: more response data available, SW2 holds the count.
    pub fn is_more_data(&self) -> bool {
        self.sw1 == 0x61
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.sw1, 0x62 | 0x63)
    }

    pub fn is_error(&self) -> bool {
        !self.is_success() && !self.is_more_data() && !self.is_warning()
    }

    pub fn status_description(&self) -> &'static str {
        match self.sw() {
            0x9000 => "success",
            sw if sw & 0xff00 == 0x6100 => "more data available",
            sw if sw & 0xff00 == 0x6200 => "warning, no change in NV memory",
            sw if sw & 0xff00 == 0x6300 => "warning, possible NV memory change",
            0x6a81 => "function not supported",
            0x6a82 => "file or application not found",
            0x6a83 => "record not found",
            0x6a84 => "not enough memory space",
            0x6a86 => "incorrect P1/P2",
            0x6a88 => "referenced data not found",
            sw if sw & 0xff00 == 0x6a00 => "wrong parameters, no information given",
            0x6b00 => "wrong parameters P1-P2",
            0x6c00 => "wrong length Le",
            0x6d00 => "instruction code not supported or invalid",
            0x6e00 => "class not supported",
            0x6f00 => "no precise diagnosis",
            0x6984 => "conditions of use not satisfied",
            0x6985 => "conditions of use not satisfied",
            _ => "unknown status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_apdu_encodes_with_single_byte_lc_and_le() {
        let cmd = CommandApdu {
            cla: 0x00,
            ins: 0xb2,
            p1: 0x01,
            p2: 0x0c,
            data: Vec::new(),
            le: Some(256),
        };
        assert_eq!(cmd.encode().unwrap(), vec![0x00, 0xb2, 0x01, 0x0c, 0x00]);
    }

    #[test]
    fn extended_apdu_matches_literal_scenario() {
        let cmd = CommandApdu {
            cla: 0x00,
            ins: 0xa4,
            p1: 0x04,
            p2: 0x00,
            data: vec![0xab; 300],
            le: Some(256),
        };
        let encoded = cmd.encode().unwrap();
        assert_eq!(&encoded[..5], &[0x00, 0xa4, 0x04, 0x00, 0x00]);
        assert_eq!(&encoded[5..7], &[0x01, 0x2c]);
        assert_eq!(&encoded[7..307], &[0xab; 300][..]);
        assert_eq!(&encoded[307..], &[0x00, 0x00]);
    }

    #[test]
    fn read_record_sets_p2_from_sfi() {
        let cmd = CommandApdu::read_record(3, 1);
        assert_eq!(cmd.p2, (3 << 3) | 0x04);
        assert_eq!(cmd.p1, 1);
    }

    #[test]
    fn generate_ac_p1_encodes_type_and_cda() {
        assert_eq!(CommandApdu::generate_ac(AcType::Aac, false, &[]).p1, 0x00);
        assert_eq!(CommandApdu::generate_ac(AcType::Tc, false, &[]).p1, 0x40);
        assert_eq!(CommandApdu::generate_ac(AcType::Arqc, true, &[]).p1, 0x90);
    }

    #[test]
    fn response_classifies_status_words() {
        let success = ResponseApdu::from_raw(&[0x90, 0x00]).unwrap();
        assert!(success.is_success());

        let more_data = ResponseApdu::from_raw(&[0x61, 0x1a]).unwrap();
        assert!(more_data.is_more_data());

        let warning = ResponseApdu::from_raw(&[0x63, 0x00]).unwrap();
        assert!(warning.is_warning());

        let error = ResponseApdu::from_raw(&[0x6a, 0x82]).unwrap();
        assert!(error.is_error());
        assert_eq!(error.status_description(), "file or application not found");
    }
}
