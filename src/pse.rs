//! PPSE discovery (EMV Book B ç3.2), generalized from the teacher's
//! `pse::list_applications`: SELECT the Proximity Payment System
//! Environment DF name, then walk its directory SFI, collecting each
//! Application Template found (ç4.E.1).

use crate::apdu::CommandApdu;
use crate::error::KernelError;
use crate::tlv::{self, DecodeError, Value};
use crate::transceiver::Transceiver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationTemplate {
    pub aid: Vec<u8>,
    pub label: String,
    pub priority: Option<u8>,
}

impl TryFrom<&tlv::Field> for ApplicationTemplate {
    type Error = DecodeError;

    fn try_from(field: &tlv::Field) -> Result<Self, Self::Error> {
        let Value::Template(fields) = &field.value else {
            return Err(DecodeError::WrongType(field.tag, "Template"));
        };

        let mut aid = None;
        let mut label = None;
        let mut priority = None;
        for f in fields {
            match (&f.value, f.tag) {
                (Value::Binary(b), 0x4f) => aid = Some(b.clone()),
                (Value::AlphanumericSpecial(s), 0x50) => label = Some(s.clone()),
                (Value::Alphanumeric(s), 0x50) => label = Some(s.clone()),
                (Value::Binary(b), 0x87) if b.len() == 1 => priority = Some(b[0]),
                _ => {}
            }
        }

        Ok(ApplicationTemplate {
            aid: aid.ok_or(DecodeError::NoSuchMember(0x4f))?,
            label: label.ok_or(DecodeError::NoSuchMember(0x50))?,
            priority,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PpseData {
    pub applications: Vec<ApplicationTemplate>,
}

/// SELECT the `2PAY.SYS.DDF01` name and walk its FCI-declared SFI,
/// collecting every Application Template record (ç4.E.1). Applications
/// come back in the order the directory lists them; sorting by priority is
/// left to the caller, since a missing priority byte means "no preference",
/// not "lowest".
pub fn discover(transceiver: &mut dyn Transceiver) -> Result<PpseData, KernelError> {
    let cmd = CommandApdu::select(CommandApdu::PPSE_NAME);
    let resp = transceiver.transceive(&cmd)?;
    if !resp.is_success() {
        return Err(KernelError::Protocol(format!(
            "PPSE SELECT failed: {}",
            resp.status_description()
        )));
    }

    let fci = tlv::read_field(&resp.data)?;
    let mut applications = Vec::new();

    // Some cards embed their directory entries directly in the FCI's
    // proprietary template (tag 0xBF0C) rather than pointing at an SFI.
    if let Ok(Value::Template(entries)) = fci.get_path(&[0x6f, 0xa5, 0xbf0c]) {
        for entry in entries {
            if entry.tag == 0x61 {
                if let Ok(template) = ApplicationTemplate::try_from(entry) {
                    applications.push(template);
                }
            }
        }
    }

    let Ok(Value::Binary(sfi_bytes)) = fci.get_path(&[0x6f, 0xa5, 0x88]) else {
        return Ok(PpseData { applications });
    };
    let Some(&sfi) = sfi_bytes.first() else {
        return Ok(PpseData { applications });
    };

    for record in 1..=16 {
        let cmd = CommandApdu::read_record(sfi, record);
        let resp = transceiver.transceive(&cmd)?;
        if resp.sw() == 0x6a83 {
            break;
        }
        if !resp.is_success() {
            continue;
        }
        let field = tlv::read_field(&resp.data)?;
        if let Ok(template) = ApplicationTemplate::try_from(&field) {
            applications.push(template);
        }
    }

    Ok(PpseData { applications })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transceiver::TransportError;

    /// SELECT-PPSE response from ç8 scenario 1: AID list `[A0000000031010]`,
    /// label "VISA", priority `01`.
    struct FixedResponses(Vec<Vec<u8>>, usize);

    impl Transceiver for FixedResponses {
        fn transceive(&mut self, _cmd: &CommandApdu) -> Result<crate::apdu::ResponseApdu, TransportError> {
            let raw = self.0[self.1].clone();
            self.1 += 1;
            Ok(crate::apdu::ResponseApdu::from_raw(&raw).unwrap())
        }
    }

    #[test]
    fn parses_ppse_scenario() {
        let full = hex::decode(
            "6F2E840E325041592E5359532E4444463031A51CBF0C1961174F07A000000003101050045649\
             53418701019000",
        )
        .unwrap();

        let mut transport = FixedResponses(vec![full], 0);
        let result = discover(&mut transport).unwrap();
        assert_eq!(result.applications.len(), 1);
        assert_eq!(result.applications[0].aid, vec![0xa0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10]);
        assert_eq!(result.applications[0].label, "VISA");
        assert_eq!(result.applications[0].priority, Some(0x01));
    }
}
