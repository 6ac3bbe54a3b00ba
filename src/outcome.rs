//! The sole external artifact of a transaction (ç6, ç9): a tagged outcome,
//! never a polymorphic "result" object with optional fields.

use crate::cvm::CvmResult;

#[derive(Debug, Clone)]
pub struct OnlineAuthorizationRequest {
    /// First-six/last-four masked, never the full PAN.
    pub masked_pan: String,
    pub application_cryptogram: Vec<u8>,
    pub atc: [u8; 2],
    pub issuer_application_data: Vec<u8>,
    pub tvr: [u8; 5],
    pub cvm_results: CvmResult,
    pub aid: Vec<u8>,
    pub unpredictable_number: [u8; 4],
    pub transaction_date: [u8; 3],
    pub transaction_type: u8,
    pub amount_authorised: u64,
    pub currency_code: [u8; 2],
    pub aip: [u8; 2],
    pub terminal_country_code: [u8; 2],
    pub terminal_capabilities: [u8; 3],
    pub terminal_type: u8,
    pub ifd_serial_number: [u8; 8],
    pub transaction_sequence_counter: Vec<u8>,
    pub amount_other: u64,
    pub pan_sequence_number: u8,
}

impl OnlineAuthorizationRequest {
    /// The ICC TLV string tag order required by ç6/ç8 scenario 6: 9F26,
    /// 9F27, 9F10, 9F37, 9F36, 95, 9A, 9C, 9F02, 5F2A, 82, 9F1A, 9F34,
    /// 9F33, 9F35, 9F1E, 9F53, 84, 9F09, 9F41, 9F03, 5F34.
    pub const ICC_TAG_ORDER: &'static [u32] = &[
        0x9f26, 0x9f27, 0x9f10, 0x9f37, 0x9f36, 0x95, 0x9a, 0x9c, 0x9f02, 0x5f2a, 0x82, 0x9f1a,
        0x9f34, 0x9f33, 0x9f35, 0x9f1e, 0x9f53, 0x84, 0x9f09, 0x9f41, 0x9f03, 0x5f34,
    ];
}

#[derive(Debug, Clone)]
pub struct OfflineApproved {
    pub transaction_certificate: Vec<u8>,
    pub atc: [u8; 2],
}

#[derive(Debug, Clone)]
pub struct Declined {
    pub reason: String,
    pub aac: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub enum TerminalOutcome {
    OnlineAuthorizationRequest(OnlineAuthorizationRequest),
    Approved(OfflineApproved),
    Declined(Declined),
    TryAnotherInterface,
    EndApplication(String),
    TryAgain,
}

impl TerminalOutcome {
    pub fn declined(reason: impl Into<String>) -> Self {
        TerminalOutcome::Declined(Declined {
            reason: reason.into(),
            aac: None,
        })
    }

    pub fn end_application(reason: impl Into<String>) -> Self {
        TerminalOutcome::EndApplication(reason.into())
    }
}
