//! Terminal configuration, ç6's enumerated option list. A plain struct, not
//! a builder — the teacher never reaches for a builder crate — with
//! `Default` only where EMV itself specifies a hard default. Everything
//! else is mandatory construction: a misconfigured terminal fails to compile
//! a transaction rather than silently defaulting.

/// PIN block format used when online PIN is requested, ISO 9564-1.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PinBlockFormat {
    Format0,
    Format4,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// ISO 3166 numeric country code, e.g. 0x0840 for the US.
    pub terminal_country_code: [u8; 2],
    /// ISO 4217 numeric currency code, e.g. 0x0840 for USD.
    pub transaction_currency_code: [u8; 2],
    /// Terminal Type, tag 0x9F35.
    pub terminal_type: u8,
    /// Terminal Capabilities, tag 0x9F33.
    pub terminal_capabilities: [u8; 3],
    /// Additional Terminal Capabilities, tag 0x9F40.
    pub additional_terminal_capabilities: [u8; 5],
    /// Interface Device (IFD) Serial Number, tag 0x9F1E, 8 bytes.
    pub ifd_serial_number: [u8; 8],
    /// Merchant Category Code, tag 0x9F15.
    pub merchant_category_code: [u8; 2],
    /// Terminal Transaction Qualifiers, tag 0x9F66.
    pub ttq: [u8; 4],
    /// Application version number sent to the card, tag 0x9F09. EMV fixes
    /// this at `00 02` absent a scheme-specific override.
    pub application_version_number: [u8; 2],
    pub acquirer_id: Vec<u8>,
    /// Terminal Identification, tag 0x9F1C, 8 alphanumeric bytes.
    pub terminal_id: [u8; 8],
    /// Merchant Identifier, tag 0x9F16, 15 alphanumeric bytes.
    pub merchant_id: [u8; 15],
    pub cvm_required_limit: u64,
    pub contactless_transaction_limit: u64,
    pub floor_limit: u64,
    /// Offline gate base velocity-check probability, 0..=100.
    pub random_selection_threshold: u8,
    pub allow_no_cvm: bool,
    pub allow_signature: bool,
    pub allow_device_credential: bool,
    pub online_pin_supported: bool,
    pub pin_block_format: PinBlockFormat,
    pub cdcvm_prompt_text: String,
    pub signature_prompt_text: String,
}

impl Default for Config {
    /// Only the fields EMV itself hardcodes (application version) get a
    /// default; every other field must be supplied by the integrator.
    fn default() -> Self {
        Config {
            terminal_country_code: [0, 0],
            transaction_currency_code: [0, 0],
            terminal_type: 0,
            terminal_capabilities: [0, 0, 0],
            additional_terminal_capabilities: [0, 0, 0, 0, 0],
            ifd_serial_number: [0; 8],
            merchant_category_code: [0, 0],
            ttq: [0, 0, 0, 0],
            application_version_number: [0x00, 0x02],
            acquirer_id: Vec::new(),
            terminal_id: [0x20; 8],
            merchant_id: [0x20; 15],
            cvm_required_limit: 0,
            contactless_transaction_limit: 0,
            floor_limit: 0,
            random_selection_threshold: 0,
            allow_no_cvm: false,
            allow_signature: false,
            allow_device_credential: false,
            online_pin_supported: false,
            pin_block_format: PinBlockFormat::Format0,
            cdcvm_prompt_text: String::new(),
            signature_prompt_text: String::new(),
        }
    }
}
