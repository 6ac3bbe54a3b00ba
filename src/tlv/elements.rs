//! The static EMV tag registry: immutable, registry-scoped metadata keyed by
//! tag id. Unknown ids simply aren't present here — the codec treats that as
//! a "null tag" and decodes the bytes anyway, it never fails parsing just
//! because a tag is unrecognised.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::Display;

/// Where a data element is expected to originate from.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Source {
    Card,
    Terminal,
    Issuer,
}

/// EMV 4.3 Book 3 ç4.3 data element formats.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Format {
    Binary,
    /// `N` — numeric, packed BCD, right-justified.
    Numeric,
    /// `CN` — compressed numeric, packed BCD, left-justified, 0xF padded.
    CompressedNumeric,
    Alphabetic,
    Alphanumeric,
    AlphanumericSpecial,
    /// A DOL value (PDOL/CDOL/DDOL/TDOL) is itself tag+length metadata, not
    /// card data proper, but it shares the tag-registry lookup path.
    Dol,
    Constructed,
}

#[derive(Copy, Clone, Debug)]
pub struct TagInfo {
    pub tag: u32,
    pub name: &'static str,
    pub short_name: Option<&'static str>,
    pub source: Source,
    pub format: Format,
    pub min_len: usize,
    pub max_len: usize,
}

impl Display for TagInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TagInfo {{ tag: {:#06x}, name: \"{}\", format: {:?} }}",
            self.tag, self.name, self.format
        )
    }
}

macro_rules! tags_map {
    [$($tag:expr => $name:tt $(($short_name:tt))?: $source:ident, $fmt:ident, $min:expr, $max:expr,)*] => {
        HashMap::from([$(
            (
                $tag,
                TagInfo {
                    tag: $tag,
                    name: $name,
                    short_name: optional!($($short_name)*),
                    source: Source::$source,
                    format: Format::$fmt,
                    min_len: $min,
                    max_len: $max,
                }
            )
        ,)*])
    };
}
macro_rules! optional {
    () => {
        None
    };
    ($($some:tt)*) => {
        Some($($some)*)
    };
}

lazy_static! {
    pub static ref TAGS: HashMap<u32, TagInfo> = tags_map![
        0x0042 => "Issuer Identification Number (IIN)": Card, Numeric, 3, 6,
        0x004f => "Application Dedicated File (ADF) Name": Card, Binary, 5, 16,
        0x0050 => "Application Label": Card, AlphanumericSpecial, 1, 16,
        0x0056 => "Track 1 Data": Card, Binary, 0, 76,
        0x0057 => "Track 2 Equivalent Data": Card, Binary, 0, 19,
        0x005a => "Application Primary Account Number (PAN)" ("PAN"): Card, CompressedNumeric, 1, 10,
        0x0061 => "Application Template": Card, Constructed, 0, 0xff,
        0x006f => "File Control Information (FCI) Template": Card, Constructed, 0, 0xff,
        0x0070 => "READ RECORD Response Message Template": Card, Constructed, 0, 0xff,
        0x0071 => "Issuer Script Template 1": Issuer, Constructed, 0, 0xff,
        0x0072 => "Issuer Script Template 2": Issuer, Constructed, 0, 0xff,
        0x0073 => "Directory Discretionary Template": Card, Constructed, 0, 0xff,
        0x0077 => "Response Message Template Format 2": Card, Constructed, 0, 0xff,
        0x0080 => "Response Message Template Format 1": Card, Binary, 2, 0xff,
        0x0081 => "Amount, Authorised (Binary)": Terminal, Binary, 4, 4,
        0x0082 => "Application Interchange Profile": Card, Binary, 2, 2,
        0x0083 => "Command Template": Terminal, Binary, 0, 0xff,
        0x0084 => "Dedicated File (DF) Name": Card, Binary, 5, 16,
        0x0086 => "Issuer Script Command": Issuer, Binary, 0, 261,
        0x0087 => "Application Priority Indicator": Card, Binary, 1, 1,
        0x0088 => "Short File Identifier (SFI)": Card, Binary, 1, 1,
        0x0089 => "Authorisation Code": Issuer, Binary, 6, 6,
        0x008a => "Authorisation Response Code": Issuer, Alphanumeric, 2, 2,
        0x008c => "Card Risk Management Data Object List 1 (CDOL1)": Card, Dol, 0, 0xff,
        0x008d => "Card Risk Management Data Object List 2 (CDOL2)": Card, Dol, 0, 0xff,
        0x008e => "Cardholder Verification Method (CVM) List": Card, Binary, 8, 0xff,
        0x008f => "Certification Authority Public Key Index": Card, Binary, 1, 1,
        0x0090 => "Issuer Public Key Certificate": Card, Binary, 0, 248,
        0x0091 => "Issuer Authentication Data": Issuer, Binary, 8, 16,
        0x0092 => "Issuer Public Key Remainder": Card, Binary, 0, 0xff,
        0x0093 => "Signed Static Application Data": Card, Binary, 0, 248,
        0x0094 => "Application File Locator (AFL)": Card, Binary, 4, 252,
        0x0095 => "Terminal Verification Results": Terminal, Binary, 5, 5,
        0x0097 => "Transaction Certificate Data Object List (TDOL)": Issuer, Dol, 0, 0xff,
        0x0098 => "Transaction Certificate (TC) Hash Value": Card, Binary, 20, 20,
        0x009a => "Transaction Date": Terminal, Numeric, 3, 3,
        0x009b => "Transaction Status Information": Terminal, Binary, 2, 2,
        0x009c => "Transaction Type": Terminal, Numeric, 1, 1,
        0x009d => "Directory Definition File (DDF) Name": Card, Binary, 5, 16,
        0x00a5 => "File Control Information (FCI) Proprietary Template": Card, Constructed, 0, 0xff,
        0x5f20 => "Cardholder Name": Card, AlphanumericSpecial, 2, 26,
        0x5f24 => "Application Expiration Date": Card, Numeric, 3, 3,
        0x5f25 => "Application Effective Date": Card, Numeric, 3, 3,
        0x5f28 => "Issuer Country Code": Card, Numeric, 2, 2,
        0x5f2a => "Transaction Currency Code": Terminal, Numeric, 2, 2,
        0x5f2d => "Language Preference": Card, Alphanumeric, 2, 8,
        0x5f30 => "Service Code": Card, Numeric, 2, 2,
        0x5f34 => "Application PAN Sequence Number": Card, Numeric, 1, 1,
        0x5f36 => "Transaction Currency Exponent": Terminal, Numeric, 1, 1,
        0x5f50 => "Issuer URL": Issuer, Binary, 0, 0xff,
        0x5f53 => "International Bank Account Number (IBAN)": Card, Binary, 1, 34,
        0x5f54 => "Bank Identifier Code (BIC)": Card, Binary, 8, 11,
        0x5f55 => "Issuer Country Code (alpha2 format)": Card, Alphabetic, 2, 2,
        0x5f56 => "Issuer Country Code (alpha3 format)": Card, Alphabetic, 3, 3,
        0x5f57 => "Account Type": Card, Numeric, 1, 1,
        0x9f01 => "Acquirer Identifier": Terminal, Numeric, 6, 6,
        0x9f02 => "Amount, Authorised (Numeric)": Terminal, Numeric, 6, 6,
        0x9f03 => "Amount, Other (Numeric)": Terminal, Numeric, 6, 6,
        0x9f04 => "Amount, Other (Binary)": Terminal, Binary, 4, 4,
        0x9f05 => "Application Discretionary Data": Card, Binary, 1, 32,
        0x9f06 => "Application Identifier (AID) - terminal": Terminal, Binary, 5, 16,
        0x9f07 => "Application Usage Control": Card, Binary, 2, 2,
        0x9f08 => "Application Version Number (card)": Card, Binary, 2, 2,
        0x9f09 => "Application Version Number (terminal)": Terminal, Binary, 2, 2,
        0x9f0b => "Cardholder Name Extended": Card, AlphanumericSpecial, 27, 45,
        0x9f0d => "Issuer Action Code - Default": Issuer, Binary, 5, 5,
        0x9f0e => "Issuer Action Code - Denial": Issuer, Binary, 5, 5,
        0x9f0f => "Issuer Action Code - Online": Issuer, Binary, 5, 5,
        0x9f10 => "Issuer Application Data": Card, Binary, 0, 32,
        0x9f11 => "Issuer Code Table Index": Card, Numeric, 1, 1,
        0x9f12 => "Application Preferred Name": Card, AlphanumericSpecial, 1, 16,
        0x9f14 => "Lower Consecutive Offline Limit": Issuer, Binary, 1, 1,
        0x9f15 => "Merchant Category Code": Terminal, Numeric, 2, 2,
        0x9f16 => "Merchant Identifier": Terminal, Alphanumeric, 15, 15,
        0x9f17 => "Personal Identification Number (PIN) Try Counter": Card, Binary, 1, 1,
        0x9f18 => "Issuer Script Identifier": Issuer, Binary, 4, 4,
        0x9f1a => "Terminal Country Code": Terminal, Numeric, 2, 2,
        0x9f1b => "Terminal Floor Limit": Terminal, Binary, 4, 4,
        0x9f1c => "Terminal Identification": Terminal, Alphanumeric, 8, 8,
        0x9f1d => "Terminal Risk Management Data": Terminal, Binary, 1, 8,
        0x9f1e => "Interface Device (IFD) Serial Number": Terminal, Alphanumeric, 8, 8,
        0x9f1f => "Track 1 Discretionary Data": Card, Alphanumeric, 0, 0xff,
        0x9f20 => "Track 2 Discretionary Data": Card, CompressedNumeric, 0, 0xff,
        0x9f21 => "Transaction Time": Terminal, Numeric, 3, 3,
        0x9f22 => "Certification Authority Public Key Index (GP)": Terminal, Binary, 1, 1,
        0x9f23 => "Upper Consecutive Offline Limit": Issuer, Binary, 1, 1,
        0x9f26 => "Application Cryptogram": Card, Binary, 8, 8,
        0x9f27 => "Cryptogram Information Data": Card, Binary, 1, 1,
        0x9f2d => "ICC PIN Encipherment Public Key Certificate": Card, Binary, 0, 248,
        0x9f2e => "ICC PIN Encipherment Public Key Exponent": Card, Binary, 1, 3,
        0x9f2f => "ICC PIN Encipherment Public Key Remainder": Card, Binary, 0, 0xff,
        0x9f32 => "Issuer Public Key Exponent": Card, Binary, 1, 3,
        0x9f33 => "Terminal Capabilities": Terminal, Binary, 3, 3,
        0x9f34 => "Cardholder Verification Method (CVM) Results": Terminal, Binary, 3, 3,
        0x9f35 => "Terminal Type": Terminal, Numeric, 1, 1,
        0x9f36 => "Application Transaction Counter (ATC)": Card, Binary, 2, 2,
        0x9f37 => "Unpredictable Number": Terminal, Binary, 4, 4,
        0x9f38 => "Processing Options Data Object List (PDOL)": Card, Dol, 0, 0xff,
        0x9f39 => "Point-of-Service (POS) Entry Mode": Terminal, Numeric, 1, 1,
        0x9f3a => "Amount, Reference Currency": Terminal, Binary, 4, 4,
        0x9f3b => "Application Reference Currency": Card, Numeric, 2, 2,
        0x9f3c => "Transaction Reference Currency Code": Terminal, Numeric, 2, 2,
        0x9f3d => "Transaction Reference Currency Exponent": Terminal, Numeric, 1, 1,
        0x9f40 => "Additional Terminal Capabilities": Terminal, Binary, 5, 5,
        0x9f41 => "Transaction Sequence Counter": Terminal, Numeric, 2, 4,
        0x9f42 => "Application Currency Code": Card, Numeric, 2, 2,
        0x9f43 => "Application Reference Currency Exponent": Card, Numeric, 1, 1,
        0x9f44 => "Application Currency Exponent": Card, Numeric, 1, 1,
        0x9f45 => "Data Authentication Code": Card, Binary, 2, 2,
        0x9f46 => "ICC Public Key Certificate": Card, Binary, 0, 248,
        0x9f47 => "ICC Public Key Exponent": Card, Binary, 1, 3,
        0x9f48 => "ICC Public Key Remainder": Card, Binary, 0, 0xff,
        0x9f49 => "Dynamic Data Authentication Data Object List (DDOL)": Card, Dol, 0, 0xff,
        0x9f4a => "Static Data Authentication Tag List": Card, Binary, 1, 1,
        0x9f4b => "Signed Dynamic Application Data": Card, Binary, 0, 248,
        0x9f4c => "ICC Dynamic Number": Card, Binary, 2, 8,
        0x9f4d => "Log Entry": Card, Binary, 2, 2,
        0x9f4e => "Merchant Name and Location": Terminal, Alphanumeric, 0, 0xff,
        0x9f4f => "Log Format": Card, Binary, 0, 0xff,
        0x9f53 => "Transaction Category Code": Terminal, Alphanumeric, 1, 1,
        0x9f5a => "Application Program Identifier": Card, Binary, 0, 0xff,
        0x9f66 => "Terminal Transaction Qualifiers (TTQ)": Terminal, Binary, 4, 4,
        0x9f6c => "Card Transaction Qualifiers (CTQ)": Card, Binary, 2, 2,
        0x9f6e => "Form Factor Indicator / Third Party Data": Card, Binary, 0, 0xff,
        0xbf0c => "FCI Issuer Discretionary Data": Card, Constructed, 0, 0xff,
        0xdf8123 => "Mastercard Kernel Configuration: Floor Limit": Terminal, Binary, 4, 4,
        0xdf8124 => "Mastercard Kernel Configuration: CVM Required Limit": Terminal, Binary, 4, 4,
        0xdf8125 => "Mastercard Kernel Configuration: No CVM Required Limit": Terminal, Binary, 4, 4,
        0xdf8126 => "Mastercard Kernel Configuration: Contactless Transaction Limit": Terminal, Binary, 4, 4,
    ];
}

pub fn lookup(tag: u32) -> Option<&'static TagInfo> {
    TAGS.get(&tag)
}
