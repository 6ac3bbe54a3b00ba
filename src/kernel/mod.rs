//! Shared kernel state machine (ç4.E): `IDLE -> SELECT_APP -> GPO ->
//! READ_AFL -> ODA -> RESTRICTIONS -> CVM -> RISK -> GEN_AC_1 -> DONE`,
//! driven identically for all five schemes; per-scheme differences are
//! small hooks consulted along the way (ç4.E.6).

mod cvm_fastpath;
pub mod discover;
pub mod jcb;
pub mod mastercard;
pub mod oda;
pub mod unionpay;
pub mod visa;

use std::collections::HashMap;

use crate::apdu::{AcType, CommandApdu, ResponseApdu};
use crate::config::Config;
use crate::crypto::{CaKeyStore, CdcvmProvider, CryptoProvider};
use crate::cvm::{self, CvmList, CvmResult, EvalContext};
use crate::data_store::DataStore;
use crate::error::KernelError;
use crate::offline::{OfflineDecision, OfflineGate, OfflineTransaction};
use crate::outcome::{OfflineApproved, OnlineAuthorizationRequest, TerminalOutcome};
use crate::tlv::elements::Format;
use crate::tlv::{self, elements, Value};
use crate::transceiver::Transceiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Visa,
    Mastercard,
    Jcb,
    Discover,
    UnionPay,
}

impl Scheme {
    /// Identify a scheme from a SELECTed AID's RID prefix (ç4.E.6).
    pub fn for_aid(aid: &[u8]) -> Option<Scheme> {
        if visa::matches(aid) {
            Some(Scheme::Visa)
        } else if mastercard::matches(aid) {
            Some(Scheme::Mastercard)
        } else if jcb::matches(aid) {
            Some(Scheme::Jcb)
        } else if discover::matches(aid) {
            Some(Scheme::Discover)
        } else if unionpay::matches(aid) {
            Some(Scheme::UnionPay)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CryptogramType {
    Aac,
    Tc,
    Arqc,
    Aar,
}

fn cryptogram_type(cid: u8) -> CryptogramType {
    match cid >> 6 {
        0b00 => CryptogramType::Aac,
        0b01 => CryptogramType::Tc,
        0b10 => CryptogramType::Arqc,
        _ => CryptogramType::Aar,
    }
}

/// Application Interchange Profile, tag 0x82.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aip(pub u16);

impl Aip {
    pub fn supports_sda(self) -> bool {
        self.0 & 0x4000 != 0
    }
    pub fn supports_dda(self) -> bool {
        self.0 & 0x2000 != 0
    }
    pub fn cvm_supported(self) -> bool {
        self.0 & 0x1000 != 0
    }
    pub fn supports_cda(self) -> bool {
        self.0 & 0x0100 != 0
    }
    /// Discover D-PAS overloads this bit to flag MSD-only mode rather than
    /// full EMV mode (ç4.E.6).
    pub fn msd_mode(self) -> bool {
        self.0 & 0x8000 == 0
    }
    /// UnionPay qPBOC electronic-cash variant, AIP byte 2 bit 0x80.
    pub fn electronic_cash(self) -> bool {
        self.0 & 0x0080 != 0
    }
}

#[derive(Debug, Clone, Copy)]
struct AflEntry {
    sfi: u8,
    first_record: u8,
    last_record: u8,
    oda_records: u8,
}

fn parse_afl(raw: &[u8]) -> Vec<AflEntry> {
    raw.chunks(4)
        .filter(|c| c.len() == 4)
        .map(|c| AflEntry {
            sfi: c[0] >> 3,
            first_record: c[1],
            last_record: c[2],
            oda_records: c[3],
        })
        .collect()
}

pub struct TransactionParams {
    pub amount: u64,
    pub amount_other: u64,
    pub transaction_type: u8,
    pub transaction_date: [u8; 3],
    pub unpredictable_number: [u8; 4],
    /// Whether a host link is up for this transaction. SoftPOS never
    /// approves offline on its own initiative: with a network, GEN_AC_1
    /// always requests ARQC; without one, the offline gate is consulted and
    /// a TC is requested only if it allows (ç4.E.7).
    pub network_available: bool,
}

/// Everything the driver accumulates across phases; deliberately public so
/// per-scheme hooks and tests can inspect it.
pub struct KernelContext<'a> {
    pub config: &'a Config,
    pub scheme: Scheme,
    pub aid: Vec<u8>,
    pub terminal_data: DataStore,
    pub card_data: DataStore,
    pub tvr: [u8; 5],
    pub tsi: [u8; 2],
    pub aip: Aip,
    pub oda_input: Vec<u8>,
}

const TAG_PDOL: u32 = 0x9f38;
const TAG_CDOL1: u32 = 0x8c;
const TAG_AFL: u32 = 0x94;
const TAG_AIP_F2: u32 = 0x82;
const TAG_PAN: u32 = 0x5a;
pub(super) const TAG_CA_KEY_INDEX: u32 = 0x8f;
pub(super) const TAG_ISSUER_CERT: u32 = 0x90;
pub(super) const TAG_SSAD: u32 = 0x93;
pub(super) const TAG_ICC_PK_CERT: u32 = 0x9f46;
const TAG_EXPIRY: u32 = 0x5f24;
const TAG_EFFECTIVE: u32 = 0x5f25;
const TAG_CVM_LIST: u32 = 0x8e;
pub(super) const TAG_CTQ: u32 = 0x9f6c;

/// Critical tags the terminal must be able to supply before GPO (ç4.C).
const CRITICAL_TAGS: &[u32] = &[0x9f02, 0x9f03, 0x9f1a, 0x5f2a, 0x9a, 0x9c, 0x9f37, 0x9f66];

pub fn drive(
    transceiver: &mut dyn Transceiver,
    crypto: &dyn CryptoProvider,
    ca_keys: &dyn CaKeyStore,
    cdcvm: &mut dyn CdcvmProvider,
    offline_gate: &OfflineGate,
    config: &Config,
    scheme: Scheme,
    aid: &[u8],
    params: TransactionParams,
) -> TerminalOutcome {
    let mut ctx = KernelContext {
        config,
        scheme,
        aid: aid.to_vec(),
        terminal_data: DataStore::new(),
        card_data: DataStore::new(),
        tvr: [0; 5],
        tsi: [0; 2],
        aip: Aip::default(),
        oda_input: Vec::new(),
    };
    seed_terminal_data(&mut ctx, &params);

    match run(&mut ctx, transceiver, crypto, ca_keys, cdcvm, offline_gate, &params) {
        Ok(outcome) => outcome,
        Err(KernelError::Transport(_)) => TerminalOutcome::end_application("transceive failed"),
        Err(err) => TerminalOutcome::end_application(err.to_string()),
    }
}

fn seed_terminal_data(ctx: &mut KernelContext, params: &TransactionParams) {
    let c = ctx.config;
    ctx.terminal_data.set(0x9f1a, c.terminal_country_code.to_vec());
    ctx.terminal_data.set(0x5f2a, c.transaction_currency_code.to_vec());
    ctx.terminal_data.set(0x9f35, vec![c.terminal_type]);
    ctx.terminal_data
        .set(0x9f33, c.terminal_capabilities.to_vec());
    ctx.terminal_data
        .set(0x9f40, c.additional_terminal_capabilities.to_vec());
    ctx.terminal_data.set(0x9f1e, c.ifd_serial_number.to_vec());
    ctx.terminal_data.set(0x9f15, c.merchant_category_code.to_vec());
    ctx.terminal_data.set(0x9f66, c.ttq.to_vec());
    ctx.terminal_data
        .set(0x9f09, c.application_version_number.to_vec());
    ctx.terminal_data.set(0x9f1c, c.terminal_id.to_vec());
    ctx.terminal_data.set(0x9f16, c.merchant_id.to_vec());
    ctx.terminal_data.set(0x9f02, crate::util::bcd_encode(params.amount, 6));
    ctx.terminal_data
        .set(0x9f03, crate::util::bcd_encode(params.amount_other, 6));
    ctx.terminal_data.set(0x9a, params.transaction_date.to_vec());
    ctx.terminal_data.set(0x9c, vec![params.transaction_type]);
    ctx.terminal_data
        .set(0x9f37, params.unpredictable_number.to_vec());
    ctx.terminal_data.set(0x9f53, vec![b'0']);
}

fn run(
    ctx: &mut KernelContext,
    transceiver: &mut dyn Transceiver,
    crypto: &dyn CryptoProvider,
    ca_keys: &dyn CaKeyStore,
    cdcvm: &mut dyn CdcvmProvider,
    offline_gate: &OfflineGate,
    params: &TransactionParams,
) -> Result<TerminalOutcome, KernelError> {
    if let Some(outcome) = select_app(ctx, transceiver)? {
        return Ok(outcome);
    }
    if let Some(outcome) = gpo(ctx, transceiver)? {
        return Ok(outcome);
    }

    // Discover's MSD path skips READ_AFL/ODA entirely once GPO has handed
    // over Track 2 directly.
    let msd_shortcut = ctx.scheme == Scheme::Discover && ctx.aip.msd_mode();
    if !msd_shortcut {
        read_afl(ctx, transceiver)?;
        oda::run(ctx, ca_keys, crypto);
        if let Some(outcome) = restrictions(ctx, params) {
            return Ok(outcome);
        }
    }

    let cvm_result = cvm_phase(ctx, params, cdcvm);
    gen_ac_1(ctx, transceiver, offline_gate, params, cvm_result)
}

fn select_app(
    ctx: &mut KernelContext,
    transceiver: &mut dyn Transceiver,
) -> Result<Option<TerminalOutcome>, KernelError> {
    let cmd = CommandApdu::select(&ctx.aid);
    let resp = transceiver.transceive(&cmd)?;
    if !resp.is_success() {
        return Ok(Some(TerminalOutcome::end_application(format!(
            "SELECT failed: {}",
            resp.status_description()
        ))));
    }

    // absorb_fields recurses into every constructed template, so the FCI's
    // nested proprietary data (PDOL, app label, preferred name, ...) ends up
    // flattened into card_data in one pass.
    let fields = tlv::read_all(&resp.data)?;
    ctx.card_data.absorb_fields(&fields);
    Ok(None)
}

fn value_for_tag(tag: u32, bytes: &[u8]) -> Value {
    match elements::lookup(tag).map(|info| info.format) {
        Some(Format::Alphabetic) => Value::Alphabetic(String::from_utf8_lossy(bytes).into_owned()),
        Some(Format::Alphanumeric) => {
            Value::Alphanumeric(String::from_utf8_lossy(bytes).into_owned())
        }
        Some(Format::AlphanumericSpecial) => {
            Value::AlphanumericSpecial(String::from_utf8_lossy(bytes).into_owned())
        }
        Some(Format::Numeric) => {
            Value::Numeric(crate::util::bcd_decode(bytes).unwrap_or(0) as u128)
        }
        _ => Value::Binary(bytes.to_vec()),
    }
}

fn merged_values(ctx: &KernelContext, dol: &tlv::dol::Dol) -> HashMap<u32, Value> {
    let mut values = HashMap::new();
    for entry in dol.get_entries() {
        let Some(bytes) = ctx
            .terminal_data
            .get(entry.tag)
            .or_else(|| ctx.card_data.get(entry.tag))
        else {
            continue;
        };
        values.insert(entry.tag, value_for_tag(entry.tag, bytes));
    }
    values
}

fn build_pdol_data(ctx: &KernelContext) -> Result<Vec<u8>, KernelError> {
    let Some(pdol_raw) = ctx.card_data.get(TAG_PDOL) else {
        return Ok(Vec::new());
    };
    let dol = tlv::dol::Dol::try_from(pdol_raw)?;
    let values = merged_values(ctx, &dol);
    if let Err(tag) = dol.can_satisfy(&values) {
        return Err(KernelError::ConfigIncomplete(tag));
    }
    Ok(dol.encode(&values).to_vec())
}

fn gpo(
    ctx: &mut KernelContext,
    transceiver: &mut dyn Transceiver,
) -> Result<Option<TerminalOutcome>, KernelError> {
    for tag in CRITICAL_TAGS {
        if !ctx.terminal_data.contains(*tag) {
            return Err(KernelError::ConfigIncomplete(*tag));
        }
    }

    let pdol_data = build_pdol_data(ctx)?;
    let mut command_data = vec![0x83, pdol_data.len() as u8];
    command_data.extend_from_slice(&pdol_data);

    let cmd = CommandApdu::get_processing_options(&command_data);
    let resp = transceiver.transceive(&cmd)?;

    if resp.sw() == 0x6984 || resp.sw() == 0x6985 {
        return Ok(Some(TerminalOutcome::TryAnotherInterface));
    }
    if !resp.is_success() {
        return Ok(Some(TerminalOutcome::end_application(format!(
            "GPO failed: {}",
            resp.status_description()
        ))));
    }

    let fields = tlv::read_all(&resp.data)?;
    let mut aip_raw = None;
    let mut afl_raw = None;

    for field in &fields {
        match (field.tag, &field.value) {
            (0x80, Value::Binary(data)) => {
                if data.len() < 2 {
                    return Ok(Some(TerminalOutcome::end_application(
                        "GPO format 1 response too short",
                    )));
                }
                aip_raw = Some([data[0], data[1]]);
                afl_raw = Some(data[2..].to_vec());
            }
            (0x77, Value::Template(inner)) => {
                ctx.card_data.absorb_fields(inner);
                for f in inner {
                    if f.tag == TAG_AIP_F2 {
                        if let Value::Binary(b) = &f.value {
                            if b.len() == 2 {
                                aip_raw = Some([b[0], b[1]]);
                            }
                        }
                    }
                    if f.tag == TAG_AFL {
                        if let Value::Binary(b) = &f.value {
                            afl_raw = Some(b.clone());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let Some(aip_raw) = aip_raw else {
        return Ok(Some(TerminalOutcome::end_application(
            "GPO response missing AIP",
        )));
    };
    ctx.aip = Aip(u16::from_be_bytes(aip_raw));
    ctx.card_data.set(0x82, aip_raw.to_vec());
    if let Some(afl) = &afl_raw {
        ctx.card_data.set(TAG_AFL, afl.clone());
    }

    Ok(None)
}

fn read_afl(ctx: &mut KernelContext, transceiver: &mut dyn Transceiver) -> Result<(), KernelError> {
    let Some(afl_raw) = ctx.card_data.get(TAG_AFL).map(<[u8]>::to_vec) else {
        return Ok(());
    };
    for entry in parse_afl(&afl_raw) {
        for record in entry.first_record..=entry.last_record {
            let cmd = CommandApdu::read_record(entry.sfi, record);
            let resp = transceiver.transceive(&cmd)?;
            if !resp.is_success() {
                continue;
            }
            if entry.oda_records > 0 && record < entry.first_record + entry.oda_records {
                // SFI <= 10 contributes the record minus its outer tag+length
                // prefix to the ODA hash input; SFI 11+ contributes raw
                // bytes as-is (EMV Book 3 ç10.3).
                if entry.sfi <= 10 {
                    ctx.oda_input.extend_from_slice(strip_outer_tl(&resp.data));
                } else {
                    ctx.oda_input.extend_from_slice(&resp.data);
                }
            }
            if let Ok(fields) = tlv::read_all(&resp.data) {
                ctx.card_data.absorb_fields(&fields);
            }
        }
    }
    Ok(())
}

/// Strip a record's outer `70 LL` tag+length prefix, leaving the inner TLV
/// bytes that feed ODA hashing. `decoders::read_tl` is private to the `tlv`
/// module, so the tag/length grammar is re-derived locally here.
fn strip_outer_tl(raw: &[u8]) -> &[u8] {
    match tlv_tl(raw) {
        Ok((_, _, tl_len)) if tl_len <= raw.len() => &raw[tl_len..],
        _ => raw,
    }
}

fn tlv_tl(raw: &[u8]) -> Result<(u32, usize, usize), tlv::DecodeError> {
    let first = *raw.first().ok_or(tlv::DecodeError::MessageTooShort(1, 0))?;
    let tag_len = if first & 0x1f == 0x1f { 2 } else { 1 };
    if raw.len() <= tag_len {
        return Err(tlv::DecodeError::MessageTooShort(tag_len + 1, raw.len()));
    }
    let len_byte = raw[tag_len];
    let (len, len_len) = if len_byte & 0x80 == 0 {
        (len_byte as usize, 1)
    } else {
        let n = (len_byte & 0x7f) as usize;
        let mut len = 0usize;
        for &b in &raw[tag_len + 1..tag_len + 1 + n] {
            len = (len << 8) | b as usize;
        }
        (len, n + 1)
    };
    Ok((0, len, tag_len + len_len))
}

fn restrictions(ctx: &mut KernelContext, params: &TransactionParams) -> Option<TerminalOutcome> {
    if let Some(effective) = ctx.card_data.get(TAG_EFFECTIVE).map(<[u8]>::to_vec) {
        if effective.len() == 3 && params.transaction_date.as_slice() < effective.as_slice() {
            ctx.tvr[1] |= 0x10;
        }
    }
    if let Some(expiry) = ctx.card_data.get(TAG_EXPIRY).map(<[u8]>::to_vec) {
        if expiry.len() == 3 && expiry.as_slice() < params.transaction_date.as_slice() {
            ctx.tvr[1] |= 0x20;
            return Some(TerminalOutcome::declined("Card expired"));
        }
    }
    None
}

fn cvm_phase(
    ctx: &mut KernelContext,
    params: &TransactionParams,
    cdcvm: &mut dyn CdcvmProvider,
) -> CvmResult {
    if let Some(result) = cvm_fastpath::check(ctx, params) {
        return result;
    }
    if params.amount <= ctx.config.cvm_required_limit {
        return CvmResult::no_cvm();
    }

    let Some(cvm_list_raw) = ctx.card_data.get(TAG_CVM_LIST).map(<[u8]>::to_vec) else {
        return if ctx.config.allow_no_cvm {
            CvmResult::no_cvm()
        } else {
            CvmResult::failed()
        };
    };
    let Ok(list) = CvmList::parse(&cvm_list_raw) else {
        return CvmResult::failed();
    };
    let eval_ctx = EvalContext {
        amount: params.amount,
        amount_other: params.amount_other,
        is_cash: params.transaction_type == 0x01,
        is_cashback: params.transaction_type == 0x09,
        terminal_supports_cvm: ctx.aip.cvm_supported(),
    };
    cvm::evaluate(&list, &eval_ctx, ctx.config, cdcvm)
}

fn default_cdol1_data(ctx: &KernelContext, cvm_result: CvmResult) -> Vec<u8> {
    // Open question (c): decided in DESIGN.md to fabricate a best-effort
    // concatenation rather than fail outright, so a conforming card can
    // still complete GENERATE AC when CDOL1 itself is absent.
    let mut data = Vec::new();
    data.extend_from_slice(ctx.terminal_data.get(0x9f02).unwrap_or(&[0; 6]));
    data.extend_from_slice(ctx.terminal_data.get(0x9f03).unwrap_or(&[0; 6]));
    data.extend_from_slice(ctx.terminal_data.get(0x9f1a).unwrap_or(&[0; 2]));
    data.extend_from_slice(&ctx.tvr);
    data.extend_from_slice(ctx.terminal_data.get(0x5f2a).unwrap_or(&[0; 2]));
    data.extend_from_slice(ctx.terminal_data.get(0x9a).unwrap_or(&[0; 3]));
    data.extend_from_slice(ctx.terminal_data.get(0x9c).unwrap_or(&[0]));
    data.extend_from_slice(ctx.terminal_data.get(0x9f37).unwrap_or(&[0; 4]));
    data.extend_from_slice(ctx.terminal_data.get(0x9f35).unwrap_or(&[0]));
    data.extend_from_slice(&cvm_result.to_bytes());
    data
}

fn gen_ac_1(
    ctx: &mut KernelContext,
    transceiver: &mut dyn Transceiver,
    offline_gate: &OfflineGate,
    params: &TransactionParams,
    cvm_result: CvmResult,
) -> Result<TerminalOutcome, KernelError> {
    let cdol_data = match ctx.card_data.get(TAG_CDOL1) {
        Some(cdol_raw) => {
            let dol = tlv::dol::Dol::try_from(cdol_raw)?;
            let mut values = merged_values(ctx, &dol);
            values.insert(0x9f34, Value::Binary(cvm_result.to_bytes().to_vec()));
            values.insert(0x95, Value::Binary(ctx.tvr.to_vec()));
            dol.encode(&values).to_vec()
        }
        None => default_cdol1_data(ctx, cvm_result),
    };

    // SoftPOS never approves offline on its own initiative: with a network
    // link up, every transaction requests ARQC. The offline gate only comes
    // into play when there is no network at all, and even then a TC is
    // requested only if the gate allows it.
    let pan_hash = pan_hash(ctx);
    let ac_type = if params.network_available {
        AcType::Arqc
    } else {
        match offline_gate.should_force_online(pan_hash, params.amount) {
            OfflineDecision::AllowOffline => AcType::Tc,
            OfflineDecision::ForceOnline { .. } => AcType::Arqc,
        }
    };

    let cmd = CommandApdu::generate_ac(ac_type, ctx.aip.supports_cda(), &cdol_data);
    let resp = transceiver.transceive(&cmd)?;
    if !resp.is_success() {
        return Ok(TerminalOutcome::end_application(format!(
            "GENERATE AC failed: {}",
            resp.status_description()
        )));
    }

    let (cid, atc, cryptogram, iad) = parse_gen_ac_response(&resp)?;
    ctx.card_data.set(0x9f27, vec![cid]);
    ctx.card_data.set(0x9f36, atc.to_vec());
    ctx.card_data.set(0x9f26, cryptogram.clone());
    ctx.card_data.set(0x9f10, iad.clone());

    Ok(match cryptogram_type(cid) {
        CryptogramType::Aac => {
            offline_gate.record_online_transaction(pan_hash, false);
            TerminalOutcome::declined("Card declined (AAC)")
        }
        CryptogramType::Tc => {
            offline_gate.record_offline_transaction(
                pan_hash,
                params.amount,
                OfflineTransaction::new(
                    pan_hash,
                    params.amount,
                    ctx.config.transaction_currency_code,
                    cryptogram.clone(),
                    Vec::new(),
                ),
            );
            TerminalOutcome::Approved(OfflineApproved {
                transaction_certificate: cryptogram,
                atc,
            })
        }
        CryptogramType::Arqc => TerminalOutcome::OnlineAuthorizationRequest(build_online_request(
            ctx, params, cvm_result, cryptogram, atc, iad,
        )),
        CryptogramType::Aar => TerminalOutcome::TryAnotherInterface,
    })
}

fn parse_gen_ac_response(
    resp: &ResponseApdu,
) -> Result<(u8, [u8; 2], Vec<u8>, Vec<u8>), KernelError> {
    let fields = tlv::read_all(&resp.data)?;

    if let Some(field) = fields.iter().find(|f| f.tag == 0x80) {
        if let Value::Binary(data) = &field.value {
            if data.len() < 11 {
                return Err(KernelError::Protocol(
                    "GENERATE AC format 1 response too short".to_string(),
                ));
            }
            let cid = data[0];
            let atc = [data[1], data[2]];
            let cryptogram = data[3..11].to_vec();
            let iad = data[11..].to_vec();
            return Ok((cid, atc, cryptogram, iad));
        }
    }

    let cid = *fields
        .iter()
        .find(|f| f.tag == 0x9f27)
        .and_then(|f| f.value.as_binary())
        .and_then(|b| b.first())
        .ok_or_else(|| KernelError::Protocol("GENERATE AC response missing CID".to_string()))?;
    let atc_bytes = fields
        .iter()
        .find(|f| f.tag == 0x9f36)
        .and_then(|f| f.value.as_binary())
        .ok_or_else(|| KernelError::Protocol("GENERATE AC response missing ATC".to_string()))?;
    let cryptogram = fields
        .iter()
        .find(|f| f.tag == 0x9f26)
        .and_then(|f| f.value.as_binary())
        .ok_or_else(|| {
            KernelError::Protocol("GENERATE AC response missing cryptogram".to_string())
        })?
        .to_vec();
    let iad = fields
        .iter()
        .find(|f| f.tag == 0x9f10)
        .and_then(|f| f.value.as_binary())
        .unwrap_or(&[])
        .to_vec();

    let atc: [u8; 2] = atc_bytes
        .try_into()
        .map_err(|_| KernelError::Protocol("malformed ATC".to_string()))?;
    Ok((cid, atc, cryptogram, iad))
}

fn pan_hash(ctx: &KernelContext) -> [u8; 32] {
    use sha1::{Digest, Sha1};
    let pan = ctx.card_data.get(TAG_PAN).unwrap_or(&[]);
    let digest = Sha1::digest(pan);
    let mut out = [0u8; 32];
    out[..20].copy_from_slice(&digest);
    out
}

fn build_online_request(
    ctx: &KernelContext,
    params: &TransactionParams,
    cvm_result: CvmResult,
    cryptogram: Vec<u8>,
    atc: [u8; 2],
    iad: Vec<u8>,
) -> OnlineAuthorizationRequest {
    let pan = ctx.card_data.get(TAG_PAN).unwrap_or(&[]);
    let masked_pan = crate::secure::MaskedPan(crate::secure::SensitiveBuffer::new(pan.to_vec()));

    OnlineAuthorizationRequest {
        masked_pan: masked_pan.to_string(),
        application_cryptogram: cryptogram,
        atc,
        issuer_application_data: iad,
        tvr: ctx.tvr,
        cvm_results: cvm_result,
        aid: ctx.aid.clone(),
        unpredictable_number: params.unpredictable_number,
        transaction_date: params.transaction_date,
        transaction_type: params.transaction_type,
        amount_authorised: params.amount,
        currency_code: ctx.config.transaction_currency_code,
        aip: ctx.aip.0.to_be_bytes(),
        terminal_country_code: ctx.config.terminal_country_code,
        terminal_capabilities: ctx.config.terminal_capabilities,
        terminal_type: ctx.config.terminal_type,
        ifd_serial_number: ctx.config.ifd_serial_number,
        transaction_sequence_counter: ctx
            .terminal_data
            .get(0x9f41)
            .map(<[u8]>::to_vec)
            .unwrap_or_default(),
        amount_other: params.amount_other,
        pan_sequence_number: ctx
            .card_data
            .get(0x5f34)
            .and_then(|b| b.first())
            .copied()
            .unwrap_or(0),
    }
}
