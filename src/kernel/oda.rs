//! Offline Data Authentication (EMV Book 3 ç10): CDA, DDA, SDA, in that
//! preference order. CDA is never checked here — its signature covers the
//! GENERATE AC response itself, so it is deferred to `gen_ac_1` and only
//! requested via the GENERATE AC command's `cda` flag.

use super::{KernelContext, TAG_CA_KEY_INDEX, TAG_ICC_PK_CERT, TAG_ISSUER_CERT, TAG_SSAD};
use crate::crypto::{CaKeyStore, CryptoProvider};

const TVR_SDA_FAILED: u8 = 0x40;
const TVR_DDA_FAILED: u8 = 0x08;
const TVR_ODA_NOT_PERFORMED: u8 = 0x80;

/// Runs after READ_AFL, before RESTRICTIONS. Sets TVR byte 1 bits on
/// failure or absence; never returns an error, since a failed ODA is a
/// TVR condition for RESTRICTIONS/risk management to act on, not a fatal
/// transaction error.
pub fn run(ctx: &mut KernelContext, ca_keys: &dyn CaKeyStore, crypto: &dyn CryptoProvider) {
    if ctx.aip.supports_cda() {
        // Deferred to GENERATE AC.
        return;
    }

    let Some(rid) = rid_of(&ctx.aid) else {
        ctx.tvr[0] |= TVR_ODA_NOT_PERFORMED;
        return;
    };
    let Some(index) = ctx.card_data.get(TAG_CA_KEY_INDEX).and_then(|b| b.first()).copied() else {
        ctx.tvr[0] |= TVR_ODA_NOT_PERFORMED;
        return;
    };
    let Some(ca_key) = ca_keys.get(&rid, index) else {
        ctx.tvr[0] |= TVR_ODA_NOT_PERFORMED;
        return;
    };

    if ctx.aip.supports_dda() {
        let Some(icc_cert) = ctx.card_data.get(TAG_ICC_PK_CERT).map(<[u8]>::to_vec) else {
            ctx.tvr[0] |= TVR_DDA_FAILED;
            return;
        };
        if crypto
            .verify_dda(&ca_key, &icc_cert, &ctx.oda_input)
            .is_err()
        {
            ctx.tvr[0] |= TVR_DDA_FAILED;
        }
        return;
    }

    if ctx.aip.supports_sda() {
        let Some(issuer_cert) = ctx.card_data.get(TAG_ISSUER_CERT).map(<[u8]>::to_vec) else {
            ctx.tvr[0] |= TVR_SDA_FAILED;
            return;
        };
        let Some(ssad) = ctx.card_data.get(TAG_SSAD).map(<[u8]>::to_vec) else {
            ctx.tvr[0] |= TVR_SDA_FAILED;
            return;
        };
        if crypto.verify_sda(&ca_key, &issuer_cert, &ssad).is_err() {
            ctx.tvr[0] |= TVR_SDA_FAILED;
        }
        return;
    }

    ctx.tvr[0] |= TVR_ODA_NOT_PERFORMED;
}

fn rid_of(aid: &[u8]) -> Option<[u8; 5]> {
    aid.get(..5)?.try_into().ok()
}
