//! Per-scheme CVM fast path (ç4.E.6): Visa qVSDC, JCB J/Speedy and UnionPay
//! QuickPass all let the card assert CDCVM was already performed via the
//! Card Transaction Qualifiers (tag 0x9F6C) rather than making the terminal
//! walk the full CVM List. Mastercard and Discover don't have this tag and
//! always fall through to the generic CVM List walk.

use super::{KernelContext, Scheme, TransactionParams, TAG_CTQ};
use crate::cvm::CvmResult;

/// Returns `Some` if the fast path applies and short-circuits the generic
/// CVM List walk; `None` means fall through to `cvm::evaluate`.
pub fn check(ctx: &KernelContext, params: &TransactionParams) -> Option<CvmResult> {
    if !matches!(ctx.scheme, Scheme::Visa | Scheme::Jcb | Scheme::UnionPay) {
        return None;
    }
    let ctq = ctx.card_data.get(TAG_CTQ)?;
    let cdcvm_performed = ctq.first().is_some_and(|&b| b & 0x40 != 0);
    if cdcvm_performed && params.amount > ctx.config.cvm_required_limit {
        Some(CvmResult::cdcvm())
    } else {
        None
    }
}
