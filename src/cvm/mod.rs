//! Cardholder Verification Method engine (ç4.F): parse the CVM List and
//! evaluate its rules in order against amount/config/card flags.

use crate::config::Config;
use crate::crypto::{CdcvmProvider, CdcvmResult};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CvmRule {
    pub method: u8,
    pub continue_on_fail: bool,
    pub condition: u8,
}

impl CvmRule {
    fn from_bytes(b: [u8; 2]) -> CvmRule {
        CvmRule {
            method: b[0] & 0x3f,
            continue_on_fail: b[0] & 0x40 != 0,
            condition: b[1],
        }
    }
}

#[derive(Debug, Clone)]
pub struct CvmList {
    pub amount_x: u32,
    pub amount_y: u32,
    pub rules: Vec<CvmRule>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CvmListError {
    TooShort,
    TrailingByte,
}

impl CvmList {
    pub fn parse(raw: &[u8]) -> Result<CvmList, CvmListError> {
        if raw.len() < 8 {
            return Err(CvmListError::TooShort);
        }
        let amount_x = u32::from_be_bytes(raw[0..4].try_into().unwrap());
        let amount_y = u32::from_be_bytes(raw[4..8].try_into().unwrap());
        let rule_bytes = &raw[8..];
        if rule_bytes.len() % 2 != 0 {
            return Err(CvmListError::TrailingByte);
        }
        let rules = rule_bytes
            .chunks(2)
            .map(|c| CvmRule::from_bytes([c[0], c[1]]))
            .collect();
        Ok(CvmList {
            amount_x,
            amount_y,
            rules,
        })
    }
}

/// `{Success(method, bytes), Failed(reason, bytes), NoCvmPerformed}` (ç9),
/// encoded the way CVM Results (tag 0x9F34) actually lays it out on the
/// wire: method byte, condition byte, result byte (0x00 unknown/failed,
/// 0x01 failed, 0x02 succeeded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvmResult {
    pub method: u8,
    pub condition: u8,
    pub succeeded: bool,
}

impl CvmResult {
    pub fn to_bytes(self) -> [u8; 3] {
        [self.method, self.condition, if self.succeeded { 0x02 } else { 0x01 }]
    }

    pub fn no_cvm() -> CvmResult {
        CvmResult {
            method: 0x1f,
            condition: 0x00,
            succeeded: true,
        }
    }

    pub fn cdcvm() -> CvmResult {
        CvmResult {
            method: 0x2f,
            condition: 0x00,
            succeeded: true,
        }
    }

    pub fn failed() -> CvmResult {
        CvmResult {
            method: 0x00,
            condition: 0x00,
            succeeded: false,
        }
    }
}

/// Condition codes a rule can test against, ç4.F.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    pub amount: u64,
    pub amount_other: u64,
    pub is_cash: bool,
    pub is_cashback: bool,
    pub terminal_supports_cvm: bool,
}

fn condition_holds(condition: u8, ctx: &EvalContext, list: &CvmList) -> bool {
    match condition {
        0x00 => true,
        0x01 => ctx.is_cash,
        0x02 => !ctx.is_cash,
        0x03 => ctx.terminal_supports_cvm,
        0x04 => ctx.is_cash && !ctx.is_cashback,
        0x05 => ctx.is_cashback,
        // 0x06/0x07 test against amount_x like 0x08/0x09 test against
        // amount_y, rather than always holding (ç4.F).
        0x06 => ctx.amount <= list.amount_x as u64,
        0x07 => ctx.amount > list.amount_x as u64,
        0x08 => ctx.amount <= list.amount_y as u64,
        0x09 => ctx.amount > list.amount_y as u64,
        _ => false,
    }
}

/// Evaluate the CVM List's rules in order. The kernel's per-scheme fast
/// path (ç4.E.6) is checked before this is ever called; this is the
/// fallback generic walk.
pub fn evaluate(
    list: &CvmList,
    ctx: &EvalContext,
    config: &Config,
    cdcvm: &mut dyn CdcvmProvider,
) -> CvmResult {
    for rule in &list.rules {
        if !condition_holds(rule.condition, ctx, list) {
            continue;
        }

        let outcome = match rule.method {
            0x1f => ctx.amount <= config.cvm_required_limit || config.allow_no_cvm,
            0x02 => config.online_pin_supported,
            0x1e => config.allow_signature,
            0x2f => matches!(cdcvm.perform_cdcvm(), CdcvmResult::Success),
            0x00 => false,
            // Offline PIN variants (0x01, 0x03, 0x04, 0x05) are not
            // supported on a SoftPOS terminal with no PIN pad.
            _ => false,
        };

        if outcome {
            return CvmResult {
                method: rule.method,
                condition: rule.condition,
                succeeded: true,
            };
        }
        if !rule.continue_on_fail {
            return CvmResult::failed();
        }
    }

    if config.allow_no_cvm {
        CvmResult::no_cvm()
    } else {
        CvmResult::failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with_rule(method: u8, continue_on_fail: bool, condition: u8) -> CvmList {
        let mut raw = vec![0u8; 8];
        raw[3] = 0x00; // amount x low byte left at 0
        let method_byte = method | if continue_on_fail { 0x40 } else { 0x00 };
        raw.push(method_byte);
        raw.push(condition);
        CvmList::parse(&raw).unwrap()
    }

    struct NeverCdcvm;
    impl CdcvmProvider for NeverCdcvm {
        fn perform_cdcvm(&mut self) -> CdcvmResult {
            CdcvmResult::Unavailable
        }
    }

    #[test]
    fn parses_amounts_and_rules() {
        let raw = [
            0x00, 0x00, 0x00, 0x00, // amount x
            0x00, 0x00, 0x00, 0x00, // amount y
            0x1f, 0x00, // no CVM, always
        ];
        let list = CvmList::parse(&raw).unwrap();
        assert_eq!(list.rules.len(), 1);
        assert_eq!(list.rules[0].method, 0x1f);
        assert!(!list.rules[0].continue_on_fail);
    }

    #[test]
    fn rejects_short_list() {
        assert_eq!(CvmList::parse(&[0; 4]), Err(CvmListError::TooShort));
    }

    #[test]
    fn no_cvm_succeeds_under_limit() {
        let list = list_with_rule(0x1f, false, 0x00);
        let config = Config {
            cvm_required_limit: 5000,
            ..Config::default()
        };
        let ctx = EvalContext {
            amount: 1000,
            amount_other: 0,
            is_cash: false,
            is_cashback: false,
            terminal_supports_cvm: true,
        };
        let result = evaluate(&list, &ctx, &config, &mut NeverCdcvm);
        assert!(result.succeeded);
        assert_eq!(result.method, 0x1f);
    }

    #[test]
    fn amount_equal_to_limit_counts_as_under() {
        let list = list_with_rule(0x1f, false, 0x00);
        let config = Config {
            cvm_required_limit: 1000,
            ..Config::default()
        };
        let ctx = EvalContext {
            amount: 1000,
            amount_other: 0,
            is_cash: false,
            is_cashback: false,
            terminal_supports_cvm: true,
        };
        let result = evaluate(&list, &ctx, &config, &mut NeverCdcvm);
        assert!(result.succeeded);
    }

    #[test]
    fn unsupported_method_fails_without_continue() {
        let list = list_with_rule(0x01, false, 0x00);
        let config = Config::default();
        let ctx = EvalContext {
            amount: 1,
            amount_other: 0,
            is_cash: false,
            is_cashback: false,
            terminal_supports_cvm: true,
        };
        let result = evaluate(&list, &ctx, &config, &mut NeverCdcvm);
        assert!(!result.succeeded);
    }
}
