//! Visa qVSDC (EMV Book C-3). PDOL is always required and the ICC string
//! built for the acquirer is the richest of the five schemes (ç4.E.6).

/// Visa's RID, `A000000003`.
const RID: [u8; 5] = [0xa0, 0x00, 0x00, 0x00, 0x03];

pub fn matches(aid: &[u8]) -> bool {
    aid.starts_with(&RID)
}

/// Tags this scheme insists on carrying into the online authorization
/// request beyond the shared set, per ç4.E.6: IFD serial number, category
/// code, application version, transaction sequence counter.
pub const RICH_ICC_TAGS: &[u32] = &[0x9f1e, 0x9f53, 0x9f09, 0x9f41];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_visa_aid() {
        assert!(matches(&[0xa0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10]));
    }

    #[test]
    fn rejects_other_rid() {
        assert!(!matches(&[0xa0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10]));
    }
}
