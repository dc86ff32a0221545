pub use crate::domain::config::ReadbackMode;

/// Decides which received bytes get reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFilter {
    /// Every non-empty buffer
    All,
    /// Only bytes equal to the sentinel
    Sentinel(u8),
}

impl ReadFilter {
    /// Filter for a readback mode; `Off` has none
    pub fn for_mode(mode: ReadbackMode, sentinel: u8) -> Option<Self> {
        match mode {
            ReadbackMode::Off => None,
            ReadbackMode::Monitor => Some(Self::All),
            ReadbackMode::Sentinel => Some(Self::Sentinel(sentinel)),
        }
    }

    pub fn apply(&self, chunk: &[u8]) -> Option<Vec<u8>> {
        let kept: Vec<u8> = match self {
            ReadFilter::All => chunk.to_vec(),
            ReadFilter::Sentinel(sentinel) => {
                chunk.iter().copied().filter(|b| b == sentinel).collect()
            }
        };

        if kept.is_empty() {
            None
        } else {
            Some(kept)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_for_mode() {
        assert_eq!(ReadFilter::for_mode(ReadbackMode::Off, 0xFF), None);
        assert_eq!(ReadFilter::for_mode(ReadbackMode::Monitor, 0xFF), Some(ReadFilter::All));
        assert_eq!(
            ReadFilter::for_mode(ReadbackMode::Sentinel, 0xAA),
            Some(ReadFilter::Sentinel(0xAA))
        );
    }

    #[test]
    fn test_all_drops_empty_buffers() {
        assert_eq!(ReadFilter::All.apply(&[]), None);
        assert_eq!(ReadFilter::All.apply(b"ok"), Some(b"ok".to_vec()));
    }

    #[test]
    fn test_sentinel_keeps_only_matches() {
        let filter = ReadFilter::Sentinel(0xFF);
        assert_eq!(filter.apply(&[0x00, 0xFF, 0x7E, 0xFF]), Some(vec![0xFF, 0xFF]));
        assert_eq!(filter.apply(&[0x00, 0x01]), None);
        assert_eq!(filter.apply(&[]), None);
    }

    proptest! {
        #[test]
        fn prop_all_is_identity_on_non_empty(chunk in proptest::collection::vec(any::<u8>(), 1..64)) {
            prop_assert_eq!(ReadFilter::All.apply(&chunk), Some(chunk.clone()));
        }

        #[test]
        fn prop_sentinel_output_is_sentinel_only(
            sentinel in any::<u8>(),
            chunk in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let expected = chunk.iter().filter(|b| **b == sentinel).count();
            match ReadFilter::Sentinel(sentinel).apply(&chunk) {
                Some(kept) => {
                    prop_assert_eq!(kept.len(), expected);
                    prop_assert!(kept.iter().all(|b| *b == sentinel));
                }
                None => prop_assert_eq!(expected, 0),
            }
        }
    }
}
