//! Binary frame checksum.
//!
//! The running sum is the wrapping 8-bit sum of the marker, the code byte and
//! every payload byte. A received checksum byte is accepted when it has no bit
//! in common with that sum, i.e. `checksum & sum == 0`. The encoder always
//! emits `!sum`, which is the only value that is both accepted and maximal.
//!
//! This mask check is weaker than an equality check: a corrupted payload whose
//! new sum only clears bits of the original sum is still accepted.

/// Wrapping sum of `marker`, `code` and `payload`.
#[inline]
#[must_use]
pub fn running_sum(marker: u8, code: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(marker.wrapping_add(code), |acc, &b| acc.wrapping_add(b))
}

/// Checksum byte an encoder emits for a given running sum.
#[inline]
#[must_use]
pub const fn checksum_for(sum: u8) -> u8 {
    !sum
}

/// `true` when `checksum` is accepted for `sum`.
#[inline]
#[must_use]
pub const fn is_checksum_valid(checksum: u8, sum: u8) -> bool {
    checksum == checksum & !sum
}

/// Incremental form of [`running_sum`], fed one byte at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunningSum(u8);

impl RunningSum {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
    }

    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_running_sum_wraps() {
        // '!' (0x21) + 'C' (0x43) + 0xFF + 0xFF + 0xFF
        assert_eq!(running_sum(b'!', b'C', &[0xFF, 0xFF, 0xFF]), 0x61);
    }

    #[test]
    fn test_color_example() {
        let sum = running_sum(b'!', b'C', &[0xFF, 0x00, 0x00]);
        assert_eq!(sum, 0x63);
        assert_eq!(checksum_for(sum), 0x9C);
        assert!(is_checksum_valid(0x9C, sum));
    }

    #[test]
    fn test_zero_checksum_always_valid() {
        for sum in 0..=u8::MAX {
            assert!(is_checksum_valid(0, sum));
        }
    }

    #[test]
    fn test_incremental_matches_slice() {
        let mut acc = RunningSum::new();
        for b in [b'!', b'B', b'2', b'1'] {
            acc.push(b);
        }
        assert_eq!(acc.value(), running_sum(b'!', b'B', b"21"));
    }

    proptest! {
        #[test]
        fn prop_encoded_checksum_is_valid(marker in any::<u8>(), code in any::<u8>(), payload in proptest::collection::vec(any::<u8>(), 0..8)) {
            let sum = running_sum(marker, code, &payload);
            prop_assert!(is_checksum_valid(checksum_for(sum), sum));
        }

        #[test]
        fn prop_valid_iff_disjoint(checksum: u8, sum: u8) {
            prop_assert_eq!(is_checksum_valid(checksum, sum), checksum & sum == 0);
        }
    }
}
