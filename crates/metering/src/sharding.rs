//! Deterministic shard selection (spec.md §4.F "Sharding").
//!
//! `shard_index = SHA-256(request_id) mod shard_count`, taken on the full
//! 256-bit digest rather than a truncated prefix, so reduction is done
//! byte-by-byte rather than by casting to a 64-bit integer.

use sha2::{Digest, Sha256};

pub fn shard_index(request_id: &str, shard_count: u32) -> u32 {
    assert!(shard_count > 0, "shard_count must be positive");
    let digest = Sha256::digest(request_id.as_bytes());
    let modulus = shard_count as u64;

    let mut acc: u64 = 0;
    for byte in digest {
        acc = (acc * 256 + byte as u64) % modulus;
    }
    acc as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic() {
        assert_eq!(shard_index("req-1", 8), shard_index("req-1", 8));
    }

    #[test]
    fn stays_within_bounds() {
        for id in ["a", "b", "request-abc-123", ""] {
            assert!(shard_index(id, 8) < 8);
        }
    }

    proptest::proptest! {
        #[test]
        fn always_in_range(id in "\\PC*", shard_count in 1u32..64) {
            let idx = shard_index(&id, shard_count);
            prop_assert!(idx < shard_count);
        }
    }
}
