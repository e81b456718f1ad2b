use sha2::{Digest as _, Sha256};

pub const DEFAULT_PREFIX: &str = "desafio";
pub const DIGEST_LEN: usize = 32;

pub type Digest = [u8; DIGEST_LEN];

/// Hash primitive used by every search variant.
///
/// Implementations must be stateless: the same oracle is shared by all lanes of
/// all workers.
pub trait DigestOracle: Send + Sync {
    fn digest(&self, input: &str) -> Digest;

    fn is_hit(&self, input: &str, target_zero_bits: u32) -> bool {
        has_leading_zero_bits(&self.digest(input), target_zero_bits)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Oracle;

impl DigestOracle for Sha256Oracle {
    fn digest(&self, input: &str) -> Digest {
        Sha256::digest(input.as_bytes()).into()
    }
}

/// Builds the candidate string tested at `index`.
pub fn candidate_text(prefix: &str, index: u64) -> String {
    format!("{}{}", prefix, index)
}

/// Returns true when the `bits` most significant bits of `digest` (big-endian)
/// are all zero. A request wider than the digest never matches.
pub fn has_leading_zero_bits(digest: &[u8], bits: u32) -> bool {
    let bits = bits as usize;
    if bits > digest.len() * 8 {
        return false;
    }

    let full_bytes = bits / 8;
    let remaining_bits = bits % 8;

    if digest[..full_bytes].iter().any(|&b| b != 0) {
        return false;
    }

    if remaining_bits > 0 {
        let mask = 0xFFu8 << (8 - remaining_bits);
        if digest[full_bytes] & mask != 0 {
            return false;
        }
    }

    true
}

pub fn digest_hex(digest: &Digest) -> String {
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text() {
        assert_eq!(candidate_text(DEFAULT_PREFIX, 0), "desafio0");
        assert_eq!(candidate_text(DEFAULT_PREFIX, 42), "desafio42");
        assert_eq!(candidate_text("x", u64::MAX), "x18446744073709551615");
    }

    #[test]
    fn test_sha256_known_vector() {
        let digest = Sha256Oracle.digest("abc");
        assert_eq!(
            digest_hex(&digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_zero_bits_always_matches() {
        assert!(has_leading_zero_bits(&[0xFF; DIGEST_LEN], 0));
        for i in 0..100 {
            let text = candidate_text(DEFAULT_PREFIX, i);
            assert!(Sha256Oracle.is_hit(&text, 0));
        }
    }

    #[test]
    fn test_partial_byte_mask() {
        let mut digest = [0xFFu8; DIGEST_LEN];
        digest[0] = 0x00;
        digest[1] = 0x1F; // three leading zero bits
        assert!(has_leading_zero_bits(&digest, 8));
        assert!(has_leading_zero_bits(&digest, 11));
        assert!(!has_leading_zero_bits(&digest, 12));
        assert!(!has_leading_zero_bits(&digest, 16));
    }

    #[test]
    fn test_full_width_boundary() {
        let zero = [0u8; DIGEST_LEN];
        assert!(has_leading_zero_bits(&zero, 256));
        assert!(!has_leading_zero_bits(&zero, 257));

        let mut almost = [0u8; DIGEST_LEN];
        almost[DIGEST_LEN - 1] = 1;
        assert!(has_leading_zero_bits(&almost, 255));
        assert!(!has_leading_zero_bits(&almost, 256));
    }
}
