///
/// Digest selection and input canonicalization.
///
/// Numeric inputs of every width hash as the little-endian bytes of their value
/// widened to f64, so `5`, `5i64` and `5.0` collide on purpose. `-0.0` hashes
/// as `0.0` and every NaN payload as the canonical NaN.
///

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// `sha2(bits)` selection; 0 means 256.
    pub fn for_sha2_bits(bits: i32) -> Option<Self> {
        match bits {
            0 | 256 => Some(HashAlgorithm::Sha256),
            224 => Some(HashAlgorithm::Sha224),
            384 => Some(HashAlgorithm::Sha384),
            512 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Lowercase hex digest of `data`.
    pub fn hex_digest(self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Md5 => hex::encode(Md5::digest(data)),
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
            HashAlgorithm::Sha224 => hex::encode(Sha224::digest(data)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            HashAlgorithm::Sha384 => hex::encode(Sha384::digest(data)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
        }
    }
}

pub fn canonical_f64(value: f64) -> [u8; 8] {
    let value = if value == 0.0 {
        0.0
    } else if value.is_nan() {
        f64::NAN
    } else {
        value
    };
    value.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(HashAlgorithm::Md5.hex_digest(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(HashAlgorithm::Md5.hex_digest(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(HashAlgorithm::Sha1.hex_digest(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(
            HashAlgorithm::Sha224.hex_digest(b"abc"),
            "23097d223405d8228642a477bda255b32aadbce4bda0b3f7e36c9da7"
        );
        assert_eq!(
            HashAlgorithm::Sha256.hex_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            HashAlgorithm::Sha384.hex_digest(b"abc"),
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7"
        );
        assert_eq!(
            HashAlgorithm::Sha512.hex_digest(b"abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn test_sha2_bits() {
        assert_eq!(HashAlgorithm::for_sha2_bits(0), Some(HashAlgorithm::Sha256));
        assert_eq!(HashAlgorithm::for_sha2_bits(224), Some(HashAlgorithm::Sha224));
        assert_eq!(HashAlgorithm::for_sha2_bits(512), Some(HashAlgorithm::Sha512));
        assert_eq!(HashAlgorithm::for_sha2_bits(128), None);
    }

    #[test]
    fn test_canonical_f64() {
        assert_eq!(canonical_f64(-0.0), canonical_f64(0.0));
        assert_eq!(canonical_f64(f64::from_bits(0x7ff8_0000_0000_0001)), canonical_f64(f64::NAN));
        assert_eq!(canonical_f64(-f64::NAN), canonical_f64(f64::NAN));
        assert_eq!(canonical_f64(1.5), 1.5f64.to_le_bytes());
    }
}
