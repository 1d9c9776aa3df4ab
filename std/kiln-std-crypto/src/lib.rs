//!
//! kiln-std-crypto - Hashing Functions
//!
//! Provides the SQL hash functions over every scalar type:
//!
//! - `md5`, `sha1`, `sha256` - one stub per argument type
//! - `sha2(value, bits)` - bits in {0, 224, 256, 384, 512}, 0 meaning 256
//!
//! Digests are lowercase hex text written to the context arena. An invalid
//! row hashes nothing and returns the empty string.
//!
//! Uses the RustCrypto digest crates (md-5, sha1, sha2) and hex.
//!

pub mod hash;
pub mod stubs;

pub use hash::*;
pub use stubs::*;
