///
/// kiln-std-regex - Pattern Matching Holders
///
/// - like: LIKE / ILIKE with literal fast paths
/// - regexp: RLIKE, REGEXP_REPLACE, REGEXP_EXTRACT
///
/// Every holder compiles its pattern once at construction; construction errors
/// are `HolderError::InvalidPattern` or `HolderError::InvalidEscape`.
///

pub mod like;
pub mod regexp;

pub use like::*;
pub use regexp::*;

use kiln_std_core::StubSignature;

pub fn signatures() -> Vec<StubSignature> {
    let mut all = like::signatures();
    all.extend(regexp::signatures());
    all
}
