///
/// kiln-std-encoding - Structured Text Holders
///
/// This module provides the holders that pick values out of structured text:
/// - json: get_json_object over Spark-style paths (serde_json RawValue)
/// - url: parse_url parts and query keys (RFC 3986 decomposition)
///
/// Lookup failures of any kind are null results, never context errors.
///

pub mod json;
pub mod url;

pub use json::*;
pub use url::*;

use kiln_std_core::StubSignature;

pub fn signatures() -> Vec<StubSignature> {
    let mut all = json::signatures();
    all.extend(url::signatures());
    all
}
