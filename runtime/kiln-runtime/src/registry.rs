///
/// Signature registry: every exported `kiln_*` stub with its ABI parameter
/// types, return type and address, gathered from each kernel crate.
///

use kiln_std_core::StubSignature;

pub fn stub_signatures() -> Vec<StubSignature> {
    let mut all = kiln_std_core::context::signatures();
    all.extend(kiln_std_strings::signatures());
    all.extend(kiln_std_regex::signatures());
    all.extend(kiln_std_encoding::signatures());
    all.extend(kiln_std_datetime::signatures());
    all.extend(kiln_std_random::signatures());
    all.extend(kiln_std_collections::signatures());
    all.extend(kiln_std_crypto::signatures());
    all
}

pub fn find(name: &str) -> Option<StubSignature> {
    stub_signatures().into_iter().find(|sig| sig.name == name)
}
