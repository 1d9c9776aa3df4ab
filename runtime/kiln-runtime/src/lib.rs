///
/// kiln Runtime Library
///
/// Provides everything generated expression code links against. This crate
/// produces a static library (libkiln_runtime.a) for ahead-of-time linking and
/// an rlib for in-process JIT use.
///
/// Contains:
/// - All kernel stubs via the kiln-std-* crate dependencies
/// - `FunctionHolder` / `HolderSet` (holder construction per expression node)
/// - `registry::stub_signatures()` (name, ABI types and address of every stub)
/// - `jit` (Cranelift symbol registration and signature declaration)
///

pub mod holders;
pub mod jit;
pub mod registry;

pub use holders::{FunctionHolder, HolderSet};
pub use jit::{JitError, StubTable};
pub use registry::stub_signatures;

pub use kiln_std_core::*;

pub use kiln_std_collections as collections;
pub use kiln_std_crypto as crypto;
pub use kiln_std_datetime as datetime;
pub use kiln_std_encoding as encoding;
pub use kiln_std_random as random;
pub use kiln_std_regex as patterns;
pub use kiln_std_strings as strings;
