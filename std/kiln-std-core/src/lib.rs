//!
//! kiln-std-core - Core Runtime Types
//!
//! This crate provides the types shared across all kiln kernel crates:
//!
//! - `Arena` for per-batch bump allocation of variable-length outputs
//! - `ExecutionContext` owning the arena and the sticky error slot
//! - `handle` for the single audited i64 <-> reference conversion layer
//! - `AbiType` and `StubSignature` describing exported stubs to the compiler
//! - `Literal` and `Decimal128` for holder construction
//! - `RuntimeConfig` for arena and output-budget settings
//!
//! Kernels never own long-lived memory: every variable-length result lives in
//! the arena of the context passed to them, inside the caller's input buffers,
//! or is the static empty string.
//!

pub mod abi;
pub mod arena;
pub mod config;
pub mod context;
pub mod decimal;
pub mod error;
pub mod handle;
pub mod literal;

pub use abi::*;
pub use arena::*;
pub use config::*;
pub use context::*;
pub use decimal::*;
pub use error::*;
pub use literal::*;
