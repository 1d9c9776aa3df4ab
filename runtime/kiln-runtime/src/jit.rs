//!
//! Cranelift JIT Integration
//!
//! Generated code reaches the kernels through imported functions. This module
//! does the two halves of that wiring for a Cranelift module:
//!
//! - `register_symbols`: tell the `JITBuilder` where each `kiln_*` symbol lives
//! - `declare_stubs`: declare each stub's signature as an import and collect
//!   the resulting `FuncId`s in a `StubTable`
//!
//! `new_jit_module` does both on a host-ISA module ready for code generation.
//!
//! ABI mapping: `Bool` is an 8-bit integer, zero-extended at the call boundary;
//! `Ptr` is the target pointer type.
//!

use std::collections::HashMap;

use cranelift::prelude::*;
use cranelift_codegen::isa::OwnedTargetIsa;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module, ModuleError};
use thiserror::Error;

use kiln_std_core::{AbiType, StubSignature};

use crate::registry::stub_signatures;

#[derive(Debug, Error)]
pub enum JitError {
    #[error("Failed to configure target ISA: {0}")]
    Isa(String),

    #[error("Failed to declare {name}: {source}")]
    Declare {
        name: &'static str,
        #[source]
        source: Box<ModuleError>,
    },

    #[error("Stub not declared: {0}")]
    UnknownStub(String),
}

/// Name to `FuncId` for every declared stub.
#[derive(Debug, Default)]
pub struct StubTable {
    ids: HashMap<&'static str, FuncId>,
}

impl StubTable {
    pub fn get(&self, name: &str) -> Option<FuncId> {
        self.ids.get(name).copied()
    }

    pub fn func_id(&self, name: &str) -> Result<FuncId, JitError> {
        self.get(name).ok_or_else(|| JitError::UnknownStub(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub fn abi_param(ty: AbiType, pointer: Type) -> AbiParam {
    match ty {
        AbiType::Bool => AbiParam::new(types::I8).uext(),
        AbiType::I32 => AbiParam::new(types::I32),
        AbiType::I64 => AbiParam::new(types::I64),
        AbiType::F32 => AbiParam::new(types::F32),
        AbiType::F64 => AbiParam::new(types::F64),
        AbiType::Ptr => AbiParam::new(pointer),
    }
}

/// The Cranelift signature of a stub under `module`'s calling convention.
pub fn stub_signature<M: Module>(module: &M, stub: &StubSignature) -> Signature {
    let pointer = module.target_config().pointer_type();
    let mut sig = module.make_signature();
    sig.params.extend(stub.params.iter().map(|&p| abi_param(p, pointer)));
    sig.returns.extend(stub.ret.map(|r| abi_param(r, pointer)));
    sig
}

pub fn create_isa() -> Result<OwnedTargetIsa, JitError> {
    let mut flag_builder = settings::builder();
    for (name, value) in [("use_colocated_libcalls", "false"), ("is_pic", "false"), ("opt_level", "speed")] {
        flag_builder
            .set(name, value)
            .map_err(|e| JitError::Isa(format!("{name}={value}: {e}")))?;
    }

    let isa_builder =
        cranelift_native::builder().map_err(|e| JitError::Isa(format!("Failed to create ISA builder: {e}")))?;

    isa_builder
        .finish(settings::Flags::new(flag_builder))
        .map_err(|e| JitError::Isa(format!("Failed to create ISA: {e}")))
}

/// Register the address of every exported stub. Returns the number registered.
pub fn register_symbols(builder: &mut JITBuilder) -> usize {
    let sigs = stub_signatures();
    for sig in &sigs {
        builder.symbol(sig.name, sig.address);
    }
    tracing::debug!(count = sigs.len(), "registered kiln symbols");
    sigs.len()
}

/// Declare every stub as an imported function of `module`.
pub fn declare_stubs<M: Module>(module: &mut M) -> Result<StubTable, JitError> {
    let mut table = StubTable::default();
    for stub in stub_signatures() {
        let sig = stub_signature(module, &stub);
        let id = module
            .declare_function(stub.name, Linkage::Import, &sig)
            .map_err(|source| JitError::Declare {
                name: stub.name,
                source: Box::new(source),
            })?;
        table.ids.insert(stub.name, id);
    }
    tracing::debug!(count = table.len(), "declared kiln stubs");
    Ok(table)
}

/// A host-ISA JIT module with every stub registered and declared.
pub fn new_jit_module() -> Result<(JITModule, StubTable), JitError> {
    let isa = create_isa()?;
    let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
    register_symbols(&mut builder);
    let mut module = JITModule::new(builder);
    let table = declare_stubs(&mut module)?;
    Ok((module, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_codegen::ir::ArgumentExtension;

    #[test]
    fn test_abi_param_mapping() {
        let p = abi_param(AbiType::Bool, types::I64);
        assert_eq!(p.value_type, types::I8);
        assert_eq!(p.extension, ArgumentExtension::Uext);
        assert_eq!(abi_param(AbiType::Ptr, types::I32).value_type, types::I32);
        assert_eq!(abi_param(AbiType::F32, types::I64).value_type, types::F32);
    }

    #[test]
    fn test_declares_every_stub() {
        let (_module, table) = new_jit_module().unwrap();
        assert_eq!(table.len(), stub_signatures().len());
        assert!(table.get("kiln_like_utf8_utf8").is_some());
        assert!(matches!(table.func_id("kiln_missing"), Err(JitError::UnknownStub(_))));
    }
}
