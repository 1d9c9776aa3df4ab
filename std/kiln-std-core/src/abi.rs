///
/// ABI Type Vocabulary
///
/// Each exported stub is described to the compiler as an ordered list of
/// primitive parameter types plus an optional return type. Byte spans are a
/// `Ptr` followed by an `I32` length; contexts and holders are `I64` handles;
/// out-params are `Ptr`.
///
/// Every kernel crate exposes `signatures()` built with the `stub!` macro so the
/// name, the type list and the symbol address can never drift apart.
///

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiType {
    Bool,
    I32,
    I64,
    F32,
    F64,
    Ptr,
}

#[derive(Debug, Clone, Copy)]
pub struct StubSignature {
    pub name: &'static str,
    pub params: &'static [AbiType],
    pub ret: Option<AbiType>,
    pub address: *const u8,
}

impl StubSignature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Describe an exported stub: `stub!(kiln_fn, [I64, Ptr, I32] -> Ptr)`.
/// The function must be in scope under its exported name.
#[macro_export]
macro_rules! stub {
    ($func:ident, [$($param:ident),* $(,)?] -> $ret:ident) => {
        $crate::abi::StubSignature {
            name: stringify!($func),
            params: &[$($crate::abi::AbiType::$param),*],
            ret: Some($crate::abi::AbiType::$ret),
            address: $func as *const u8,
        }
    };
    ($func:ident, [$($param:ident),* $(,)?]) => {
        $crate::abi::StubSignature {
            name: stringify!($func),
            params: &[$($crate::abi::AbiType::$param),*],
            ret: None,
            address: $func as *const u8,
        }
    };
}
