//!
//! kiln-std-collections - IN-list Membership
//!
//! `value IN (lit, lit, ...)` compiles to one `InHolder<T>` per expression
//! node, holding the literal list as a hash set:
//!
//! - `InHolder<i32>` / `InHolder<i64>` for integer lists
//! - `InHolder<Decimal128>` matching on value, precision and scale together
//! - `InHolder<Vec<u8>>` for utf8 and binary lists, probed with `&[u8]`
//!
//! Null literals in the list never match and are dropped at construction. A
//! row whose value is invalid answers `false` without consulting the set.
//!

use std::borrow::Borrow;
use std::hash::Hash;

use rustc_hash::FxHashSet;

use kiln_std_core::{handle, Decimal128, HolderError, Literal, LiteralArgs, StubSignature};

/// A type that can appear in an IN list.
pub trait InValue: Eq + Hash + Sized {
    const EXPECTED: &'static str;

    fn from_literal(literal: &Literal) -> Option<Self>;
}

impl InValue for i32 {
    const EXPECTED: &'static str = "an int32 literal";

    fn from_literal(literal: &Literal) -> Option<Self> {
        match literal {
            Literal::Int32(v) => Some(*v),
            _ => None,
        }
    }
}

impl InValue for i64 {
    const EXPECTED: &'static str = "an integer literal";

    fn from_literal(literal: &Literal) -> Option<Self> {
        match literal {
            Literal::Int32(v) => Some(*v as i64),
            Literal::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

impl InValue for Decimal128 {
    const EXPECTED: &'static str = "a decimal128 literal";

    fn from_literal(literal: &Literal) -> Option<Self> {
        match literal {
            Literal::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl InValue for Vec<u8> {
    const EXPECTED: &'static str = "a utf8 or binary literal";

    fn from_literal(literal: &Literal) -> Option<Self> {
        match literal {
            Literal::Utf8(s) => Some(s.as_bytes().to_vec()),
            Literal::Binary(b) => Some(b.clone()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct InHolder<T> {
    values: FxHashSet<T>,
}

impl<T: InValue> InHolder<T> {
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        let mut values = FxHashSet::default();
        for (index, literal) in args.all().iter().enumerate() {
            if literal.is_null() {
                continue;
            }
            let value = T::from_literal(literal).ok_or_else(|| args.type_error(index, T::EXPECTED))?;
            values.insert(value);
        }
        tracing::debug!(literals = args.len(), distinct = values.len(), "in holder ready");
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn call<Q>(&self, value: &Q, valid: bool) -> bool
    where
        T: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        valid && self.values.contains(value)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_in_expr_lookup_int32(holder_ptr: i64, value: i32, valid: bool) -> bool {
    unsafe { handle::holder::<InHolder<i32>>(holder_ptr).call(&value, valid) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_in_expr_lookup_int64(holder_ptr: i64, value: i64, valid: bool) -> bool {
    unsafe { handle::holder::<InHolder<i64>>(holder_ptr).call(&value, valid) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_in_expr_lookup_decimal(
    holder_ptr: i64,
    high: i64,
    low: i64,
    precision: i32,
    scale: i32,
    valid: bool,
) -> bool {
    let value = Decimal128::from_parts(high, low as u64, precision, scale);
    unsafe { handle::holder::<InHolder<Decimal128>>(holder_ptr).call(&value, valid) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_in_expr_lookup_utf8(holder_ptr: i64, data: *const u8, data_len: i32, valid: bool) -> bool {
    unsafe {
        if !valid {
            return false;
        }
        let holder = handle::holder::<InHolder<Vec<u8>>>(holder_ptr);
        holder.call(handle::bytes(data, data_len), true)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_in_expr_lookup_int32, [I64, I32, Bool] -> Bool),
        stub!(kiln_in_expr_lookup_int64, [I64, I64, Bool] -> Bool),
        stub!(kiln_in_expr_lookup_decimal, [I64, I64, I64, I32, I32, Bool] -> Bool),
        stub!(kiln_in_expr_lookup_utf8, [I64, Ptr, I32, Bool] -> Bool),
    ]
}
