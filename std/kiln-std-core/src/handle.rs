//!
//! Opaque Handles at the ABI Boundary
//!
//! Generated code passes contexts and holders as plain `i64` values and byte
//! spans as (pointer, length) pairs. This module is the only place those raw
//! values are turned back into Rust references, and the only place out-params
//! are written. There is no type tag: the compiler must pass each stub the
//! handle type it expects.
//!

use crate::context::ExecutionContext;

static EMPTY: [u8; 0] = [];

/// Encode a reference as an opaque handle.
pub fn to_handle<T>(value: &T) -> i64 {
    value as *const T as i64
}

/// Reconstruct a holder or context from its handle.
///
/// # Safety
/// `handle` must come from `to_handle` on a live `T` that outlives `'a`.
#[inline(always)]
pub unsafe fn holder<'a, T>(handle: i64) -> &'a T {
    unsafe { &*(handle as *const T) }
}

/// # Safety
/// `handle` must come from `to_handle` on a live `ExecutionContext`.
#[inline(always)]
pub unsafe fn context<'a>(handle: i64) -> &'a ExecutionContext {
    unsafe { holder::<ExecutionContext>(handle) }
}

/// View a (pointer, length) argument as a byte slice. Null or non-positive
/// lengths read as empty without touching the pointer.
///
/// # Safety
/// When `len > 0`, `data` must point to `len` readable bytes for `'a`.
#[inline(always)]
pub unsafe fn bytes<'a>(data: *const u8, len: i32) -> &'a [u8] {
    if data.is_null() || len <= 0 {
        return &EMPTY;
    }
    unsafe { std::slice::from_raw_parts(data, len as usize) }
}

/// Write an out-param if the caller supplied one.
///
/// # Safety
/// `out` must be null or valid for writes.
#[inline(always)]
pub unsafe fn write<T>(out: *mut T, value: T) {
    if !out.is_null() {
        unsafe { out.write(value) };
    }
}

/// Hand a non-null byte result back to generated code.
///
/// # Safety
/// `out_len` must be null or valid for writes.
#[inline(always)]
pub unsafe fn emit_bytes(result: &[u8], out_len: *mut i32) -> *const u8 {
    unsafe {
        write(out_len, result.len() as i32);
    }
    if result.is_empty() {
        EMPTY.as_ptr()
    } else {
        result.as_ptr()
    }
}

/// Hand a nullable byte result back to generated code. Null results report
/// `out_valid = false` and a zero length.
///
/// # Safety
/// `out_valid` and `out_len` must be null or valid for writes.
#[inline(always)]
pub unsafe fn emit_nullable(result: Option<&[u8]>, out_valid: *mut bool, out_len: *mut i32) -> *const u8 {
    unsafe {
        write(out_valid, result.is_some());
        emit_bytes(result.unwrap_or(&EMPTY), out_len)
    }
}

/// The null representation for a nullable byte result.
///
/// # Safety
/// `out_valid` and `out_len` must be null or valid for writes.
#[inline(always)]
pub unsafe fn emit_null(out_valid: *mut bool, out_len: *mut i32) -> *const u8 {
    unsafe { emit_nullable(None, out_valid, out_len) }
}
