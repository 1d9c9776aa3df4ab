///
/// Casts between text and scalars.
///
/// Text to number trims surrounding ASCII spaces before parsing. The plain
/// casts report a failure on the context and return 0; the `_or_null` casts
/// report it through `out_valid` instead.
///
/// Number to text renders the shortest round-trip form and truncates it to
/// the requested byte length (0 means no limit for utf8 input only).
///

use std::str::FromStr;

use kiln_std_core::{handle, ExecutionContext, StubSignature};

use crate::trim::btrim;

pub fn parse_trimmed<T: FromStr>(data: &[u8]) -> Option<T> {
    std::str::from_utf8(btrim(data)).ok()?.parse().ok()
}

/// Parse or record `Failed to cast the string <s> to <type_name>` and yield 0.
pub fn cast_text<T: FromStr + Default>(ctx: &ExecutionContext, data: &[u8], type_name: &str) -> T {
    parse_trimmed(data).unwrap_or_else(|| {
        ctx.set_error(format!(
            "Failed to cast the string {} to {type_name}",
            String::from_utf8_lossy(data)
        ));
        T::default()
    })
}

/// Text form of a float: integral values keep a trailing `.0`.
pub fn format_float(value: f64, text: String) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

/// Copy the first `len` bytes of `text` into the arena.
fn truncated<'a>(ctx: &'a ExecutionContext, text: &str, len: i64) -> &'a [u8] {
    if len < 0 {
        ctx.set_error("Buffer length can not be negative");
        return &[];
    }
    let end = (len as usize).min(text.len());
    ctx.copy(&text.as_bytes()[..end])
}

pub fn cast_varchar_bool(ctx: &ExecutionContext, value: bool, len: i64) -> &'static [u8] {
    if len < 0 {
        ctx.set_error("Output buffer length can't be negative");
        return &[];
    }
    let text: &'static [u8] = if value { b"true" } else { b"false" };
    &text[..(len as usize).min(text.len())]
}

pub fn cast_varchar_int64(ctx: &ExecutionContext, value: i64, len: i64) -> &[u8] {
    truncated(ctx, &value.to_string(), len)
}

pub fn cast_varchar_float64(ctx: &ExecutionContext, value: f64, len: i64) -> &[u8] {
    truncated(ctx, &format_float(value, value.to_string()), len)
}

pub fn cast_varchar_float32(ctx: &ExecutionContext, value: f32, len: i64) -> &[u8] {
    truncated(ctx, &format_float(value as f64, value.to_string()), len)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castINT_utf8(context_ptr: i64, data: *const u8, data_len: i32) -> i32 {
    unsafe { cast_text(handle::context(context_ptr), handle::bytes(data, data_len), "int32") }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castBIGINT_utf8(context_ptr: i64, data: *const u8, data_len: i32) -> i64 {
    unsafe { cast_text(handle::context(context_ptr), handle::bytes(data, data_len), "int64") }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castFLOAT4_utf8(context_ptr: i64, data: *const u8, data_len: i32) -> f32 {
    unsafe { cast_text(handle::context(context_ptr), handle::bytes(data, data_len), "float32") }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castFLOAT8_utf8(context_ptr: i64, data: *const u8, data_len: i32) -> f64 {
    unsafe { cast_text(handle::context(context_ptr), handle::bytes(data, data_len), "float64") }
}

/// # Safety
/// `out_valid` must be null or valid for writes; `data` must cover `data_len`
/// bytes when `in_valid` is set.
unsafe fn cast_or_null<T: FromStr + Default>(data: *const u8, data_len: i32, in_valid: bool, out_valid: *mut bool) -> T {
    unsafe {
        let parsed = if in_valid { parse_trimmed(handle::bytes(data, data_len)) } else { None };
        handle::write(out_valid, parsed.is_some());
        parsed.unwrap_or_default()
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castINT_or_null_utf8(
    _context_ptr: i64,
    data: *const u8,
    data_len: i32,
    in_valid: bool,
    out_valid: *mut bool,
) -> i32 {
    unsafe { cast_or_null(data, data_len, in_valid, out_valid) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castBIGINT_or_null_utf8(
    _context_ptr: i64,
    data: *const u8,
    data_len: i32,
    in_valid: bool,
    out_valid: *mut bool,
) -> i64 {
    unsafe { cast_or_null(data, data_len, in_valid, out_valid) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castFLOAT4_or_null_utf8(
    _context_ptr: i64,
    data: *const u8,
    data_len: i32,
    in_valid: bool,
    out_valid: *mut bool,
) -> f32 {
    unsafe { cast_or_null(data, data_len, in_valid, out_valid) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castFLOAT8_or_null_utf8(
    _context_ptr: i64,
    data: *const u8,
    data_len: i32,
    in_valid: bool,
    out_valid: *mut bool,
) -> f64 {
    unsafe { cast_or_null(data, data_len, in_valid, out_valid) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castVARCHAR_bool_int64(context_ptr: i64, value: bool, len: i64, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(cast_varchar_bool(handle::context(context_ptr), value, len), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castVARCHAR_int32_int64(context_ptr: i64, value: i32, len: i64, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(cast_varchar_int64(handle::context(context_ptr), value as i64, len), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castVARCHAR_int64_int64(context_ptr: i64, value: i64, len: i64, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(cast_varchar_int64(handle::context(context_ptr), value, len), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castVARCHAR_float32_int64(context_ptr: i64, value: f32, len: i64, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(cast_varchar_float32(handle::context(context_ptr), value, len), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castVARCHAR_float64_int64(context_ptr: i64, value: f64, len: i64, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(cast_varchar_float64(handle::context(context_ptr), value, len), out_len) }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_castINT_utf8, [I64, Ptr, I32] -> I32),
        stub!(kiln_castBIGINT_utf8, [I64, Ptr, I32] -> I64),
        stub!(kiln_castFLOAT4_utf8, [I64, Ptr, I32] -> F32),
        stub!(kiln_castFLOAT8_utf8, [I64, Ptr, I32] -> F64),
        stub!(kiln_castINT_or_null_utf8, [I64, Ptr, I32, Bool, Ptr] -> I32),
        stub!(kiln_castBIGINT_or_null_utf8, [I64, Ptr, I32, Bool, Ptr] -> I64),
        stub!(kiln_castFLOAT4_or_null_utf8, [I64, Ptr, I32, Bool, Ptr] -> F32),
        stub!(kiln_castFLOAT8_or_null_utf8, [I64, Ptr, I32, Bool, Ptr] -> F64),
        stub!(kiln_castVARCHAR_bool_int64, [I64, Bool, I64, Ptr] -> Ptr),
        stub!(kiln_castVARCHAR_int32_int64, [I64, I32, I64, Ptr] -> Ptr),
        stub!(kiln_castVARCHAR_int64_int64, [I64, I64, I64, Ptr] -> Ptr),
        stub!(kiln_castVARCHAR_float32_int64, [I64, F32, I64, Ptr] -> Ptr),
        stub!(kiln_castVARCHAR_float64_int64, [I64, F64, I64, Ptr] -> Ptr),
    ]
}
