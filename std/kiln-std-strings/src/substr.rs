///
/// substr and castVARCHAR(utf8, len)
///
/// Positions are 1-based glyph positions. A negative position counts back from
/// the end, 0 behaves like 1. Out-of-range requests produce an empty string,
/// never an error.
///

use kiln_std_core::{handle, ExecutionContext, StubSignature};

use crate::utf8::{checked_glyph_spans, utf8_byte_pos};

pub fn substr<'a>(ctx: &'a ExecutionContext, data: &[u8], position: i64, length: i64) -> &'a [u8] {
    if length <= 0 || data.is_empty() {
        return &[];
    }
    let Some(spans) = checked_glyph_spans(ctx, data) else {
        return &[];
    };
    let count = spans.len() as i64;
    let from = match position {
        p if p > 0 => p - 1,
        p if p < 0 => count + p,
        _ => 0,
    };
    if from < 0 || from >= count {
        return &[];
    }
    let take = length.min(count - from);
    let start = spans[from as usize].0;
    let end = spans[(from + take - 1) as usize].1;
    ctx.copy(&data[start..end])
}

/// Truncate `data` to at most `len` glyphs. 0 means "no limit".
pub fn cast_varchar<'a>(ctx: &ExecutionContext, data: &'a [u8], len: i64) -> &'a [u8] {
    if len < 0 {
        ctx.set_error("Output buffer length can't be negative");
        return &[];
    }
    if len == 0 || len >= data.len() as i64 {
        return data;
    }
    let len = len as usize;
    // ASCII prefix: bytes and glyphs coincide
    let ascii = data[..len].iter().position(|b| !b.is_ascii()).unwrap_or(len);
    if ascii == len {
        return &data[..len];
    }
    let rest = utf8_byte_pos(ctx, &data[ascii..], (len - ascii) as i32);
    if rest < 0 {
        return &[];
    }
    &data[..ascii + rest as usize]
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_substr_utf8_int64_int64(
    context_ptr: i64,
    data: *const u8,
    data_len: i32,
    position: i64,
    length: i64,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(substr(ctx, handle::bytes(data, data_len), position, length), out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_substr_utf8_int64(
    context_ptr: i64,
    data: *const u8,
    data_len: i32,
    position: i64,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let out = substr(ctx, handle::bytes(data, data_len), position, data_len as i64);
        handle::emit_bytes(out, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_castVARCHAR_utf8_int64(
    context_ptr: i64,
    data: *const u8,
    data_len: i32,
    len: i64,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(cast_varchar(ctx, handle::bytes(data, data_len), len), out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_substr_utf8_int64_int64, [I64, Ptr, I32, I64, I64, Ptr] -> Ptr),
        stub!(kiln_substr_utf8_int64, [I64, Ptr, I32, I64, Ptr] -> Ptr),
        stub!(kiln_castVARCHAR_utf8_int64, [I64, Ptr, I32, I64, Ptr] -> Ptr),
    ]
}
