///
/// Byte-level transforms: ASCII case mapping, glyph-wise reverse and space().
///

use kiln_std_core::{handle, ExecutionContext, StubSignature};

use crate::utf8::{glyph_at, set_invalid_utf8_error};

pub fn upper<'a>(ctx: &'a ExecutionContext, data: &[u8]) -> &'a [u8] {
    map_bytes(ctx, data, |b| b.to_ascii_uppercase())
}

pub fn lower<'a>(ctx: &'a ExecutionContext, data: &[u8]) -> &'a [u8] {
    map_bytes(ctx, data, |b| b.to_ascii_lowercase())
}

fn map_bytes<'a>(ctx: &'a ExecutionContext, data: &[u8], f: impl Fn(u8) -> u8) -> &'a [u8] {
    if data.is_empty() {
        return &[];
    }
    let Some(out) = ctx.allocate(data.len()) else {
        return &[];
    };
    for (dst, &src) in out.iter_mut().zip(data) {
        *dst = f(src);
    }
    out
}

/// Reverse glyph order. Invalid utf8 sets an error and yields an empty result.
pub fn reverse<'a>(ctx: &'a ExecutionContext, data: &[u8]) -> &'a [u8] {
    if data.is_empty() {
        return &[];
    }
    let Some(out) = ctx.allocate(data.len()) else {
        return &[];
    };
    let len = data.len();
    let mut pos = 0;
    while pos < len {
        let width = match glyph_at(data, pos) {
            Ok(width) => width,
            Err(byte) => {
                set_invalid_utf8_error(ctx, byte);
                return &[];
            }
        };
        out[len - pos - width..len - pos].copy_from_slice(&data[pos..pos + width]);
        pos += width;
    }
    out
}

/// `n` spaces, with `n` clamped to the configured pad limit.
pub fn space(ctx: &ExecutionContext, n: i64) -> &[u8] {
    let n = n.clamp(0, ctx.limits().pad_max_len as i64) as usize;
    if n == 0 {
        return &[];
    }
    let Some(out) = ctx.allocate(n) else {
        return &[];
    };
    out.fill(b' ');
    out
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_upper_utf8(context_ptr: i64, data: *const u8, data_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(upper(ctx, handle::bytes(data, data_len)), out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_lower_utf8(context_ptr: i64, data: *const u8, data_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(lower(ctx, handle::bytes(data, data_len)), out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_reverse_utf8(context_ptr: i64, data: *const u8, data_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(reverse(ctx, handle::bytes(data, data_len)), out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_space_int32(context_ptr: i64, n: i32, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(space(handle::context(context_ptr), n as i64), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_space_int64(context_ptr: i64, n: i64, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(space(handle::context(context_ptr), n), out_len) }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_upper_utf8, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_lower_utf8, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_reverse_utf8, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_space_int32, [I64, I32, Ptr] -> Ptr),
        stub!(kiln_space_int64, [I64, I64, Ptr] -> Ptr),
    ]
}
