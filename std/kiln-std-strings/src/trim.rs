///
/// ltrim / rtrim / btrim
///
/// The one-argument forms strip ASCII spaces only. The two-argument forms strip
/// any glyph whose bytes occur in the trim text, scanning glyph by glyph from
/// each end. Results are slices of the input; nothing is allocated.
///

use kiln_std_core::{handle, ExecutionContext, StubSignature};

use crate::search::is_substr;
use crate::utf8::{char_length, set_invalid_utf8_error};

pub fn ltrim(data: &[u8]) -> &[u8] {
    let start = data.iter().position(|&b| b != b' ').unwrap_or(data.len());
    &data[start..]
}

pub fn rtrim(data: &[u8]) -> &[u8] {
    let end = data.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    &data[..end]
}

pub fn btrim(data: &[u8]) -> &[u8] {
    rtrim(ltrim(data))
}

/// Byte offset of the first glyph not in `trim`, or `Err(byte)` on invalid input.
fn scan_left(base: &[u8], trim: &[u8]) -> Result<usize, u8> {
    let mut pos = 0;
    while pos < base.len() {
        let width = char_length(base[pos]);
        if width == 0 || pos + width > base.len() {
            return Err(base[pos]);
        }
        if !is_substr(trim, &base[pos..pos + width]) {
            break;
        }
        pos += width;
    }
    Ok(pos)
}

/// Byte offset just past the last glyph not in `trim`, never below `floor`.
fn scan_right(base: &[u8], trim: &[u8], floor: usize) -> Result<usize, u8> {
    let mut end = base.len();
    let mut trailing = 0;
    let mut pos = base.len();
    while pos > floor {
        pos -= 1;
        let width = char_length(base[pos]);
        if width == 0 {
            trailing += 1;
            continue;
        }
        if width != trailing + 1 {
            return Err(base[pos]);
        }
        trailing = 0;
        if !is_substr(trim, &base[pos..pos + width]) {
            return Ok(end);
        }
        end = pos;
    }
    Ok(floor)
}

pub fn ltrim_chars<'a>(ctx: &ExecutionContext, base: &'a [u8], trim: &[u8]) -> &'a [u8] {
    if base.is_empty() || trim.is_empty() {
        return base;
    }
    match scan_left(base, trim) {
        Ok(start) => &base[start..],
        Err(byte) => {
            set_invalid_utf8_error(ctx, byte);
            &[]
        }
    }
}

pub fn rtrim_chars<'a>(ctx: &ExecutionContext, base: &'a [u8], trim: &[u8]) -> &'a [u8] {
    if base.is_empty() || trim.is_empty() {
        return base;
    }
    match scan_right(base, trim, 0) {
        Ok(end) => &base[..end],
        Err(byte) => {
            set_invalid_utf8_error(ctx, byte);
            &[]
        }
    }
}

pub fn btrim_chars<'a>(ctx: &ExecutionContext, base: &'a [u8], trim: &[u8]) -> &'a [u8] {
    if base.is_empty() || trim.is_empty() {
        return base;
    }
    let trimmed = scan_left(base, trim).and_then(|start| {
        let end = scan_right(base, trim, start)?;
        Ok((start, end))
    });
    match trimmed {
        Ok((start, end)) if start < end => &base[start..end],
        Ok(_) => &[],
        Err(byte) => {
            set_invalid_utf8_error(ctx, byte);
            &[]
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_ltrim_utf8(_context_ptr: i64, data: *const u8, data_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(ltrim(handle::bytes(data, data_len)), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_rtrim_utf8(_context_ptr: i64, data: *const u8, data_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(rtrim(handle::bytes(data, data_len)), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_btrim_utf8(_context_ptr: i64, data: *const u8, data_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(btrim(handle::bytes(data, data_len)), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_ltrim_utf8_utf8(
    context_ptr: i64,
    base: *const u8,
    base_len: i32,
    trim: *const u8,
    trim_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let out = ltrim_chars(ctx, handle::bytes(base, base_len), handle::bytes(trim, trim_len));
        handle::emit_bytes(out, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_rtrim_utf8_utf8(
    context_ptr: i64,
    base: *const u8,
    base_len: i32,
    trim: *const u8,
    trim_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let out = rtrim_chars(ctx, handle::bytes(base, base_len), handle::bytes(trim, trim_len));
        handle::emit_bytes(out, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_btrim_utf8_utf8(
    context_ptr: i64,
    base: *const u8,
    base_len: i32,
    trim: *const u8,
    trim_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let out = btrim_chars(ctx, handle::bytes(base, base_len), handle::bytes(trim, trim_len));
        handle::emit_bytes(out, out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_ltrim_utf8, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_rtrim_utf8, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_btrim_utf8, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_ltrim_utf8_utf8, [I64, Ptr, I32, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_rtrim_utf8_utf8, [I64, Ptr, I32, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_btrim_utf8_utf8, [I64, Ptr, I32, Ptr, I32, Ptr] -> Ptr),
    ]
}
