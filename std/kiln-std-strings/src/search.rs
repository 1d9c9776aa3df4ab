///
/// Substring search: prefix/suffix tests, locate and find_in_set.
///
/// Positions returned to generated code are 1-based glyph positions; 0 means
/// "not found".
///

use memchr::memmem;

use kiln_std_core::{handle, ExecutionContext, StubSignature};

use crate::utf8::{utf8_byte_pos, utf8_length};

pub fn starts_with(data: &[u8], prefix: &[u8]) -> bool {
    data.starts_with(prefix)
}

pub fn ends_with(data: &[u8], suffix: &[u8]) -> bool {
    data.ends_with(suffix)
}

/// Whether `needle` occurs anywhere in `haystack`. The empty needle always does.
pub fn is_substr(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || memmem::find(haystack, needle).is_some()
}

/// 1-based glyph position of `sub` in `text`, searching from glyph `start`.
pub fn locate(ctx: &ExecutionContext, sub: &[u8], text: &[u8], start: i32) -> i32 {
    if start < 1 {
        return 0;
    }
    if sub.is_empty() {
        return 1;
    }
    let byte_pos = utf8_byte_pos(ctx, text, start - 1);
    if byte_pos < 0 || byte_pos as usize >= text.len() {
        return 0;
    }
    let from = byte_pos as usize;
    match memmem::find(&text[from..], sub) {
        Some(offset) => utf8_length(ctx, &text[..from + offset]) + 1,
        None => 0,
    }
}

/// 1-based index of `needle` in the comma-separated `list`, 0 when absent or
/// when the needle itself contains a comma.
pub fn find_in_set(needle: &[u8], list: &[u8]) -> i32 {
    if memchr::memchr(b',', needle).is_some() {
        return 0;
    }
    list.split(|&b| b == b',')
        .position(|item| item == needle)
        .map_or(0, |i| i as i32 + 1)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_starts_with_utf8_utf8(data: *const u8, data_len: i32, prefix: *const u8, prefix_len: i32) -> bool {
    unsafe { starts_with(handle::bytes(data, data_len), handle::bytes(prefix, prefix_len)) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_ends_with_utf8_utf8(data: *const u8, data_len: i32, suffix: *const u8, suffix_len: i32) -> bool {
    unsafe { ends_with(handle::bytes(data, data_len), handle::bytes(suffix, suffix_len)) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_is_substr_utf8_utf8(data: *const u8, data_len: i32, sub: *const u8, sub_len: i32) -> bool {
    unsafe { is_substr(handle::bytes(data, data_len), handle::bytes(sub, sub_len)) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_locate_utf8_utf8(
    context_ptr: i64,
    sub: *const u8,
    sub_len: i32,
    text: *const u8,
    text_len: i32,
) -> i32 {
    unsafe {
        let ctx = handle::context(context_ptr);
        locate(ctx, handle::bytes(sub, sub_len), handle::bytes(text, text_len), 1)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_locate_utf8_utf8_int32(
    context_ptr: i64,
    sub: *const u8,
    sub_len: i32,
    text: *const u8,
    text_len: i32,
    start: i32,
) -> i32 {
    unsafe {
        let ctx = handle::context(context_ptr);
        locate(ctx, handle::bytes(sub, sub_len), handle::bytes(text, text_len), start)
    }
}

/// `strpos(text, sub)`: locate with the arguments swapped
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_strpos_utf8_utf8(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    sub: *const u8,
    sub_len: i32,
) -> i32 {
    unsafe {
        let ctx = handle::context(context_ptr);
        locate(ctx, handle::bytes(sub, sub_len), handle::bytes(text, text_len), 1)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_find_in_set_utf8_utf8(
    _context_ptr: i64,
    needle: *const u8,
    needle_len: i32,
    list: *const u8,
    list_len: i32,
) -> i32 {
    unsafe { find_in_set(handle::bytes(needle, needle_len), handle::bytes(list, list_len)) }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_starts_with_utf8_utf8, [Ptr, I32, Ptr, I32] -> Bool),
        stub!(kiln_ends_with_utf8_utf8, [Ptr, I32, Ptr, I32] -> Bool),
        stub!(kiln_is_substr_utf8_utf8, [Ptr, I32, Ptr, I32] -> Bool),
        stub!(kiln_locate_utf8_utf8, [I64, Ptr, I32, Ptr, I32] -> I32),
        stub!(kiln_locate_utf8_utf8_int32, [I64, Ptr, I32, Ptr, I32, I32] -> I32),
        stub!(kiln_strpos_utf8_utf8, [I64, Ptr, I32, Ptr, I32] -> I32),
        stub!(kiln_find_in_set_utf8_utf8, [I64, Ptr, I32, Ptr, I32] -> I32),
    ]
}
