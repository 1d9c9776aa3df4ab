//!
//! UTF-8 Primitives
//!
//! All kernels work on raw byte spans. A glyph is one encoded code point; its
//! width comes from the lead byte alone. Invalid input is reported on the
//! execution context with the offending byte in `\xx` form.
//!
//! ## Functions
//!
//! - `char_length(lead) -> 0..=4` - glyph width from the lead byte, 0 if invalid
//! - `utf8_length(ctx, s) -> i32` - glyph count, 0 with an error on invalid input
//! - `utf8_length_ignore_invalid(s) -> i32` - glyph count, invalid bytes count as one
//! - `utf8_byte_pos(ctx, s, n) -> i32` - byte offset of glyph `n`, -1 on invalid input
//!

use kiln_std_core::{handle, ExecutionContext, StubSignature};

#[inline(always)]
pub fn char_length(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        0
    }
}

#[inline(always)]
pub fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

pub fn set_invalid_utf8_error(ctx: &ExecutionContext, byte: u8) {
    ctx.set_error(format!(
        "unexpected byte \\{byte:02x} encountered while decoding utf8 string"
    ));
}

/// Width of the glyph at `pos`, or the byte that makes it invalid.
#[inline]
pub fn glyph_at(data: &[u8], pos: usize) -> Result<usize, u8> {
    let lead = data[pos];
    let width = char_length(lead);
    if width == 0 || pos + width > data.len() {
        return Err(lead);
    }
    for &b in &data[pos + 1..pos + width] {
        if !is_continuation(b) {
            return Err(b);
        }
    }
    Ok(width)
}

/// Byte ranges of every glyph, or the offending byte.
pub fn glyph_spans(data: &[u8]) -> Result<Vec<(usize, usize)>, u8> {
    let mut spans = Vec::with_capacity(data.len());
    let mut pos = 0;
    while pos < data.len() {
        let width = glyph_at(data, pos)?;
        spans.push((pos, pos + width));
        pos += width;
    }
    Ok(spans)
}

/// Same as `glyph_spans`, reporting invalid input on the context.
pub fn checked_glyph_spans(ctx: &ExecutionContext, data: &[u8]) -> Option<Vec<(usize, usize)>> {
    match glyph_spans(data) {
        Ok(spans) => Some(spans),
        Err(byte) => {
            set_invalid_utf8_error(ctx, byte);
            None
        }
    }
}

pub fn utf8_length(ctx: &ExecutionContext, data: &[u8]) -> i32 {
    let mut count = 0;
    let mut pos = 0;
    while pos < data.len() {
        match glyph_at(data, pos) {
            Ok(width) => pos += width,
            Err(byte) => {
                set_invalid_utf8_error(ctx, byte);
                return 0;
            }
        }
        count += 1;
    }
    count
}

pub fn utf8_length_ignore_invalid(data: &[u8]) -> i32 {
    let mut count = 0;
    let mut pos = 0;
    while pos < data.len() {
        pos += glyph_at(data, pos).unwrap_or(1);
        count += 1;
    }
    count
}

/// Byte offset where glyph `char_pos` starts (or the length, if the text is
/// shorter). Only lead bytes are checked.
pub fn utf8_byte_pos(ctx: &ExecutionContext, data: &[u8], char_pos: i32) -> i32 {
    let mut pos = 0usize;
    let mut index = 0;
    while index < char_pos && pos < data.len() {
        let width = char_length(data[pos]);
        if width == 0 || pos + width > data.len() {
            set_invalid_utf8_error(ctx, data[pos]);
            return -1;
        }
        pos += width;
        index += 1;
    }
    pos as i32
}

/// Iterate glyphs, treating each invalid byte as a one-byte glyph.
pub fn lossy_glyphs(data: &[u8]) -> impl Iterator<Item = &[u8]> + Clone {
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= data.len() {
            return None;
        }
        let width = glyph_at(data, pos).unwrap_or(1);
        let glyph = &data[pos..pos + width];
        pos += width;
        Some(glyph)
    })
}

/// Glyph count of a utf8 value; invalid input sets an error and returns 0
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_char_length_utf8(context_ptr: i64, data: *const u8, data_len: i32) -> i32 {
    unsafe { utf8_length(handle::context(context_ptr), handle::bytes(data, data_len)) }
}

/// Alias of `char_length` under the SQL name `length`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_length_utf8(context_ptr: i64, data: *const u8, data_len: i32) -> i32 {
    unsafe { utf8_length(handle::context(context_ptr), handle::bytes(data, data_len)) }
}

/// Glyph count of a binary value decoded as utf8
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_length_utf8_binary(context_ptr: i64, data: *const u8, data_len: i32) -> i32 {
    unsafe { utf8_length(handle::context(context_ptr), handle::bytes(data, data_len)) }
}

#[unsafe(no_mangle)]
pub extern "C" fn kiln_octet_length_utf8(_data: *const u8, data_len: i32) -> i32 {
    data_len
}

#[unsafe(no_mangle)]
pub extern "C" fn kiln_bit_length_utf8(_data: *const u8, data_len: i32) -> i32 {
    data_len * 8
}

#[unsafe(no_mangle)]
pub extern "C" fn kiln_octet_length_binary(_data: *const u8, data_len: i32) -> i32 {
    data_len
}

#[unsafe(no_mangle)]
pub extern "C" fn kiln_bit_length_binary(_data: *const u8, data_len: i32) -> i32 {
    data_len * 8
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_char_length_utf8, [I64, Ptr, I32] -> I32),
        stub!(kiln_length_utf8, [I64, Ptr, I32] -> I32),
        stub!(kiln_length_utf8_binary, [I64, Ptr, I32] -> I32),
        stub!(kiln_octet_length_utf8, [Ptr, I32] -> I32),
        stub!(kiln_bit_length_utf8, [Ptr, I32] -> I32),
        stub!(kiln_octet_length_binary, [Ptr, I32] -> I32),
        stub!(kiln_bit_length_binary, [Ptr, I32] -> I32),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_length() {
        assert_eq!(char_length(b'a'), 1);
        assert_eq!(char_length(0xC3), 2);
        assert_eq!(char_length(0xE2), 3);
        assert_eq!(char_length(0xF0), 4);
        assert_eq!(char_length(0x80), 0);
        assert_eq!(char_length(0xF8), 0);
    }

    #[test]
    fn test_utf8_length() {
        let ctx = ExecutionContext::new();
        assert_eq!(utf8_length(&ctx, b""), 0);
        assert_eq!(utf8_length(&ctx, "hello".as_bytes()), 5);
        assert_eq!(utf8_length(&ctx, "çåå†".as_bytes()), 4);
        assert_eq!(utf8_length(&ctx, "अपाचे एरो".as_bytes()), 9);
        assert!(!ctx.has_error());
    }

    #[test]
    fn test_utf8_length_invalid_lead() {
        let ctx = ExecutionContext::new();
        assert_eq!(utf8_length(&ctx, b"\xf8\x28"), 0);
        assert_eq!(
            ctx.error().as_deref(),
            Some("unexpected byte \\f8 encountered while decoding utf8 string")
        );
    }

    #[test]
    fn test_utf8_length_truncated() {
        let ctx = ExecutionContext::new();
        assert_eq!(utf8_length(&ctx, b"aa\xc3"), 0);
        assert!(ctx.error().unwrap().contains("\\c3"));
    }

    #[test]
    fn test_utf8_length_bad_continuation() {
        let ctx = ExecutionContext::new();
        assert_eq!(utf8_length(&ctx, b"a\xc3a"), 0);
        assert!(ctx.error().unwrap().contains("\\61"));

        let ctx = ExecutionContext::new();
        assert_eq!(utf8_length(&ctx, b"a\xc3\xe3a"), 0);
        assert!(ctx.error().unwrap().contains("\\e3"));
    }

    #[test]
    fn test_utf8_length_ignore_invalid() {
        assert_eq!(utf8_length_ignore_invalid(b"abc"), 3);
        assert_eq!(utf8_length_ignore_invalid(b"a\xffc"), 3);
        assert_eq!(utf8_length_ignore_invalid("çå".as_bytes()), 2);
        assert_eq!(utf8_length_ignore_invalid(b"\xc3"), 1);
    }

    #[test]
    fn test_utf8_byte_pos() {
        let ctx = ExecutionContext::new();
        let s = "çåa".as_bytes();
        assert_eq!(utf8_byte_pos(&ctx, s, 0), 0);
        assert_eq!(utf8_byte_pos(&ctx, s, 2), 4);
        assert_eq!(utf8_byte_pos(&ctx, s, 10), 5);
        assert_eq!(utf8_byte_pos(&ctx, b"a\xffc", 3), -1);
        assert!(ctx.error().unwrap().contains("\\ff"));
    }

    #[test]
    fn test_lossy_glyphs() {
        let glyphs: Vec<&[u8]> = lossy_glyphs(b"a\xff\xc3\xa7").collect();
        assert_eq!(glyphs, vec![&b"a"[..], &b"\xff"[..], "ç".as_bytes()]);
    }

    #[test]
    fn test_lossy_glyphs_cycle() {
        let tiled: Vec<u8> = lossy_glyphs(b"\xc3\xa7\xff").cycle().take(5).flatten().copied().collect();
        assert_eq!(tiled, b"\xc3\xa7\xff\xc3\xa7\xff\xc3\xa7".to_vec());
    }

    #[test]
    fn test_length_stubs() {
        let ctx = ExecutionContext::new();
        let h = handle::to_handle(&ctx);
        let s = "çåå†";
        unsafe {
            assert_eq!(kiln_char_length_utf8(h, s.as_ptr(), s.len() as i32), 4);
            assert_eq!(kiln_length_utf8_binary(h, s.as_ptr(), s.len() as i32), 4);
        }
        assert_eq!(kiln_octet_length_utf8(s.as_ptr(), s.len() as i32), 9);
        assert_eq!(kiln_bit_length_binary(s.as_ptr(), s.len() as i32), 72);
    }
}
