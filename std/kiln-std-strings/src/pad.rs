///
/// lpad / rpad
///
/// The target length is a glyph count clamped to [0, pad_max_len]. A target
/// shorter than the text truncates it; otherwise the fill text is tiled glyph
/// by glyph (invalid fill bytes count as one glyph each) until the output holds
/// exactly the target number of glyphs.
///

use kiln_std_core::{handle, ExecutionContext, StubSignature};

use crate::utf8::{lossy_glyphs, utf8_byte_pos, utf8_length_ignore_invalid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

pub fn lpad<'a>(ctx: &'a ExecutionContext, text: &'a [u8], target: i32, fill: &[u8]) -> &'a [u8] {
    pad(ctx, text, target, fill, Side::Left)
}

pub fn rpad<'a>(ctx: &'a ExecutionContext, text: &'a [u8], target: i32, fill: &[u8]) -> &'a [u8] {
    pad(ctx, text, target, fill, Side::Right)
}

fn pad<'a>(ctx: &'a ExecutionContext, text: &'a [u8], target: i32, fill: &[u8], side: Side) -> &'a [u8] {
    let target = target.clamp(0, ctx.limits().pad_max_len);
    if text.is_empty() || target == 0 {
        return &[];
    }
    let actual = utf8_length_ignore_invalid(text);
    if target == actual || (target > actual && fill.is_empty()) {
        return text;
    }
    if target < actual {
        let end = utf8_byte_pos(ctx, text, target);
        return if end < 0 { &[] } else { &text[..end as usize] };
    }

    let missing = (target - actual) as usize;
    let padding_len: usize = lossy_glyphs(fill).cycle().take(missing).map(<[u8]>::len).sum();
    let Some(out) = ctx.allocate(padding_len + text.len()) else {
        return &[];
    };
    let (padding, body) = match side {
        Side::Left => out.split_at_mut(padding_len),
        Side::Right => {
            let (b, p) = out.split_at_mut(text.len());
            (p, b)
        }
    };
    body.copy_from_slice(text);
    let mut offset = 0;
    for glyph in lossy_glyphs(fill).cycle().take(missing) {
        padding[offset..offset + glyph.len()].copy_from_slice(glyph);
        offset += glyph.len();
    }
    out
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_lpad_utf8_int32_utf8(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    target: i32,
    fill: *const u8,
    fill_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let out = lpad(ctx, handle::bytes(text, text_len), target, handle::bytes(fill, fill_len));
        handle::emit_bytes(out, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_rpad_utf8_int32_utf8(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    target: i32,
    fill: *const u8,
    fill_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let out = rpad(ctx, handle::bytes(text, text_len), target, handle::bytes(fill, fill_len));
        handle::emit_bytes(out, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_lpad_utf8_int32(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    target: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(lpad(ctx, handle::bytes(text, text_len), target, b" "), out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_rpad_utf8_int32(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    target: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(rpad(ctx, handle::bytes(text, text_len), target, b" "), out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_lpad_utf8_int32_utf8, [I64, Ptr, I32, I32, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_rpad_utf8_int32_utf8, [I64, Ptr, I32, I32, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_lpad_utf8_int32, [I64, Ptr, I32, I32, Ptr] -> Ptr),
        stub!(kiln_rpad_utf8_int32, [I64, Ptr, I32, I32, Ptr] -> Ptr),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lpad() {
        let ctx = ExecutionContext::new();
        assert_eq!(lpad(&ctx, b"TestString", 10, b"Fill"), b"TestString");
        assert_eq!(lpad(&ctx, b"TestString", 4, b"Fill"), b"Test");
        assert_eq!(lpad(&ctx, b"TestString", 15, b"Fill"), b"FillFTestString");
        assert_eq!(lpad(&ctx, b"TestString", 20, b"Fill"), b"FillFillFiTestString");
        assert_eq!(lpad(&ctx, "абвгд".as_bytes(), 7, "д".as_bytes()), "ддабвгд".as_bytes());
        assert_eq!(lpad(&ctx, b"TestString", 20, b""), b"TestString");
        assert_eq!(lpad(&ctx, b"", 5, b"x"), b"");
        assert_eq!(lpad(&ctx, b"abc", -3, b"x"), b"");
        assert!(!ctx.has_error());
    }

    #[test]
    fn test_rpad() {
        let ctx = ExecutionContext::new();
        assert_eq!(rpad(&ctx, b"TestString", 15, b"Fill"), b"TestStringFillF");
        assert_eq!(rpad(&ctx, b"TestString", 20, b"Fill"), b"TestStringFillFillFi");
        assert_eq!(rpad(&ctx, "абвгд".as_bytes(), 7, "д".as_bytes()), "абвгддд".as_bytes());
        assert_eq!(rpad(&ctx, "çåå†".as_bytes(), 2, b"x"), "çå".as_bytes());
        assert!(!ctx.has_error());
    }

    #[test]
    fn test_pad_clamps_target() {
        let ctx = ExecutionContext::new();
        let out = lpad(&ctx, "大学路".as_bytes(), 65536, "哈".as_bytes());
        assert_eq!(out.len(), 65536 * 3);
        assert!(out.ends_with("大学路".as_bytes()));

        let out = lpad(&ctx, b"TestString", 65537, b" ");
        assert_eq!(out.len(), 65536);
        assert!(out[..65526].iter().all(|&b| b == b' '));
        assert!(out.ends_with(b"TestString"));
    }

    #[test]
    fn test_pad_glyph_count_property() {
        let ctx = ExecutionContext::new();
        for (text, fill) in [("abc", "xy"), ("çå", "†"), ("a", "日本語"), ("अपाचे", "-")] {
            for n in 0..12 {
                let left = lpad(&ctx, text.as_bytes(), n, fill.as_bytes());
                let right = rpad(&ctx, text.as_bytes(), n, fill.as_bytes());
                assert_eq!(utf8_length_ignore_invalid(left), n);
                assert_eq!(utf8_length_ignore_invalid(right), n);
            }
        }
        assert!(!ctx.has_error());
    }
}
