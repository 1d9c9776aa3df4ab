///
/// Escaped-text decoding and UTF-8 repair:
/// binary_string, url_decoder, convert_fromUTF8, convert_replace_invalid_fromUTF8.
///

use kiln_std_core::{handle, ExecutionContext, StubSignature};

use crate::utf8::glyph_at;

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Decode `\xHH` (or `\XHH`) escapes; every other byte is copied through.
pub fn binary_string<'a>(ctx: &'a ExecutionContext, text: &[u8]) -> &'a [u8] {
    if text.is_empty() {
        return &[];
    }
    let Some(out) = ctx.allocate(text.len()) else {
        return &[];
    };
    let mut i = 0;
    let mut j = 0;
    while i < text.len() {
        let escaped = (text[i] == b'\\' && i + 3 < text.len() && matches!(text[i + 1], b'x' | b'X'))
            .then(|| Some(hex_value(text[i + 2])? * 16 + hex_value(text[i + 3])?))
            .flatten();
        match escaped {
            Some(byte) => {
                out[j] = byte;
                i += 4;
            }
            None => {
                out[j] = text[i];
                i += 1;
            }
        }
        j += 1;
    }
    &out[..j]
}

/// Value of the leading hex digits of a two-byte escape, the way `strtol` reads
/// it: leading whitespace and a sign are accepted, anything unparsable is 0.
fn escape_value(pair: [u8; 2]) -> u8 {
    let mut digits = &pair[..];
    while let [first, rest @ ..] = digits {
        if first.is_ascii_whitespace() {
            digits = rest;
        } else {
            break;
        }
    }
    let negative = digits.first() == Some(&b'-');
    if matches!(digits.first(), Some(b'-' | b'+')) {
        digits = &digits[1..];
    }
    let value = digits
        .iter()
        .map_while(|&b| hex_value(b))
        .fold(0i32, |acc, d| acc * 16 + d as i32);
    (if negative { -value } else { value }) as u8
}

/// JDK `URLDecoder` semantics. A trailing incomplete escape returns the input
/// unchanged.
pub fn url_decode<'a>(ctx: &'a ExecutionContext, input: &'a [u8]) -> &'a [u8] {
    if input.is_empty() {
        return &[];
    }
    let len = input.len();
    let mut out = Vec::with_capacity(len);
    let mut i = 0;
    while i < len {
        match input[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                while i + 2 < len && input[i] == b'%' {
                    out.push(escape_value([input[i + 1], input[i + 2]]));
                    i += 3;
                }
                if i < len && input[i] == b'%' {
                    return input;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    ctx.copy(&out)
}

/// Replace every byte that is not part of a valid glyph with `replacement`.
pub fn replace_invalid_utf8<'a>(ctx: &'a ExecutionContext, text: &'a [u8], replacement: &[u8]) -> &'a [u8] {
    if replacement.is_empty() {
        return text;
    }
    if replacement.len() != 1 {
        ctx.set_error("Replacement of multiple bytes not supported");
        return &[];
    }
    let mut out: Option<Vec<u8>> = None;
    let mut pos = 0;
    while pos < text.len() {
        match glyph_at(text, pos) {
            Ok(width) => pos += width,
            Err(_) => {
                let buf = out.get_or_insert_with(|| text.to_vec());
                buf[pos] = replacement[0];
                pos += 1;
            }
        }
    }
    match out {
        Some(buf) => ctx.copy(&buf),
        None => text,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_binary_string(context_ptr: i64, text: *const u8, text_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(binary_string(ctx, handle::bytes(text, text_len)), out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_url_decoder(context_ptr: i64, input: *const u8, input_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(url_decode(ctx, handle::bytes(input, input_len)), out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_convert_fromUTF8_binary(context_ptr: i64, data: *const u8, data_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(ctx.copy(handle::bytes(data, data_len)), out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_convert_replace_invalid_fromUTF8_binary(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    replacement: *const u8,
    replacement_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let out = replace_invalid_utf8(ctx, handle::bytes(text, text_len), handle::bytes(replacement, replacement_len));
        handle::emit_bytes(out, out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_binary_string, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_url_decoder, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_convert_fromUTF8_binary, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_convert_replace_invalid_fromUTF8_binary, [I64, Ptr, I32, Ptr, I32, Ptr] -> Ptr),
    ]
}
