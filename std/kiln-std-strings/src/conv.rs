///
/// Base conversion: conv(text, from_base, to_base) and bin(int64).
///
/// Parsing follows C `strtoul`: leading whitespace is skipped, an optional sign
/// is accepted, the longest run of valid digits is consumed and overflow
/// saturates at `u64::MAX`. A negative input printed to a positive base is
/// rendered as 64-bit two's complement; a negative target base prints a sign.
///

use kiln_std_core::{handle, ExecutionContext, StubSignature};

const MIN_BASE: i32 = 2;
const MAX_BASE: i32 = 36;

/// Returns the parsed value, or `None` when no digit was consumed.
fn parse_unsigned(text: &[u8], base: u32) -> Option<u64> {
    let mut rest = text;
    while let [b, tail @ ..] = rest {
        if b.is_ascii_whitespace() {
            rest = tail;
        } else {
            break;
        }
    }
    let negate = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };
    if base == 16 && rest.len() > 2 && rest[0] == b'0' && matches!(rest[1], b'x' | b'X') && (rest[2] as char).is_digit(16) {
        rest = &rest[2..];
    }

    let mut value: u64 = 0;
    let mut overflow = false;
    let mut consumed = 0;
    for &b in rest {
        let Some(digit) = (b as char).to_digit(base) else {
            break;
        };
        consumed += 1;
        match value.checked_mul(base as u64).and_then(|v| v.checked_add(digit as u64)) {
            Some(v) => value = v,
            None => overflow = true,
        }
    }
    if consumed == 0 {
        return None;
    }
    if overflow {
        return Some(u64::MAX);
    }
    Some(if negate { value.wrapping_neg() } else { value })
}

fn format_radix(mut value: u64, base: u64, negative_mark: bool) -> String {
    let mut digits = Vec::with_capacity(65);
    while value > 0 {
        let d = (value % base) as u8;
        digits.push(if d < 10 { b'0' + d } else { b'A' + d - 10 });
        value /= base;
    }
    if negative_mark {
        digits.push(b'-');
    }
    digits.iter().rev().map(|&b| b as char).collect()
}

pub fn conv<'a>(ctx: &'a ExecutionContext, input: &[u8], from_base: i32, to_base: i32) -> Option<&'a [u8]> {
    if input.is_empty() {
        return None;
    }
    if input == b"0" {
        return Some(&b"0"[..]);
    }
    if !(MIN_BASE..=MAX_BASE).contains(&from_base) || !(MIN_BASE as u32..=MAX_BASE as u32).contains(&to_base.unsigned_abs()) {
        return None;
    }
    let (negative, digits) = match input.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, input),
    };
    let mut value = parse_unsigned(digits, from_base as u32)?;
    let negative_mark = negative && to_base < 0;
    if negative && to_base > 0 {
        value = value.wrapping_neg();
    }
    // No digits to print: only the literal "0" converts to zero.
    if value == 0 {
        return None;
    }
    let text = format_radix(value, to_base.unsigned_abs() as u64, negative_mark);
    Some(ctx.copy(text.as_bytes()))
}

/// Two's complement binary text of `value`.
pub fn bin(ctx: &ExecutionContext, value: i64) -> &[u8] {
    if value == 0 {
        return b"0";
    }
    ctx.copy(format!("{:b}", value as u64).as_bytes())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_conv(
    context_ptr: i64,
    input: *const u8,
    input_len: i32,
    input_valid: bool,
    from_base: i32,
    from_valid: bool,
    to_base: i32,
    to_valid: bool,
    out_valid: *mut bool,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        if !input_valid || !from_valid || !to_valid {
            return handle::emit_null(out_valid, out_len);
        }
        let ctx = handle::context(context_ptr);
        let out = conv(ctx, handle::bytes(input, input_len), from_base, to_base);
        handle::emit_nullable(out, out_valid, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_bin_int64(
    context_ptr: i64,
    value: i64,
    value_valid: bool,
    out_valid: *mut bool,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        if !value_valid {
            return handle::emit_null(out_valid, out_len);
        }
        let ctx = handle::context(context_ptr);
        handle::emit_nullable(Some(bin(ctx, value)), out_valid, out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_conv, [I64, Ptr, I32, Bool, I32, Bool, I32, Bool, Ptr, Ptr] -> Ptr),
        stub!(kiln_bin_int64, [I64, I64, Bool, Ptr, Ptr] -> Ptr),
    ]
}
