///
/// Decimal128 <-> text.
///
/// Accepted text: `[+-]digits[.digits][(e|E)[+-]digits]`, at least one digit.
/// Precision counts significant digits (leading zeros dropped), scale counts
/// fractional digits minus the exponent. A negative resulting scale is folded
/// into the value so the scale reported is never below zero.
///

use kiln_std_core::{handle, Decimal128, ExecutionContext, StubSignature};

fn parse_digits(digits: &[u8], value: &mut i128) -> Option<()> {
    for &d in digits {
        *value = value.checked_mul(10)?.checked_add((d - b'0') as i128)?;
    }
    Some(())
}

pub fn parse_decimal(text: &[u8]) -> Option<Decimal128> {
    let text = crate::trim::btrim(text);
    let (negative, rest) = match text.split_first()? {
        (b'-', rest) => (true, rest),
        (b'+', rest) => (false, rest),
        _ => (false, text),
    };

    let whole_end = rest.iter().position(|b| !b.is_ascii_digit()).unwrap_or(rest.len());
    let (whole, rest) = rest.split_at(whole_end);
    let (fraction, rest) = match rest.split_first() {
        Some((b'.', tail)) => {
            let end = tail.iter().position(|b| !b.is_ascii_digit()).unwrap_or(tail.len());
            tail.split_at(end)
        }
        _ => (&rest[..0], rest),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let exponent: i32 = match rest.split_first() {
        None => 0,
        Some((b'e' | b'E', tail)) => std::str::from_utf8(tail).ok()?.parse().ok()?,
        Some(_) => return None,
    };

    let mut value: i128 = 0;
    parse_digits(whole, &mut value)?;
    parse_digits(fraction, &mut value)?;

    let significant = whole.iter().skip_while(|&&b| b == b'0').count() + fraction.len();
    let mut precision = significant.max(1) as i32;
    let mut scale = (fraction.len() as i32).checked_sub(exponent)?;
    if scale < 0 {
        value = value.checked_mul(10i128.checked_pow(scale.unsigned_abs())?)?;
        precision += -scale;
        scale = 0;
    }
    if precision > Decimal128::MAX_PRECISION || scale > Decimal128::MAX_PRECISION {
        return None;
    }
    if negative {
        value = -value;
    }
    Some(Decimal128::new(value, precision.max(scale), scale))
}

pub fn format_decimal(value: i128, scale: i32) -> String {
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    if scale <= 0 {
        return if scale == 0 {
            format!("{sign}{digits}")
        } else {
            format!("{sign}{digits}E+{}", -scale)
        };
    }
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    format!("{sign}{whole}.{fraction}")
}

pub fn dec_from_string(ctx: &ExecutionContext, text: &[u8]) -> Option<Decimal128> {
    let parsed = parse_decimal(text);
    if parsed.is_none() {
        ctx.set_error(format!(
            "Failed to convert the string {} to decimal",
            String::from_utf8_lossy(text)
        ));
    }
    parsed
}

/// Returns 0 on success, -1 after recording the parse failure.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_dec_from_string(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    out_precision: *mut i32,
    out_scale: *mut i32,
    out_high: *mut i64,
    out_low: *mut u64,
) -> i32 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let Some(dec) = dec_from_string(ctx, handle::bytes(text, text_len)) else {
            return -1;
        };
        handle::write(out_precision, dec.precision);
        handle::write(out_scale, dec.scale);
        handle::write(out_high, dec.high());
        handle::write(out_low, dec.low());
        0
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_dec_to_string(
    context_ptr: i64,
    high: i64,
    low: u64,
    scale: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let dec = Decimal128::from_parts(high, low, Decimal128::MAX_PRECISION, scale);
        handle::emit_bytes(ctx.copy(format_decimal(dec.value, scale).as_bytes()), out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_dec_from_string, [I64, Ptr, I32, Ptr, Ptr, Ptr, Ptr] -> I32),
        stub!(kiln_dec_to_string, [I64, I64, I64, I32, Ptr] -> Ptr),
    ]
}
