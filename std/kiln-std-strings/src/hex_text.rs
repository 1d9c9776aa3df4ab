///
/// to_hex / from_hex text
///

use kiln_std_core::{handle, ExecutionContext, StubSignature};

/// Two uppercase hex digits per byte.
pub fn to_hex_binary<'a>(ctx: &'a ExecutionContext, data: &[u8]) -> &'a [u8] {
    if data.is_empty() {
        return &[];
    }
    ctx.copy(hex::encode_upper(data).as_bytes())
}

/// Two's complement hex of a 64-bit value, no leading zeros.
pub fn to_hex_int64(ctx: &ExecutionContext, value: i64) -> &[u8] {
    ctx.copy(format!("{:X}", value as u64).as_bytes())
}

pub fn to_hex_int32(ctx: &ExecutionContext, value: i32) -> &[u8] {
    ctx.copy(format!("{:X}", value as u32).as_bytes())
}

pub fn from_hex<'a>(ctx: &'a ExecutionContext, text: &[u8]) -> &'a [u8] {
    if text.is_empty() {
        return &[];
    }
    if text.len() % 2 != 0 {
        ctx.set_error("Error parsing hex string, length was not a multiple of two.");
        return &[];
    }
    let Some(out) = ctx.allocate(text.len() / 2) else {
        return &[];
    };
    if hex::decode_to_slice(text, out).is_err() {
        ctx.set_error("Error parsing hex string, one or more bytes are not valid.");
        return &[];
    }
    out
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_to_hex_binary(context_ptr: i64, data: *const u8, data_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(to_hex_binary(ctx, handle::bytes(data, data_len)), out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_to_hex_int64(context_ptr: i64, value: i64, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(to_hex_int64(handle::context(context_ptr), value), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_to_hex_int32(context_ptr: i64, value: i32, out_len: *mut i32) -> *const u8 {
    unsafe { handle::emit_bytes(to_hex_int32(handle::context(context_ptr), value), out_len) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_from_hex_utf8(context_ptr: i64, text: *const u8, text_len: i32, out_len: *mut i32) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        handle::emit_bytes(from_hex(ctx, handle::bytes(text, text_len)), out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_to_hex_binary, [I64, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_to_hex_int64, [I64, I64, Ptr] -> Ptr),
        stub!(kiln_to_hex_int32, [I64, I32, Ptr] -> Ptr),
        stub!(kiln_from_hex_utf8, [I64, Ptr, I32, Ptr] -> Ptr),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex() {
        let ctx = ExecutionContext::new();
        assert_eq!(to_hex_binary(&ctx, b"foo"), b"666F6F");
        assert_eq!(to_hex_binary(&ctx, b"\x00\xff"), b"00FF");
        assert_eq!(to_hex_binary(&ctx, b""), b"");
        assert_eq!(to_hex_int64(&ctx, 10), b"A");
        assert_eq!(to_hex_int64(&ctx, 0), b"0");
        assert_eq!(to_hex_int64(&ctx, -1), b"FFFFFFFFFFFFFFFF");
        assert_eq!(to_hex_int32(&ctx, -1), b"FFFFFFFF");
        assert_eq!(to_hex_int32(&ctx, 255), b"FF");
    }

    #[test]
    fn test_from_hex() {
        let ctx = ExecutionContext::new();
        assert_eq!(from_hex(&ctx, b"414243"), b"ABC");
        assert_eq!(from_hex(&ctx, b"6f6D"), b"om");
        assert_eq!(from_hex(&ctx, b""), b"");
        assert!(!ctx.has_error());
    }

    #[test]
    fn test_from_hex_errors() {
        let ctx = ExecutionContext::new();
        assert_eq!(from_hex(&ctx, b"414"), b"");
        assert_eq!(
            ctx.error().as_deref(),
            Some("Error parsing hex string, length was not a multiple of two.")
        );

        let ctx = ExecutionContext::new();
        assert_eq!(from_hex(&ctx, b"41zz"), b"");
        assert_eq!(
            ctx.error().as_deref(),
            Some("Error parsing hex string, one or more bytes are not valid.")
        );
    }
}
