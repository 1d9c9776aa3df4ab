///
/// Exported hashing stubs.
///
/// `kiln_<algo>_<type>` for md5, sha1 and sha256 over every numeric, boolean
/// and date/time type plus utf8, binary and decimal128, and
/// `kiln_sha2_<type>_int32` over the same numeric types plus utf8 and binary.
/// Narrow integer types travel as `I32` and are narrowed back before widening
/// to f64. The digest text is copied into the context arena.
///

use kiln_std_core::{handle, Decimal128, StubSignature};

use crate::hash::{canonical_f64, HashAlgorithm};

/// Hash `input` (or nothing, for an invalid row) and hand back the hex text.
///
/// # Safety
/// `context_ptr` must be a live context handle; `out_len` null or writable.
unsafe fn emit_digest(context_ptr: i64, algorithm: HashAlgorithm, input: Option<&[u8]>, out_len: *mut i32) -> *const u8 {
    unsafe {
        let Some(input) = input else {
            return handle::emit_bytes(b"", out_len);
        };
        let ctx = handle::context(context_ptr);
        let digest = algorithm.hex_digest(input);
        handle::emit_bytes(ctx.copy(digest.as_bytes()), out_len)
    }
}

macro_rules! numeric_stub {
    ($name:ident, $algorithm:ident, $rust:ty, $widen:expr) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(context_ptr: i64, value: $rust, valid: bool, out_len: *mut i32) -> *const u8 {
            let widen: fn($rust) -> f64 = $widen;
            let bytes = valid.then(|| canonical_f64(widen(value)));
            unsafe { emit_digest(context_ptr, HashAlgorithm::$algorithm, bytes.as_ref().map(|b| &b[..]), out_len) }
        }
    };
}

macro_rules! hash_stubs {
    ($algo:ident, $algorithm:ident) => {
        paste::paste! {
            numeric_stub!([<kiln_ $algo _int8>], $algorithm, i32, |v| v as i8 as f64);
            numeric_stub!([<kiln_ $algo _int16>], $algorithm, i32, |v| v as i16 as f64);
            numeric_stub!([<kiln_ $algo _int32>], $algorithm, i32, |v| v as f64);
            numeric_stub!([<kiln_ $algo _int64>], $algorithm, i64, |v| v as f64);
            numeric_stub!([<kiln_ $algo _uint8>], $algorithm, i32, |v| v as u8 as f64);
            numeric_stub!([<kiln_ $algo _uint16>], $algorithm, i32, |v| v as u16 as f64);
            numeric_stub!([<kiln_ $algo _uint32>], $algorithm, i32, |v| v as u32 as f64);
            numeric_stub!([<kiln_ $algo _uint64>], $algorithm, i64, |v| v as u64 as f64);
            numeric_stub!([<kiln_ $algo _float32>], $algorithm, f32, f64::from);
            numeric_stub!([<kiln_ $algo _float64>], $algorithm, f64, |v| v);
            numeric_stub!([<kiln_ $algo _boolean>], $algorithm, bool, |v| f64::from(u8::from(v)));
            numeric_stub!([<kiln_ $algo _date32>], $algorithm, i32, |v| v as f64);
            numeric_stub!([<kiln_ $algo _date64>], $algorithm, i64, |v| v as f64);
            numeric_stub!([<kiln_ $algo _time32>], $algorithm, i32, |v| v as f64);
            numeric_stub!([<kiln_ $algo _timestamp>], $algorithm, i64, |v| v as f64);
            numeric_stub!([<kiln_ $algo _timestampusutc>], $algorithm, i64, |v| v as f64);

            #[unsafe(no_mangle)]
            pub unsafe extern "C" fn [<kiln_ $algo _utf8>](
                context_ptr: i64,
                data: *const u8,
                data_len: i32,
                valid: bool,
                out_len: *mut i32,
            ) -> *const u8 {
                unsafe {
                    let input = valid.then(|| handle::bytes(data, data_len));
                    emit_digest(context_ptr, HashAlgorithm::$algorithm, input, out_len)
                }
            }

            #[unsafe(no_mangle)]
            pub unsafe extern "C" fn [<kiln_ $algo _binary>](
                context_ptr: i64,
                data: *const u8,
                data_len: i32,
                valid: bool,
                out_len: *mut i32,
            ) -> *const u8 {
                unsafe { [<kiln_ $algo _utf8>](context_ptr, data, data_len, valid, out_len) }
            }

            #[unsafe(no_mangle)]
            pub unsafe extern "C" fn [<kiln_ $algo _decimal128>](
                context_ptr: i64,
                high: i64,
                low: i64,
                precision: i32,
                scale: i32,
                valid: bool,
                out_len: *mut i32,
            ) -> *const u8 {
                let bytes = valid.then(|| Decimal128::from_parts(high, low as u64, precision, scale).to_le_bytes());
                unsafe { emit_digest(context_ptr, HashAlgorithm::$algorithm, bytes.as_ref().map(|b| &b[..]), out_len) }
            }

            fn [<$algo _signatures>]() -> Vec<StubSignature> {
                use kiln_std_core::stub;
                vec![
                    stub!([<kiln_ $algo _int8>], [I64, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _int16>], [I64, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _int32>], [I64, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _int64>], [I64, I64, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _uint8>], [I64, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _uint16>], [I64, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _uint32>], [I64, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _uint64>], [I64, I64, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _float32>], [I64, F32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _float64>], [I64, F64, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _boolean>], [I64, Bool, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _date32>], [I64, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _date64>], [I64, I64, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _time32>], [I64, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _timestamp>], [I64, I64, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _timestampusutc>], [I64, I64, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _utf8>], [I64, Ptr, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _binary>], [I64, Ptr, I32, Bool, Ptr] -> Ptr),
                    stub!([<kiln_ $algo _decimal128>], [I64, I64, I64, I32, I32, Bool, Ptr] -> Ptr),
                ]
            }
        }
    };
}

hash_stubs!(md5, Md5);
hash_stubs!(sha1, Sha1);
hash_stubs!(sha256, Sha256);

/// `sha2` over `input` with a runtime digest width. A missing width is an
/// error even for an invalid row; an unsupported width is checked next.
///
/// # Safety
/// Same as `emit_digest`.
unsafe fn emit_sha2_digest(
    context_ptr: i64,
    bits: i32,
    bits_valid: bool,
    input: Option<&[u8]>,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        if !bits_valid {
            ctx.set_error("The bits length should be specified!");
            return handle::emit_bytes(b"", out_len);
        }
        let Some(algorithm) = HashAlgorithm::for_sha2_bits(bits) else {
            ctx.set_error(format!("Unsupported bits length for sha2: {bits}"));
            return handle::emit_bytes(b"", out_len);
        };
        emit_digest(context_ptr, algorithm, input, out_len)
    }
}

macro_rules! sha2_stubs {
    ($(($ty:ident, $rust:ty, $abi:ident, $widen:expr)),+ $(,)?) => {
        paste::paste! {
            $(
                #[unsafe(no_mangle)]
                pub unsafe extern "C" fn [<kiln_sha2_ $ty _int32>](
                    context_ptr: i64,
                    value: $rust,
                    valid: bool,
                    bits: i32,
                    bits_valid: bool,
                    out_len: *mut i32,
                ) -> *const u8 {
                    let widen: fn($rust) -> f64 = $widen;
                    let bytes = valid.then(|| canonical_f64(widen(value)));
                    unsafe { emit_sha2_digest(context_ptr, bits, bits_valid, bytes.as_ref().map(|b| &b[..]), out_len) }
                }
            )+

            fn sha2_numeric_signatures() -> Vec<StubSignature> {
                use kiln_std_core::stub;
                vec![$(stub!([<kiln_sha2_ $ty _int32>], [I64, $abi, Bool, I32, Bool, Ptr] -> Ptr)),+]
            }
        }
    };
}

sha2_stubs!(
    (int8, i32, I32, |v| v as i8 as f64),
    (int16, i32, I32, |v| v as i16 as f64),
    (int32, i32, I32, |v| v as f64),
    (int64, i64, I64, |v| v as f64),
    (uint8, i32, I32, |v| v as u8 as f64),
    (uint16, i32, I32, |v| v as u16 as f64),
    (uint32, i32, I32, |v| v as u32 as f64),
    (uint64, i64, I64, |v| v as u64 as f64),
    (float32, f32, F32, f64::from),
    (float64, f64, F64, |v| v),
    (boolean, bool, Bool, |v| f64::from(u8::from(v))),
    (date32, i32, I32, |v| v as f64),
    (date64, i64, I64, |v| v as f64),
    (time32, i32, I32, |v| v as f64),
    (timestamp, i64, I64, |v| v as f64),
    (timestampusutc, i64, I64, |v| v as f64),
);

/// `sha2(text, bits)`.
///
/// # Safety
/// Standard stub preconditions on `context_ptr`, `data` and `out_len`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_sha2_utf8_int32(
    context_ptr: i64,
    data: *const u8,
    data_len: i32,
    valid: bool,
    bits: i32,
    bits_valid: bool,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let input = valid.then(|| handle::bytes(data, data_len));
        emit_sha2_digest(context_ptr, bits, bits_valid, input, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_sha2_binary_int32(
    context_ptr: i64,
    data: *const u8,
    data_len: i32,
    valid: bool,
    bits: i32,
    bits_valid: bool,
    out_len: *mut i32,
) -> *const u8 {
    unsafe { kiln_sha2_utf8_int32(context_ptr, data, data_len, valid, bits, bits_valid, out_len) }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    let mut sigs = md5_signatures();
    sigs.extend(sha1_signatures());
    sigs.extend(sha256_signatures());
    sigs.extend(sha2_numeric_signatures());
    sigs.push(stub!(kiln_sha2_utf8_int32, [I64, Ptr, I32, Bool, I32, Bool, Ptr] -> Ptr));
    sigs.push(stub!(kiln_sha2_binary_int32, [I64, Ptr, I32, Bool, I32, Bool, Ptr] -> Ptr));
    sigs
}
