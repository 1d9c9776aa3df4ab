///
/// concat / concatOperator for two to four inputs.
///
/// `concat` takes a validity flag per input and reads a null input as the empty
/// string; `concatOperator` takes no flags (null propagation happens in the
/// generated code).
///

use kiln_std_core::{handle, StubSignature};

macro_rules! concat_stubs {
    ($concat:ident, $operator:ident, $(($data:ident, $len:ident, $valid:ident)),+) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $concat(
            context_ptr: i64,
            $($data: *const u8, $len: i32, $valid: bool,)+
            out_len: *mut i32,
        ) -> *const u8 {
            unsafe {
                let ctx = handle::context(context_ptr);
                let parts = [$(handle::bytes($data, if $valid { $len } else { 0 })),+];
                handle::emit_bytes(ctx.concat(&parts), out_len)
            }
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $operator(
            context_ptr: i64,
            $($data: *const u8, $len: i32,)+
            out_len: *mut i32,
        ) -> *const u8 {
            unsafe {
                let ctx = handle::context(context_ptr);
                let parts = [$(handle::bytes($data, $len)),+];
                handle::emit_bytes(ctx.concat(&parts), out_len)
            }
        }
    };
}

concat_stubs!(
    kiln_concat_utf8_utf8,
    kiln_concatOperator_utf8_utf8,
    (in1, in1_len, in1_valid),
    (in2, in2_len, in2_valid)
);

concat_stubs!(
    kiln_concat_utf8_utf8_utf8,
    kiln_concatOperator_utf8_utf8_utf8,
    (in1, in1_len, in1_valid),
    (in2, in2_len, in2_valid),
    (in3, in3_len, in3_valid)
);

concat_stubs!(
    kiln_concat_utf8_utf8_utf8_utf8,
    kiln_concatOperator_utf8_utf8_utf8_utf8,
    (in1, in1_len, in1_valid),
    (in2, in2_len, in2_valid),
    (in3, in3_len, in3_valid),
    (in4, in4_len, in4_valid)
);

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_concat_utf8_utf8, [I64, Ptr, I32, Bool, Ptr, I32, Bool, Ptr] -> Ptr),
        stub!(kiln_concatOperator_utf8_utf8, [I64, Ptr, I32, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_concat_utf8_utf8_utf8, [I64, Ptr, I32, Bool, Ptr, I32, Bool, Ptr, I32, Bool, Ptr] -> Ptr),
        stub!(kiln_concatOperator_utf8_utf8_utf8, [I64, Ptr, I32, Ptr, I32, Ptr, I32, Ptr] -> Ptr),
        stub!(
            kiln_concat_utf8_utf8_utf8_utf8,
            [I64, Ptr, I32, Bool, Ptr, I32, Bool, Ptr, I32, Bool, Ptr, I32, Bool, Ptr] -> Ptr
        ),
        stub!(
            kiln_concatOperator_utf8_utf8_utf8_utf8,
            [I64, Ptr, I32, Ptr, I32, Ptr, I32, Ptr, I32, Ptr] -> Ptr
        ),
    ]
}
