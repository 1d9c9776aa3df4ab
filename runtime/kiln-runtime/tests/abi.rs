///
/// Stub-level ABI Tests
///
/// Calls exported stubs exactly as generated code does: opaque i64 handles,
/// raw (pointer, length) spans and out-params. Covers:
/// 1. invalid inputs short-circuit without touching their pointers
/// 2. arena exhaustion becomes a context error with well-defined outputs
/// 3. output budgets come from the runtime config
/// 4. the context error slot keeps the first message
///
/// Run all:  `cargo test -p kiln-runtime --test abi`
///

use std::io::Write;

use kiln_runtime::collections::kiln_in_expr_lookup_utf8;
use kiln_runtime::crypto::kiln_md5_utf8;
use kiln_runtime::datetime::kiln_to_date_utf8_utf8;
use kiln_runtime::encoding::{kiln_get_json_object_utf8_utf8, kiln_parse_url_utf8_utf8};
use kiln_runtime::patterns::kiln_regexp_extract_utf8_utf8_int32;
use kiln_runtime::strings::{kiln_concat_utf8_utf8, kiln_replace_utf8_utf8_utf8, kiln_split_part};
use kiln_runtime::{
    handle, kiln_context_arena_malloc, kiln_context_has_error, kiln_context_set_error_msg, ExecutionContext,
    HolderSet, Literal, RuntimeConfig,
};

/// Never dereferenceable; any read through it faults.
const POISON: *const u8 = 0x1 as *const u8;

fn out(ptr: *const u8, len: i32) -> Vec<u8> {
    unsafe { handle::bytes(ptr, len).to_vec() }
}

#[test]
fn invalid_inputs_are_not_read() {
    let ctx = ExecutionContext::new();
    let c = handle::to_handle(&ctx);
    let mut holders = HolderSet::new();
    let json = holders.add("get_json_object", &[]).unwrap();
    let url = holders.add("parse_url", &[]).unwrap();
    let extract = holders
        .add("regexp_extract", &[Literal::Null, Literal::Utf8("(a+)".into()), Literal::Null])
        .unwrap();
    let date = holders
        .add("to_date", &[Literal::Null, Literal::Utf8("YYYY-MM-DD".into())])
        .unwrap();
    let set = holders.add("in_utf8", &[Literal::Utf8("x".into())]).unwrap();

    let mut valid = true;
    let mut len = -1;
    unsafe {
        let p = kiln_concat_utf8_utf8(c, POISON, 1 << 20, false, b"ab".as_ptr(), 2, true, &mut len);
        assert_eq!(out(p, len), b"ab");

        kiln_get_json_object_utf8_utf8(c, json, POISON, 64, false, b"$.a".as_ptr(), 3, true, &mut valid, &mut len);
        assert!(!valid);
        assert_eq!(len, 0);

        valid = true;
        kiln_parse_url_utf8_utf8(c, url, b"http://h".as_ptr(), 8, true, POISON, 64, false, &mut valid, &mut len);
        assert!(!valid);

        valid = true;
        kiln_split_part(c, POISON, 64, false, b",".as_ptr(), 1, true, 1, true, &mut valid, &mut len);
        assert!(!valid);

        valid = true;
        kiln_regexp_extract_utf8_utf8_int32(c, extract, POISON, 64, false, 1, &mut valid, &mut len);
        assert!(!valid);

        valid = true;
        assert_eq!(kiln_to_date_utf8_utf8(c, date, POISON, 64, false, &mut valid), 0);
        assert!(!valid);

        assert!(!kiln_in_expr_lookup_utf8(set, POISON, 64, false));

        len = -1;
        kiln_md5_utf8(c, POISON, 64, false, &mut len);
        assert_eq!(len, 0);
    }
    assert!(!ctx.has_error());
}

#[test]
fn arena_exhaustion_is_a_context_error() {
    let config = RuntimeConfig::from_toml_str("[arena]\nblock_size = 1024\ncapacity = 4096\n").unwrap();
    let ctx = ExecutionContext::with_config(&config);
    let c = handle::to_handle(&ctx);
    let big = vec![b'z'; 8192];

    let mut len = -1;
    let p = unsafe { kiln_concat_utf8_utf8(c, big.as_ptr(), 8192, true, big.as_ptr(), 8192, true, &mut len) };
    assert!(!p.is_null());
    assert_eq!(len, 0);
    assert_eq!(ctx.error().as_deref(), Some("Could not allocate memory for output string"));

    let raw = unsafe { kiln_context_arena_malloc(c, 1 << 20) };
    assert!(raw.is_null());
    assert!(unsafe { kiln_context_has_error(c) });
}

#[test]
fn replace_budget_comes_from_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[limits]\nreplace_max_len = 8").unwrap();
    let config = RuntimeConfig::from_file(file.path()).unwrap();

    let tight = ExecutionContext::with_config(&config);
    let roomy = ExecutionContext::new();
    let mut len = -1;
    unsafe {
        let p = kiln_replace_utf8_utf8_utf8(
            handle::to_handle(&roomy),
            b"aaaa".as_ptr(),
            4,
            b"a".as_ptr(),
            1,
            b"xyz".as_ptr(),
            3,
            &mut len,
        );
        assert_eq!(out(p, len), b"xyzxyzxyzxyz");

        kiln_replace_utf8_utf8_utf8(
            handle::to_handle(&tight),
            b"aaaa".as_ptr(),
            4,
            b"a".as_ptr(),
            1,
            b"xyz".as_ptr(),
            3,
            &mut len,
        );
    }
    assert_eq!(len, 0);
    assert_eq!(tight.error().as_deref(), Some("Buffer overflow for output string"));
    assert!(!roomy.has_error());
}

#[test]
fn first_error_wins_until_reset() {
    let mut ctx = ExecutionContext::new();
    let c = handle::to_handle(&ctx);
    unsafe {
        kiln_context_set_error_msg(c, b"first".as_ptr(), 5);
        kiln_context_set_error_msg(c, b"second".as_ptr(), 6);
    }
    assert_eq!(ctx.error().as_deref(), Some("first"));
    ctx.reset();
    assert!(!ctx.has_error());
}
