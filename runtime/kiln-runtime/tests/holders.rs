///
/// Holder Integration Tests
///
/// Builds holders through `HolderSet` the way the expression compiler does,
/// then drives them through their exported stubs: shared across threads,
/// against a linear-scan oracle, and on the documented sample inputs.
///
/// Run all:  `cargo test -p kiln-runtime --test holders`
///

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kiln_runtime::collections::{kiln_in_expr_lookup_int64, kiln_in_expr_lookup_utf8};
use kiln_runtime::encoding::{kiln_get_json_object_utf8_utf8, kiln_parse_url_utf8_utf8};
use kiln_runtime::patterns::kiln_like_utf8_utf8;
use kiln_runtime::random::kiln_random;
use kiln_runtime::strings::kiln_translate_utf8_utf8_utf8;
use kiln_runtime::{handle, ExecutionContext, HolderError, HolderSet, Literal};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn json(set: i64, ctx: &ExecutionContext, doc: &str, path: &str) -> Option<String> {
    let mut valid = false;
    let mut len = 0;
    unsafe {
        let p = kiln_get_json_object_utf8_utf8(
            handle::to_handle(ctx),
            set,
            doc.as_ptr(),
            doc.len() as i32,
            true,
            path.as_ptr(),
            path.len() as i32,
            true,
            &mut valid,
            &mut len,
        );
        valid.then(|| String::from_utf8_lossy(handle::bytes(p, len)).into_owned())
    }
}

fn parse_url(set: i64, ctx: &ExecutionContext, url: &str, part: &str) -> Option<String> {
    let mut valid = false;
    let mut len = 0;
    unsafe {
        let p = kiln_parse_url_utf8_utf8(
            handle::to_handle(ctx),
            set,
            url.as_ptr(),
            url.len() as i32,
            true,
            part.as_ptr(),
            part.len() as i32,
            true,
            &mut valid,
            &mut len,
        );
        valid.then(|| String::from_utf8_lossy(handle::bytes(p, len)).into_owned())
    }
}

#[test]
fn json_sample_paths() {
    init_tracing();
    let mut holders = HolderSet::new();
    let h = holders.add("get_json_object", &[]).unwrap();
    let ctx = ExecutionContext::new();
    assert_eq!(json(h, &ctx, r#"{"hello": "3.5"}"#, "$.hello").as_deref(), Some("3.5"));
    assert_eq!(json(h, &ctx, r#"{"hello": 3.5}"#, "$.hi"), None);
    assert_eq!(json(h, &ctx, r#"[{"a":1}]"#, "$[0].a").as_deref(), Some("1"));
}

#[test]
fn parse_url_sample_parts() {
    let mut holders = HolderSet::new();
    let h = holders.add("parse_url", &[]).unwrap();
    let ctx = ExecutionContext::new();
    assert_eq!(
        parse_url(h, &ctx, "https://u@host:8080/p?q=1#f", "AUTHORITY").as_deref(),
        Some("u@host:8080")
    );
    assert_eq!(parse_url(h, &ctx, "http://host", "REF"), None);
}

#[test]
fn construction_errors_surface() {
    init_tracing();
    let mut holders = HolderSet::new();
    let err = holders.add("like", &[Literal::Null, Literal::Int32(3)]).unwrap_err();
    assert!(matches!(err, HolderError::LiteralType { .. }));
    let err = holders.add("unknown_fn", &[]).unwrap_err();
    assert!(matches!(err, HolderError::UnknownFunction(_)));
    assert!(holders.is_empty());
}

#[test]
fn like_holder_shared_across_threads() {
    let mut holders = HolderSet::new();
    let h = holders
        .add("like", &[Literal::Null, Literal::Utf8("%ab_d%".into())])
        .unwrap();
    let rows: Vec<String> = (0..512)
        .map(|i| if i % 3 == 0 { format!("xx{i}abcd{i}") } else { format!("row{i}") })
        .collect();
    let expected: Vec<bool> = rows.iter().map(|r| r.contains("abcd")).collect();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for (row, want) in rows.iter().zip(&expected) {
                    let got = unsafe { kiln_like_utf8_utf8(h, row.as_ptr(), row.len() as i32) };
                    assert_eq!(got, *want, "{row}");
                }
            });
        }
    });
}

#[test]
fn translate_holder_per_thread_contexts() {
    let mut holders = HolderSet::new();
    let h = holders
        .add("translate", &[Literal::Null, Literal::Utf8("abc".into()), Literal::Utf8("xy".into())])
        .unwrap();

    std::thread::scope(|s| {
        for t in 0..4 {
            s.spawn(move || {
                let ctx = ExecutionContext::new();
                for _ in 0..100 {
                    let mut len = 0;
                    let text = format!("aabbcc{t}");
                    let out = unsafe {
                        let p = kiln_translate_utf8_utf8_utf8(
                            handle::to_handle(&ctx),
                            h,
                            text.as_ptr(),
                            text.len() as i32,
                            b"abc".as_ptr(),
                            3,
                            b"xy".as_ptr(),
                            2,
                            &mut len,
                        );
                        handle::bytes(p, len).to_vec()
                    };
                    assert_eq!(out, format!("xxyy{t}").into_bytes());
                }
            });
        }
    });
}

#[test]
fn random_holder_hands_out_one_sequence() {
    let mut holders = HolderSet::new();
    let shared = holders.add("random", &[Literal::Int64(2024)]).unwrap();
    let reference = holders.add("random", &[Literal::Int64(2024)]).unwrap();

    let mut drawn: Vec<f64> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|_| s.spawn(move || (0..250).map(|_| unsafe { kiln_random(shared) }).collect::<Vec<_>>()))
            .collect();
        workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
    });
    let mut expected: Vec<f64> = (0..1000).map(|_| unsafe { kiln_random(reference) }).collect();

    drawn.sort_by(f64::total_cmp);
    expected.sort_by(f64::total_cmp);
    assert_eq!(drawn, expected);
}

#[test]
fn in_holder_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(0x6b696c6e);
    for _ in 0..20 {
        let size = rng.gen_range(0..40);
        let values: Vec<i64> = (0..size).map(|_| rng.gen_range(-50..50)).collect();
        let literals: Vec<Literal> = values.iter().map(|&v| Literal::Int64(v)).collect();
        let mut holders = HolderSet::new();
        let h = holders.add("in_int64", &literals).unwrap();

        for _ in 0..200 {
            let probe = rng.gen_range(-60..60);
            let valid = rng.gen_bool(0.9);
            let want = valid && values.contains(&probe);
            assert_eq!(unsafe { kiln_in_expr_lookup_int64(h, probe, valid) }, want);
        }
    }
}

#[test]
fn in_holder_bytes_match_linear_scan() {
    let mut rng = StdRng::seed_from_u64(7);
    let alphabet = ['a', 'b', 'é', '字'];
    let word = |rng: &mut StdRng| -> String {
        let len = rng.gen_range(0..4);
        (0..len).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect()
    };

    let values: Vec<String> = (0..30).map(|_| word(&mut rng)).collect();
    let literals: Vec<Literal> = values.iter().map(|v| Literal::Utf8(v.clone())).collect();
    let mut holders = HolderSet::new();
    let h = holders.add("in_utf8", &literals).unwrap();

    for _ in 0..500 {
        let probe = word(&mut rng);
        let want = values.contains(&probe);
        let got = unsafe { kiln_in_expr_lookup_utf8(h, probe.as_ptr(), probe.len() as i32, true) };
        assert_eq!(got, want, "{probe:?}");
    }
}
