///
/// Literal replacement: replace(text, from, to) with an output budget, and the
/// glyph-wise translate(text, from, to) holder.
///

use memchr::memmem;
use rustc_hash::FxHashMap;

use kiln_std_core::{handle, ExecutionContext, HolderError, Literal, LiteralArgs, StubSignature};

use crate::utf8::{glyph_spans, set_invalid_utf8_error};

const OVERFLOW: &str = "Buffer overflow for output string";

/// Replace every non-overlapping occurrence of `from`. The output may not
/// exceed `max_len` bytes.
pub fn replace_with_max_len<'a>(
    ctx: &'a ExecutionContext,
    text: &'a [u8],
    from: &[u8],
    to: &[u8],
    max_len: i32,
) -> &'a [u8] {
    if from.is_empty() || from.len() > text.len() {
        return text;
    }
    let max_len = max_len.max(0) as usize;
    let mut out: Vec<u8> = Vec::new();
    let mut last = 0;
    let mut found = false;
    for pos in memmem::find_iter(text, from) {
        found = true;
        if out.len() + (pos - last) + to.len() > max_len {
            ctx.set_error(OVERFLOW);
            return &[];
        }
        out.extend_from_slice(&text[last..pos]);
        out.extend_from_slice(to);
        last = pos + from.len();
    }
    if !found {
        return text;
    }
    if out.len() + (text.len() - last) > max_len {
        ctx.set_error(OVERFLOW);
        return &[];
    }
    out.extend_from_slice(&text[last..]);
    ctx.copy(&out)
}

pub fn replace<'a>(ctx: &'a ExecutionContext, text: &'a [u8], from: &[u8], to: &[u8]) -> &'a [u8] {
    replace_with_max_len(ctx, text, from, to, ctx.limits().replace_max_len)
}

type GlyphMap = FxHashMap<Vec<u8>, Option<Vec<u8>>>;

/// glyph of `from` -> glyph at the same position in `to`, or `None` to delete
fn translation_map(from: &[u8], to: &[u8]) -> Result<GlyphMap, u8> {
    let from_spans = glyph_spans(from)?;
    let to_spans = glyph_spans(to)?;
    let mut map = GlyphMap::default();
    for (i, &(start, end)) in from_spans.iter().enumerate() {
        let target = to_spans.get(i).map(|&(s, e)| to[s..e].to_vec());
        map.entry(from[start..end].to_vec()).or_insert(target);
    }
    Ok(map)
}

/// translate(text, from, to). When `from` and `to` are literals the glyph map is
/// built once at construction; otherwise it is rebuilt for each row.
#[derive(Debug, Default)]
pub struct TranslateHolder {
    cached: Option<(Vec<u8>, Vec<u8>, GlyphMap)>,
}

impl TranslateHolder {
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(0, 3)?;
        let cached = match (args.get(1), args.get(2)) {
            (Some(Literal::Utf8(from)), Some(Literal::Utf8(to))) => {
                let (from, to) = (from.as_bytes(), to.as_bytes());
                translation_map(from, to)
                    .ok()
                    .map(|map| (from.to_vec(), to.to_vec(), map))
            }
            _ => None,
        };
        tracing::debug!(cached = cached.is_some(), "translate holder ready");
        Ok(Self { cached })
    }

    pub fn call<'a>(&self, ctx: &'a ExecutionContext, text: &'a [u8], from: &[u8], to: &[u8]) -> &'a [u8] {
        if text.is_empty() || from.is_empty() {
            return text;
        }
        let built;
        let map = match &self.cached {
            Some((f, t, map)) if f == from && t == to => map,
            _ => match translation_map(from, to) {
                Ok(map) => {
                    built = map;
                    &built
                }
                Err(byte) => {
                    set_invalid_utf8_error(ctx, byte);
                    return &[];
                }
            },
        };
        let spans = match glyph_spans(text) {
            Ok(spans) => spans,
            Err(byte) => {
                set_invalid_utf8_error(ctx, byte);
                return &[];
            }
        };
        let mut out = Vec::with_capacity(text.len());
        for (start, end) in spans {
            let glyph = &text[start..end];
            match map.get(glyph) {
                Some(Some(target)) => out.extend_from_slice(target),
                Some(None) => {}
                None => out.extend_from_slice(glyph),
            }
        }
        ctx.copy(&out)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_replace_utf8_utf8_utf8(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    from: *const u8,
    from_len: i32,
    to: *const u8,
    to_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let out = replace(
            ctx,
            handle::bytes(text, text_len),
            handle::bytes(from, from_len),
            handle::bytes(to, to_len),
        );
        handle::emit_bytes(out, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_replace_with_max_len_utf8_utf8_utf8(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    from: *const u8,
    from_len: i32,
    to: *const u8,
    to_len: i32,
    max_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let out = replace_with_max_len(
            ctx,
            handle::bytes(text, text_len),
            handle::bytes(from, from_len),
            handle::bytes(to, to_len),
            max_len,
        );
        handle::emit_bytes(out, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_translate_utf8_utf8_utf8(
    context_ptr: i64,
    holder_ptr: i64,
    text: *const u8,
    text_len: i32,
    from: *const u8,
    from_len: i32,
    to: *const u8,
    to_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let holder = handle::holder::<TranslateHolder>(holder_ptr);
        let out = holder.call(
            ctx,
            handle::bytes(text, text_len),
            handle::bytes(from, from_len),
            handle::bytes(to, to_len),
        );
        handle::emit_bytes(out, out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_replace_utf8_utf8_utf8, [I64, Ptr, I32, Ptr, I32, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_replace_with_max_len_utf8_utf8_utf8, [I64, Ptr, I32, Ptr, I32, Ptr, I32, I32, Ptr] -> Ptr),
        stub!(kiln_translate_utf8_utf8_utf8, [I64, I64, Ptr, I32, Ptr, I32, Ptr, I32, Ptr] -> Ptr),
    ]
}
