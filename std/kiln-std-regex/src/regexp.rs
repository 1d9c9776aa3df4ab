///
/// Regex holders: rlike, regexp_replace, regexp_extract.
///
/// The pattern is always a literal compiled once at construction. Matching runs
/// on raw bytes, so rows that are not valid UTF-8 simply fail to match `.`.
///

use std::borrow::Cow;

use regex::bytes::Regex;

use kiln_std_core::{handle, ExecutionContext, HolderError, Literal, LiteralArgs, StubSignature};

fn compile_regex(pattern: &str) -> Result<Regex, HolderError> {
    Regex::new(pattern).map_err(|e| HolderError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// `rlike(text, pattern)`: unanchored search.
#[derive(Debug)]
pub struct RLikeHolder {
    regex: Regex,
}

impl RLikeHolder {
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(2, 2)?;
        let pattern = args.utf8(1)?;
        let regex = compile_regex(pattern)?;
        tracing::debug!(pattern, "rlike holder ready");
        Ok(Self { regex })
    }

    pub fn call(&self, data: &[u8]) -> bool {
        self.regex.is_match(data)
    }
}

/// Rewrite `$n`/`${n}` group references into the form the regex crate expands,
/// with `\$` as a literal dollar and `\\` as a literal backslash.
pub fn rewrite_replacement(replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(replacement.len() + 4);
    let mut i = 0;
    while i < replacement.len() {
        match replacement[i] {
            b'\\' if matches!(replacement.get(i + 1), Some(b'$')) => {
                out.extend_from_slice(b"$$");
                i += 2;
            }
            b'\\' if matches!(replacement.get(i + 1), Some(b'\\')) => {
                out.push(b'\\');
                i += 2;
            }
            b'$' if replacement.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                let digits = replacement[i + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
                out.extend_from_slice(b"${");
                out.extend_from_slice(&replacement[i + 1..i + 1 + digits]);
                out.push(b'}');
                i += 1 + digits;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

/// `regexp_replace(text, pattern, replacement)`: replaces every match.
///
/// A literal replacement is rewritten once at construction; rows carrying any
/// other replacement are rewritten per call.
#[derive(Debug)]
pub struct RegexpReplaceHolder {
    regex: Regex,
    literal: Option<LiteralReplacement>,
}

#[derive(Debug)]
struct LiteralReplacement {
    source: Vec<u8>,
    rewritten: Vec<u8>,
}

impl RegexpReplaceHolder {
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(2, 3)?;
        let pattern = args.utf8(1)?;
        let regex = compile_regex(pattern)?;
        let literal = match args.get(2) {
            Some(Literal::Utf8(replacement)) => Some(LiteralReplacement {
                source: replacement.as_bytes().to_vec(),
                rewritten: rewrite_replacement(replacement.as_bytes()),
            }),
            _ => None,
        };
        tracing::debug!(
            pattern,
            groups = regex.captures_len() - 1,
            literal_replacement = literal.is_some(),
            "regexp_replace holder ready"
        );
        Ok(Self { regex, literal })
    }

    fn replacement<'r>(&'r self, replacement: &'r [u8]) -> Cow<'r, [u8]> {
        match &self.literal {
            Some(literal) if literal.source == replacement => Cow::Borrowed(&literal.rewritten),
            _ => Cow::Owned(rewrite_replacement(replacement)),
        }
    }

    pub fn call<'a>(&self, ctx: &'a ExecutionContext, text: &'a [u8], replacement: &[u8]) -> &'a [u8] {
        let replacement = self.replacement(replacement);
        match self.regex.replace_all(text, &*replacement) {
            Cow::Borrowed(unchanged) => unchanged,
            Cow::Owned(replaced) => ctx.copy(&replaced),
        }
    }
}

/// `regexp_extract(text, pattern, idx)`: capture group `idx` of the first match.
#[derive(Debug)]
pub struct RegexpExtractHolder {
    regex: Regex,
}

impl RegexpExtractHolder {
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(2, 3)?;
        let pattern = args.utf8(1)?;
        let regex = compile_regex(pattern)?;
        tracing::debug!(pattern, groups = regex.captures_len() - 1, "regexp_extract holder ready");
        Ok(Self { regex })
    }

    /// `None` when `index` names no group; an empty slice when nothing matched
    /// or the group did not take part in the match.
    pub fn call<'a>(&self, text: &'a [u8], index: i32) -> Option<&'a [u8]> {
        let index = usize::try_from(index).ok().filter(|&i| i < self.regex.captures_len())?;
        let Some(caps) = self.regex.captures(text) else {
            return Some(&[][..]);
        };
        Some(caps.get(index).map_or(&[][..], |m| m.as_bytes()))
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_rlike_utf8_utf8(holder_ptr: i64, data: *const u8, data_len: i32) -> bool {
    unsafe { handle::holder::<RLikeHolder>(holder_ptr).call(handle::bytes(data, data_len)) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_regexp_replace_utf8_utf8_utf8(
    context_ptr: i64,
    holder_ptr: i64,
    text: *const u8,
    text_len: i32,
    replacement: *const u8,
    replacement_len: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let ctx = handle::context(context_ptr);
        let holder = handle::holder::<RegexpReplaceHolder>(holder_ptr);
        let out = holder.call(ctx, handle::bytes(text, text_len), handle::bytes(replacement, replacement_len));
        handle::emit_bytes(out, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_regexp_extract_utf8_utf8_int32(
    _context_ptr: i64,
    holder_ptr: i64,
    text: *const u8,
    text_len: i32,
    text_valid: bool,
    index: i32,
    out_valid: *mut bool,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        if !text_valid {
            return handle::emit_null(out_valid, out_len);
        }
        let holder = handle::holder::<RegexpExtractHolder>(holder_ptr);
        handle::emit_nullable(holder.call(handle::bytes(text, text_len), index), out_valid, out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_rlike_utf8_utf8, [I64, Ptr, I32] -> Bool),
        stub!(kiln_regexp_replace_utf8_utf8_utf8, [I64, I64, Ptr, I32, Ptr, I32, Ptr] -> Ptr),
        stub!(kiln_regexp_extract_utf8_utf8_int32, [I64, I64, Ptr, I32, Bool, I32, Ptr, Ptr] -> Ptr),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_std_core::Literal;

    fn args(pattern: &str) -> [Literal; 2] {
        [Literal::Null, Literal::Utf8(pattern.into())]
    }

    #[test]
    fn test_rlike_is_unanchored() {
        let a = args("b+c");
        let h = RLikeHolder::make(&LiteralArgs::new("rlike", &a)).unwrap();
        assert!(h.call(b"abbbcd"));
        assert!(!h.call(b"acd"));
    }

    #[test]
    fn test_invalid_pattern() {
        let a = args("a(b");
        let err = RLikeHolder::make(&LiteralArgs::new("rlike", &a)).unwrap_err();
        assert!(matches!(err, HolderError::InvalidPattern { .. }));
    }

    #[test]
    fn test_rewrite_replacement() {
        assert_eq!(rewrite_replacement(b"$1-$2"), b"${1}-${2}");
        assert_eq!(rewrite_replacement(b"${1}x"), b"${1}x");
        assert_eq!(rewrite_replacement(b"cost \\$5"), b"cost $$5");
        assert_eq!(rewrite_replacement(b"a\\\\b"), b"a\\b");
        assert_eq!(rewrite_replacement(b"$1a"), b"${1}a");
    }

    #[test]
    fn test_regexp_replace() {
        let ctx = ExecutionContext::new();
        let a = args("(\\w+)@(\\w+)");
        let h = RegexpReplaceHolder::make(&LiteralArgs::new("regexp_replace", &a)).unwrap();
        assert_eq!(h.call(&ctx, b"joe@example, ann@test", b"$2:$1"), b"example:joe, test:ann");
        assert_eq!(h.call(&ctx, b"no match here", b"x"), b"no match here");

        let a = args("\\d");
        let h = RegexpReplaceHolder::make(&LiteralArgs::new("regexp_replace", &a)).unwrap();
        assert_eq!(h.call(&ctx, b"a1b22", b"\\$"), b"a$b$$");
        assert_eq!(h.call(&ctx, b"a1b22", b""), b"ab");
    }

    #[test]
    fn test_regexp_replace_literal_cached() {
        let ctx = ExecutionContext::new();
        let a = [Literal::Null, Literal::Utf8("(\\w)(\\d)".into()), Literal::Utf8("$2$1".into())];
        let h = RegexpReplaceHolder::make(&LiteralArgs::new("regexp_replace", &a)).unwrap();
        assert!(matches!(h.replacement(b"$2$1"), Cow::Borrowed(cached) if cached == b"${2}${1}"));
        assert_eq!(h.call(&ctx, b"a1 b2", b"$2$1"), b"1a 2b");

        assert!(matches!(h.replacement(b"<$1>"), Cow::Owned(_)));
        assert_eq!(h.call(&ctx, b"a1 b2", b"<$1>"), b"<a> <b>");
    }

    #[test]
    fn test_regexp_extract() {
        let a = args("(\\d+)-(\\d+)?");
        let h = RegexpExtractHolder::make(&LiteralArgs::new("regexp_extract", &a)).unwrap();
        assert_eq!(h.call(b"x 100-200 y", 0), Some(&b"100-200"[..]));
        assert_eq!(h.call(b"x 100-200 y", 1), Some(&b"100"[..]));
        assert_eq!(h.call(b"x 100-200 y", 2), Some(&b"200"[..]));
        assert_eq!(h.call(b"x 100- y", 2), Some(&b""[..]));
        assert_eq!(h.call(b"nothing", 1), Some(&b""[..]));
        assert_eq!(h.call(b"x 100-200 y", 3), None);
        assert_eq!(h.call(b"x 100-200 y", -1), None);
    }

    #[test]
    fn test_extract_stub_null_input() {
        let a = args("(a)");
        let h = RegexpExtractHolder::make(&LiteralArgs::new("regexp_extract", &a)).unwrap();
        let mut valid = true;
        let mut len = -1;
        unsafe {
            kiln_regexp_extract_utf8_utf8_int32(0, handle::to_handle(&h), 0x1 as *const u8, 4, false, 1, &mut valid, &mut len);
        }
        assert!(!valid);
        assert_eq!(len, 0);
    }
}
