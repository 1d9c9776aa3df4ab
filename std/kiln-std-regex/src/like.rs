//!
//! SQL LIKE / ILIKE
//!
//! `%` matches any run of glyphs, `_` exactly one glyph; the escape character
//! (default `\`) makes the next pattern character literal. Patterns are
//! compiled once when the holder is built:
//!
//! - **Exact**: `'abc'`
//! - **Prefix**: `'abc%'`
//! - **Suffix**: `'%abc'`
//! - **Contains**: `'%abc%'` (memchr `Finder`)
//! - **PrefixSuffix**: `'ab%cd'`
//! - **Regex**: everything else, anchored and with `(?s)` so `%` spans newlines
//!
//! ILIKE always goes through the regex with `(?i)`.
//!

use memchr::memmem;
use regex::bytes::Regex;

use kiln_std_core::{handle, HolderError, Literal, LiteralArgs, StubSignature};

const DEFAULT_ESCAPE: char = '\\';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyRun,
    AnyOne,
}

#[derive(Debug)]
enum LikeMatcher {
    Any,
    Exact(Vec<u8>),
    Prefix(Vec<u8>),
    Suffix(Vec<u8>),
    Contains(memmem::Finder<'static>),
    PrefixSuffix(Vec<u8>, Vec<u8>),
    Regex(Regex),
}

impl LikeMatcher {
    fn matches(&self, data: &[u8]) -> bool {
        match self {
            LikeMatcher::Any => true,
            LikeMatcher::Exact(lit) => data == lit.as_slice(),
            LikeMatcher::Prefix(p) => data.starts_with(p),
            LikeMatcher::Suffix(s) => data.ends_with(s),
            LikeMatcher::Contains(finder) => finder.find(data).is_some(),
            LikeMatcher::PrefixSuffix(p, s) => data.len() >= p.len() + s.len() && data.starts_with(p) && data.ends_with(s),
            LikeMatcher::Regex(re) => re.is_match(data),
        }
    }
}

fn tokenize(pattern: &str, escape: char) -> Result<Vec<Token>, HolderError> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = if c == escape {
            let Some(next) = chars.next() else {
                return Err(HolderError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: format!("escape character '{escape}' at end of pattern"),
                });
            };
            Token::Literal(next)
        } else if c == '%' {
            if tokens.last() == Some(&Token::AnyRun) {
                continue;
            }
            Token::AnyRun
        } else if c == '_' {
            Token::AnyOne
        } else {
            Token::Literal(c)
        };
        tokens.push(token);
    }
    Ok(tokens)
}

fn to_regex(tokens: &[Token], case_insensitive: bool) -> String {
    let mut out = String::from(if case_insensitive { "(?si)^" } else { "(?s)^" });
    let mut buf = [0u8; 4];
    for token in tokens {
        match token {
            Token::Literal(c) => out.push_str(&regex::escape(c.encode_utf8(&mut buf))),
            Token::AnyRun => out.push_str(".*"),
            Token::AnyOne => out.push('.'),
        }
    }
    out.push('$');
    out
}

/// Literal runs between `%` tokens, or `None` when the pattern uses `_`.
fn literal_parts(tokens: &[Token]) -> Option<Vec<Vec<u8>>> {
    let mut parts = vec![Vec::new()];
    let mut buf = [0u8; 4];
    for token in tokens {
        match token {
            Token::Literal(c) => parts.last_mut()?.extend_from_slice(c.encode_utf8(&mut buf).as_bytes()),
            Token::AnyRun => parts.push(Vec::new()),
            Token::AnyOne => return None,
        }
    }
    Some(parts)
}

fn compile(pattern: &str, escape: char, case_insensitive: bool) -> Result<LikeMatcher, HolderError> {
    let tokens = tokenize(pattern, escape)?;
    if !case_insensitive {
        if let Some(parts) = literal_parts(&tokens) {
            let fast = match parts.as_slice() {
                [exact] => Some(LikeMatcher::Exact(exact.clone())),
                [p, s] if p.is_empty() && s.is_empty() => Some(LikeMatcher::Any),
                [p, s] if s.is_empty() => Some(LikeMatcher::Prefix(p.clone())),
                [p, s] if p.is_empty() => Some(LikeMatcher::Suffix(s.clone())),
                [p, s] => Some(LikeMatcher::PrefixSuffix(p.clone(), s.clone())),
                [p, c, s] if p.is_empty() && s.is_empty() => {
                    Some(LikeMatcher::Contains(memmem::Finder::new(c).into_owned()))
                }
                _ => None,
            };
            if let Some(fast) = fast {
                return Ok(fast);
            }
        }
    }
    let source = to_regex(&tokens, case_insensitive);
    Regex::new(&source)
        .map(LikeMatcher::Regex)
        .map_err(|e| HolderError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Holder for `like(text, pattern[, escape])` and `ilike(text, pattern)`.
#[derive(Debug)]
pub struct LikeHolder {
    matcher: LikeMatcher,
}

impl LikeHolder {
    pub fn make(args: &LiteralArgs<'_>, case_insensitive: bool) -> Result<Self, HolderError> {
        args.expect_arity(2, 3)?;
        let pattern = args.utf8(1)?;
        let escape = match args.get(2) {
            None => DEFAULT_ESCAPE,
            Some(Literal::Utf8(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => return Err(HolderError::InvalidEscape(s.clone())),
                }
            }
            Some(_) => return Err(args.type_error(2, "a utf8 literal")),
        };
        let matcher = compile(pattern, escape, case_insensitive)?;
        tracing::debug!(pattern, case_insensitive, ?matcher, "like holder ready");
        Ok(Self { matcher })
    }

    pub fn call(&self, data: &[u8]) -> bool {
        self.matcher.matches(data)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_like_utf8_utf8(holder_ptr: i64, data: *const u8, data_len: i32) -> bool {
    unsafe { handle::holder::<LikeHolder>(holder_ptr).call(handle::bytes(data, data_len)) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_like_utf8_utf8_utf8(holder_ptr: i64, data: *const u8, data_len: i32) -> bool {
    unsafe { handle::holder::<LikeHolder>(holder_ptr).call(handle::bytes(data, data_len)) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_ilike_utf8_utf8(holder_ptr: i64, data: *const u8, data_len: i32) -> bool {
    unsafe { handle::holder::<LikeHolder>(holder_ptr).call(handle::bytes(data, data_len)) }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_like_utf8_utf8, [I64, Ptr, I32] -> Bool),
        stub!(kiln_like_utf8_utf8_utf8, [I64, Ptr, I32] -> Bool),
        stub!(kiln_ilike_utf8_utf8, [I64, Ptr, I32] -> Bool),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(pattern: &str) -> LikeHolder {
        let args = [Literal::Null, Literal::Utf8(pattern.into())];
        LikeHolder::make(&LiteralArgs::new("like", &args), false).unwrap()
    }

    fn ilike(pattern: &str) -> LikeHolder {
        let args = [Literal::Null, Literal::Utf8(pattern.into())];
        LikeHolder::make(&LiteralArgs::new("ilike", &args), true).unwrap()
    }

    fn like_escaped(pattern: &str, escape: &str) -> Result<LikeHolder, HolderError> {
        let args = [Literal::Null, Literal::Utf8(pattern.into()), Literal::Utf8(escape.into())];
        LikeHolder::make(&LiteralArgs::new("like", &args), false)
    }

    #[test]
    fn test_fast_paths() {
        assert!(matches!(like("abc").matcher, LikeMatcher::Exact(_)));
        assert!(matches!(like("ab%").matcher, LikeMatcher::Prefix(_)));
        assert!(matches!(like("%ab").matcher, LikeMatcher::Suffix(_)));
        assert!(matches!(like("%ab%").matcher, LikeMatcher::Contains(_)));
        assert!(matches!(like("a%b").matcher, LikeMatcher::PrefixSuffix(..)));
        assert!(matches!(like("%%").matcher, LikeMatcher::Any));
        assert!(matches!(like("a_c").matcher, LikeMatcher::Regex(_)));
    }

    #[test]
    fn test_like_matching() {
        let h = like("ab%");
        assert!(h.call(b"ab"));
        assert!(h.call(b"abcd"));
        assert!(!h.call(b"cab"));

        let h = like("%cd");
        assert!(h.call(b"abcd"));
        assert!(!h.call(b"cde"));

        let h = like("%bc%");
        assert!(h.call(b"abcd"));
        assert!(!h.call(b"acbd"));

        let h = like("ab%ba");
        assert!(h.call(b"abba"));
        assert!(h.call(b"ab..ba"));
        assert!(!h.call(b"aba"));
    }

    #[test]
    fn test_underscore_is_one_glyph() {
        let h = like("a_c");
        assert!(h.call(b"abc"));
        assert!(h.call("açc".as_bytes()));
        assert!(!h.call(b"ac"));
        assert!(!h.call(b"abbc"));
    }

    #[test]
    fn test_percent_spans_newlines() {
        assert!(like("a%_z").call(b"a\nb\nz"));
    }

    #[test]
    fn test_empty_pattern_matches_only_empty() {
        let h = like("");
        assert!(h.call(b""));
        assert!(!h.call(b"a"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let h = like("a.c_");
        assert!(h.call(b"a.cd"));
        assert!(!h.call(b"abcd"));
        assert!(like("(x)+%").call(b"(x)+y"));
    }

    #[test]
    fn test_escape() {
        let h = like("50\\%");
        assert!(h.call(b"50%"));
        assert!(!h.call(b"500"));

        let h = like_escaped("a#_b%", "#").unwrap();
        assert!(h.call(b"a_bcd"));
        assert!(!h.call(b"axbcd"));
    }

    #[test]
    fn test_invalid_escape() {
        assert!(matches!(like_escaped("abc#", "#"), Err(HolderError::InvalidPattern { .. })));
        assert!(matches!(like_escaped("abc", "##"), Err(HolderError::InvalidEscape(_))));
        assert!(matches!(like_escaped("abc", ""), Err(HolderError::InvalidEscape(_))));
    }

    #[test]
    fn test_ilike() {
        let h = ilike("%SpArK%");
        assert!(h.call(b"apache spark"));
        assert!(h.call(b"SPARK"));
        assert!(!h.call(b"spork"));
    }

    #[test]
    fn test_stub() {
        let h = like("x%");
        let handle = handle::to_handle(&h);
        let data = b"xyz";
        assert!(unsafe { kiln_like_utf8_utf8(handle, data.as_ptr(), data.len() as i32) });
        assert!(!unsafe { kiln_like_utf8_utf8(handle, std::ptr::null(), 0) });
    }
}
