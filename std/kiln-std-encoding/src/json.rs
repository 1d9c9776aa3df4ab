///
/// get_json_object(json, path)
///
/// Paths follow Spark: `$.a.b`, `$['a']['b']`, `$[0]`, or a mix. The path is
/// normalized into a slash pointer (`$`, `]` and `'` dropped, `[` and `.`
/// become `/`).
///
/// Navigation is a single forward pass over the document. Siblings before the
/// target are skipped structurally without validation, and nothing after the
/// target value is read, so malformed regions off the path do not affect the
/// result. Only the target value itself is parsed, as a borrowed `RawValue`.
///
/// Result text:
/// - number: shortest round-trip decimal
/// - string: unescaped content
/// - boolean: `true` / `false`
/// - object or array: the source text of the sub-tree
/// - null, missing member, bad path, malformed path region: null result
///

use memchr::memmem;
use serde_json::value::RawValue;

use kiln_std_core::{handle, ExecutionContext, HolderError, LiteralArgs, StubSignature};

/// Spark path -> JSON pointer, or `None` for paths too short to name a member.
pub fn normalize_path(path: &str) -> Option<String> {
    if path.len() < 3 {
        return None;
    }
    let pointer = path
        .chars()
        .filter(|c| !matches!(c, '$' | ']' | '\''))
        .map(|c| if matches!(c, '[' | '.') { '/' } else { c })
        .collect();
    Some(pointer)
}

fn pointer_tokens(pointer: &str) -> Option<Vec<String>> {
    let rest = pointer.strip_prefix('/')?;
    Some(rest.split('/').map(|t| t.replace("~1", "/").replace("~0", "~")).collect())
}

fn array_index(token: &str) -> Option<usize> {
    let valid = !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) && (token == "0" || !token.starts_with('0'));
    valid.then(|| token.parse().ok()).flatten()
}

fn skip_ws(json: &[u8], mut at: usize) -> usize {
    while json.get(at).is_some_and(u8::is_ascii_whitespace) {
        at += 1;
    }
    at
}

/// End of the string whose opening quote is at `at`.
fn skip_string(json: &[u8], mut at: usize) -> Option<usize> {
    at += 1;
    loop {
        at += memchr::memchr2(b'"', b'\\', json.get(at..)?)?;
        if json[at] == b'"' {
            return Some(at + 1);
        }
        at += 2;
    }
}

/// End of the value starting at `at`. Brackets are balanced and strings are
/// stepped over; nothing else is checked.
fn skip_value(json: &[u8], at: usize) -> Option<usize> {
    match json.get(at)? {
        b'"' => skip_string(json, at),
        b'{' | b'[' => {
            let mut depth = 0usize;
            let mut i = at;
            loop {
                match json.get(i)? {
                    b'"' => {
                        i = skip_string(json, i)?;
                        continue;
                    }
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i + 1);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
        }
        _ => {
            let len = json[at..]
                .iter()
                .position(|b| matches!(b, b',' | b'}' | b']') || b.is_ascii_whitespace())
                .unwrap_or(json.len() - at);
            (len > 0).then_some(at + len)
        }
    }
}

/// Start of the value of member `token` in the object whose body starts at
/// `at`. The first matching key wins.
fn seek_member(json: &str, mut at: usize, token: &str) -> Option<usize> {
    let bytes = json.as_bytes();
    loop {
        at = skip_ws(bytes, at);
        if *bytes.get(at)? != b'"' {
            return None;
        }
        let mut keys = serde_json::Deserializer::from_str(&json[at..]).into_iter::<String>();
        let key = keys.next()?.ok()?;
        at = skip_ws(bytes, at + keys.byte_offset());
        if *bytes.get(at)? != b':' {
            return None;
        }
        at = skip_ws(bytes, at + 1);
        if key == token {
            return Some(at);
        }
        at = skip_ws(bytes, skip_value(bytes, at)?);
        if *bytes.get(at)? != b',' {
            return None;
        }
        at += 1;
    }
}

/// Start of element `target` in the array whose body starts at `at`.
fn seek_element(json: &[u8], mut at: usize, target: usize) -> Option<usize> {
    for _ in 0..target {
        at = skip_ws(json, skip_value(json, skip_ws(json, at))?);
        if *json.get(at)? != b',' {
            return None;
        }
        at += 1;
    }
    let at = skip_ws(json, at);
    (*json.get(at)? != b']').then_some(at)
}

/// Step from the container at `at` into its child named by `token`.
fn seek(json: &str, at: usize, token: &str) -> Option<usize> {
    match json.as_bytes().get(at)? {
        b'{' => seek_member(json, at + 1, token),
        b'[' => seek_element(json.as_bytes(), at + 1, array_index(token)?),
        _ => None,
    }
}

/// Parse exactly one value at `at`, ignoring whatever follows it.
fn value_at(json: &str, at: usize) -> Option<&RawValue> {
    let mut values = serde_json::Deserializer::from_str(json.get(at..)?).into_iter::<&RawValue>();
    values.next()?.ok()
}

/// Text of a leaf value, `None` for JSON null.
fn render(value: &RawValue) -> Option<String> {
    let text = value.get();
    match text.as_bytes().first()? {
        b'"' => serde_json::from_str::<String>(text).ok(),
        b'{' | b'[' => Some(text.to_string()),
        b't' => Some("true".to_string()),
        b'f' => Some("false".to_string()),
        b'n' => None,
        _ => serde_json::from_str::<f64>(text).ok().map(|n| n.to_string()),
    }
}

fn is_terminator(json: &[u8], mut at: usize) -> bool {
    while let Some(&b) = json.get(at) {
        match b {
            b',' | b'}' | b']' => return true,
            b' ' | b'\r' | b'\n' | b'\t' => at += 1,
            _ => return false,
        }
    }
    false
}

/// Cheap check that the first occurrence of `output` in the document ends
/// where a JSON value could end.
pub fn is_valid_output(json: &[u8], output: &[u8]) -> bool {
    let Some(index) = memmem::find(json, output) else {
        return true;
    };
    if index == 0 {
        return true;
    }
    let end = index + output.len();
    let end = if json[index - 1] == b'"' { end + 1 } else { end };
    is_terminator(json, end)
}

/// Evaluate a path against a document, returning the owned result text.
pub fn extract(json: &str, path: &str) -> Option<String> {
    let tokens = pointer_tokens(&normalize_path(path)?)?;
    let mut at = skip_ws(json.as_bytes(), 0);
    for token in &tokens {
        at = seek(json, at, token)?;
    }
    let out = render(value_at(json, at)?)?;
    if out.is_empty() || is_valid_output(json.as_bytes(), out.as_bytes()) {
        Some(out)
    } else {
        None
    }
}

#[derive(Debug, Default)]
pub struct JsonHolder;

impl JsonHolder {
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(0, 2)?;
        Ok(Self)
    }

    pub fn call<'a>(&self, ctx: &'a ExecutionContext, json: &[u8], path: &[u8]) -> Option<&'a [u8]> {
        let json = std::str::from_utf8(json).ok()?;
        let path = std::str::from_utf8(path).ok()?;
        let out = extract(json, path)?;
        Some(ctx.copy(out.as_bytes()))
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_get_json_object_utf8_utf8(
    context_ptr: i64,
    holder_ptr: i64,
    json: *const u8,
    json_len: i32,
    json_valid: bool,
    path: *const u8,
    path_len: i32,
    path_valid: bool,
    out_valid: *mut bool,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        if !json_valid || !path_valid {
            return handle::emit_null(out_valid, out_len);
        }
        let ctx = handle::context(context_ptr);
        let holder = handle::holder::<JsonHolder>(holder_ptr);
        let out = holder.call(ctx, handle::bytes(json, json_len), handle::bytes(path, path_len));
        handle::emit_nullable(out, out_valid, out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![stub!(
        kiln_get_json_object_utf8_utf8,
        [I64, I64, Ptr, I32, Bool, Ptr, I32, Bool, Ptr, Ptr] -> Ptr
    )]
}
