///
/// parse_url(url, part[, key])
///
/// QUERY and REF are sliced straight out of the input: the query starts after
/// the first `?`, the fragment after the first `#` that follows it. Spaces and
/// braces in those regions make the whole URL null. Everything else comes from
/// an RFC 3986 decomposition of the prefix that ends with the `?`, which must
/// be an absolute URI.
///
/// Parts: HOST, PATH, QUERY, PROTOCOL, FILE, AUTHORITY, USERINFO, REF. Absent
/// QUERY/REF and unknown part names are null; other parts may be empty.
///

use regex::bytes::Regex;

use kiln_std_core::{handle, ExecutionContext, HolderError, Literal, LiteralArgs, StubSignature};

/// RFC 3986 appendix B.
const URI_PATTERN: &str = r"^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$";
const SCHEME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9+.\-]*$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPart {
    Host,
    Path,
    Query,
    Protocol,
    File,
    Authority,
    UserInfo,
    Ref,
}

impl UrlPart {
    pub fn parse(name: &[u8]) -> Option<Self> {
        Some(match name {
            b"HOST" => Self::Host,
            b"PATH" => Self::Path,
            b"QUERY" => Self::Query,
            b"PROTOCOL" => Self::Protocol,
            b"FILE" => Self::File,
            b"AUTHORITY" => Self::Authority,
            b"USERINFO" => Self::UserInfo,
            b"REF" => Self::Ref,
            _ => return None,
        })
    }
}

/// Byte offsets of the query and fragment markers.
#[derive(Debug, Clone, Copy)]
struct Regions {
    query: Option<usize>,
    fragment: Option<usize>,
}

fn is_rejected(b: u8) -> bool {
    matches!(b, b' ' | b'{' | b'}')
}

fn scan_regions(url: &[u8]) -> Option<Regions> {
    let Some(query) = memchr::memchr(b'?', url) else {
        return Some(Regions { query: None, fragment: None });
    };
    let mut fragment = None;
    for (i, &b) in url.iter().enumerate().skip(query) {
        if is_rejected(b) {
            return None;
        }
        if b == b'#' {
            fragment = Some(i);
            break;
        }
    }
    if let Some(start) = fragment {
        if url[start + 1..].iter().any(|&b| is_rejected(b) || b == b'#') {
            return None;
        }
    }
    Some(Regions { query: Some(query), fragment })
}

fn is_uri_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-._~:/?#[]@!$&'()*+,;=%".contains(&b)
}

fn has_valid_escapes(text: &[u8]) -> bool {
    text.iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'%')
        .all(|(i, _)| text.get(i + 1..i + 3).is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)))
}

/// Components of an absolute URI.
#[derive(Debug, Default, PartialEq, Eq)]
struct Uri<'a> {
    scheme: &'a [u8],
    user_info: Option<&'a [u8]>,
    host: &'a [u8],
    port: Option<&'a [u8]>,
    path: &'a [u8],
}

/// Split `host[:port]`, keeping IPv6 literals intact.
fn split_host_port(host_port: &[u8]) -> Option<(&[u8], Option<&[u8]>)> {
    let (host, port) = if let Some(rest) = host_port.strip_prefix(b"[") {
        let close = memchr::memchr(b']', rest)?;
        let after = &rest[close + 1..];
        let port = match after.split_first() {
            None => None,
            Some((b':', port)) => Some(port),
            Some(_) => return None,
        };
        (&rest[..close], port)
    } else {
        match memchr::memrchr(b':', host_port) {
            Some(i) => (&host_port[..i], Some(&host_port[i + 1..])),
            None => (host_port, None),
        }
    };
    if let Some(port) = port {
        if !port.iter().all(u8::is_ascii_digit) {
            return None;
        }
    }
    Some((host, port.filter(|p| !p.is_empty())))
}

#[derive(Debug)]
pub struct ParseUrlHolder {
    uri: Regex,
    scheme: Regex,
    query_key: Option<(String, Regex)>,
}

fn query_regex(key: &str) -> Option<Regex> {
    Regex::new(&format!("(?:&|^){}=([^&#]*)", regex::escape(key))).ok()
}

impl ParseUrlHolder {
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(0, 3)?;
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| HolderError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        };
        let query_key = match args.get(2) {
            Some(Literal::Utf8(key)) => query_regex(key).map(|re| (key.clone(), re)),
            _ => None,
        };
        tracing::debug!(cached_key = ?query_key.as_ref().map(|(k, _)| k), "parse_url holder ready");
        Ok(Self {
            uri: compile(URI_PATTERN)?,
            scheme: compile(SCHEME_PATTERN)?,
            query_key,
        })
    }

    fn parse_uri<'a>(&self, text: &'a [u8]) -> Option<Uri<'a>> {
        if !text.iter().all(|&b| is_uri_byte(b)) || !has_valid_escapes(text) {
            return None;
        }
        let caps = self.uri.captures(text)?;
        let scheme = caps.get(1)?.as_bytes();
        if !self.scheme.is_match(scheme) {
            return None;
        }
        let mut uri = Uri {
            scheme,
            path: caps.get(3).map_or(&[][..], |m| m.as_bytes()),
            ..Default::default()
        };
        if let Some(authority) = caps.get(2).map(|m| m.as_bytes()) {
            let host_port = match memchr::memrchr(b'@', authority) {
                Some(at) => {
                    uri.user_info = Some(&authority[..at]);
                    &authority[at + 1..]
                }
                None => authority,
            };
            let (host, port) = split_host_port(host_port)?;
            uri.host = host;
            uri.port = port;
        }
        Some(uri)
    }

    /// Two-argument form.
    pub fn call<'a>(&self, ctx: &'a ExecutionContext, url: &'a [u8], part: &[u8]) -> Option<&'a [u8]> {
        let part = UrlPart::parse(part)?;
        let regions = scan_regions(url)?;
        let prefix_end = regions.query.map_or(url.len(), |q| q + 1);
        let uri = self.parse_uri(&url[..prefix_end])?;
        let query_end = regions.fragment.unwrap_or(url.len());

        let out: &[u8] = match part {
            UrlPart::Host => uri.host,
            UrlPart::Path => uri.path,
            UrlPart::Protocol => uri.scheme,
            UrlPart::UserInfo => uri.user_info.unwrap_or_default(),
            UrlPart::Query => &url[regions.query? + 1..query_end],
            UrlPart::Ref => &url[regions.fragment? + 1..],
            UrlPart::File => match regions.query {
                Some(q) => &url[q - uri.path.len()..query_end],
                None => uri.path,
            },
            UrlPart::Authority => {
                let mut authority = Vec::with_capacity(uri.host.len() + 16);
                if let Some(info) = uri.user_info {
                    authority.extend_from_slice(info);
                    authority.push(b'@');
                }
                authority.extend_from_slice(uri.host);
                if let Some(port) = uri.port {
                    authority.push(b':');
                    authority.extend_from_slice(port);
                }
                return Some(ctx.copy(&authority));
            }
        };
        Some(ctx.copy(out))
    }

    /// Three-argument form: the value of `key` in the query string.
    pub fn call_with_key<'a>(&self, ctx: &'a ExecutionContext, url: &'a [u8], part: &[u8], key: &[u8]) -> Option<&'a [u8]> {
        if UrlPart::parse(part)? != UrlPart::Query {
            return None;
        }
        let regions = scan_regions(url)?;
        let query = regions.query?;
        self.parse_uri(&url[..query + 1])?;
        let query_text = &url[query + 1..regions.fragment.unwrap_or(url.len())];

        let key = std::str::from_utf8(key).ok()?;
        let built;
        let re = match &self.query_key {
            Some((cached, re)) if cached == key => re,
            _ => {
                built = query_regex(key)?;
                &built
            }
        };
        let value = re.captures(query_text)?.get(1)?.as_bytes();
        Some(ctx.copy(value))
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_parse_url_utf8_utf8(
    context_ptr: i64,
    holder_ptr: i64,
    url: *const u8,
    url_len: i32,
    url_valid: bool,
    part: *const u8,
    part_len: i32,
    part_valid: bool,
    out_valid: *mut bool,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        if !url_valid || !part_valid {
            return handle::emit_null(out_valid, out_len);
        }
        let ctx = handle::context(context_ptr);
        let holder = handle::holder::<ParseUrlHolder>(holder_ptr);
        let out = holder.call(ctx, handle::bytes(url, url_len), handle::bytes(part, part_len));
        handle::emit_nullable(out, out_valid, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_parse_url_utf8_utf8_utf8(
    context_ptr: i64,
    holder_ptr: i64,
    url: *const u8,
    url_len: i32,
    url_valid: bool,
    part: *const u8,
    part_len: i32,
    part_valid: bool,
    key: *const u8,
    key_len: i32,
    key_valid: bool,
    out_valid: *mut bool,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        if !url_valid || !part_valid || !key_valid {
            return handle::emit_null(out_valid, out_len);
        }
        let ctx = handle::context(context_ptr);
        let holder = handle::holder::<ParseUrlHolder>(holder_ptr);
        let out = holder.call_with_key(
            ctx,
            handle::bytes(url, url_len),
            handle::bytes(part, part_len),
            handle::bytes(key, key_len),
        );
        handle::emit_nullable(out, out_valid, out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_parse_url_utf8_utf8, [I64, I64, Ptr, I32, Bool, Ptr, I32, Bool, Ptr, Ptr] -> Ptr),
        stub!(
            kiln_parse_url_utf8_utf8_utf8,
            [I64, I64, Ptr, I32, Bool, Ptr, I32, Bool, Ptr, I32, Bool, Ptr, Ptr] -> Ptr
        ),
    ]
}
