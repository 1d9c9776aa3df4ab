///
/// split_part and substr_index
///

use memchr::memmem;

use kiln_std_core::{handle, ExecutionContext, HolderError, LiteralArgs, StubSignature};

use crate::utf8::lossy_glyphs;

/// Token `index` (0-based) of `text` split on the literal `delim`. Empty tokens
/// are kept and an empty delimiter splits into glyphs. `None` when the index is
/// past the last token.
pub fn split_part<'a>(ctx: &ExecutionContext, text: &'a [u8], delim: &[u8], index: i32) -> Option<&'a [u8]> {
    if index < 0 {
        ctx.set_error(format!(
            "Index in split_part must be positive, value provided was {index}"
        ));
        return Some(&[]);
    }
    let index = index as usize;
    if text.is_empty() {
        return (index == 0).then_some(text);
    }
    if delim.is_empty() {
        return lossy_glyphs(text).nth(index);
    }
    let mut start = 0;
    let mut matches = memmem::find_iter(text, delim);
    for _ in 0..index {
        start = matches.next()? + delim.len();
    }
    let end = memmem::find(&text[start..], delim).map_or(text.len(), |off| start + off);
    Some(&text[start..end])
}

/// substr_index(text, delim, count): the prefix before the count-th delimiter
/// from the left (count > 0) or the suffix after the count-th from the right
/// (count < 0). Matches may overlap.
#[derive(Debug, Default)]
pub struct SubstrIndexHolder;

impl SubstrIndexHolder {
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(0, 3)?;
        Ok(Self)
    }

    pub fn call<'a>(&self, text: &'a [u8], delim: &[u8], count: i32) -> &'a [u8] {
        if count == 0 || delim.is_empty() || text.is_empty() {
            return &[];
        }
        if count > 0 {
            let mut idx: Option<usize> = None;
            for _ in 0..count {
                let from = idx.map_or(0, |i| i + 1);
                match memmem::find(&text[from.min(text.len())..], delim) {
                    Some(off) => idx = Some(from + off),
                    None => return text,
                }
            }
            idx.map_or(text, |i| &text[..i])
        } else {
            // each step looks for a match starting strictly before the previous one
            let mut idx = text.len();
            for _ in 0..count.unsigned_abs() {
                if idx == 0 {
                    return text;
                }
                let window = (idx - 1 + delim.len()).min(text.len());
                match memmem::rfind(&text[..window], delim) {
                    Some(pos) => idx = pos,
                    None => return text,
                }
            }
            &text[idx + delim.len()..]
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_split_part(
    context_ptr: i64,
    text: *const u8,
    text_len: i32,
    text_valid: bool,
    delim: *const u8,
    delim_len: i32,
    delim_valid: bool,
    index: i32,
    index_valid: bool,
    out_valid: *mut bool,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        if !text_valid || !delim_valid || !index_valid {
            return handle::emit_null(out_valid, out_len);
        }
        let ctx = handle::context(context_ptr);
        let token = split_part(ctx, handle::bytes(text, text_len), handle::bytes(delim, delim_len), index);
        handle::emit_nullable(token.map(|t| ctx.copy(t)), out_valid, out_len)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_substr_index_utf8_utf8_int32(
    _context_ptr: i64,
    holder_ptr: i64,
    text: *const u8,
    text_len: i32,
    delim: *const u8,
    delim_len: i32,
    count: i32,
    out_len: *mut i32,
) -> *const u8 {
    unsafe {
        let holder = handle::holder::<SubstrIndexHolder>(holder_ptr);
        let out = holder.call(handle::bytes(text, text_len), handle::bytes(delim, delim_len), count);
        handle::emit_bytes(out, out_len)
    }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_split_part, [I64, Ptr, I32, Bool, Ptr, I32, Bool, I32, Bool, Ptr, Ptr] -> Ptr),
        stub!(kiln_substr_index_utf8_utf8_int32, [I64, I64, Ptr, I32, Ptr, I32, I32, Ptr] -> Ptr),
    ]
}
