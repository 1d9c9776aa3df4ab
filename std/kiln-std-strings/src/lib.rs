#![allow(non_snake_case)]

///
/// kiln-std-strings - String and Numeric-Text Kernels
///
/// Stateless kernels over raw byte spans, plus the two text holders:
/// - utf8: glyph length, byte positions, invalid-byte reporting
/// - transform: upper, lower, reverse, space
/// - trim, pad, substr, search (locate, strpos, find_in_set, starts/ends_with)
/// - replace (with output budget) and TranslateHolder
/// - split: split_part and SubstrIndexHolder
/// - concat / concatOperator
/// - escape: binary_string, url_decoder, invalid UTF-8 replacement
/// - conv, bin, to_hex/from_hex, casts, decimal text
///
/// Text is never assumed to be valid UTF-8. Kernels that must count glyphs
/// record `unexpected byte \xx encountered while decoding utf8 string` on the
/// context and return an empty or zero result.
///

pub mod cast;
pub mod concat;
pub mod conv;
pub mod decimal;
pub mod escape;
pub mod hex_text;
pub mod pad;
pub mod replace;
pub mod search;
pub mod split;
pub mod substr;
pub mod transform;
pub mod trim;
pub mod utf8;

pub use cast::*;
pub use concat::*;
pub use conv::*;
pub use decimal::*;
pub use escape::*;
pub use hex_text::*;
pub use pad::*;
pub use replace::*;
pub use search::*;
pub use split::*;
pub use substr::*;
pub use transform::*;
pub use trim::*;
pub use utf8::*;

use kiln_std_core::StubSignature;

/// Every stub exported by this crate.
pub fn signatures() -> Vec<StubSignature> {
    let mut all = Vec::new();
    all.extend(utf8::signatures());
    all.extend(transform::signatures());
    all.extend(trim::signatures());
    all.extend(pad::signatures());
    all.extend(substr::signatures());
    all.extend(search::signatures());
    all.extend(replace::signatures());
    all.extend(split::signatures());
    all.extend(concat::signatures());
    all.extend(escape::signatures());
    all.extend(hex_text::signatures());
    all.extend(conv::signatures());
    all.extend(cast::signatures());
    all.extend(decimal::signatures());
    all
}
