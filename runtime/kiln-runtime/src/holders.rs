//!
//! Holder Construction
//!
//! Every expression node that needs precompiled state gets exactly one holder,
//! built from the node's literal arguments before any row is evaluated.
//! `FunctionHolder::make` is the factory keyed by function name;
//! `HolderSet` owns the holders of one compiled expression and hands out the
//! opaque handles that generated code passes to the stubs.
//!
//! A handle always points at the concrete holder inside the enum, never at the
//! enum itself, because the stubs reconstruct the concrete type.
//!

use kiln_std_collections::InHolder;
use kiln_std_core::{handle, Decimal128, HolderError, Literal, LiteralArgs};
use kiln_std_datetime::ToDateHolder;
use kiln_std_encoding::{JsonHolder, ParseUrlHolder};
use kiln_std_random::RandomGeneratorHolder;
use kiln_std_regex::{LikeHolder, RLikeHolder, RegexpExtractHolder, RegexpReplaceHolder};
use kiln_std_strings::{SubstrIndexHolder, TranslateHolder};

#[derive(Debug)]
pub enum FunctionHolder {
    Like(LikeHolder),
    ILike(LikeHolder),
    RLike(RLikeHolder),
    RegexpReplace(RegexpReplaceHolder),
    RegexpExtract(RegexpExtractHolder),
    Json(JsonHolder),
    ParseUrl(ParseUrlHolder),
    ToDate(ToDateHolder),
    Translate(TranslateHolder),
    SubstrIndex(SubstrIndexHolder),
    Random(RandomGeneratorHolder),
    InInt32(InHolder<i32>),
    InInt64(InHolder<i64>),
    InDecimal(InHolder<Decimal128>),
    InBytes(InHolder<Vec<u8>>),
}

impl FunctionHolder {
    /// Build the holder for `function` from its positional literal arguments.
    /// Non-literal arguments are passed as `Literal::Null`.
    pub fn make(function: &str, literals: &[Literal]) -> Result<Self, HolderError> {
        let args = LiteralArgs::new(function, literals);
        let holder = match function {
            "like" => FunctionHolder::Like(LikeHolder::make(&args, false)?),
            "ilike" => FunctionHolder::ILike(LikeHolder::make(&args, true)?),
            "rlike" | "regexp_like" => FunctionHolder::RLike(RLikeHolder::make(&args)?),
            "regexp_replace" => FunctionHolder::RegexpReplace(RegexpReplaceHolder::make(&args)?),
            "regexp_extract" => FunctionHolder::RegexpExtract(RegexpExtractHolder::make(&args)?),
            "get_json_object" => FunctionHolder::Json(JsonHolder::make(&args)?),
            "parse_url" => FunctionHolder::ParseUrl(ParseUrlHolder::make(&args)?),
            "to_date" => FunctionHolder::ToDate(ToDateHolder::make(&args)?),
            "translate" => FunctionHolder::Translate(TranslateHolder::make(&args)?),
            "substr_index" | "substring_index" => FunctionHolder::SubstrIndex(SubstrIndexHolder::make(&args)?),
            "random" | "rand" => FunctionHolder::Random(RandomGeneratorHolder::make(&args)?),
            "random_with_seed64_offset" => FunctionHolder::Random(RandomGeneratorHolder::make_with_offset(&args)?),
            "in_int32" => FunctionHolder::InInt32(InHolder::make(&args)?),
            "in_int64" => FunctionHolder::InInt64(InHolder::make(&args)?),
            "in_decimal" => FunctionHolder::InDecimal(InHolder::make(&args)?),
            "in_utf8" | "in_binary" => FunctionHolder::InBytes(InHolder::make(&args)?),
            _ => return Err(HolderError::UnknownFunction(function.to_string())),
        };
        Ok(holder)
    }

    /// The handle generated code passes as `holder_ptr`.
    pub fn handle(&self) -> i64 {
        match self {
            FunctionHolder::Like(h) | FunctionHolder::ILike(h) => handle::to_handle(h),
            FunctionHolder::RLike(h) => handle::to_handle(h),
            FunctionHolder::RegexpReplace(h) => handle::to_handle(h),
            FunctionHolder::RegexpExtract(h) => handle::to_handle(h),
            FunctionHolder::Json(h) => handle::to_handle(h),
            FunctionHolder::ParseUrl(h) => handle::to_handle(h),
            FunctionHolder::ToDate(h) => handle::to_handle(h),
            FunctionHolder::Translate(h) => handle::to_handle(h),
            FunctionHolder::SubstrIndex(h) => handle::to_handle(h),
            FunctionHolder::Random(h) => handle::to_handle(h),
            FunctionHolder::InInt32(h) => handle::to_handle(h),
            FunctionHolder::InInt64(h) => handle::to_handle(h),
            FunctionHolder::InDecimal(h) => handle::to_handle(h),
            FunctionHolder::InBytes(h) => handle::to_handle(h),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FunctionHolder::Like(_) => "like",
            FunctionHolder::ILike(_) => "ilike",
            FunctionHolder::RLike(_) => "rlike",
            FunctionHolder::RegexpReplace(_) => "regexp_replace",
            FunctionHolder::RegexpExtract(_) => "regexp_extract",
            FunctionHolder::Json(_) => "get_json_object",
            FunctionHolder::ParseUrl(_) => "parse_url",
            FunctionHolder::ToDate(_) => "to_date",
            FunctionHolder::Translate(_) => "translate",
            FunctionHolder::SubstrIndex(_) => "substr_index",
            FunctionHolder::Random(_) => "random",
            FunctionHolder::InInt32(_) => "in_int32",
            FunctionHolder::InInt64(_) => "in_int64",
            FunctionHolder::InDecimal(_) => "in_decimal",
            FunctionHolder::InBytes(_) => "in_utf8",
        }
    }
}

/// The holders of one compiled expression. Holders are boxed so their handles
/// stay valid as the set grows, and live until the set is dropped.
#[derive(Debug, Default)]
pub struct HolderSet {
    holders: Vec<Box<FunctionHolder>>,
}

impl HolderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a holder and return its handle.
    pub fn add(&mut self, function: &str, literals: &[Literal]) -> Result<i64, HolderError> {
        let holder = FunctionHolder::make(function, literals).inspect_err(|e| {
            tracing::warn!(function, error = %e, "holder construction failed");
        })?;
        let holder = Box::new(holder);
        let handle = holder.handle();
        tracing::debug!(
            function,
            kind = holder.kind(),
            literals = literals.len(),
            index = self.holders.len(),
            "holder added"
        );
        self.holders.push(holder);
        Ok(handle)
    }

    pub fn get(&self, index: usize) -> Option<&FunctionHolder> {
        self.holders.get(index).map(|h| h.as_ref())
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionHolder> {
        self.holders.iter().map(|h| h.as_ref())
    }
}
