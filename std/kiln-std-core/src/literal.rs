///
/// Literal arguments of an expression node, already extracted from the tree by
/// the compiler. Holders are built from these.
///

use std::fmt;

use crate::decimal::Decimal128;
use crate::error::HolderError;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Binary(Vec<u8>),
    Decimal(Decimal128),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int32(_) => "int32",
            Literal::Int64(_) => "int64",
            Literal::Float64(_) => "float64",
            Literal::Utf8(_) => "utf8",
            Literal::Binary(_) => "binary",
            Literal::Decimal(_) => "decimal128",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Int32(v) => write!(f, "{v}"),
            Literal::Int64(v) => write!(f, "{v}"),
            Literal::Float64(v) => write!(f, "{v}"),
            Literal::Utf8(v) => write!(f, "'{v}'"),
            Literal::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Literal::Decimal(d) => write!(f, "{}e-{}", d.value, d.scale),
        }
    }
}

/// Typed access to a holder's literal argument list.
pub struct LiteralArgs<'a> {
    function: &'a str,
    args: &'a [Literal],
}

impl<'a> LiteralArgs<'a> {
    pub fn new(function: &'a str, args: &'a [Literal]) -> Self {
        Self { function, args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn all(&self) -> &'a [Literal] {
        self.args
    }

    /// Require between `min` and `max` arguments.
    pub fn expect_arity(&self, min: usize, max: usize) -> Result<(), HolderError> {
        if (min..=max).contains(&self.args.len()) {
            return Ok(());
        }
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min} to {max}")
        };
        Err(HolderError::Arity {
            function: self.function.to_string(),
            expected,
            actual: self.args.len(),
        })
    }

    pub fn get(&self, index: usize) -> Option<&'a Literal> {
        self.args.get(index)
    }

    pub fn utf8(&self, index: usize) -> Result<&'a str, HolderError> {
        match self.args.get(index) {
            Some(Literal::Utf8(s)) => Ok(s),
            _ => Err(self.type_error(index, "a utf8 literal")),
        }
    }

    pub fn int64(&self, index: usize) -> Result<i64, HolderError> {
        match self.args.get(index) {
            Some(Literal::Int32(v)) => Ok(*v as i64),
            Some(Literal::Int64(v)) => Ok(*v),
            _ => Err(self.type_error(index, "an integer literal")),
        }
    }

    pub fn type_error(&self, index: usize, expected: &'static str) -> HolderError {
        HolderError::LiteralType {
            function: self.function.to_string(),
            index,
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        let args = [Literal::Utf8("a%".into())];
        let la = LiteralArgs::new("like", &args);
        assert!(la.expect_arity(1, 2).is_ok());
        let err = la.expect_arity(2, 2).unwrap_err();
        assert_eq!(err.to_string(), "'like' expects 2 literal argument(s), got 1");
    }

    #[test]
    fn test_typed_access() {
        let args = [Literal::Utf8("x".into()), Literal::Int32(3)];
        let la = LiteralArgs::new("f", &args);
        assert_eq!(la.utf8(0).unwrap(), "x");
        assert_eq!(la.int64(1).unwrap(), 3);
        assert!(la.utf8(1).is_err());
        assert!(la.int64(5).is_err());
    }
}
