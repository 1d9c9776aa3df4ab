//!
//! kiln-std-datetime - Date Parsing Holder
//!
//! `to_date(text, format[, suppress_errors])` parses text with a SQL-style
//! format and returns epoch milliseconds (UTC). The format is compiled once
//! into a token list when the holder is built.
//!
//! ## Format tokens
//!
//! | Token | Meaning |
//! |---|---|
//! | `YYYY` | year, up to 4 digits |
//! | `YY` | two-digit year, `00`-`69` -> 20xx, `70`-`99` -> 19xx |
//! | `MM` | month number |
//! | `MON` | abbreviated month name, any case |
//! | `MONTH` | full month name, any case |
//! | `DD` | day of month |
//! | `DDD` | day of year |
//! | `HH24` | hour 0-23 |
//! | `HH12`, `HH` | hour 1-12 |
//! | `MI` | minute |
//! | `SS` | second |
//! | `FFF` | milliseconds, up to 3 digits |
//! | `AM`, `PM` | meridiem marker, either spelling matches either value |
//!
//! Any other character must appear literally. Fields missing from the format
//! default to 1970-01-01 00:00:00.000. Text that does not match, leaves
//! trailing characters, or names an impossible date yields an invalid output.
//!

use chrono::{Month, NaiveDate, NaiveTime};

use kiln_std_core::{handle, HolderError, Literal, LiteralArgs, StubSignature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Year4,
    Year2,
    Month,
    MonthAbbrev,
    MonthName,
    Day,
    DayOfYear,
    Hour24,
    Hour12,
    Minute,
    Second,
    Millis,
    Meridiem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormatToken {
    Field(Field),
    Literal(char),
}

/// Longest tokens first so `MONTH` wins over `MON` and `MM`.
const TOKENS: &[(&str, Field)] = &[
    ("MONTH", Field::MonthName),
    ("YYYY", Field::Year4),
    ("HH24", Field::Hour24),
    ("HH12", Field::Hour12),
    ("MON", Field::MonthAbbrev),
    ("DDD", Field::DayOfYear),
    ("FFF", Field::Millis),
    ("YY", Field::Year2),
    ("MM", Field::Month),
    ("DD", Field::Day),
    ("HH", Field::Hour12),
    ("MI", Field::Minute),
    ("SS", Field::Second),
    ("AM", Field::Meridiem),
    ("PM", Field::Meridiem),
];

fn compile_format(format: &str) -> Result<Vec<FormatToken>, HolderError> {
    if format.is_empty() {
        return Err(HolderError::InvalidFormat {
            format: format.to_string(),
            reason: "format is empty".to_string(),
        });
    }
    let mut tokens = Vec::new();
    let mut rest = format;
    while !rest.is_empty() {
        if let Some((name, field)) = TOKENS.iter().find(|(name, _)| rest.starts_with(name)) {
            tokens.push(FormatToken::Field(*field));
            rest = &rest[name.len()..];
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            tokens.push(FormatToken::Literal(c));
        }
        rest = chars.as_str();
    }
    Ok(tokens)
}

#[derive(Debug, Default)]
struct Fields {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    day_of_year: Option<u32>,
    hour: Option<u32>,
    hour12: bool,
    pm: Option<bool>,
    minute: Option<u32>,
    second: Option<u32>,
    millis: Option<u32>,
}

/// Consume 1..=`max` ASCII digits.
fn take_number(text: &str, max: usize) -> Option<(u32, &str)> {
    let len = text.bytes().take(max).take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    Some((text[..len].parse().ok()?, &text[len..]))
}

fn take_month_name(text: &str, full: bool) -> Option<(u32, &str)> {
    (1..=12u8).find_map(|n| {
        let month = Month::try_from(n).ok()?;
        let name = month.name();
        let name = if full { name } else { &name[..3] };
        let candidate = text.get(..name.len())?;
        candidate
            .eq_ignore_ascii_case(name)
            .then(|| (month.number_from_month(), &text[name.len()..]))
    })
}

fn parse_fields(tokens: &[FormatToken], mut text: &str) -> Option<Fields> {
    let mut fields = Fields::default();
    for token in tokens {
        match token {
            FormatToken::Literal(c) => text = text.strip_prefix(*c)?,
            FormatToken::Field(field) => {
                let (value, rest) = match field {
                    Field::Year4 => take_number(text, 4)?,
                    Field::Year2 => take_number(text, 2)?,
                    Field::Month | Field::Day | Field::Hour24 | Field::Hour12 | Field::Minute | Field::Second => {
                        take_number(text, 2)?
                    }
                    Field::DayOfYear | Field::Millis => take_number(text, 3)?,
                    Field::MonthAbbrev => take_month_name(text, false)?,
                    Field::MonthName => take_month_name(text, true)?,
                    Field::Meridiem => {
                        let marker = text.get(..2)?;
                        let pm = if marker.eq_ignore_ascii_case("PM") {
                            true
                        } else if marker.eq_ignore_ascii_case("AM") {
                            false
                        } else {
                            return None;
                        };
                        fields.pm = Some(pm);
                        text = &text[2..];
                        continue;
                    }
                };
                text = rest;
                match field {
                    Field::Year4 => fields.year = Some(value as i32),
                    Field::Year2 => fields.year = Some(if value < 70 { 2000 } else { 1900 } + value as i32),
                    Field::Month | Field::MonthAbbrev | Field::MonthName => fields.month = Some(value),
                    Field::Day => fields.day = Some(value),
                    Field::DayOfYear => fields.day_of_year = Some(value),
                    Field::Hour24 => fields.hour = Some(value),
                    Field::Hour12 => {
                        fields.hour = Some(value);
                        fields.hour12 = true;
                    }
                    Field::Minute => fields.minute = Some(value),
                    Field::Second => fields.second = Some(value),
                    Field::Millis => fields.millis = Some(value),
                    Field::Meridiem => {}
                }
            }
        }
    }
    text.is_empty().then_some(fields)
}

impl Fields {
    fn to_millis(&self) -> Option<i64> {
        let year = self.year.unwrap_or(1970);
        let date = match self.day_of_year {
            Some(doy) => NaiveDate::from_yo_opt(year, doy)?,
            None => NaiveDate::from_ymd_opt(year, self.month.unwrap_or(1), self.day.unwrap_or(1))?,
        };
        let mut hour = self.hour.unwrap_or(0);
        if self.hour12 {
            if !(1..=12).contains(&hour) {
                return None;
            }
            hour %= 12;
            if self.pm == Some(true) {
                hour += 12;
            }
        }
        let time = NaiveTime::from_hms_milli_opt(
            hour,
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
            self.millis.unwrap_or(0),
        )?;
        Some(date.and_time(time).and_utc().timestamp_millis())
    }
}

/// Holder for `to_date(text, format[, suppress_errors])`.
#[derive(Debug)]
pub struct ToDateHolder {
    format: String,
    tokens: Vec<FormatToken>,
}

impl ToDateHolder {
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(2, 3)?;
        let format = args.utf8(1)?;
        match args.get(2) {
            None | Some(Literal::Int32(_) | Literal::Int64(_)) => {}
            Some(_) => return Err(args.type_error(2, "an integer literal")),
        }
        let tokens = compile_format(format)?;
        tracing::debug!(format, tokens = tokens.len(), "to_date holder ready");
        Ok(Self {
            format: format.to_string(),
            tokens,
        })
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Epoch milliseconds, or `None` when the text does not fit the format.
    pub fn call(&self, text: &[u8]) -> Option<i64> {
        let text = std::str::from_utf8(text).ok()?;
        parse_fields(&self.tokens, text)?.to_millis()
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_to_date_utf8_utf8(
    _context_ptr: i64,
    holder_ptr: i64,
    data: *const u8,
    data_len: i32,
    in_valid: bool,
    out_valid: *mut bool,
) -> i64 {
    unsafe {
        let result = if in_valid {
            handle::holder::<ToDateHolder>(holder_ptr).call(handle::bytes(data, data_len))
        } else {
            None
        };
        handle::write(out_valid, result.is_some());
        result.unwrap_or(0)
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_to_date_utf8_utf8_int32(
    context_ptr: i64,
    holder_ptr: i64,
    data: *const u8,
    data_len: i32,
    in_valid: bool,
    out_valid: *mut bool,
) -> i64 {
    unsafe { kiln_to_date_utf8_utf8(context_ptr, holder_ptr, data, data_len, in_valid, out_valid) }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![
        stub!(kiln_to_date_utf8_utf8, [I64, I64, Ptr, I32, Bool, Ptr] -> I64),
        stub!(kiln_to_date_utf8_utf8_int32, [I64, I64, Ptr, I32, Bool, Ptr] -> I64),
    ]
}
