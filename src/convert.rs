//! Text → scalar conversion rules.
//!
//! Pure and deterministic: every scalar field read from a document goes
//! through [`convert`], every failure becomes `ERR_EXTRACTING_FIELD` at the
//! call site.

use thiserror::Error;

use crate::schema::ScalarKind;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{text:?} is not a valid {kind}")]
pub struct ConvertError {
    pub kind: ScalarKind,
    pub text: String,
}

impl ConvertError {
    fn new(kind: ScalarKind, text: &str) -> Self {
        Self { kind, text: text.to_owned() }
    }
}

/// Convert `text` into a value of `kind`.
///
/// Strings take the text as is. Every other kind ignores surrounding
/// whitespace.
pub fn convert(kind: ScalarKind, text: &str) -> Result<Value, ConvertError> {
    if kind == ScalarKind::String {
        return Ok(Value::Str(text.to_owned()));
    }
    let token = text.trim();
    match kind {
        ScalarKind::Bool => parse_bool(token).map(Value::Bool),
        ScalarKind::F32 => parse_float::<f32>(kind, token).map(|v| Value::Float(f64::from(v))),
        ScalarKind::F64 => parse_float::<f64>(kind, token).map(Value::Float),
        _ => parse_integer(kind, token),
    }
}

/// Decimal or exponential numeral. Only a literal `inf`/`infinity`/`nan`
/// may produce a non-finite value; overflow to infinity is a failure.
pub fn parse_float<F>(kind: ScalarKind, text: &str) -> Result<F, ConvertError>
where
    F: std::str::FromStr + Into<f64> + Copy,
{
    let value = text.parse::<F>().map_err(|_| ConvertError::new(kind, text))?;
    if !Into::<f64>::into(value).is_finite() && !names_non_finite(text) {
        return Err(ConvertError::new(kind, text));
    }
    Ok(value)
}

fn names_non_finite(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    ["inf", "infinity", "nan"].iter().any(|name| unsigned.eq_ignore_ascii_case(name))
}

/// `true`/`1` and `false`/`0`, letters in any case.
pub fn parse_bool(text: &str) -> Result<bool, ConvertError> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Ok(false)
    } else {
        Err(ConvertError::new(ScalarKind::Bool, text))
    }
}

/// Decimal or `0x`/`0X` hexadecimal, range-checked against the kind's width.
pub fn parse_integer(kind: ScalarKind, text: &str) -> Result<Value, ConvertError> {
    let fail = || ConvertError::new(kind, text);
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (digits, radix) = match unsigned.get(..2) {
        Some("0x" | "0X") => (&unsigned[2..], 16),
        _ => (unsigned, 10),
    };
    // from_str_radix tolerates its own sign; ours was already consumed
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(fail());
    }
    let magnitude = i128::from_str_radix(digits, radix).map_err(|_| fail())?;
    let number = if negative { -magnitude } else { magnitude };
    let (min, max) = bounds(kind);
    if number < min || number > max {
        return Err(fail());
    }
    if kind_is_signed(kind) {
        i64::try_from(number).map(Value::Int).map_err(|_| fail())
    } else {
        u64::try_from(number).map(Value::UInt).map_err(|_| fail())
    }
}

fn kind_is_signed(kind: ScalarKind) -> bool {
    matches!(kind, ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64)
}

fn bounds(kind: ScalarKind) -> (i128, i128) {
    match kind {
        ScalarKind::I8 => (i8::MIN.into(), i8::MAX.into()),
        ScalarKind::I16 => (i16::MIN.into(), i16::MAX.into()),
        ScalarKind::I32 => (i32::MIN.into(), i32::MAX.into()),
        ScalarKind::I64 => (i64::MIN.into(), i64::MAX.into()),
        ScalarKind::U8 => (0, u8::MAX.into()),
        ScalarKind::U16 => (0, u16::MAX.into()),
        ScalarKind::U32 => (0, u32::MAX.into()),
        ScalarKind::U64 => (0, u64::MAX.into()),
        _ => (0, -1),
    }
}
