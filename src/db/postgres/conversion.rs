//! Type conversion utilities for the PostgreSQL backend.
//!
//! Handles conversion between:
//! - caller text parameters and PostgreSQL parameters (sent in text format,
//!   so the server parses them against the inferred placeholder type)
//! - binary result values and their text rendering

use std::error::Error;

use bytes::BytesMut;
use postgres::types::{to_sql_checked, Format, FromSql, IsNull, Kind, ToSql, Type};

use crate::db::NativeError;

/// A parameter sent as text whatever the placeholder type.
#[derive(Debug)]
pub struct TextParam<'a>(pub &'a str);

impl ToSql for TextParam<'_> {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        out.extend_from_slice(self.0.as_bytes());
        Ok(IsNull::No)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn encode_format(&self, _ty: &Type) -> Format {
        Format::Text
    }

    to_sql_checked!();
}

/// Any non-NULL column value rendered as text.
///
/// Results always arrive in binary format. Types with a known binary layout
/// are decoded and printed the way `psql` prints them. Text-like types and
/// enum labels are taken as UTF-8. Any other type fails to decode rather
/// than produce text from its binary payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PgText(pub String);

type DecodeError = Box<dyn Error + Sync + Send>;

/// Days from 1970-01-01 to the PostgreSQL epoch, 2000-01-01.
const PG_EPOCH_DAYS: i64 = 10_957;
const MICROS_PER_DAY: i64 = 86_400_000_000;

impl<'a> FromSql<'a> for PgText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, DecodeError> {
        let text = match *ty {
            Type::BOOL => bool::from_sql(ty, raw)?.to_string(),
            Type::INT2 => i16::from_sql(ty, raw)?.to_string(),
            Type::INT4 => i32::from_sql(ty, raw)?.to_string(),
            Type::INT8 => i64::from_sql(ty, raw)?.to_string(),
            Type::OID => u32::from_sql(ty, raw)?.to_string(),
            Type::FLOAT4 => f32::from_sql(ty, raw)?.to_string(),
            Type::FLOAT8 => f64::from_sql(ty, raw)?.to_string(),
            Type::NUMERIC => numeric_text(raw)?,
            Type::BYTEA => format!("\\x{}", hex::encode(raw)),
            Type::UUID => uuid_text(raw)?,
            Type::DATE => date_text(i32::from_sql(ty, raw)?),
            Type::TIME => time_text(i64::from_sql(ty, raw)?),
            Type::TIMESTAMP => timestamp_text(i64::from_sql(ty, raw)?, ""),
            Type::TIMESTAMPTZ => timestamp_text(i64::from_sql(ty, raw)?, "+00"),
            // Version byte, then the JSON text.
            Type::JSONB => match raw.split_first() {
                Some((&1, json)) => String::from_utf8_lossy(json).into_owned(),
                _ => return Err("unsupported jsonb version".into()),
            },
            Type::INTERVAL => interval_text(raw)?,
            _ if is_text_like(ty) => String::from_utf8_lossy(raw).into_owned(),
            _ => match ty.kind() {
                Kind::Array(_) => array_text(ty, raw)?,
                Kind::Domain(inner) => return PgText::from_sql(inner, raw),
                _ => return Err(format!("cannot render type {} as text", ty.name()).into()),
            },
        };
        Ok(PgText(text))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn is_text_like(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT
            | Type::VARCHAR
            | Type::BPCHAR
            | Type::NAME
            | Type::CHAR
            | Type::JSON
            | Type::XML
            | Type::UNKNOWN
    ) || matches!(ty.kind(), Kind::Enum(_))
}

/// One-dimensional arrays in the `{a,"b c",NULL}` output syntax.
fn array_text(ty: &Type, raw: &[u8]) -> Result<String, DecodeError> {
    let elements = Vec::<Option<PgText>>::from_sql(ty, raw)?;
    let items: Vec<String> = elements
        .into_iter()
        .map(|element| match element {
            None => "NULL".to_string(),
            Some(PgText(text)) => quote_array_element(&text),
        })
        .collect();
    Ok(format!("{{{}}}", items.join(",")))
}

fn quote_array_element(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text.eq_ignore_ascii_case("NULL")
        || text
            .chars()
            .any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_ascii_whitespace());
    if !needs_quotes {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// `[N year[s]] [N mon[s]] [N day[s]] [-]HH:MM:SS[.ffffff]`, as `psql` prints
/// intervals with the default `postgres` style.
fn interval_text(raw: &[u8]) -> Result<String, DecodeError> {
    let raw: &[u8; 16] = raw.try_into().map_err(|_| "interval must be 16 bytes")?;
    let micros = i64::from_be_bytes([raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7]]);
    let days = i32::from_be_bytes([raw[8], raw[9], raw[10], raw[11]]);
    let months = i32::from_be_bytes([raw[12], raw[13], raw[14], raw[15]]);

    let mut parts = Vec::new();
    // A positive field after a negative one carries an explicit `+`.
    let mut is_before = false;
    for (n, name) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        if n == 0 {
            continue;
        }
        let sign = if is_before && n > 0 { "+" } else { "" };
        let plural = if n == 1 { "" } else { "s" };
        parts.push(format!("{}{} {}{}", sign, n, name, plural));
        is_before = n < 0;
    }
    if micros != 0 || parts.is_empty() {
        let sign = match (micros < 0, is_before) {
            (true, _) => "-",
            (false, true) => "+",
            (false, false) => "",
        };
        let magnitude = i64::try_from(micros.unsigned_abs()).unwrap_or(i64::MAX);
        parts.push(format!("{}{}", sign, time_text(magnitude)));
    }
    Ok(parts.join(" "))
}

fn be_u16(raw: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([raw[at], raw[at + 1]])
}

/// Decode the base-10000 digit layout of NUMERIC.
fn numeric_text(raw: &[u8]) -> Result<String, DecodeError> {
    if raw.len() < 8 {
        return Err("numeric value too short".into());
    }
    let ndigits = usize::from(be_u16(raw, 0));
    let weight = i32::from(be_u16(raw, 2) as i16);
    let sign = be_u16(raw, 4);
    let dscale = usize::from(be_u16(raw, 6));

    match sign {
        0xC000 => return Ok("NaN".to_string()),
        0xD000 => return Ok("Infinity".to_string()),
        0xF000 => return Ok("-Infinity".to_string()),
        _ => {}
    }
    if raw.len() != 8 + 2 * ndigits {
        return Err("numeric digit count does not match its length".into());
    }
    let digit = |i: i32| -> u16 {
        if i < 0 || i as usize >= ndigits {
            0
        } else {
            be_u16(raw, 8 + 2 * i as usize)
        }
    };

    let mut out = String::new();
    if sign == 0x4000 {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&digit(0).to_string());
        for i in 1..=weight {
            out.push_str(&format!("{:04}", digit(i)));
        }
    }

    if dscale > 0 {
        let mut frac = String::new();
        let mut i = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", digit(i)));
            i += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Ok(out)
}

fn uuid_text(raw: &[u8]) -> Result<String, DecodeError> {
    if raw.len() != 16 {
        return Err("uuid must be 16 bytes".into());
    }
    let h = hex::encode(raw);
    Ok(format!("{}-{}-{}-{}-{}", &h[0..8], &h[8..12], &h[12..16], &h[16..20], &h[20..]))
}

/// Civil date for a count of days since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn date_text(days: i32) -> String {
    match days {
        i32::MAX => "infinity".to_string(),
        i32::MIN => "-infinity".to_string(),
        _ => {
            let (y, m, d) = civil_from_days(i64::from(days) + PG_EPOCH_DAYS);
            format!("{:04}-{:02}-{:02}", y, m, d)
        }
    }
}

/// `HH:MM:SS[.ffffff]` with trailing fractional zeros removed.
fn time_text(micros: i64) -> String {
    let secs = micros / 1_000_000;
    let frac = micros % 1_000_000;
    let mut out = format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
    if frac > 0 {
        let digits = format!("{:06}", frac);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

fn timestamp_text(micros: i64, zone: &str) -> String {
    match micros {
        i64::MAX => "infinity".to_string(),
        i64::MIN => "-infinity".to_string(),
        _ => {
            let days = micros.div_euclid(MICROS_PER_DAY);
            let (y, m, d) = civil_from_days(days + PG_EPOCH_DAYS);
            let time = time_text(micros.rem_euclid(MICROS_PER_DAY));
            format!("{:04}-{:02}-{:02} {}{}", y, m, d, time, zone)
        }
    }
}

/// Message and SQLSTATE of a PostgreSQL error.
pub fn native_error(e: &postgres::Error) -> NativeError {
    match e.as_db_error() {
        Some(db) => NativeError::new(Some(db.code().code().to_string()), db.message()),
        None => NativeError::message(e.to_string()),
    }
}
