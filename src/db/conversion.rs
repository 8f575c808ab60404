//! Type conversion registry.
//!
//! Maps native wire type codes to pure conversion functions. Lookups happen
//! once per column before a fetch loop starts; the loop then applies the
//! resolved function pointer to every cell of that column.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::types::{RawValue, Value};
use crate::error::{AdapterError, Result};

/// Conversion from a raw driver value to its typed form.
pub type ConversionFn = fn(RawValue) -> Result<Value>;

/// Closed set of wire type codes the adapter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// `DT_NOTYPE`, treated as decimal.
    NoType,
    Date,
    Time,
    Timestamp,
    Decimal,
    /// `DT_SMALLINT`, the boolean candidate.
    SmallInt,
    Binary,
    LongBinary,
    /// Any code without a registered conversion.
    Other(u16),
}

impl WireType {
    pub const NO_TYPE: u16 = 0;
    pub const DATE: u16 = 384;
    pub const TIME: u16 = 388;
    pub const TIMESTAMP: u16 = 392;
    pub const DECIMAL: u16 = 484;
    pub const SMALL_INT: u16 = 500;
    pub const BINARY: u16 = 524;
    pub const LONG_BINARY: u16 = 528;

    pub fn from_code(code: u16) -> Self {
        match code {
            Self::NO_TYPE => Self::NoType,
            Self::DATE => Self::Date,
            Self::TIME => Self::Time,
            Self::TIMESTAMP => Self::Timestamp,
            Self::DECIMAL => Self::Decimal,
            Self::SMALL_INT => Self::SmallInt,
            Self::BINARY => Self::Binary,
            Self::LONG_BINARY => Self::LongBinary,
            other => Self::Other(other),
        }
    }

    /// Whether this is the type whose conversion is gated by the
    /// `convert_smallint_to_bool` option.
    pub fn is_boolean(self) -> bool {
        self == Self::SmallInt
    }
}

/// Timezone in which the application interprets timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationTimezone {
    #[default]
    Local,
    Utc,
}

/// Read-only registry shared by every connection of a database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionRegistry {
    timezone: ApplicationTimezone,
}

impl ConversionRegistry {
    pub fn new(timezone: ApplicationTimezone) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> ApplicationTimezone {
        self.timezone
    }

    /// Returns the conversion registered for `wire_type`, or `None` when the
    /// raw value should pass through unchanged.
    pub fn lookup(&self, wire_type: WireType) -> Option<ConversionFn> {
        match wire_type {
            WireType::NoType | WireType::Decimal => Some(to_decimal),
            WireType::Date => Some(to_date),
            WireType::Time => Some(to_time),
            WireType::Timestamp => Some(match self.timezone {
                ApplicationTimezone::Utc => to_timestamp_utc,
                ApplicationTimezone::Local => to_timestamp_local,
            }),
            WireType::SmallInt => Some(to_boolean),
            WireType::Binary | WireType::LongBinary => Some(to_blob),
            WireType::Other(_) => None,
        }
    }
}

fn unexpected(kind: &str, raw: &RawValue) -> AdapterError {
    AdapterError::conversion(format!("cannot convert {raw:?} to {kind}"))
}

fn to_decimal(raw: RawValue) -> Result<Value> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Text(s) => parse_decimal(&s),
        RawValue::Int(i) => Ok(Value::Decimal(BigDecimal::from(i))),
        RawValue::Float(f) => parse_decimal(&f.to_string()),
        other => Err(unexpected("decimal", &other)),
    }
}

fn parse_decimal(s: &str) -> Result<Value> {
    s.trim()
        .parse::<BigDecimal>()
        .map(Value::Decimal)
        .map_err(|e| AdapterError::conversion(format!("invalid decimal '{s}': {e}")))
}

fn to_date(raw: RawValue) -> Result<Value> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|e| AdapterError::conversion(format!("invalid date '{s}': {e}"))),
        other => Err(unexpected("date", &other)),
    }
}

fn to_time(raw: RawValue) -> Result<Value> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Text(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
            .map(Value::Time)
            .map_err(|e| AdapterError::conversion(format!("invalid time '{s}': {e}"))),
        other => Err(unexpected("time", &other)),
    }
}

fn parse_naive_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| AdapterError::conversion(format!("invalid timestamp '{s}': {e}")))
}

fn to_timestamp_utc(raw: RawValue) -> Result<Value> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Text(s) => {
            let naive = parse_naive_timestamp(&s)?;
            let utc = FixedOffset::east_opt(0)
                .ok_or_else(|| AdapterError::internal("zero offset out of range"))?;
            Ok(Value::Timestamp(Utc.from_utc_datetime(&naive).with_timezone(&utc)))
        }
        other => Err(unexpected("timestamp", &other)),
    }
}

fn to_timestamp_local(raw: RawValue) -> Result<Value> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Text(s) => {
            let naive = parse_naive_timestamp(&s)?;
            // Ambiguous local times (DST fall-back) resolve to the earlier instant.
            let local: DateTime<Local> = Local
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| {
                    AdapterError::conversion(format!("timestamp '{s}' does not exist locally"))
                })?;
            Ok(Value::Timestamp(local.fixed_offset()))
        }
        other => Err(unexpected("timestamp", &other)),
    }
}

fn to_boolean(raw: RawValue) -> Result<Value> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Int(i) => Ok(Value::Bool(i != 0)),
        RawValue::Float(f) => Ok(Value::Bool(f != 0.0)),
        // Leading-integer parse, non-numeric text counts as zero.
        RawValue::Text(s) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                .map_or(s.len(), |(i, _)| i);
            let n = s[..end].parse::<i64>().unwrap_or(0);
            Ok(Value::Bool(n != 0))
        }
        other => Err(unexpected("boolean", &other)),
    }
}

fn to_blob(raw: RawValue) -> Result<Value> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Bytes(b) => Ok(Value::Blob(b)),
        RawValue::Text(s) => Ok(Value::Blob(s.into_bytes())),
        other => Err(unexpected("blob", &other)),
    }
}
