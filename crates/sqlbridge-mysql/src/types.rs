//! Mapping between MySQL column types and sqlbridge values.
//!
//! Every result column is bound once to a [`NativeType`], chosen from its
//! MySQL type code by [`NativeType::for_field`]. Each fetched cell is then
//! converted into that native type by [`decode_value`]:
//!
//! | MySQL type | native |
//! |---|---|
//! | TINY, SHORT, INT24, LONG, LONGLONG, YEAR | `i64` |
//! | TIMESTAMP, NEWDATE | `i64` (`YYYYMMDDhhmmss`) |
//! | DECIMAL, NEWDECIMAL, FLOAT, DOUBLE | `f64` |
//! | DATE, TIME, DATETIME, VARCHAR | string |
//! | BIT | bool |
//! | NULL | NULL |
//! | anything else | bytes |

use std::fmt::Write as _;

use mysql::Value as MyValue;
use sqlbridge_core::error::{Error, TypeError};
use sqlbridge_core::{Result, Value};

/// MySQL column type codes (`MYSQL_TYPE_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldType {
    Decimal = 0x00,
    Tiny = 0x01,
    Short = 0x02,
    Long = 0x03,
    Float = 0x04,
    Double = 0x05,
    Null = 0x06,
    Timestamp = 0x07,
    LongLong = 0x08,
    Int24 = 0x09,
    Date = 0x0A,
    Time = 0x0B,
    DateTime = 0x0C,
    Year = 0x0D,
    NewDate = 0x0E,
    VarChar = 0x0F,
    Bit = 0x10,
    Timestamp2 = 0x11,
    DateTime2 = 0x12,
    Time2 = 0x13,
    Json = 0xF5,
    NewDecimal = 0xF6,
    Enum = 0xF7,
    Set = 0xF8,
    TinyBlob = 0xF9,
    MediumBlob = 0xFA,
    LongBlob = 0xFB,
    Blob = 0xFC,
    VarString = 0xFD,
    String = 0xFE,
    Geometry = 0xFF,
}

impl FieldType {
    /// Look up a type code. Unassigned codes yield `None`.
    #[must_use]
    pub fn from_u8(code: u8) -> Option<Self> {
        let ty = match code {
            0x00 => FieldType::Decimal,
            0x01 => FieldType::Tiny,
            0x02 => FieldType::Short,
            0x03 => FieldType::Long,
            0x04 => FieldType::Float,
            0x05 => FieldType::Double,
            0x06 => FieldType::Null,
            0x07 => FieldType::Timestamp,
            0x08 => FieldType::LongLong,
            0x09 => FieldType::Int24,
            0x0A => FieldType::Date,
            0x0B => FieldType::Time,
            0x0C => FieldType::DateTime,
            0x0D => FieldType::Year,
            0x0E => FieldType::NewDate,
            0x0F => FieldType::VarChar,
            0x10 => FieldType::Bit,
            0x11 => FieldType::Timestamp2,
            0x12 => FieldType::DateTime2,
            0x13 => FieldType::Time2,
            0xF5 => FieldType::Json,
            0xF6 => FieldType::NewDecimal,
            0xF7 => FieldType::Enum,
            0xF8 => FieldType::Set,
            0xF9 => FieldType::TinyBlob,
            0xFA => FieldType::MediumBlob,
            0xFB => FieldType::LongBlob,
            0xFC => FieldType::Blob,
            0xFD => FieldType::VarString,
            0xFE => FieldType::String,
            0xFF => FieldType::Geometry,
            _ => return None,
        };
        Some(ty)
    }

    /// SQL name of the type, as used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Decimal | FieldType::NewDecimal => "DECIMAL",
            FieldType::Tiny => "TINYINT",
            FieldType::Short => "SMALLINT",
            FieldType::Long => "INT",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Null => "NULL",
            FieldType::Timestamp | FieldType::Timestamp2 => "TIMESTAMP",
            FieldType::LongLong => "BIGINT",
            FieldType::Int24 => "MEDIUMINT",
            FieldType::Date | FieldType::NewDate => "DATE",
            FieldType::Time | FieldType::Time2 => "TIME",
            FieldType::DateTime | FieldType::DateTime2 => "DATETIME",
            FieldType::Year => "YEAR",
            FieldType::VarChar | FieldType::VarString => "VARCHAR",
            FieldType::Bit => "BIT",
            FieldType::Json => "JSON",
            FieldType::Enum => "ENUM",
            FieldType::Set => "SET",
            FieldType::TinyBlob => "TINYBLOB",
            FieldType::MediumBlob => "MEDIUMBLOB",
            FieldType::LongBlob => "LONGBLOB",
            FieldType::Blob => "BLOB",
            FieldType::String => "CHAR",
            FieldType::Geometry => "GEOMETRY",
        }
    }
}

/// The native slot a result column is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeType {
    Int64,
    Float64,
    Text,
    Bool,
    /// Column of type NULL; every cell is absent.
    Null,
    Bytes,
}

impl NativeType {
    /// Choose the slot for a column type.
    pub const fn for_field(field: FieldType) -> Self {
        match field {
            FieldType::Tiny
            | FieldType::Short
            | FieldType::Int24
            | FieldType::Long
            | FieldType::LongLong
            | FieldType::Year
            | FieldType::Timestamp
            | FieldType::NewDate => NativeType::Int64,
            FieldType::Decimal
            | FieldType::NewDecimal
            | FieldType::Float
            | FieldType::Double => NativeType::Float64,
            FieldType::Date | FieldType::Time | FieldType::DateTime | FieldType::VarChar => {
                NativeType::Text
            }
            FieldType::Bit => NativeType::Bool,
            FieldType::Null => NativeType::Null,
            _ => NativeType::Bytes,
        }
    }

    /// Choose the slot for a raw type code. Unknown codes get [`NativeType::Bytes`].
    pub fn for_code(code: u8) -> Self {
        FieldType::from_u8(code).map_or(NativeType::Bytes, Self::for_field)
    }

    pub const fn name(self) -> &'static str {
        match self {
            NativeType::Int64 => "i64",
            NativeType::Float64 => "f64",
            NativeType::Text => "string",
            NativeType::Bool => "bool",
            NativeType::Null => "null",
            NativeType::Bytes => "bytes",
        }
    }
}

fn client_kind(value: &MyValue) -> &'static str {
    match value {
        MyValue::NULL => "NULL",
        MyValue::Bytes(_) => "bytes",
        MyValue::Int(_) => "signed integer",
        MyValue::UInt(_) => "unsigned integer",
        MyValue::Float(_) => "float",
        MyValue::Double(_) => "double",
        MyValue::Date(..) => "date",
        MyValue::Time(..) => "time",
    }
}

fn mismatch(native: NativeType, actual: String) -> Error {
    Error::Type(TypeError {
        expected: native.name(),
        actual,
        column: None,
    })
}

fn parse_text<T: std::str::FromStr>(native: NativeType, bytes: &[u8]) -> Result<T> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .ok_or_else(|| {
            mismatch(
                native,
                format!("unparsable text '{}'", String::from_utf8_lossy(bytes)),
            )
        })
}

/// Numeric `YYYYMMDDhhmmss` form of a date/time value.
fn date_as_number(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> i64 {
    i64::from(year) * 10_000_000_000
        + i64::from(month) * 100_000_000
        + i64::from(day) * 1_000_000
        + i64::from(hour) * 10_000
        + i64::from(minute) * 100
        + i64::from(second)
}

/// Append the fraction of a second using the column's declared precision.
///
/// `decimals` above 6 means the precision is unknown (expression results);
/// the full six digits are then written, and only when non-zero.
fn push_fraction(out: &mut String, decimals: u8, micros: u32) {
    match decimals {
        0 => {}
        1..=6 => {
            let width = usize::from(decimals);
            let scaled = micros / 10_u32.pow(6 - u32::from(decimals));
            let _ = write!(out, ".{:0width$}", scaled, width = width);
        }
        _ if micros != 0 => {
            let _ = write!(out, ".{:06}", micros);
        }
        _ => {}
    }
}

/// Render a client date value the way MySQL prints the column type.
#[allow(clippy::too_many_arguments)]
fn format_date(
    field: Option<FieldType>,
    decimals: u8,
    y: u16,
    m: u8,
    d: u8,
    h: u8,
    i: u8,
    s: u8,
    us: u32,
) -> String {
    let mut out = format!("{:04}-{:02}-{:02}", y, m, d);
    if !matches!(field, Some(FieldType::Date | FieldType::NewDate)) {
        let _ = write!(out, " {:02}:{:02}:{:02}", h, i, s);
        push_fraction(&mut out, decimals, us);
    }
    out
}

/// Render a client time value as `[-]HH:MM:SS[.f...]`; days fold into hours.
fn format_time(negative: bool, decimals: u8, days: u32, h: u8, i: u8, s: u8, us: u32) -> String {
    let hours = u64::from(days) * 24 + u64::from(h);
    let mut out = format!(
        "{}{:02}:{:02}:{:02}",
        if negative { "-" } else { "" },
        hours,
        i,
        s
    );
    push_fraction(&mut out, decimals, us);
    out
}

/// Textual form of any non-NULL client value.
fn render(field: Option<FieldType>, decimals: u8, value: MyValue) -> Vec<u8> {
    match value {
        MyValue::NULL => Vec::new(),
        MyValue::Bytes(b) => b,
        MyValue::Int(v) => v.to_string().into_bytes(),
        MyValue::UInt(v) => v.to_string().into_bytes(),
        MyValue::Float(v) => v.to_string().into_bytes(),
        MyValue::Double(v) => v.to_string().into_bytes(),
        MyValue::Date(y, m, d, h, i, s, us) => {
            format_date(field, decimals, y, m, d, h, i, s, us).into_bytes()
        }
        MyValue::Time(neg, days, h, i, s, us) => {
            format_time(neg, decimals, days, h, i, s, us).into_bytes()
        }
    }
}

/// Convert one fetched cell into the native type of its slot.
///
/// `decimals` is the column's declared fractional-second precision; temporal
/// values rendered as text carry exactly that many digits.
///
/// SQL NULL always yields [`Value::Null`], whatever the slot.
pub fn decode_value(
    native: NativeType,
    field: Option<FieldType>,
    decimals: u8,
    value: MyValue,
) -> Result<Value> {
    if matches!(value, MyValue::NULL) {
        return Ok(Value::Null);
    }

    match native {
        NativeType::Null => Ok(Value::Null),
        NativeType::Int64 => match value {
            MyValue::Int(v) => Ok(Value::BigInt(v)),
            MyValue::UInt(v) => i64::try_from(v)
                .map(Value::BigInt)
                .map_err(|_| mismatch(native, format!("unsigned value {} out of range", v))),
            MyValue::Bytes(b) => parse_text::<i64>(native, &b).map(Value::BigInt),
            MyValue::Date(y, m, d, h, i, s, _) => Ok(Value::BigInt(date_as_number(y, m, d, h, i, s))),
            other => Err(mismatch(native, client_kind(&other).to_string())),
        },
        NativeType::Float64 => match value {
            MyValue::Double(v) => Ok(Value::Double(v)),
            MyValue::Float(v) => Ok(Value::Double(f64::from(v))),
            MyValue::Int(v) => Ok(Value::Double(v as f64)),
            MyValue::UInt(v) => Ok(Value::Double(v as f64)),
            MyValue::Bytes(b) => parse_text::<f64>(native, &b).map(Value::Double),
            other => Err(mismatch(native, client_kind(&other).to_string())),
        },
        NativeType::Text => String::from_utf8(render(field, decimals, value))
            .map(Value::Text)
            .map_err(|e| mismatch(native, format!("invalid UTF-8: {}", e))),
        NativeType::Bool => match value {
            MyValue::Bytes(b) => Ok(Value::Bool(b.iter().any(|byte| *byte != 0))),
            MyValue::Int(v) => Ok(Value::Bool(v != 0)),
            MyValue::UInt(v) => Ok(Value::Bool(v != 0)),
            other => Err(mismatch(native, client_kind(&other).to_string())),
        },
        NativeType::Bytes => Ok(Value::Bytes(render(field, decimals, value))),
    }
}

/// Convert a statement argument into a client value.
pub fn encode_value(value: &Value) -> MyValue {
    match value {
        Value::Null => MyValue::NULL,
        Value::Bool(v) => MyValue::Int(i64::from(*v)),
        Value::BigInt(v) => MyValue::Int(*v),
        Value::Double(v) => MyValue::Double(*v),
        Value::Text(v) => MyValue::Bytes(v.clone().into_bytes()),
        Value::Bytes(v) => MyValue::Bytes(v.clone()),
    }
}

/// Convert a whole argument list into positional client parameters.
pub fn encode_params(args: &[Value]) -> mysql::Params {
    if args.is_empty() {
        mysql::Params::Empty
    } else {
        mysql::Params::Positional(args.iter().map(encode_value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_from_u8() {
        assert_eq!(FieldType::from_u8(0x01), Some(FieldType::Tiny));
        assert_eq!(FieldType::from_u8(0x0F), Some(FieldType::VarChar));
        assert_eq!(FieldType::from_u8(0xF6), Some(FieldType::NewDecimal));
        assert_eq!(FieldType::from_u8(0xFE), Some(FieldType::String));
        assert_eq!(FieldType::from_u8(0x14), None);
        assert_eq!(FieldType::from_u8(0x80), None);
    }

    #[test]
    fn test_codes_round_trip() {
        for code in 0..=u8::MAX {
            if let Some(ty) = FieldType::from_u8(code) {
                assert_eq!(ty as u8, code);
            }
        }
    }

    #[test]
    fn test_mapping_table() {
        use FieldType as F;
        use NativeType as N;

        let table = [
            (F::Tiny, N::Int64),
            (F::Short, N::Int64),
            (F::Int24, N::Int64),
            (F::Long, N::Int64),
            (F::LongLong, N::Int64),
            (F::Year, N::Int64),
            (F::Timestamp, N::Int64),
            (F::NewDate, N::Int64),
            (F::Decimal, N::Float64),
            (F::NewDecimal, N::Float64),
            (F::Float, N::Float64),
            (F::Double, N::Float64),
            (F::Date, N::Text),
            (F::Time, N::Text),
            (F::DateTime, N::Text),
            (F::VarChar, N::Text),
            (F::Bit, N::Bool),
            (F::Null, N::Null),
            (F::VarString, N::Bytes),
            (F::String, N::Bytes),
            (F::Blob, N::Bytes),
            (F::TinyBlob, N::Bytes),
            (F::MediumBlob, N::Bytes),
            (F::LongBlob, N::Bytes),
            (F::Enum, N::Bytes),
            (F::Set, N::Bytes),
            (F::Json, N::Bytes),
            (F::Geometry, N::Bytes),
            (F::Timestamp2, N::Bytes),
            (F::DateTime2, N::Bytes),
            (F::Time2, N::Bytes),
        ];
        for (field, native) in table {
            assert_eq!(NativeType::for_field(field), native, "{field:?}");
        }
        assert_eq!(NativeType::for_code(0x42), NativeType::Bytes);
        assert_eq!(NativeType::for_code(0x08), NativeType::Int64);
    }

    #[test]
    fn test_null_is_null_in_every_slot() {
        for native in [
            NativeType::Int64,
            NativeType::Float64,
            NativeType::Text,
            NativeType::Bool,
            NativeType::Null,
            NativeType::Bytes,
        ] {
            assert_eq!(decode_value(native, None, 0, MyValue::NULL).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_decode_integers() {
        let f = Some(FieldType::LongLong);
        assert_eq!(
            decode_value(NativeType::Int64, f, 0, MyValue::Int(-5)).unwrap(),
            Value::BigInt(-5)
        );
        assert_eq!(
            decode_value(NativeType::Int64, f, 0, MyValue::UInt(7)).unwrap(),
            Value::BigInt(7)
        );
        assert_eq!(
            decode_value(NativeType::Int64, f, 0, MyValue::Bytes(b"2024".to_vec())).unwrap(),
            Value::BigInt(2024)
        );
        assert!(decode_value(NativeType::Int64, f, 0, MyValue::UInt(u64::MAX)).is_err());
        assert!(decode_value(NativeType::Int64, f, 0, MyValue::Bytes(b"x".to_vec())).is_err());
    }

    #[test]
    fn test_decode_timestamp_as_number() {
        let v = MyValue::Date(2024, 3, 9, 14, 5, 7, 120);
        assert_eq!(
            decode_value(NativeType::Int64, Some(FieldType::Timestamp), 0, v).unwrap(),
            Value::BigInt(20_240_309_140_507)
        );
    }

    #[test]
    fn test_decode_floats() {
        let f = Some(FieldType::NewDecimal);
        assert_eq!(
            decode_value(NativeType::Float64, f, 0, MyValue::Bytes(b"93.21".to_vec())).unwrap(),
            Value::Double(93.21)
        );
        assert_eq!(
            decode_value(NativeType::Float64, f, 0, MyValue::Float(1.5)).unwrap(),
            Value::Double(1.5)
        );
        assert_eq!(
            decode_value(NativeType::Float64, f, 0, MyValue::Double(2.25)).unwrap(),
            Value::Double(2.25)
        );
    }

    #[test]
    fn test_decode_dates_as_text() {
        let date = MyValue::Date(2024, 1, 2, 0, 0, 0, 0);
        assert_eq!(
            decode_value(NativeType::Text, Some(FieldType::Date), 0, date).unwrap(),
            Value::Text("2024-01-02".to_string())
        );

        let dt = MyValue::Date(2024, 1, 2, 3, 4, 5, 0);
        assert_eq!(
            decode_value(NativeType::Text, Some(FieldType::DateTime), 0, dt).unwrap(),
            Value::Text("2024-01-02 03:04:05".to_string())
        );

        let dt = MyValue::Date(2024, 1, 2, 3, 4, 5, 60);
        assert_eq!(
            decode_value(NativeType::Text, Some(FieldType::DateTime), 6, dt).unwrap(),
            Value::Text("2024-01-02 03:04:05.000060".to_string())
        );
    }

    #[test]
    fn test_decode_fraction_follows_column_precision() {
        let dt = |us| MyValue::Date(2024, 1, 2, 3, 4, 5, us);
        let text = |decimals, v| decode_value(NativeType::Text, Some(FieldType::DateTime), decimals, v).unwrap();

        assert_eq!(
            text(3, dt(120_000)),
            Value::Text("2024-01-02 03:04:05.120".to_string())
        );
        assert_eq!(
            text(6, dt(0)),
            Value::Text("2024-01-02 03:04:05.000000".to_string())
        );
        assert_eq!(
            text(1, dt(0)),
            Value::Text("2024-01-02 03:04:05.0".to_string())
        );
        assert_eq!(text(0, dt(0)), Value::Text("2024-01-02 03:04:05".to_string()));

        // Unknown precision: six digits, only when there is a fraction.
        assert_eq!(
            text(31, dt(60)),
            Value::Text("2024-01-02 03:04:05.000060".to_string())
        );
        assert_eq!(text(31, dt(0)), Value::Text("2024-01-02 03:04:05".to_string()));

        let t = MyValue::Time(false, 0, 1, 2, 3, 500_000);
        assert_eq!(
            decode_value(NativeType::Text, Some(FieldType::Time), 2, t).unwrap(),
            Value::Text("01:02:03.50".to_string())
        );
    }

    #[test]
    fn test_decode_time_as_text() {
        let t = MyValue::Time(false, 0, 12, 30, 0, 0);
        assert_eq!(
            decode_value(NativeType::Text, Some(FieldType::Time), 0, t).unwrap(),
            Value::Text("12:30:00".to_string())
        );

        let t = MyValue::Time(true, 2, 1, 0, 59, 500_000);
        assert_eq!(
            decode_value(NativeType::Text, Some(FieldType::Time), 6, t).unwrap(),
            Value::Text("-49:00:59.500000".to_string())
        );
    }

    #[test]
    fn test_decode_bit() {
        let f = Some(FieldType::Bit);
        assert_eq!(
            decode_value(NativeType::Bool, f, 0, MyValue::Bytes(vec![0x01])).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            decode_value(NativeType::Bool, f, 0, MyValue::Bytes(vec![0x00, 0x00])).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            decode_value(NativeType::Bool, f, 0, MyValue::Bytes(vec![0x00, 0x80])).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_decode_bytes() {
        let f = Some(FieldType::VarString);
        assert_eq!(
            decode_value(NativeType::Bytes, f, 0, MyValue::Bytes("héllo".as_bytes().to_vec())).unwrap(),
            Value::Bytes("héllo".as_bytes().to_vec())
        );
        assert_eq!(
            decode_value(NativeType::Bytes, None, 0, MyValue::Int(12)).unwrap(),
            Value::Bytes(b"12".to_vec())
        );
    }

    #[test]
    fn test_decode_text_rejects_invalid_utf8() {
        let err = decode_value(
            NativeType::Text,
            Some(FieldType::VarChar),
            0,
            MyValue::Bytes(vec![0xff]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_encode_values() {
        assert_eq!(encode_value(&Value::Null), MyValue::NULL);
        assert_eq!(encode_value(&Value::Bool(true)), MyValue::Int(1));
        assert_eq!(encode_value(&Value::BigInt(-3)), MyValue::Int(-3));
        assert_eq!(encode_value(&Value::Double(0.5)), MyValue::Double(0.5));
        assert_eq!(
            encode_value(&Value::Text("abc".to_string())),
            MyValue::Bytes(b"abc".to_vec())
        );
        assert_eq!(encode_value(&Value::Bytes(vec![0])), MyValue::Bytes(vec![0]));
    }

    #[test]
    fn test_encode_params() {
        assert_eq!(encode_params(&[]), mysql::Params::Empty);
        assert_eq!(
            encode_params(&[Value::BigInt(1), Value::Null]),
            mysql::Params::Positional(vec![MyValue::Int(1), MyValue::NULL])
        );
    }
}
