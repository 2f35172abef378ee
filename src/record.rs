//! Trip record schema and per-line decoding.

use std::fmt;

use thiserror::Error;

use crate::extract::FieldFinder;

/// The nine input keys a trip record is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    PickupTime,
    DropoffTime,
    VendorId,
    PassengerCount,
    TripDistance,
    PaymentType,
    FareAmount,
    TipAmount,
    StoreAndForwardFlag,
}

impl Field {
    /// All fields, in discriminant order.
    pub const ALL: [Field; 9] = [
        Field::PickupTime,
        Field::DropoffTime,
        Field::VendorId,
        Field::PassengerCount,
        Field::TripDistance,
        Field::PaymentType,
        Field::FareAmount,
        Field::TipAmount,
        Field::StoreAndForwardFlag,
    ];

    /// Key as it appears in the input.
    pub fn key(self) -> &'static str {
        match self {
            Field::PickupTime => "tpep_pickup_datetime",
            Field::DropoffTime => "tpep_dropoff_datetime",
            Field::VendorId => "VendorID",
            Field::PassengerCount => "passenger_count",
            Field::TripDistance => "trip_distance",
            Field::PaymentType => "payment_type",
            Field::FareAmount => "fare_amount",
            Field::TipAmount => "tip_amount",
            Field::StoreAndForwardFlag => "store_and_fwd_flag",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How absent, `null` or malformed fields are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Every field falls back to its default; decoding never fails.
    #[default]
    Lenient,
    /// Every field must be present, non-null, and numeric where expected.
    Strict,
}

/// One decoded taxi trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub pickup_time: String,
    pub dropoff_time: String,
    pub vendor_id: i64,
    pub passenger_count: i64,
    pub trip_distance: f64,
    pub payment_type: i64,
    pub fare_amount: f64,
    pub tip_amount: f64,
    pub store_and_forward_flag: char,
}

impl Default for TripRecord {
    fn default() -> Self {
        Self {
            pickup_time: String::new(),
            dropoff_time: String::new(),
            vendor_id: 0,
            passenger_count: 0,
            trip_distance: 0.0,
            payment_type: 0,
            fare_amount: 0.0,
            tip_amount: 0.0,
            store_and_forward_flag: 'N',
        }
    }
}

impl TripRecord {
    /// Calendar date of the pickup: the first 10 characters of the timestamp.
    /// `None` when the timestamp is shorter than that.
    pub fn pickup_date(&self) -> Option<&str> {
        self.pickup_time.get(..10)
    }
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("missing field `{0}`")]
    Missing(Field),

    #[error("field `{0}` is null")]
    Null(Field),

    #[error("field `{field}` is not a number: {raw:?}")]
    InvalidNumber { field: Field, raw: String },

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// Decodes lines into [`TripRecord`]s with one fixed [`DecodeMode`].
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    mode: DecodeMode,
    finders: [FieldFinder; 9],
}

impl RecordDecoder {
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            mode,
            finders: Field::ALL.map(|field| FieldFinder::new(field.key())),
        }
    }

    pub fn decode(&self, line: &str) -> Result<TripRecord, DecodeError> {
        Ok(TripRecord {
            pickup_time: self.text(line, Field::PickupTime)?,
            dropoff_time: self.text(line, Field::DropoffTime)?,
            vendor_id: self.int(line, Field::VendorId)?,
            passenger_count: self.int(line, Field::PassengerCount)?,
            trip_distance: self.float(line, Field::TripDistance)?,
            payment_type: self.int(line, Field::PaymentType)?,
            fare_amount: self.float(line, Field::FareAmount)?,
            tip_amount: self.float(line, Field::TipAmount)?,
            store_and_forward_flag: self.flag(line, Field::StoreAndForwardFlag)?,
        })
    }

    /// Decode raw line bytes; invalid UTF-8 is a decode failure in either mode.
    pub fn decode_bytes(&self, line: &[u8]) -> Result<TripRecord, DecodeError> {
        let text = std::str::from_utf8(line).map_err(|_| DecodeError::InvalidUtf8)?;
        self.decode(text)
    }

    /// Raw value text, or `None` when the field should take its default.
    fn lookup<'a>(&self, line: &'a str, field: Field) -> Result<Option<&'a str>, DecodeError> {
        let strict = self.mode == DecodeMode::Strict;
        match self.finders[field as usize].find(line) {
            Some("null") if strict => Err(DecodeError::Null(field)),
            Some("null") => Ok(None),
            Some(raw) => Ok(Some(raw)),
            None if strict => Err(DecodeError::Missing(field)),
            None => Ok(None),
        }
    }

    fn text(&self, line: &str, field: Field) -> Result<String, DecodeError> {
        Ok(self
            .lookup(line, field)?
            .map(str::to_string)
            .unwrap_or_default())
    }

    fn int(&self, line: &str, field: Field) -> Result<i64, DecodeError> {
        self.number(line, field, parse_int)
    }

    fn float(&self, line: &str, field: Field) -> Result<f64, DecodeError> {
        self.number(line, field, parse_float)
    }

    fn number<T: Default>(
        &self,
        line: &str,
        field: Field,
        parse: fn(&str) -> Option<T>,
    ) -> Result<T, DecodeError> {
        let Some(raw) = self.lookup(line, field)? else {
            return Ok(T::default());
        };
        match parse(raw) {
            Some(value) => Ok(value),
            None if self.mode == DecodeMode::Strict => Err(DecodeError::InvalidNumber {
                field,
                raw: raw.to_string(),
            }),
            None => Ok(T::default()),
        }
    }

    fn flag(&self, line: &str, field: Field) -> Result<char, DecodeError> {
        match self.lookup(line, field)?.and_then(|raw| raw.chars().next()) {
            Some(c) => Ok(c),
            None if self.mode == DecodeMode::Strict => Err(DecodeError::Missing(field)),
            None => Ok('N'),
        }
    }
}

/// Decode one line with a throwaway decoder.
pub fn decode(line: &str, mode: DecodeMode) -> Result<TripRecord, DecodeError> {
    RecordDecoder::new(mode).decode(line)
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer codes are sometimes exported as floats (`1.0`); those truncate.
/// Values outside the 32-bit range are rejected.
fn parse_int(raw: &str) -> Option<i64> {
    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let v = parse_float(raw)?.trunc();
            if v < i32::MIN as f64 || v > i32::MAX as f64 {
                return None;
            }
            v as i64
        }
    };
    i32::try_from(value).ok().map(i64::from)
}
