//! JSON payload grammar and exact size estimation.
//!
//! The body is never built in memory, yet its length has to be announced in
//! `Content-Length` before the first body byte goes out. [`compute_size`] does
//! that arithmetic from the same fragment constants the request composer
//! writes, so the two cannot drift apart.
//!
//! ```text
//! {"data":{"<name>":[{"value":<value>,"epoch":<epoch>}],"<name>":[...]}}
//! ```

use super::error::Error;
use super::{RecordSource, TelemetryRecord};

/// Opens the body and the first key.
pub const JSON_OPEN: &str = "{\"data\":{\"";
/// Between a record name and its value.
pub const VALUE_TAG: &str = "\":[{\"value\":";
/// Between a value and its timestamp.
pub const EPOCH_TAG: &str = ",\"epoch\":";
/// Closes one record.
pub const RECORD_CLOSE: &str = "}]";
/// Between two records; opens the next key.
pub const RECORD_SEPARATOR: &str = ",\"";
/// Closes the body.
pub const JSON_CLOSE: &str = "}}";

/// Digits reserved for every epoch.
///
/// Ten digits covers 2001-09-09 through 2286-11-20. Epochs outside that range
/// are refused by [`validate`] rather than mis-sized.
pub const EPOCH_DIGITS: usize = 10;
pub const EPOCH_MIN: u64 = 1_000_000_000;
pub const EPOCH_MAX: u64 = 9_999_999_999;

/// Exact byte length of the JSON body for `records`.
///
/// Pure arithmetic, no formatting. An empty source yields the length of
/// `{"data":{"}}`, which is never sent.
pub fn compute_size<R: RecordSource + ?Sized>(records: &R) -> usize {
    let count = records.count();
    let mut size = JSON_OPEN.len();
    for record in (0..count).filter_map(|i| records.record(i)) {
        size += record.name.len();
        size += VALUE_TAG.len();
        size += record.value.len();
        size += EPOCH_TAG.len();
        size += EPOCH_DIGITS;
        size += RECORD_CLOSE.len();
    }
    size += RECORD_SEPARATOR.len() * count.saturating_sub(1);
    size + JSON_CLOSE.len()
}

/// Checks that `records` can be serialized with the size [`compute_size`]
/// announces.
pub fn validate<R: RecordSource + ?Sized>(records: &R) -> Result<(), Error> {
    if records.count() == 0 {
        return Err(Error::EmptyPayload);
    }
    for index in 0..records.count() {
        let record = records.record(index).ok_or(Error::InvalidRecord)?;
        validate_record(&record)?;
    }
    Ok(())
}

fn validate_record(record: &TelemetryRecord<'_>) -> Result<(), Error> {
    let name_ok = !record.name.is_empty()
        && record
            .name
            .bytes()
            .all(|b| b.is_ascii() && !b.is_ascii_control() && b != b'"' && b != b'\\');
    // Values are spliced in unquoted.
    if !name_ok || !is_json_number(record.value.as_bytes()) {
        return Err(Error::InvalidRecord);
    }
    if !(EPOCH_MIN..=EPOCH_MAX).contains(&record.epoch) {
        return Err(Error::EpochOutOfRange);
    }
    Ok(())
}

/// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
fn is_json_number(text: &[u8]) -> bool {
    fn digits(text: &[u8]) -> usize {
        text.iter().take_while(|b| b.is_ascii_digit()).count()
    }

    let mut rest = text.strip_prefix(b"-").unwrap_or(text);
    let int = digits(rest);
    if int == 0 || (int > 1 && rest[0] == b'0') {
        return false;
    }
    rest = &rest[int..];

    if let Some(fraction) = rest.strip_prefix(b".") {
        let len = digits(fraction);
        if len == 0 {
            return false;
        }
        rest = &fraction[len..];
    }

    if let Some(exponent) = rest
        .strip_prefix(b"e")
        .or_else(|| rest.strip_prefix(b"E"))
    {
        let exponent = exponent
            .strip_prefix(b"+")
            .or_else(|| exponent.strip_prefix(b"-"))
            .unwrap_or(exponent);
        let len = digits(exponent);
        if len == 0 {
            return false;
        }
        rest = &exponent[len..];
    }

    rest.is_empty()
}
