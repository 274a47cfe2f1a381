//! Precision-aware FHIR dateTime
//!
//! Per FHIR, a dateTime is an interval whose width is given by its precision:
//! - "2013" → [2013-01-01, 2014-01-01)
//! - "2013-04" → [2013-04-01, 2013-05-01)
//! - "2013-04-04" → [2013-04-04, 2013-04-05)
//! - "2013-04-04T10:30:45Z" → [10:30:45, 10:30:46)
//!
//! The end is the first instant of the next granule (exclusive upper bound).

use super::error::{Error, Result};
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much of a dateTime was actually recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Precision {
    Year,
    Month,
    Day,
    Timestamp,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Year => "year",
            Precision::Month => "month",
            Precision::Day => "day",
            Precision::Timestamp => "timestamp",
        }
    }
}

/// A FHIR dateTime: an instant plus the precision it was recorded with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FhirDateTime {
    pub time: DateTime<Utc>,
    pub precision: Precision,
}

impl FhirDateTime {
    pub fn new(time: DateTime<Utc>, precision: Precision) -> Self {
        Self { time, precision }
    }

    /// Parse a FHIR date or dateTime string, inferring precision from the fields present
    ///
    /// Supported formats:
    /// - YYYY
    /// - YYYY-MM
    /// - YYYY-MM-DD
    /// - YYYY-MM-DDThh:mm:ss(.s+)?(Z|±hh:mm)?
    ///
    /// A timestamp without an offset is read as UTC.
    pub fn parse(text: &str) -> Result<Self> {
        let s = text.trim();
        let malformed = || Error::MalformedDateTime(text.to_string());

        if let Some((date_part, time_part)) = s.split_once('T') {
            let date = parse_calendar_date(date_part).ok_or_else(malformed)?;
            let (time_part, offset) = split_time_and_offset(time_part).ok_or_else(malformed)?;
            let time = NaiveTime::parse_from_str(time_part, "%H:%M:%S%.f")
                .map_err(|_| malformed())?;
            let local = NaiveDateTime::new(date, time);
            let instant = offset
                .from_local_datetime(&local)
                .single()
                .ok_or_else(malformed)?
                .with_timezone(&Utc);
            return Ok(Self::new(instant, Precision::Timestamp));
        }

        let bytes = s.as_bytes();
        let all_digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);

        match s.len() {
            4 if all_digits(0..4) => {
                let year: i32 = s.parse().map_err(|_| malformed())?;
                let time = utc_midnight(year, 1, 1).ok_or_else(malformed)?;
                Ok(Self::new(time, Precision::Year))
            }
            7 if bytes[4] == b'-' && all_digits(0..4) && all_digits(5..7) => {
                let year: i32 = s[0..4].parse().map_err(|_| malformed())?;
                let month: u32 = s[5..7].parse().map_err(|_| malformed())?;
                let time = utc_midnight(year, month, 1).ok_or_else(malformed)?;
                Ok(Self::new(time, Precision::Month))
            }
            10 => {
                let date = parse_calendar_date(s).ok_or_else(malformed)?;
                let time = utc_midnight(date.year(), date.month(), date.day()).ok_or_else(malformed)?;
                Ok(Self::new(time, Precision::Day))
            }
            _ => Err(malformed()),
        }
    }

    /// Start of the granule containing `time`
    pub fn from(&self) -> Result<DateTime<Utc>> {
        let t = self.time;
        let start = match self.precision {
            Precision::Year => utc_midnight(t.year(), 1, 1),
            Precision::Month => utc_midnight(t.year(), t.month(), 1),
            Precision::Day => utc_midnight(t.year(), t.month(), t.day()),
            Precision::Timestamp => t.with_nanosecond(0),
        };
        start.ok_or_else(|| Error::DateTimeOutOfRange(t.to_rfc3339()))
    }

    /// First instant after the granule containing `time`
    pub fn to(&self) -> Result<DateTime<Utc>> {
        let start = self.from()?;
        let end = match self.precision {
            Precision::Year => utc_midnight(start.year() + 1, 1, 1),
            Precision::Month => {
                let (year, month) = if start.month() == 12 {
                    (start.year() + 1, 1)
                } else {
                    (start.year(), start.month() + 1)
                };
                utc_midnight(year, month, 1)
            }
            Precision::Day => start.checked_add_signed(Duration::days(1)),
            Precision::Timestamp => start.checked_add_signed(Duration::seconds(1)),
        };
        end.ok_or_else(|| Error::DateTimeOutOfRange(start.to_rfc3339()))
    }

    /// `[from, to)` bounds of the granule
    pub fn range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        Ok((self.from()?, self.to()?))
    }

    /// Canonical rendering truncated to the precision, always in UTC
    pub fn to_fhir_string(&self) -> String {
        let format = match self.precision {
            Precision::Year => "%Y",
            Precision::Month => "%Y-%m",
            Precision::Day => "%Y-%m-%d",
            Precision::Timestamp => "%Y-%m-%dT%H:%M:%SZ",
        };
        self.time.format(format).to_string()
    }
}

fn utc_midnight(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()
}

/// `YYYY-MM-DD` with exactly four year digits
fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let b = value.as_bytes();
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && [0..4, 5..7, 8..10]
            .into_iter()
            .all(|r| b[r].iter().all(u8::is_ascii_digit));
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn split_time_and_offset(value: &str) -> Option<(&str, FixedOffset)> {
    if let Some(time) = value.strip_suffix('Z') {
        return Some((time, FixedOffset::east_opt(0)?));
    }

    if let Some(pos) = value.rfind(['+', '-']) {
        let (time, offset) = value.split_at(pos);
        let sign = if offset.starts_with('+') { 1 } else { -1 };
        let (hours, minutes) = offset[1..].split_once(':')?;
        if hours.len() != 2 || minutes.len() != 2 {
            return None;
        }
        let hours: i32 = hours.parse().ok()?;
        let minutes: i32 = minutes.parse().ok()?;
        return Some((time, FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?));
    }

    Some((value, FixedOffset::east_opt(0)?))
}

impl FromStr for FhirDateTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FhirDateTime {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FhirDateTime> for String {
    fn from(value: FhirDateTime) -> Self {
        value.to_fhir_string()
    }
}

impl fmt::Display for FhirDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fhir_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn timestamp_range_is_one_second() {
        let dt = FhirDateTime::new(utc(2012, 3, 1, 12, 0, 0), Precision::Timestamp);
        let (from, to) = dt.range().unwrap();
        assert_eq!(from, utc(2012, 3, 1, 12, 0, 0));
        assert_eq!(to, utc(2012, 3, 1, 12, 0, 1));
        assert_eq!(dt.to_fhir_string(), "2012-03-01T12:00:00Z");
    }

    #[test]
    fn coarse_precisions_use_calendar_granules() {
        let t = utc(2012, 12, 31, 15, 45, 10);

        let year = FhirDateTime::new(t, Precision::Year);
        assert_eq!(year.range().unwrap(), (utc(2012, 1, 1, 0, 0, 0), utc(2013, 1, 1, 0, 0, 0)));
        assert_eq!(year.to_fhir_string(), "2012");

        let month = FhirDateTime::new(t, Precision::Month);
        assert_eq!(month.range().unwrap(), (utc(2012, 12, 1, 0, 0, 0), utc(2013, 1, 1, 0, 0, 0)));
        assert_eq!(month.to_fhir_string(), "2012-12");

        let day = FhirDateTime::new(t, Precision::Day);
        assert_eq!(day.range().unwrap(), (utc(2012, 12, 31, 0, 0, 0), utc(2013, 1, 1, 0, 0, 0)));
        assert_eq!(day.to_fhir_string(), "2012-12-31");
    }

    #[test]
    fn february_month_granule_respects_leap_years() {
        let dt = FhirDateTime::parse("2024-02").unwrap();
        let (from, to) = dt.range().unwrap();
        assert_eq!((to - from).num_days(), 29);
    }

    #[test]
    fn parse_infers_precision_from_fields_present() {
        assert_eq!(FhirDateTime::parse("2013").unwrap().precision, Precision::Year);
        assert_eq!(FhirDateTime::parse("2013-04").unwrap().precision, Precision::Month);
        assert_eq!(FhirDateTime::parse("2013-04-04").unwrap().precision, Precision::Day);
        let ts = FhirDateTime::parse("2013-04-04T10:30:45Z").unwrap();
        assert_eq!(ts.precision, Precision::Timestamp);
        assert_eq!(ts.time, utc(2013, 4, 4, 10, 30, 45));
    }

    #[test]
    fn parse_normalizes_offsets_to_utc() {
        let ts = FhirDateTime::parse("2013-04-04T10:30:45+02:00").unwrap();
        assert_eq!(ts.time, utc(2013, 4, 4, 8, 30, 45));
        assert_eq!(ts.to_fhir_string(), "2013-04-04T08:30:45Z");

        let ts = FhirDateTime::parse("2013-04-04T22:30:45-05:00").unwrap();
        assert_eq!(ts.time, utc(2013, 4, 5, 3, 30, 45));
    }

    #[test]
    fn fractional_seconds_truncate_to_the_second() {
        let ts = FhirDateTime::parse("2013-04-04T10:30:45.250Z").unwrap();
        assert_eq!(ts.from().unwrap(), utc(2013, 4, 4, 10, 30, 45));
        assert_eq!(ts.to().unwrap(), utc(2013, 4, 4, 10, 30, 46));
    }

    #[test]
    fn rejects_malformed_values() {
        for text in ["", "20", "2013-13", "2013-02-30", "2013-04-04T25:00:00Z", "yesterday", "2013-4-4"] {
            assert!(
                matches!(FhirDateTime::parse(text), Err(Error::MalformedDateTime(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn rendering_round_trips_through_parse() {
        for text in ["2001", "2001-07", "2001-07-04", "2001-07-04T05:06:07Z"] {
            let dt = FhirDateTime::parse(text).unwrap();
            assert_eq!(dt.to_fhir_string(), text);
            assert_eq!(FhirDateTime::parse(&dt.to_fhir_string()).unwrap(), dt);
        }
    }

    #[test]
    fn day_requires_four_digit_year_and_two_digit_fields() {
        for text in ["+201-04-04", "-201-04-04", "2012-4-04x", "2012/04/04", "+201-04-04T10:00:00Z"] {
            assert!(
                matches!(FhirDateTime::parse(text), Err(Error::MalformedDateTime(_))),
                "{text}"
            );
        }
        assert_eq!(FhirDateTime::parse("0201-04-04").unwrap().precision, Precision::Day);
    }
}
