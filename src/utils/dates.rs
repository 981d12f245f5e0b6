//! Date layouts, year inference and time zones

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc,
};
use std::borrow::Cow;

use crate::types::*;

/// Placeholder year given to dates parsed from a year-less layout
pub const PLACEHOLDER_YEAR: i32 = 0;

const YEAR_SPECIFIERS: [&str; 6] = ["%Y", "%y", "%G", "%g", "%F", "%D"];

/// Zone in which naive document timestamps are interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Zone {
    Fixed(FixedOffset),
    #[default]
    Local,
}

impl Zone {
    /// Parse `local`, `UTC`, `Z` or an offset such as `+08:00` / `-0530`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "local" => return Some(Zone::Local),
            "utc" | "z" => return FixedOffset::east_opt(0).map(Zone::Fixed),
            _ => {}
        }

        let (sign, rest) = match value.as_bytes().first()? {
            b'+' => (1, &value[1..]),
            b'-' => (-1, &value[1..]),
            _ => return None,
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let hours: i32 = digits[..2].parse().ok()?;
        let minutes: i32 = digits[2..].parse().ok()?;
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(Zone::Fixed)
    }

    /// Attach this zone to a naive timestamp
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<FixedOffset> {
        match self {
            Zone::Fixed(offset) => match offset.from_local_datetime(&naive).single() {
                Some(localized) => localized,
                None => Utc.from_utc_datetime(&naive).with_timezone(offset),
            },
            Zone::Local => match Local.from_local_datetime(&naive).earliest() {
                Some(localized) => localized.with_timezone(&localized.offset().fix()),
                // skipped by a daylight-saving gap
                None => Utc.from_utc_datetime(&naive).with_timezone(&Utc.fix()),
            },
        }
    }

    /// Attach this zone to a calendar date at midnight
    pub fn localize_date(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        self.localize(date.and_time(NaiveTime::default()))
    }
}

/// Whether a layout names the year
pub fn has_year(layout: &str) -> bool {
    YEAR_SPECIFIERS.iter().any(|spec| layout.contains(spec))
}

/// Layout to use for a captured date value.
///
/// A value with only two `/`-separated parts is parsed with the first two
/// `/`-separated parts of the layout, so `01/11` reads under `%d/%m/%y` as
/// `%d/%m`.
pub fn layout_for_value<'a>(layout: &'a str, value: &str) -> Cow<'a, str> {
    if value.trim().split('/').count() == 2 {
        let parts: Vec<&str> = layout.split('/').collect();
        if parts.len() > 2 {
            return Cow::Owned(parts[..2].join("/"));
        }
    }
    Cow::Borrowed(layout)
}

/// Parse a calendar date; year-less layouts yield [`PLACEHOLDER_YEAR`]
pub fn parse_date(value: &str, layout: &str) -> ExtractionResult<NaiveDate> {
    let value = value.trim();
    let parsed = if has_year(layout) {
        NaiveDate::parse_from_str(value, layout)
    } else {
        NaiveDate::parse_from_str(&format!("{value} {PLACEHOLDER_YEAR:04}"), &format!("{layout} %Y"))
    };

    parsed.map_err(|_| ExtractionError::InvalidDate {
        value: value.to_string(),
        layout: layout.to_string(),
    })
}

/// Parse a date with a layout truncated to the shape of the value
pub fn parse_partial_date(value: &str, layout: &str) -> ExtractionResult<NaiveDate> {
    parse_date(value, &layout_for_value(layout, value))
}

/// Parse a date and time
pub fn parse_datetime(value: &str, layout: &str) -> ExtractionResult<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, layout).map_err(|_| ExtractionError::InvalidDate {
        value: value.to_string(),
        layout: layout.to_string(),
    })
}

/// Resolve the year of a transaction date against the statement date.
///
/// When the years differ the statement year is used, or the year before it
/// when the transaction month falls after the statement month (a December
/// transaction on a January statement).
pub fn normalize_year(date: NaiveDate, reference: NaiveDate) -> NaiveDate {
    if date.year() == reference.year() {
        return date;
    }

    let year = if date.month() > reference.month() {
        reference.year() - 1
    } else {
        reference.year()
    };

    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        // 29 February outside a leap year
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}
