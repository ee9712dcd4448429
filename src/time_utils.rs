// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Duration, Local, NaiveDate, SecondsFormat, Utc};

/// Calendar date format used as the daily record key.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Local calendar date of a timestamp.
pub fn local_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Local).date_naive()
}

/// Daily record key ("YYYY-MM-DD") for the local calendar date of `now`.
pub fn date_key(now: DateTime<Utc>) -> String {
    local_date(now).format(DATE_KEY_FORMAT).to_string()
}

/// First instant of the local calendar day `date`, if that local midnight exists.
pub fn local_day_start(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)?
        .and_local_timezone(Local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// Parse a daily record key back into a date.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// The `days` most recent date keys ending at `today`, oldest first.
pub fn trailing_date_keys(today: NaiveDate, days: u32) -> Vec<String> {
    (0..days as i64)
        .rev()
        .map(|offset| {
            (today - Duration::days(offset))
                .format(DATE_KEY_FORMAT)
                .to_string()
        })
        .collect()
}
