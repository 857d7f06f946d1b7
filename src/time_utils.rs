// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.
//!
//! Streak logic compares date-only values with no timezone normalization:
//! "today" is the client's local calendar date when the request carries one,
//! otherwise the server host's local date. A log made near midnight across a
//! timezone or DST boundary can land on either side of a day; inherited
//! behavior, kept as-is.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};

/// The server's local calendar date.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
