// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Time related utils.

use crate::Error;
use chrono::format::Fixed;
use chrono::format::Item;
use chrono::format::Numeric;
use chrono::format::Pad;
use chrono::SecondsFormat;
use chrono::Utc;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into ISO 8601 with separators and whole seconds: "2022-03-13T07:20:04Z"
///
/// This is the layout storage SAS parameters (`st`, `se`, `skt`, `ske`) expect.
pub fn format_iso8601(t: DateTime) -> String {
    const ISO8601: &[Item<'static>] = &[
        Item::Numeric(Numeric::Year, Pad::Zero),
        Item::Literal("-"),
        Item::Numeric(Numeric::Month, Pad::Zero),
        Item::Literal("-"),
        Item::Numeric(Numeric::Day, Pad::Zero),
        Item::Literal("T"),
        Item::Numeric(Numeric::Hour, Pad::Zero),
        Item::Literal(":"),
        Item::Numeric(Numeric::Minute, Pad::Zero),
        Item::Literal(":"),
        Item::Numeric(Numeric::Second, Pad::Zero),
        Item::Literal("Z"),
    ];

    t.format_with_items(ISO8601.iter()).to_string()
}

/// Format time into RFC 3339: "1985-04-12T23:20:50.52Z"
pub fn format_rfc3339(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Format time into http date: "Sun, 06 Nov 1994 08:49:37 GMT"
pub fn format_http_date(t: DateTime) -> String {
    const HTTP_DATE: &[Item<'static>] = &[
        Item::Fixed(Fixed::ShortWeekdayName),
        Item::Literal(", "),
        Item::Numeric(Numeric::Day, Pad::Zero),
        Item::Literal(" "),
        Item::Fixed(Fixed::ShortMonthName),
        Item::Literal(" "),
        Item::Numeric(Numeric::Year, Pad::Zero),
        Item::Literal(" "),
        Item::Numeric(Numeric::Hour, Pad::Zero),
        Item::Literal(":"),
        Item::Numeric(Numeric::Minute, Pad::Zero),
        Item::Literal(":"),
        Item::Numeric(Numeric::Second, Pad::Zero),
        Item::Literal(" GMT"),
    ];

    t.format_with_items(HTTP_DATE.iter()).to_string()
}

/// Parse time from RFC 3339: "1985-04-12T23:20:50.52Z"
pub fn parse_rfc3339(s: &str) -> crate::Result<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("failed to parse rfc3339 time {s}")).with_source(e))
}

/// Parse time from unix timestamp in seconds, as returned by managed identity endpoints.
pub fn parse_unix_timestamp(s: &str) -> crate::Result<DateTime> {
    let secs: i64 = s.trim().parse().map_err(|e: std::num::ParseIntError| {
        Error::unexpected(format!("failed to parse unix timestamp {s}")).with_source(e)
    })?;

    chrono::DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::unexpected(format!("unix timestamp {s} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap()
    }

    #[test]
    fn test_format_iso8601() {
        let t = test_time() + chrono::TimeDelta::try_milliseconds(512).unwrap();
        assert_eq!("2022-03-01T08:12:34Z", format_iso8601(t));
    }

    #[test]
    fn test_format_http_date() {
        assert_eq!("Tue, 01 Mar 2022 08:12:34 GMT", format_http_date(test_time()));
    }

    #[test]
    fn test_format_rfc3339() {
        assert_eq!("2022-03-01T08:12:34Z", format_rfc3339(test_time()));
    }

    #[test]
    fn test_parse_rfc3339() {
        let t = parse_rfc3339("2022-03-01T08:12:34Z").unwrap();
        assert_eq!(t, test_time());
        assert!(parse_rfc3339("yesterday").is_err());
    }

    #[test]
    fn test_parse_unix_timestamp() {
        assert_eq!(parse_unix_timestamp("1646122354").unwrap(), test_time());
        assert!(parse_unix_timestamp("soon").is_err());
    }
}
