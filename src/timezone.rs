//! Helpers for the server's configured local timezone.

use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the current UTC offset of the timezone named by `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the name is not a known canonical timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Parse a calendar date sent by a client.
///
/// Accepts either a plain date ("2025-01-31") or an RFC 3339 timestamp
/// ("2025-01-31T22:15:00Z"). Timestamps are converted to `local_offset` and
/// their local calendar date is returned.
///
/// # Errors
///
/// Returns [Error::Validation] naming `field` if `raw` is neither format.
pub fn parse_date_input(raw: &str, field: &str, local_offset: UtcOffset) -> Result<Date, Error> {
    let raw = raw.trim();

    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(date);
    }

    OffsetDateTime::parse(raw, &Rfc3339)
        .map(|timestamp| timestamp.to_offset(local_offset).date())
        .map_err(|_| {
            Error::Validation(format!(
                "{field} must be a date (YYYY-MM-DD) or RFC 3339 timestamp"
            ))
        })
}

/// Resolve the local offset for `canonical_timezone` or fail with [Error::InvalidTimezoneError].
pub fn local_offset_or_error(canonical_timezone: &str) -> Result<UtcOffset, Error> {
    get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}

#[cfg(test)]
mod tests {
    use time::{UtcOffset, macros::date};

    use crate::Error;

    use super::{get_local_offset, local_offset_or_error, parse_date_input};

    #[test]
    fn parses_plain_date() {
        let got = parse_date_input("2025-03-09", "date", UtcOffset::UTC);

        assert_eq!(got, Ok(date!(2025 - 03 - 09)));
    }

    #[test]
    fn timestamp_uses_local_calendar_date() {
        let offset = UtcOffset::from_hms(13, 0, 0).unwrap();

        let got = parse_date_input("2025-03-09T22:30:00Z", "date", offset);

        assert_eq!(got, Ok(date!(2025 - 03 - 10)));
    }

    #[test]
    fn rejects_garbage() {
        let got = parse_date_input("next tuesday", "startDate", UtcOffset::UTC);

        assert!(
            matches!(got, Err(Error::Validation(message)) if message.starts_with("startDate"))
        );
    }

    #[test]
    fn rejects_impossible_date() {
        let got = parse_date_input("2025-02-30", "date", UtcOffset::UTC);

        assert!(matches!(got, Err(Error::Validation(_))));
    }

    #[test]
    fn knows_utc() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            local_offset_or_error("Middle/Earth"),
            Err(Error::InvalidTimezoneError("Middle/Earth".to_owned()))
        );
    }
}
