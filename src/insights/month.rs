//! Parsing of the `month` query parameter into a calendar month.

use time::{Date, Month, util::days_in_year_month};

use crate::Error;

/// The first and last day of a calendar month, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub first_day: Date,
    pub last_day: Date,
}

impl MonthWindow {
    /// Parse a month in the form "YYYY-MM".
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if `raw` is missing, not in the form "YYYY-MM" or names a
    /// month outside 01 to 12.
    pub fn parse(raw: Option<&str>) -> Result<Self, Error> {
        let raw = raw.ok_or_else(month_error)?;
        let (year, month) = raw.split_once('-').ok_or_else(month_error)?;

        if year.len() != 4
            || month.len() != 2
            || !year.bytes().chain(month.bytes()).all(|byte| byte.is_ascii_digit())
        {
            return Err(month_error());
        }

        let year: i32 = year.parse().map_err(|_| month_error())?;
        let month: u8 = month.parse().map_err(|_| month_error())?;
        let month = Month::try_from(month).map_err(|_| month_error())?;

        let first_day = Date::from_calendar_date(year, month, 1).map_err(|_| month_error())?;
        let last_day = Date::from_calendar_date(year, month, days_in_year_month(year, month))
            .map_err(|_| month_error())?;

        Ok(Self {
            first_day,
            last_day,
        })
    }
}

fn month_error() -> Error {
    Error::Validation("month parameter is required (YYYY-MM format)".to_owned())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::MonthWindow;

    #[test]
    fn parses_month() {
        let window = MonthWindow::parse(Some("2025-01")).unwrap();

        assert_eq!(window.first_day, date!(2025 - 01 - 01));
        assert_eq!(window.last_day, date!(2025 - 01 - 31));
    }

    #[test]
    fn handles_leap_february() {
        let window = MonthWindow::parse(Some("2024-02")).unwrap();

        assert_eq!(window.last_day, date!(2024 - 02 - 29));
    }

    #[test]
    fn handles_december() {
        let window = MonthWindow::parse(Some("2024-12")).unwrap();

        assert_eq!(window.first_day, date!(2024 - 12 - 01));
        assert_eq!(window.last_day, date!(2024 - 12 - 31));
    }

    #[test]
    fn handles_last_representable_month() {
        let window = MonthWindow::parse(Some("9999-12")).unwrap();

        assert_eq!(window.first_day, date!(9999 - 12 - 01));
        assert_eq!(window.last_day, date!(9999 - 12 - 31));
    }

    #[test]
    fn rejects_bad_months() {
        for raw in ["2025-00", "2025-13", "2025-1", "25-01", "2025/01", "2025-01-01", "abcd-ef"] {
            assert!(
                matches!(MonthWindow::parse(Some(raw)), Err(Error::Validation(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_missing_month() {
        assert!(matches!(
            MonthWindow::parse(None),
            Err(Error::Validation(_))
        ));
    }
}
