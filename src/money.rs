//! Exact decimal money and percentage values.
//!
//! Money is never stored or summed as a binary float. Values are held as
//! [Decimal]s, stored in SQLite as TEXT (e.g. "1200.00") and sent to clients
//! as strings with two decimal places.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

use crate::Error;

/// The largest amount that can be stored, i.e. ten digits with two after the decimal point.
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Round `value` half away from zero to two decimal places and pad it to
/// exactly two decimal places.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Format a decimal with exactly two decimal places, e.g. "1200.00".
pub fn format_money(value: Decimal) -> String {
    round_money(value).to_string()
}

/// Serialize a [Decimal] as a string with two decimal places.
///
/// Use with `#[serde(serialize_with = "serialize_money")]`.
pub fn serialize_money<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_money(*value))
}

/// A positive amount of money with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount, rounding `value` half away from zero to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if the rounded value is not greater than
    /// zero or is larger than 99,999,999.99.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let value = round_money(value);

        if value <= Decimal::ZERO {
            return Err(Error::Validation("Amount must be positive".to_owned()));
        }

        if value > MAX_AMOUNT {
            return Err(Error::Validation(format!(
                "Amount must be at most {MAX_AMOUNT}"
            )));
        }

        Ok(Self(value))
    }

    /// The amount as a decimal number.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_money(self.0))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        decimal_from_sql(value).map(Self)
    }
}

/// A percentage between 0 and 100 (inclusive) with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(Decimal);

impl Percentage {
    /// Create a percentage, rounding `value` half away from zero to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] naming `field` if the unrounded value is outside 0 to 100.
    pub fn new(value: Decimal, field: &str) -> Result<Self, Error> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(Error::Validation(format!(
                "{field} must be between 0 and 100"
            )));
        }

        Ok(Self(round_money(value)))
    }

    /// Create a percentage without validation.
    ///
    /// The caller should ensure that `value` is within 0 to 100.
    pub fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// The percentage as a decimal number, e.g. 50.00 for fifty percent.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_money(self.0))
    }
}

impl Serialize for Percentage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl ToSql for Percentage {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Percentage {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        decimal_from_sql(value).map(Self)
    }
}

/// Read a decimal stored as TEXT.
pub fn decimal_from_sql(value: ValueRef<'_>) -> FromSqlResult<Decimal> {
    let text = value.as_str()?;

    Decimal::from_str(text).map_err(|error| FromSqlError::Other(Box::new(error)))
}



#[cfg(test)]
mod sql_tests {
    use std::str::FromStr;

    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::money::Amount;

    #[test]
    fn amount_is_stored_as_text() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute("CREATE TABLE money (amount TEXT NOT NULL)", ())
            .unwrap();
        let amount = Amount::new(Decimal::from_str("0.1").unwrap()).unwrap();

        connection
            .execute("INSERT INTO money (amount) VALUES (?1)", (amount,))
            .unwrap();

        let (raw, got): (String, Amount) = connection
            .query_row("SELECT amount, amount FROM money", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(raw, "0.10");
        assert_eq!(got, amount);
    }
}
