use std::fmt;

use chrono::{Datelike, NaiveDate};

/// Width of the numeric suffix. Suffixes past 999 widen to four digits.
const SUFFIX_WIDTH: usize = 3;

/// Compute the number for the next bill: "F" + YYYYMM of `today` + a
/// zero-padded suffix one past the previous bill's suffix.
///
/// The suffix is global and monotonic: it is parsed from the most recent
/// bill regardless of which month that bill was numbered in, so it does
/// not restart at 001 when the calendar month changes even though the
/// month is embedded in the number.
pub fn next_bill_number(last: Option<&str>, today: NaiveDate) -> Result<String, NumberError> {
    let suffix = match last {
        Some(number) => parse_suffix(number)? + 1,
        None => 1,
    };

    Ok(format!(
        "F{:04}{:02}{:0width$}",
        today.year(),
        today.month(),
        suffix,
        width = SUFFIX_WIDTH
    ))
}

/// Parse the trailing 3 characters of a bill number as its numeric suffix.
pub fn parse_suffix(number: &str) -> Result<u32, NumberError> {
    let unparsable = || NumberError::UnparsableSuffix {
        number: number.to_string(),
    };

    let tail_start = number
        .char_indices()
        .rev()
        .nth(SUFFIX_WIDTH - 1)
        .map(|(i, _)| i)
        .ok_or_else(unparsable)?;

    number[tail_start..].parse().map_err(|_| unparsable())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberError {
    /// The previous bill's number does not end in a numeric suffix
    UnparsableSuffix { number: String },
}

impl fmt::Display for NumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberError::UnparsableSuffix { number } => {
                write!(f, "bill number '{}' has no numeric suffix", number)
            }
        }
    }
}

impl std::error::Error for NumberError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_number_starts_at_one() {
        let number = next_bill_number(None, date(2024, 5, 1)).unwrap();
        assert_eq!(number, "F202405001");
    }

    #[test]
    fn test_number_increments_from_previous() {
        let number = next_bill_number(Some("F202405007"), date(2024, 5, 20)).unwrap();
        assert_eq!(number, "F202405008");
    }

    #[test]
    fn test_suffix_does_not_reset_on_month_change() {
        // The suffix continues across months; only the embedded date moves.
        let number = next_bill_number(Some("F202405007"), date(2024, 6, 2)).unwrap();
        assert_eq!(number, "F202406008");
    }

    #[test]
    fn test_suffix_continues_across_year_change() {
        let number = next_bill_number(Some("F202412041"), date(2025, 1, 3)).unwrap();
        assert_eq!(number, "F202501042");
    }

    #[test]
    fn test_suffix_widens_past_999() {
        let number = next_bill_number(Some("F202405999"), date(2024, 5, 30)).unwrap();
        assert_eq!(number, "F2024051000");
    }

    #[test]
    fn test_unparsable_suffix_is_an_error() {
        let result = next_bill_number(Some("F2024ABC"), date(2024, 5, 1));
        assert!(matches!(
            result,
            Err(NumberError::UnparsableSuffix { .. })
        ));
    }

    #[test]
    fn test_short_number_is_an_error() {
        assert!(next_bill_number(Some("F1"), date(2024, 5, 1)).is_err());
    }

    #[test]
    fn test_parse_suffix() {
        assert_eq!(parse_suffix("F202405017").unwrap(), 17);
        assert_eq!(parse_suffix("F202405001").unwrap(), 1);
        assert!(parse_suffix("Fxx").is_err());
    }
}
