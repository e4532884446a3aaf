/// Smallest value accepted as an exchange rate.
pub const MIN_RATE: f64 = 0.0000001;
/// Largest value accepted as an exchange rate.
pub const MAX_RATE: f64 = 100.0;

/// Parse a rate token after removing spaces and thousands separators.
///
/// ```
/// use ratewatch_common::rate::parse_rate;
///
/// assert_eq!(parse_rate("3.6725"), Some(3.6725));
/// assert_eq!(parse_rate("1,000.5"), Some(1000.5));
/// assert_eq!(parse_rate("n/a"), None);
/// ```
pub fn parse_rate(text: &str) -> Option<f64> {
    let clean: String = text.chars().filter(|c| *c != ' ' && *c != ',').collect();
    clean.trim().parse::<f64>().ok()
}

/// `true` when `text` parses as a number within [`MIN_RATE`, `MAX_RATE`].
pub fn is_valid_rate(text: &str) -> bool {
    parse_rate(text).is_some_and(|rate| (MIN_RATE..=MAX_RATE).contains(&rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_values_inside_the_range() {
        for ok in ["3.6725", "0.0000001", "100", "100.0", " 4.0021 ", "0.024,5", "1 2.5"] {
            assert!(is_valid_rate(ok), "{ok:?} should be accepted");
        }
    }

    #[test]
    fn rejects_values_outside_the_range() {
        for bad in ["0", "0.00000009", "100.0001", "1,000", "-3.5", "inf", "-inf"] {
            assert!(!is_valid_rate(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn rejects_non_numeric_text() {
        for bad in ["", "US Dollar", "NaN", "3.67 AED", "--", "1.2.3"] {
            assert!(!is_valid_rate(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parse_strips_separators() {
        assert_eq!(parse_rate("1,234.5"), Some(1234.5));
        assert_eq!(parse_rate(" 0.05 "), Some(0.05));
        assert_eq!(parse_rate("abc"), None);
    }
}
