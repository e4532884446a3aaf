//! Pure row scanner: table cell texts in, ordered currency → rate pairs out.
//!
//! Matching rules, applied row by row in document order:
//!
//! 1. rows with fewer than two cells are ignored;
//! 2. target fragments are tried in the order given; the first fragment
//!    contained (case-insensitively) in any cell fixes the row's currency,
//!    recorded as that cell's full text;
//! 3. the first cell in the row that passes [`is_valid_rate`] is the rate;
//!    a matched row without one is dropped, and its fragment is not tried
//!    again in later rows;
//! 4. a currency text already recorded keeps its first rate.
use ratewatch_common::rate::is_valid_rate;
use ratewatch_common::ExtractedRates;

const MIN_CELLS: usize = 2;

/// Scan `rows` for `targets` and collect the first rate seen per currency.
///
/// ```
/// use ratewatch_extract::scan::scan_rows;
///
/// let rows = vec![
///     vec!["Currency", "Rate"],
///     vec!["Euro", "4.0021"],
/// ];
/// let rates = scan_rows(&rows, &["Euro"]);
/// assert_eq!(rates.get("Euro"), Some("4.0021"));
/// assert_eq!(rates.len(), 1);
/// ```
pub fn scan_rows<C, T>(rows: &[Vec<C>], targets: &[T]) -> ExtractedRates
where
    C: AsRef<str>,
    T: AsRef<str>,
{
    let targets: Vec<String> = targets
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mut found = ExtractedRates::new();
    let mut dropped = vec![false; targets.len()];
    for (index, cells) in rows.iter().enumerate() {
        if cells.len() < MIN_CELLS {
            continue;
        }
        let Some((fragment, currency)) = match_currency(cells, &targets, &dropped) else {
            continue;
        };
        let Some(rate) = match_rate(cells) else {
            tracing::debug!(target: "extract.row", row = index, %currency, "matched currency without a valid rate; not retried");
            dropped[fragment] = true;
            continue;
        };
        if !found.insert_first(currency, rate) {
            tracing::debug!(target: "extract.row", row = index, %currency, %rate, "currency already recorded; keeping first rate");
        }
    }
    found
}

/// Index of the earliest live target fragment found in the row, with the
/// text of the first cell containing it.
fn match_currency<'a, C: AsRef<str>>(
    cells: &'a [C],
    targets: &[String],
    dropped: &[bool],
) -> Option<(usize, &'a str)> {
    let lowered: Vec<String> = cells.iter().map(|c| c.as_ref().to_lowercase()).collect();
    targets
        .iter()
        .enumerate()
        .filter(|(t, _)| !dropped[*t])
        .find_map(|(t, target)| {
            lowered
                .iter()
                .position(|cell| cell.contains(target.as_str()))
                .map(|i| (t, cells[i].as_ref()))
        })
}

fn match_rate<C: AsRef<str>>(cells: &[C]) -> Option<&str> {
    cells.iter().map(AsRef::as_ref).find(|text| is_valid_rate(text))
}
