use crate::error::{HwFactsError, HwFactsResult};
use crate::freq::buckets::CoreRange;

/// The ISA whose column carries the headline turbo numbers.
pub const SSE: &str = "SSE";

// The first column is always the package-level core range.
const RANGE_COLUMN: usize = 0;

/// Expands one ISA column of a bucket table into one frequency per active-core count.
///
/// `table` is the header row followed by bucket rows, as produced by
/// [`FrequencyBucketTable::to_rows`](crate::freq::FrequencyBucketTable::to_rows). The
/// first element is the single-core ceiling, the last the all-core ceiling.
///
/// # Errors
/// `UnknownIsa` if no header column matches `isa` (ignoring case); `MalformedTable` if
/// the table has fewer than two rows or columns, or a range or frequency cell does not
/// parse.
pub fn expand_turbo_frequencies<R, S>(table: &[R], isa: &str) -> HwFactsResult<Vec<String>>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let buckets = parse_column(table, isa)?;
    let mut freqs = Vec::new();
    for (range, freq) in buckets {
        for _ in 0..range.core_count() {
            freqs.push(freq.to_string());
        }
    }
    Ok(freqs)
}

/// Max single-core frequency, e.g. `"3.5GHz"`.
#[must_use]
pub fn max_frequency<R, S>(table: &[R]) -> Option<String>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let buckets = parse_column(table, SSE).ok()?;
    buckets.first().map(|(_, freq)| format!("{freq}GHz"))
}

/// Max all-core frequency, e.g. `"2.8GHz"`.
#[must_use]
pub fn all_core_max_frequency<R, S>(table: &[R]) -> Option<String>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let buckets = parse_column(table, SSE).ok()?;
    buckets.last().map(|(_, freq)| format!("{freq}GHz"))
}

/// Collapses adjacent buckets with equal frequency into `"start-end/freq"` entries.
///
/// e.g. `"1-40/3.5, 41-60/3.4, 61-86/3.2"`. A single-core range renders as `"n/freq"`.
///
/// # Errors
/// Same as [`expand_turbo_frequencies`].
pub fn consolidate_frequencies<R, S>(table: &[R], isa: &str) -> HwFactsResult<String>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let buckets = parse_column(table, isa)?;

    let mut merged: Vec<(u32, u32, &str)> = Vec::new();
    for (range, freq) in buckets {
        match merged.last_mut() {
            Some((_, end, last)) if *last == freq => *end = range.end,
            _ => merged.push((range.start, range.end, freq)),
        }
    }

    let entries: Vec<String> = merged
        .into_iter()
        .map(|(start, end, freq)| {
            if start == end {
                format!("{start}/{freq}")
            } else {
                format!("{start}-{end}/{freq}")
            }
        })
        .collect();
    Ok(entries.join(", "))
}

/// Validates the table and returns `(range, frequency)` for the requested column.
fn parse_column<'a, R, S>(table: &'a [R], isa: &str) -> HwFactsResult<Vec<(CoreRange, &'a str)>>
where
    R: AsRef<[S]>,
    S: AsRef<str> + 'a,
{
    let Some((header, rows)) = table.split_first() else {
        return Err(HwFactsError::MalformedTable(
            "unable to parse core frequency buckets".to_string(),
        ));
    };
    let header = header.as_ref();
    if rows.is_empty() || header.len() < 2 {
        return Err(HwFactsError::MalformedTable(
            "unable to parse core frequency buckets".to_string(),
        ));
    }

    let isa_idx = header
        .iter()
        .skip(1)
        .position(|col| col.as_ref().trim().eq_ignore_ascii_case(isa))
        .map(|pos| pos + 1)
        .ok_or_else(|| HwFactsError::UnknownIsa(isa.to_string()))?;

    let mut column = Vec::with_capacity(rows.len());
    for row in rows {
        let row = row.as_ref();

        let range_cell = row.get(RANGE_COLUMN).map_or("", |c| c.as_ref());
        let range = CoreRange::parse(range_cell).ok_or_else(|| {
            HwFactsError::MalformedTable(format!("unable to parse bucket range {range_cell:?}"))
        })?;

        let freq_cell = row.get(isa_idx).map_or("", |c| c.as_ref()).trim();
        if freq_cell.parse::<f64>().is_err() {
            return Err(HwFactsError::MalformedTable(format!(
                "unable to parse bucket frequency {freq_cell:?}"
            )));
        }

        column.push((range, freq_cell));
    }
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| (*c).to_string()).collect())
            .collect()
    }

    #[test]
    fn test_expand_multiple_buckets() {
        let buckets = table(&[
            &["Cores", "SSE", "AVX2"],
            &["1-2", "3.5", "3.2"],
            &["3-4", "3.6", "3.3"],
        ]);
        assert_eq!(
            expand_turbo_frequencies(&buckets, "SSE").unwrap(),
            vec!["3.5", "3.5", "3.6", "3.6"]
        );
        assert_eq!(
            expand_turbo_frequencies(&buckets, "avx2").unwrap(),
            vec!["3.2", "3.2", "3.3", "3.3"]
        );
    }

    #[test]
    fn test_expand_tolerates_whitespace() {
        let buckets = table(&[&["Cores", "SSE", "AVX2"], &[" 1-4 ", "3.5", "3.2"]]);
        assert_eq!(
            expand_turbo_frequencies(&buckets, "SSE").unwrap(),
            vec!["3.5"; 4]
        );
    }

    #[test]
    fn test_expand_failures() {
        let buckets = table(&[&["Cores", "SSE", "AVX2"], &["1-4", "3.5", "3.2"]]);
        assert_eq!(
            expand_turbo_frequencies(&buckets, "AVX512"),
            Err(HwFactsError::UnknownIsa("AVX512".to_string()))
        );

        let empty: Vec<Vec<String>> = vec![vec![]];
        assert!(matches!(
            expand_turbo_frequencies(&empty, "SSE"),
            Err(HwFactsError::MalformedTable(_))
        ));

        let bad_range = table(&[&["Cores", "SSE", "AVX2"], &["1-", "3.5", "3.2"]]);
        assert!(matches!(
            expand_turbo_frequencies(&bad_range, "SSE"),
            Err(HwFactsError::MalformedTable(_))
        ));

        let bad_freq = table(&[&["Cores", "SSE", "AVX2"], &["1-4", "", "3.2"]]);
        assert!(matches!(
            expand_turbo_frequencies(&bad_freq, "SSE"),
            Err(HwFactsError::MalformedTable(_))
        ));
    }

    #[test]
    fn test_headline_frequencies() {
        let buckets = table(&[
            &["Cores", "Cores per Die", "SSE"],
            &["1-40", "1-20", "3.5"],
            &["41-80", "21-40", "3.4"],
            &["81-86", "41-43", "3.2"],
        ]);
        assert_eq!(max_frequency(&buckets), Some("3.5GHz".to_string()));
        assert_eq!(all_core_max_frequency(&buckets), Some("3.2GHz".to_string()));

        let no_sse = table(&[&["Cores", "AMX"], &["1-4", "2.0"]]);
        assert_eq!(max_frequency(&no_sse), None);
    }

    #[test]
    fn test_consolidate_frequencies() {
        let buckets = table(&[
            &["Cores", "SSE"],
            &["1-20", "3.5"],
            &["21-40", "3.5"],
            &["41-60", "3.4"],
            &["61-61", "3.2"],
        ]);
        assert_eq!(
            consolidate_frequencies(&buckets, "sse").unwrap(),
            "1-40/3.5, 41-60/3.4, 61/3.2"
        );
    }
}
