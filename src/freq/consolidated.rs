#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::error::{HwFactsError, HwFactsResult};
use crate::freq::arch::arch_multiplier;
use crate::freq::buckets::BUCKET_COUNT;
use crate::utils::{RATIO_FIELDS, decode_hex_vector, ratio_field, ratio_field_value};

struct ConsolidatedRange {
    start_core: u32,
    end_core: u32,
    freq: f64,
}

fn parse_consolidated(text: &str) -> HwFactsResult<Vec<ConsolidatedRange>> {
    let mut ranges = Vec::new();
    for entry in text.split(',').map(str::trim) {
        let malformed = |what: &str| HwFactsError::MalformedConsolidated(format!("{what} in entry {entry:?}"));

        let Some((range, freq)) = entry.split_once('/') else {
            return Err(malformed("invalid format"));
        };
        let freq: f64 = freq.trim().parse().map_err(|_| malformed("invalid frequency"))?;
        let (start_core, end_core) = match range.split_once('-') {
            Some((start, end)) => (
                start.trim().parse().map_err(|_| malformed("invalid start core"))?,
                end.trim().parse().map_err(|_| malformed("invalid end core"))?,
            ),
            // A single-core range is written as a bare core number.
            None => {
                let core = range.trim().parse().map_err(|_| malformed("invalid range format"))?;
                (core, core)
            }
        };

        ranges.push(ConsolidatedRange {
            start_core,
            end_core,
            freq,
        });
    }
    Ok(ranges)
}

/// Maps a consolidated `"start-end/freq, ..."` string back onto the eight firmware buckets.
///
/// `bucket_sizes` are the cumulative package-level core counts of each bucket. A bucket
/// takes the frequency of whichever consolidated range contains its midpoint, or 0.0
/// when none does.
///
/// # Errors
/// `WrongElementCount` unless there are exactly eight bucket sizes;
/// `MalformedConsolidated` for an entry that does not parse.
pub fn expand_consolidated_frequencies(
    consolidated: &str,
    bucket_sizes: &[u32],
) -> HwFactsResult<Vec<f64>> {
    if bucket_sizes.len() != BUCKET_COUNT {
        return Err(HwFactsError::WrongElementCount {
            what: "bucket sizes",
            expected: BUCKET_COUNT,
            found: bucket_sizes.len(),
        });
    }

    let ranges = parse_consolidated(consolidated)?;

    let mut freqs = vec![0.0; BUCKET_COUNT];
    let mut bucket_start = 1;
    for (freq, &bucket_end) in freqs.iter_mut().zip(bucket_sizes) {
        let midpoint = (bucket_start + bucket_end) / 2;
        if let Some(r) = ranges
            .iter()
            .find(|r| midpoint >= r.start_core && midpoint <= r.end_core)
        {
            *freq = r.freq;
        }
        bucket_start = bucket_end + 1;
    }
    Ok(freqs)
}

/// Decodes per-die bucket sizes and scales them to package-level core counts.
///
/// # Errors
/// `MalformedHex` or `WrongElementCount` for bucket data that is not eight hex values.
pub fn package_bucket_sizes(bucket_sizes_hex: &str, uarch: &str) -> HwFactsResult<Vec<u32>> {
    let sizes = decode_hex_vector(bucket_sizes_hex)?;
    if sizes.len() != BUCKET_COUNT {
        return Err(HwFactsError::WrongElementCount {
            what: "bucket sizes",
            expected: BUCKET_COUNT,
            found: sizes.len(),
        });
    }
    let multiplier = arch_multiplier(uarch);
    Ok(sizes.iter().map(|&s| u32::from(s) * multiplier).collect())
}

/// Packs bucket frequencies (GHz) into a turbo ratio-limit register, bucket *i* in byte *i*.
///
/// # Errors
/// `WrongElementCount` for more than eight frequencies; `MalformedConsolidated` for a
/// frequency that does not fit a ratio byte.
pub fn encode_ratio_limits(freqs: &[f64]) -> HwFactsResult<u64> {
    if freqs.len() > RATIO_FIELDS {
        return Err(HwFactsError::WrongElementCount {
            what: "bucket frequencies",
            expected: RATIO_FIELDS,
            found: freqs.len(),
        });
    }

    let mut register = 0;
    for (i, &freq) in freqs.iter().enumerate() {
        let ratio = (freq * 10.0).round();
        if !(0.0..=f64::from(u8::MAX)).contains(&ratio) {
            return Err(HwFactsError::MalformedConsolidated(format!(
                "frequency {freq} out of range"
            )));
        }
        register |= ratio_field(ratio as u8, i as u32);
    }
    Ok(register)
}

/// Unpacks a turbo ratio-limit register into eight bucket frequencies (GHz).
#[must_use]
pub fn decode_ratio_limits(register: u64) -> Vec<f64> {
    (0..RATIO_FIELDS as u32)
        .map(|i| f64::from(ratio_field_value(register, i)) / 10.0)
        .collect()
}
