use crate::error::{HwFactsError, HwFactsResult};
use crate::freq::arch::arch_multiplier;
use crate::freq::dump::FrequencyDump;
use crate::utils::decode_hex_vector;
use log::{debug, warn};
use serde::Serialize;
use std::fmt;

/// Firmware always reports eight turbo buckets.
pub const BUCKET_COUNT: usize = 8;

/// Hex value the collector emits for an ISA the part does not support.
const UNSUPPORTED_ISA_HEX: &str = "0";

pub const CORES_HEADER: &str = "Cores";
pub const CORES_PER_DIE_HEADER: &str = "Cores per Die";

// ===============================================================================================
// Data Structures
// ===============================================================================================

/// An inclusive range of active core counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoreRange {
    pub start: u32,
    pub end: u32,
}

impl CoreRange {
    /// Number of core counts covered by the range.
    #[must_use]
    pub const fn core_count(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Parses `"start-end"` or a bare `"n"`. Surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (start, end) = match text.split_once('-') {
            Some((start, end)) => (start.trim().parse().ok()?, end.trim().parse().ok()?),
            None => {
                let n = text.parse().ok()?;
                (n, n)
            }
        };
        if start == 0 || start > end {
            return None;
        }
        Some(Self { start, end })
    }
}

impl fmt::Display for CoreRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsaFrequency {
    pub isa: String,
    pub ghz: f64,
}

/// One turbo bucket: a core-count range and the frequency ceiling of each ISA within it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyBucket {
    /// Package-level core range.
    pub cores: CoreRange,
    /// Per-die core range, present only on multi-die packages.
    pub die_cores: Option<CoreRange>,
    pub frequencies: Vec<IsaFrequency>,
}

impl FrequencyBucket {
    /// Frequency for `isa` in GHz, ignoring case.
    #[must_use]
    pub fn frequency(&self, isa: &str) -> Option<f64> {
        self.frequencies
            .iter()
            .find(|f| f.isa.eq_ignore_ascii_case(isa))
            .map(|f| f.ghz)
    }

    /// The per-die range, which is the package range on single-die parts.
    #[must_use]
    pub fn die_range(&self) -> CoreRange {
        self.die_cores.unwrap_or(self.cores)
    }
}

/// Decoded turbo buckets, ascending by core count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyBucketTable {
    pub multiplier: u32,
    /// Upper-cased names of the supported ISAs, in input order.
    pub isas: Vec<String>,
    pub buckets: Vec<FrequencyBucket>,
}

// ===============================================================================================
// Decoding
// ===============================================================================================

impl FrequencyBucketTable {
    /// Decodes the bucket-size hex and per-ISA frequency hex into a bucket table.
    ///
    /// `isa_hex` pairs an ISA name with its hex; the literal `"0"` marks the ISA as
    /// unsupported and drops its column.
    ///
    /// # Errors
    /// `MissingArchitecture` for an empty `uarch`, `MissingBucketSizes` for empty bucket
    /// data, `MalformedHex` for undecodable hex, and `WrongElementCount` when the bucket
    /// sizes or any ISA do not decode to exactly eight values.
    pub fn decode<N, H>(
        bucket_sizes_hex: &str,
        isa_hex: &[(N, H)],
        uarch: &str,
    ) -> HwFactsResult<Self>
    where
        N: AsRef<str>,
        H: AsRef<str>,
    {
        if uarch.trim().is_empty() {
            return Err(HwFactsError::MissingArchitecture);
        }
        if bucket_sizes_hex.trim().is_empty() {
            return Err(HwFactsError::MissingBucketSizes);
        }

        let boundaries = decode_hex_vector(bucket_sizes_hex)?;
        if boundaries.len() != BUCKET_COUNT {
            return Err(HwFactsError::WrongElementCount {
                what: "bucket sizes",
                expected: BUCKET_COUNT,
                found: boundaries.len(),
            });
        }

        let multiplier = arch_multiplier(uarch);
        let ranges = build_core_ranges(&boundaries, multiplier);

        let mut columns: Vec<(String, Vec<u8>)> = Vec::new();
        for (name, hex) in isa_hex {
            let name = name.as_ref();
            let hex = hex.as_ref().trim();
            if hex == UNSUPPORTED_ISA_HEX {
                debug!("{name} not supported, dropping column");
                continue;
            }
            let values = decode_hex_vector(hex)?;
            if values.len() != BUCKET_COUNT {
                return Err(HwFactsError::WrongElementCount {
                    what: "ISA frequencies",
                    expected: BUCKET_COUNT,
                    found: values.len(),
                });
            }
            if values.first() == Some(&0) {
                debug!("{name} reports no single-core ceiling, dropping column");
                continue;
            }
            columns.push((name.to_uppercase(), values));
        }

        let buckets = ranges
            .into_iter()
            .enumerate()
            .map(|(i, (cores, die_cores))| FrequencyBucket {
                cores,
                die_cores,
                frequencies: columns
                    .iter()
                    .map(|(isa, values)| IsaFrequency {
                        isa: isa.clone(),
                        ghz: f64::from(values[i]) / 10.0,
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            multiplier,
            isas: columns.into_iter().map(|(isa, _)| isa).collect(),
            buckets,
        })
    }

    /// Decodes the two-line dump emitted by the frequency collection script.
    ///
    /// # Errors
    /// `MalformedDump` if the text is not a header line plus a matching value line,
    /// otherwise the same errors as [`FrequencyBucketTable::decode`].
    pub fn from_dump(text: &str, uarch: &str) -> HwFactsResult<Self> {
        let dump = FrequencyDump::parse(text)?;
        Self::decode(dump.bucket_sizes(), &dump.isa_hex(), uarch)
    }

    /// Package-level core ranges, ascending.
    #[must_use]
    pub fn package_ranges(&self) -> Vec<CoreRange> {
        self.buckets.iter().map(|b| b.cores).collect()
    }

    /// Per-die core ranges, ascending. Identical to the package ranges on single-die parts.
    #[must_use]
    pub fn die_ranges(&self) -> Vec<CoreRange> {
        self.buckets.iter().map(FrequencyBucket::die_range).collect()
    }

    /// Largest active-core count covered by the table.
    #[must_use]
    pub fn max_core_count(&self) -> Option<u32> {
        self.buckets.last().map(|b| b.cores.end)
    }

    /// Header row followed by one row per bucket, the form the report layer renders.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let multi_die = self.multiplier > 1;

        let mut header = vec![CORES_HEADER.to_string()];
        if multi_die {
            header.push(CORES_PER_DIE_HEADER.to_string());
        }
        header.extend(self.isas.iter().cloned());

        let mut rows = Vec::with_capacity(self.buckets.len() + 1);
        rows.push(header);
        for bucket in &self.buckets {
            let mut row = vec![bucket.cores.to_string()];
            if multi_die {
                row.push(bucket.die_range().to_string());
            }
            row.extend(bucket.frequencies.iter().map(|f| format!("{:.1}", f.ghz)));
            rows.push(row);
        }
        rows
    }
}

/// Builds `(package, per-die)` ranges from cumulative per-die boundaries.
///
/// Emission stops at the first boundary that does not advance past the running start;
/// firmware pads unused buckets by repeating the last boundary.
fn build_core_ranges(boundaries: &[u8], multiplier: u32) -> Vec<(CoreRange, Option<CoreRange>)> {
    let mut ranges = Vec::with_capacity(boundaries.len());
    let mut die_start = 1;
    let mut package_start = 1;

    for &boundary in boundaries {
        let boundary = u32::from(boundary);
        if boundary < die_start {
            debug!("bucket boundary {boundary} does not advance past {die_start}, table exhausted");
            break;
        }
        let die = CoreRange {
            start: die_start,
            end: boundary,
        };
        die_start = boundary + 1;

        if multiplier > 1 {
            let package_end = boundary * multiplier;
            if package_end < package_start {
                break;
            }
            ranges.push((
                CoreRange {
                    start: package_start,
                    end: package_end,
                },
                Some(die),
            ));
            package_start = package_end + 1;
        } else {
            ranges.push((die, None));
        }
    }

    if ranges.is_empty() {
        warn!("bucket sizes {boundaries:?} yield no core ranges");
    }
    ranges
}
