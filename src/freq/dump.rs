use crate::error::{HwFactsError, HwFactsResult};

/// The raw output of the frequency collection script.
///
/// ```text
/// cores sse avx2 avx512 avx512h amx
/// hex   hex hex  hex    hex     hex
/// ```
///
/// The first column always carries the bucket sizes; the remaining columns are ISAs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyDump {
    pub fields: Vec<String>,
    pub values: Vec<String>,
}

impl FrequencyDump {
    /// # Errors
    /// `MalformedDump` when the text is empty, has fewer than two lines, fewer than two
    /// fields, or a value count that differs from the field count.
    pub fn parse(text: &str) -> HwFactsResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(HwFactsError::MalformedDump("no core frequencies found"));
        }

        let mut lines = text.lines();
        let (Some(header), Some(data)) = (lines.next(), lines.next()) else {
            return Err(HwFactsError::MalformedDump("need at least 2 lines"));
        };

        let fields: Vec<String> = header.split_whitespace().map(str::to_string).collect();
        if fields.len() < 2 {
            return Err(HwFactsError::MalformedDump("need at least 2 fields"));
        }

        let values: Vec<String> = data.split_whitespace().map(str::to_string).collect();
        if values.len() != fields.len() {
            return Err(HwFactsError::MalformedDump("field count mismatch"));
        }

        Ok(Self { fields, values })
    }

    /// Hex of the first column. Empty if the dump holds no values.
    #[must_use]
    pub fn bucket_sizes(&self) -> &str {
        self.values.first().map_or("", String::as_str)
    }

    /// `(ISA name, hex)` pairs in dump order.
    #[must_use]
    pub fn isa_hex(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .zip(&self.values)
            .skip(1)
            .map(|(name, hex)| (name.as_str(), hex.as_str()))
            .collect()
    }
}
