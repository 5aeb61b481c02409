use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HwFactsError {
    #[error("Malformed hex string {input:?}: {reason}")]
    MalformedHex { input: String, reason: &'static str },

    #[error("Expected {expected} {what}, got {found}")]
    WrongElementCount {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Microarchitecture is required")]
    MissingArchitecture,

    #[error("No core frequency bucket sizes found")]
    MissingBucketSizes,

    #[error("Unable to find {0} frequency column")]
    UnknownIsa(String),

    #[error("Malformed frequency table: {0}")]
    MalformedTable(String),

    #[error("Malformed frequency dump: {0}")]
    MalformedDump(&'static str),

    #[error("Malformed consolidated frequencies: {0}")]
    MalformedConsolidated(String),

    #[error("Unknown DIMM identification format: {bank_locator:?} {locator:?}")]
    UnknownDialect {
        bank_locator: String,
        locator: String,
    },

    #[error("DIMM {index} resolved to channel {channel}, platform has {channels_per_socket}")]
    InconsistentChannel {
        index: usize,
        channel: u32,
        channels_per_socket: u32,
    },

    #[error("Doesn't conform to expected {vendor} format: {detail}")]
    VendorFormatMismatch {
        vendor: &'static str,
        detail: String,
    },

    #[error("No DIMMs")]
    NoDimms,

    #[error("Invalid memory layout: {0}")]
    InvalidLayout(&'static str),
}

// A convenient alias
pub type HwFactsResult<T> = Result<T, HwFactsError>;
