//! Hardware facts decoded from platform introspection text: turbo frequency buckets from
//! firmware hex registers, and DIMM socket/channel/slot positions from SMBIOS locators.

pub mod config;
pub mod dimm;
pub mod error;
pub mod freq;
pub mod utils;

pub use config::MemoryLayout;
pub use dimm::{DimmDialect, DimmPosition, DimmRecord, resolve_dimm_positions};
pub use error::{HwFactsError, HwFactsResult};
pub use freq::{CoreRange, FrequencyBucket, FrequencyBucketTable, expand_turbo_frequencies};
