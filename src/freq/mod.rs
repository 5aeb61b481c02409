pub mod arch;
pub mod buckets;
pub mod consolidated;
pub mod dump;
pub mod turbo;

pub use buckets::{CoreRange, FrequencyBucket, FrequencyBucketTable, IsaFrequency};
pub use turbo::{
    all_core_max_frequency, consolidate_frequencies, expand_turbo_frequencies, max_frequency,
};
