// ===============================================================================================
// Architecture Multipliers
// ===============================================================================================

/// Firmware reports turbo buckets per die. Multi-die packages replicate that table once
/// per die, so package-level core counts are the per-die counts times this factor.
struct MultiplierRule {
    uarch: &'static str,
    multiplier: u32,
}

const MULTIPLIER_TABLE: &[MultiplierRule] = &[
    /* Tile-replicated E-core parts */
    MultiplierRule {
        uarch: "SRF",
        multiplier: 4,
    },
    MultiplierRule {
        uarch: "CWF",
        multiplier: 4,
    },
    /* Granite Rapids multi-die packages */
    MultiplierRule {
        uarch: "GNR_X3",
        multiplier: 3,
    },
    MultiplierRule {
        uarch: "GNR_X2",
        multiplier: 2,
    },
];

/// Returns the package-to-die core multiplier for a microarchitecture identifier.
///
/// Identifiers are matched by substring, first rule wins; anything unmatched is a
/// single-die part.
#[must_use]
pub fn arch_multiplier(uarch: &str) -> u32 {
    MULTIPLIER_TABLE
        .iter()
        .find(|rule| uarch.contains(rule.uarch))
        .map_or(1, |rule| rule.multiplier)
}

// ===============================================================================================
// ISA Catalog
// ===============================================================================================

pub struct IsaInfo {
    pub name: &'static str,
    pub full_name: &'static str,
}

/// ISA columns the frequency collection emits, in collection order.
pub const ISA_CATALOG: &[IsaInfo] = &[
    IsaInfo {
        name: "SSE",
        full_name: "Streaming SIMD Extensions",
    },
    IsaInfo {
        name: "AVX2",
        full_name: "Advanced Vector Extensions 2",
    },
    IsaInfo {
        name: "AVX512",
        full_name: "Advanced Vector Extensions 512",
    },
    IsaInfo {
        name: "AVX512H",
        full_name: "Advanced Vector Extensions 512 (Heavy)",
    },
    IsaInfo {
        name: "AMX",
        full_name: "Advanced Matrix Extensions",
    },
];

/// Looks up a catalog entry, ignoring case.
#[must_use]
pub fn find_isa(name: &str) -> Option<&'static IsaInfo> {
    ISA_CATALOG
        .iter()
        .find(|isa| isa.name.eq_ignore_ascii_case(name))
}
