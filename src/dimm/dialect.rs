use crate::dimm::DimmRecord;
use crate::error::{HwFactsError, HwFactsResult};
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

// ===============================================================================================
// Dialects
// ===============================================================================================

/// A recognized firmware locator format.
///
/// Variant order is classification priority: the first dialect whose patterns all match
/// the first record wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DimmDialect {
    /// `CPU0_C0D0` (Inspur ICX).
    CpuChannelDimm,
    /// `CPU0_A1`.
    CpuLetterSlot,
    /// `CPU0_MC0_DIMM_A1`.
    CpuControllerDimm,
    /// Bank locator `NODE 0 CHANNEL 0 DIMM 0`.
    NodeChannelDimm,
    /// `P1-DIMMA1` (SuperMicro).
    SupermicroProcDimm,
    /// Bank locator `P0_Node0_Channel0_Dimm0`.
    ProcNodeChannelDimm,
    /// Bank locator `_Node0_Channel0_Dimm0`.
    NodeChannelDimmSuffix,
    /// `CPU1_DIMM_A1` with bank locator `NODE 1` (Skylake SDP).
    SkylakeSdp,
    /// `CPU0_DIMM_A1` with bank locator `NODE 0` (Ice Lake SDP).
    IceLakeSdp,
    /// Bank locator `NODE 1` with `DIMM_A1`.
    NodeDimmLetter,
    /// `DIMM_P0_A0` (Gigabyte Milan).
    GigabyteMilan,
    /// Bank locator `CHANNEL A DIMM0` (NUC).
    NucChannel,
    /// `Controller0-ChannelA-DIMM0` (Alder Lake client).
    ClientController,
    /// `CPU0_DIMM_A1` (Birchstream).
    Birchstream,
    /// `CPU0_DIMM_A` (Granite Rapids AP).
    GraniteRapidsAp,
    /// `CPU0 CH0/D0` (Forest City).
    ForestCity,
    Unknown,
}

/// Socket and slot extracted from one record, plus the channel when the format states it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorTokens {
    pub socket: u32,
    pub channel: Option<u32>,
    pub slot: u32,
}

impl LocatorTokens {
    #[must_use]
    pub const fn new(socket: u32, slot: u32) -> Self {
        Self {
            socket,
            channel: None,
            slot,
        }
    }

    #[must_use]
    pub const fn with_channel(socket: u32, channel: u32, slot: u32) -> Self {
        Self {
            socket,
            channel: Some(channel),
            slot,
        }
    }
}

// ===============================================================================================
// Grammar catalog
// ===============================================================================================

type Extractor = fn(Option<&Captures<'_>>, Option<&Captures<'_>>) -> Option<LocatorTokens>;

struct GrammarSpec {
    dialect: DimmDialect,
    bank_locator: Option<&'static str>,
    locator: Option<&'static str>,
    /// Receives the bank locator and locator captures, in that order.
    extract: Extractor,
}

fn group(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

/// One-based group, shifted to zero-based.
fn group_from_one(caps: &Captures<'_>, index: usize) -> Option<u32> {
    group(caps, index)?.checked_sub(1)
}

const GRAMMAR_TABLE: &[GrammarSpec] = &[
    GrammarSpec {
        dialect: DimmDialect::CpuChannelDimm,
        bank_locator: None,
        locator: Some(r"CPU([0-9])_C([0-9])D([0-9])"),
        extract: |_, loc| {
            let loc = loc?;
            Some(LocatorTokens::with_channel(
                group(loc, 1)?,
                group(loc, 2)?,
                group(loc, 3)?,
            ))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::CpuLetterSlot,
        bank_locator: None,
        locator: Some(r"CPU([0-9])_([A-Z])([0-9])"),
        extract: |_, loc| {
            let loc = loc?;
            Some(LocatorTokens::new(group(loc, 1)?, group(loc, 3)?))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::CpuControllerDimm,
        bank_locator: None,
        locator: Some(r"CPU([0-9])_MC._DIMM_([A-Z])([0-9])"),
        extract: |_, loc| {
            let loc = loc?;
            Some(LocatorTokens::new(group(loc, 1)?, group(loc, 3)?))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::NodeChannelDimm,
        bank_locator: Some(r"NODE ([0-9]) CHANNEL ([0-9]) DIMM ([0-9])"),
        locator: None,
        extract: |bank, _| {
            let bank = bank?;
            Some(LocatorTokens::with_channel(
                group(bank, 1)?,
                group(bank, 2)?,
                group(bank, 3)?,
            ))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::SupermicroProcDimm,
        bank_locator: None,
        locator: Some(r"P([1,2])-DIMM([A-L])([1,2])"),
        extract: |_, loc| {
            let loc = loc?;
            Some(LocatorTokens::new(
                group_from_one(loc, 1)?,
                group_from_one(loc, 3)?,
            ))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::ProcNodeChannelDimm,
        bank_locator: Some(r"P([0-9])_Node([0-9])_Channel([0-9])_Dimm([0-9])"),
        locator: None,
        extract: |bank, _| {
            let bank = bank?;
            Some(LocatorTokens::new(group(bank, 1)?, group(bank, 4)?))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::NodeChannelDimmSuffix,
        bank_locator: Some(r"_Node([0-9])_Channel([0-9])_Dimm([0-9])"),
        locator: None,
        extract: |bank, _| {
            let bank = bank?;
            Some(LocatorTokens::with_channel(
                group(bank, 1)?,
                group(bank, 2)?,
                group(bank, 3)?,
            ))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::SkylakeSdp,
        bank_locator: Some(r"NODE ([1-8])"),
        locator: Some(r"CPU([1-4])_DIMM_([A-Z])([1-2])"),
        extract: |_, loc| {
            let loc = loc?;
            Some(LocatorTokens::new(
                group_from_one(loc, 1)?,
                group_from_one(loc, 3)?,
            ))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::IceLakeSdp,
        bank_locator: Some(r"NODE ([0-9]+)"),
        locator: Some(r"CPU([0-7])_DIMM_([A-Z])([1-2])"),
        extract: |_, loc| {
            let loc = loc?;
            Some(LocatorTokens::new(group(loc, 1)?, group_from_one(loc, 3)?))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::NodeDimmLetter,
        bank_locator: Some(r"NODE ([1-9]\d*)"),
        locator: Some(r"DIMM_([A-Z])([1-9]\d*)"),
        extract: |bank, loc| {
            Some(LocatorTokens::new(
                group_from_one(bank?, 1)?,
                group_from_one(loc?, 2)?,
            ))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::GigabyteMilan,
        bank_locator: None,
        locator: Some(r"DIMM_P([0-1])_[A-Z]([0-1])"),
        extract: |_, loc| {
            let loc = loc?;
            Some(LocatorTokens::new(group(loc, 1)?, group(loc, 2)?))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::NucChannel,
        bank_locator: Some(r"CHANNEL ([A-D]) DIMM([0-9])"),
        locator: None,
        extract: |bank, _| Some(LocatorTokens::new(0, group(bank?, 2)?)),
    },
    GrammarSpec {
        dialect: DimmDialect::ClientController,
        bank_locator: None,
        locator: Some(r"Controller([0-1]).*DIMM([0-1])"),
        extract: |_, loc| Some(LocatorTokens::new(0, group(loc?, 2)?)),
    },
    GrammarSpec {
        dialect: DimmDialect::Birchstream,
        bank_locator: None,
        locator: Some(r"CPU([\d])_DIMM_([A-H])([1-2])"),
        extract: |_, loc| {
            let loc = loc?;
            Some(LocatorTokens::new(group(loc, 1)?, group_from_one(loc, 3)?))
        },
    },
    GrammarSpec {
        dialect: DimmDialect::GraniteRapidsAp,
        bank_locator: None,
        locator: Some(r"CPU([\d])_DIMM_([A-L])"),
        extract: |_, loc| Some(LocatorTokens::new(group(loc?, 1)?, 0)),
    },
    GrammarSpec {
        dialect: DimmDialect::ForestCity,
        bank_locator: None,
        locator: Some(r"CPU([\d]) CH([0-7])/D([0-1])"),
        extract: |_, loc| {
            let loc = loc?;
            Some(LocatorTokens::with_channel(
                group(loc, 1)?,
                group(loc, 2)?,
                group(loc, 3)?,
            ))
        },
    },
];

struct Grammar {
    spec: &'static GrammarSpec,
    bank_locator: Option<Regex>,
    locator: Option<Regex>,
}

impl Grammar {
    /// `None` (and an error log) if a pattern does not compile; the dialect then never matches.
    fn compile(spec: &'static GrammarSpec) -> Option<Self> {
        let compile = |pattern: Option<&'static str>| -> Result<Option<Regex>, ()> {
            pattern
                .map(Regex::new)
                .transpose()
                .map_err(|e| error!("Dropping {:?} from the DIMM catalog: {e}", spec.dialect))
        };
        Some(Self {
            spec,
            bank_locator: compile(spec.bank_locator).ok()?,
            locator: compile(spec.locator).ok()?,
        })
    }

    fn captures<'r>(&self, record: &'r DimmRecord) -> Option<LocatorCaptures<'r>> {
        let bank = match &self.bank_locator {
            Some(re) => Some(re.captures(&record.bank_locator)?),
            None => None,
        };
        let loc = match &self.locator {
            Some(re) => Some(re.captures(&record.locator)?),
            None => None,
        };
        Some(LocatorCaptures { bank, loc })
    }
}

struct LocatorCaptures<'r> {
    bank: Option<Captures<'r>>,
    loc: Option<Captures<'r>>,
}

static GRAMMARS: Lazy<Vec<Grammar>> =
    Lazy::new(|| GRAMMAR_TABLE.iter().filter_map(Grammar::compile).collect());

// ===============================================================================================
// Classification
// ===============================================================================================

impl DimmDialect {
    fn grammar(self) -> Option<&'static Grammar> {
        GRAMMARS.iter().find(|g| g.spec.dialect == self)
    }

    /// True if every pattern of this dialect matches the record.
    #[must_use]
    pub fn matches(self, record: &DimmRecord) -> bool {
        self.grammar().is_some_and(|g| g.captures(record).is_some())
    }

    /// Pulls socket, slot and (where stated) channel from one record.
    ///
    /// `None` if the record does not fit this dialect.
    #[must_use]
    pub fn extract(self, record: &DimmRecord) -> Option<LocatorTokens> {
        let grammar = self.grammar()?;
        let caps = grammar.captures(record)?;
        (grammar.spec.extract)(caps.bank.as_ref(), caps.loc.as_ref())
    }

    /// All known dialects in priority order.
    pub fn catalog() -> impl Iterator<Item = Self> {
        GRAMMAR_TABLE.iter().map(|spec| spec.dialect)
    }
}

/// Identifies the dialect of a record, normally the first of a listing.
///
/// # Errors
/// `UnknownDialect` if no dialect in the catalog matches.
pub fn classify(record: &DimmRecord) -> HwFactsResult<DimmDialect> {
    let dialect = GRAMMARS
        .iter()
        .find(|g| g.captures(record).is_some())
        .map(|g| g.spec.dialect)
        .ok_or_else(|| HwFactsError::UnknownDialect {
            bank_locator: record.bank_locator.clone(),
            locator: record.locator.clone(),
        })?;
    debug!(
        "{:?} / {:?} classified as {dialect:?}",
        record.bank_locator, record.locator
    );
    Ok(dialect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(bank_locator: &str, locator: &str) -> DimmRecord {
        DimmRecord::with_locators(bank_locator, locator)
    }

    #[test]
    fn test_classify_each_dialect() {
        let cases = [
            (rec("", "CPU0_C1D0"), DimmDialect::CpuChannelDimm),
            (rec("", "CPU0_A1"), DimmDialect::CpuLetterSlot),
            (rec("", "CPU0_MC0_DIMM_A1"), DimmDialect::CpuControllerDimm),
            (rec("NODE 0 CHANNEL 1 DIMM 0", ""), DimmDialect::NodeChannelDimm),
            (rec("", "P1-DIMMA1"), DimmDialect::SupermicroProcDimm),
            (rec("P0_Node0_Channel0_Dimm0", "DIMM 0"), DimmDialect::ProcNodeChannelDimm),
            (rec("_Node1_Channel2_Dimm0", "DIMM 0"), DimmDialect::NodeChannelDimmSuffix),
            (rec("NODE 1", "CPU1_DIMM_A1"), DimmDialect::SkylakeSdp),
            (rec("NODE 0", "CPU0_DIMM_A1"), DimmDialect::IceLakeSdp),
            (rec("NODE 1", "DIMM_A1"), DimmDialect::NodeDimmLetter),
            (rec("BANK 0", "DIMM_P0_A0"), DimmDialect::GigabyteMilan),
            (rec("CHANNEL A DIMM0", "SODIMM"), DimmDialect::NucChannel),
            (rec("BANK 0", "Controller0-ChannelA-DIMM0"), DimmDialect::ClientController),
            (rec("BANK 0", "CPU0_DIMM_A1"), DimmDialect::Birchstream),
            (rec("BANK 0", "CPU0_DIMM_K"), DimmDialect::GraniteRapidsAp),
            (rec("", "CPU0 CH3/D1"), DimmDialect::ForestCity),
        ];
        for (record, want) in cases {
            assert_eq!(classify(&record).unwrap(), want, "{record:?}");
        }
    }

    #[test]
    fn test_classify_priority() {
        // Several dialects accept this record; the earliest wins.
        let record = rec("NODE 1", "CPU1_DIMM_A1");
        for dialect in [
            DimmDialect::IceLakeSdp,
            DimmDialect::NodeDimmLetter,
            DimmDialect::Birchstream,
        ] {
            assert!(dialect.matches(&record), "{dialect:?}");
        }
        assert_eq!(classify(&record).unwrap(), DimmDialect::SkylakeSdp);
        assert_eq!(
            classify(&rec("NODE 1", "P1-DIMMA1")).unwrap(),
            DimmDialect::SupermicroProcDimm
        );

        // Skylake SDP requires a one-based CPU number.
        assert_eq!(
            classify(&rec("NODE 1", "CPU0_DIMM_A1")).unwrap(),
            DimmDialect::IceLakeSdp
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(
            classify(&rec("BANK 0", "ChannelA-DIMM0")),
            Err(HwFactsError::UnknownDialect {
                bank_locator: "BANK 0".to_string(),
                locator: "ChannelA-DIMM0".to_string(),
            })
        );
        assert!(!DimmDialect::Unknown.matches(&rec("NODE 1", "DIMM_A1")));
    }

    #[test]
    fn test_extract_tokens() {
        assert_eq!(
            DimmDialect::SupermicroProcDimm.extract(&rec("", "P2-DIMMC2")),
            Some(LocatorTokens::new(1, 1))
        );
        assert_eq!(
            DimmDialect::NodeDimmLetter.extract(&rec("NODE 2", "DIMM_B12")),
            Some(LocatorTokens::new(1, 11))
        );
        assert_eq!(
            DimmDialect::ForestCity.extract(&rec("", "CPU1 CH7/D1")),
            Some(LocatorTokens::with_channel(1, 7, 1))
        );
        assert_eq!(
            DimmDialect::ProcNodeChannelDimm.extract(&rec("P1_Node1_Channel3_Dimm1", "")),
            Some(LocatorTokens::new(1, 1))
        );
        assert_eq!(
            DimmDialect::GraniteRapidsAp.extract(&rec("", "CPU1_DIMM_L")),
            Some(LocatorTokens::new(1, 0))
        );
        assert_eq!(DimmDialect::Birchstream.extract(&rec("", "P1-DIMMA1")), None);
    }

    #[test]
    fn test_catalog_order() {
        let catalog: Vec<_> = DimmDialect::catalog().collect();
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog[0], DimmDialect::CpuChannelDimm);
        assert_eq!(catalog[4], DimmDialect::SupermicroProcDimm);
        assert_eq!(catalog[15], DimmDialect::ForestCity);
        assert!(!catalog.contains(&DimmDialect::Unknown));
    }
}
