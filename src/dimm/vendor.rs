use crate::config::MemoryLayout;
use crate::dimm::{DimmPosition, DimmRecord};
use crate::error::{HwFactsError, HwFactsResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Bank locator shared by every DIMM on Dell and HPE boards.
const NOT_SPECIFIED: &str = "Not Specified";

type LazyPattern = Lazy<Result<Regex, regex::Error>>;

static DELL_LOCATOR: LazyPattern = Lazy::new(|| Regex::new(r"([ABCD])([1-9]\d*)"));
static HPE_LOCATOR: LazyPattern = Lazy::new(|| Regex::new(r"PROC ([1-9]\d*) DIMM ([1-9]\d*)"));
static EC2_C5_BANK: LazyPattern = Lazy::new(|| Regex::new(r"NODE\s+([1-9])"));
static EC2_C5_LOCATOR: LazyPattern = Lazy::new(|| Regex::new(r"DIMM_([A-Z])(\d)"));
static EC2_C6I_BANK: LazyPattern = Lazy::new(|| Regex::new(r"NODE\s+(\d+)"));
static EC2_C6I_LOCATOR: LazyPattern =
    Lazy::new(|| Regex::new(r"CPU(\d+)\s+Channel(\d+)\s+DIMM(\d+)"));

/// Platforms whose DIMM numbering is known well enough to map positions in closed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformVendor {
    Dell,
    Hpe,
    AmazonEc2,
}

impl PlatformVendor {
    /// Matches the firmware's platform vendor string. Any other vendor uses the generic dialects.
    #[must_use]
    pub fn identify(vendor: &str) -> Option<Self> {
        if vendor.contains("Dell") {
            Some(Self::Dell)
        } else if vendor == "HPE" {
            Some(Self::Hpe)
        } else if vendor == "Amazon EC2" {
            Some(Self::AmazonEc2)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dell => "Dell",
            Self::Hpe => "HPE",
            Self::AmazonEc2 => "Amazon EC2",
        }
    }

    /// Maps every record to a position using this vendor's numbering.
    ///
    /// # Errors
    /// `InvalidLayout` for a layout with no channels or sockets; `VendorFormatMismatch` as
    /// soon as one record does not follow the vendor's format.
    pub fn derive(
        self,
        records: &[DimmRecord],
        layout: &MemoryLayout,
    ) -> HwFactsResult<Vec<DimmPosition>> {
        layout.validate()?;
        match self {
            Self::Dell => derive_dell(records, layout.channels_per_socket),
            Self::Hpe => derive_hpe(records, layout.sockets, layout.channels_per_socket),
            Self::AmazonEc2 => derive_ec2(records, layout.channels_per_socket),
        }
    }

    fn mismatch(self, detail: impl Into<String>) -> HwFactsError {
        HwFactsError::VendorFormatMismatch {
            vendor: self.name(),
            detail: detail.into(),
        }
    }

    fn pattern(self, pattern: &'static LazyPattern) -> HwFactsResult<&'static Regex> {
        Lazy::force(pattern)
            .as_ref()
            .map_err(|e| self.mismatch(e.to_string()))
    }
}

fn number(text: &str) -> Option<u32> {
    text.parse().ok()
}

// ===============================================================================================
// Dell
// ===============================================================================================

// Bank locator is "Not Specified" everywhere; locators run A1..A12 then B1..B12 on a two
// socket board with six channels. A1 and A7 share channel 0, A2 and A8 channel 1, and so on.
fn derive_dell(records: &[DimmRecord], channels_per_socket: u32) -> HwFactsResult<Vec<DimmPosition>> {
    let vendor = PlatformVendor::Dell;
    let re = vendor.pattern(&DELL_LOCATOR)?;

    records
        .iter()
        .map(|dimm| {
            if !dimm.bank_locator.contains(NOT_SPECIFIED) {
                return Err(vendor.mismatch("bank locator"));
            }
            let caps = re
                .captures(&dimm.locator)
                .ok_or_else(|| vendor.mismatch(format!("locator {:?}", dimm.locator)))?;
            let letter = caps[1].as_bytes()[0];
            let numeric = number(&caps[2])
                .ok_or_else(|| vendor.mismatch(format!("locator number {:?}", &caps[2])))?;

            let socket = u32::from(letter - b'A');
            let position = if numeric <= channels_per_socket {
                DimmPosition::new(socket, numeric - 1, 0)
            } else {
                DimmPosition::new(socket, numeric - (channels_per_socket + 1), 1)
            };
            Ok(position)
        })
        .collect()
}

// ===============================================================================================
// HPE
// ===============================================================================================

// Locators read "PROC 1 DIMM 1", "PROC 1 DIMM 2", ... with two slots per channel. Odd DIMM
// numbers below the channel count and even ones above it sit in slot 0.
fn derive_hpe(
    records: &[DimmRecord],
    sockets: u32,
    channels_per_socket: u32,
) -> HwFactsResult<Vec<DimmPosition>> {
    let vendor = PlatformVendor::Hpe;
    let re = vendor.pattern(&HPE_LOCATOR)?;

    let total_channels = u64::from(sockets) * u64::from(channels_per_socket);
    let slots_per_channel = u32::try_from(records.len() as u64 / total_channels.max(1))
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            vendor.mismatch(format!(
                "{} DIMMs cannot fill {total_channels} channels",
                records.len()
            ))
        })?;

    records
        .iter()
        .map(|dimm| {
            if !dimm.bank_locator.contains(NOT_SPECIFIED) {
                return Err(vendor.mismatch(format!("bank locator {:?}", dimm.bank_locator)));
            }
            let caps = re
                .captures(&dimm.locator)
                .ok_or_else(|| vendor.mismatch(format!("locator {:?}", dimm.locator)))?;
            let proc = number(&caps[1])
                .ok_or_else(|| vendor.mismatch(format!("socket number {:?}", &caps[1])))?;
            let dimm_num = number(&caps[2])
                .ok_or_else(|| vendor.mismatch(format!("DIMM number {:?}", &caps[2])))?;

            let channel = (dimm_num - 1) / slots_per_channel;
            let odd = dimm_num % 2 != 0;
            let slot = if (dimm_num < channels_per_socket && odd)
                || (dimm_num > channels_per_socket && !odd)
            {
                0
            } else {
                1
            };
            Ok(DimmPosition::new(proc - 1, channel, slot))
        })
        .collect()
}

// ===============================================================================================
// Amazon EC2
// ===============================================================================================

// Two bare-metal layouts exist.
//
//   c5.metal   NODE 1  DIMM_A0 ... NODE 2  DIMM_M1   (letters skip 'I')
//   c6i.metal  NODE 0  CPU0 Channel0 DIMM0 ... NODE 7  CPU1 Channel7 DIMM1
fn derive_ec2(records: &[DimmRecord], channels_per_socket: u32) -> HwFactsResult<Vec<DimmPosition>> {
    let vendor = PlatformVendor::AmazonEc2;
    let c5_bank = vendor.pattern(&EC2_C5_BANK)?;
    let c5_loc = vendor.pattern(&EC2_C5_LOCATOR)?;
    let c6i_bank = vendor.pattern(&EC2_C6I_BANK)?;
    let c6i_loc = vendor.pattern(&EC2_C6I_LOCATOR)?;

    records
        .iter()
        .map(|dimm| {
            if let (Some(bank), Some(loc)) = (
                c5_bank.captures(&dimm.bank_locator),
                c5_loc.captures(&dimm.locator),
            ) {
                let node = number(&bank[1]).ok_or_else(|| vendor.mismatch("node number"))?;
                let letter = loc[1].as_bytes()[0];
                let channel = match letter {
                    b'I' => return Err(vendor.mismatch(format!("locator {:?}", dimm.locator))),
                    l if l < b'I' => u32::from(l - b'A') % channels_per_socket,
                    l => u32::from(l - b'B') % channels_per_socket,
                };
                let slot = number(&loc[2]).ok_or_else(|| vendor.mismatch("slot number"))?;
                return Ok(DimmPosition::new(node - 1, channel, slot));
            }

            if c6i_bank.is_match(&dimm.bank_locator)
                && let Some(loc) = c6i_loc.captures(&dimm.locator)
            {
                let field = |i: usize| {
                    number(&loc[i]).ok_or_else(|| vendor.mismatch(format!("locator {:?}", dimm.locator)))
                };
                return Ok(DimmPosition::new(field(1)?, field(2)?, field(3)?));
            }

            Err(vendor.mismatch(format!(
                "bank locator {:?} locator {:?}",
                dimm.bank_locator, dimm.locator
            )))
        })
        .collect()
}
