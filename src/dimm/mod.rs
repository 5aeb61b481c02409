pub mod dialect;
pub mod resolver;
pub mod summary;
pub mod vendor;

use crate::error::{HwFactsError, HwFactsResult};
use serde::Serialize;

/// Number of reported attributes per memory device, in collector order.
pub const DIMM_FIELD_COUNT: usize = 11;

/// One memory device (SMBIOS type 17) as reported by firmware. All fields are free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimmRecord {
    pub bank_locator: String,
    pub locator: String,
    pub manufacturer: String,
    pub part_number: String,
    pub serial: String,
    pub size: String,
    pub mem_type: String,
    pub type_detail: String,
    pub speed: String,
    pub rank: String,
    pub configured_speed: String,
}

impl DimmRecord {
    /// A record carrying only the two locator fields.
    #[must_use]
    pub fn with_locators(bank_locator: &str, locator: &str) -> Self {
        Self {
            bank_locator: bank_locator.to_string(),
            locator: locator.to_string(),
            ..Self::default()
        }
    }

    /// Builds a record from the collector's field array: bank locator, locator,
    /// manufacturer, part number, serial, size, type, type detail, speed, rank,
    /// configured speed.
    ///
    /// # Errors
    /// `WrongElementCount` unless exactly [`DIMM_FIELD_COUNT`] fields are given.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> HwFactsResult<Self> {
        let [
            bank_locator,
            locator,
            manufacturer,
            part_number,
            serial,
            size,
            mem_type,
            type_detail,
            speed,
            rank,
            configured_speed,
        ] = fields
        else {
            return Err(HwFactsError::WrongElementCount {
                what: "DIMM fields",
                expected: DIMM_FIELD_COUNT,
                found: fields.len(),
            });
        };

        let own = |s: &S| s.as_ref().to_string();
        Ok(Self {
            bank_locator: own(bank_locator),
            locator: own(locator),
            manufacturer: own(manufacturer),
            part_number: own(part_number),
            serial: own(serial),
            size: own(size),
            mem_type: own(mem_type),
            type_detail: own(type_detail),
            speed: own(speed),
            rank: own(rank),
            configured_speed: own(configured_speed),
        })
    }
}

/// Where a DIMM sits: socket, channel within the socket, slot within the channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DimmPosition {
    pub socket: u32,
    pub channel: u32,
    pub slot: u32,
}

impl DimmPosition {
    #[must_use]
    pub const fn new(socket: u32, channel: u32, slot: u32) -> Self {
        Self {
            socket,
            channel,
            slot,
        }
    }
}

pub use dialect::{DimmDialect, LocatorTokens, classify};
pub use resolver::resolve_dimm_positions;
pub use summary::{installed_memory, populated_channels};
pub use vendor::PlatformVendor;
