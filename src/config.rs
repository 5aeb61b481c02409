use crate::error::{HwFactsError, HwFactsResult};
use log::{info, warn};
use std::env;

pub const CHANNELS_PER_SOCKET_VAR: &str = "HWFACTS_CHANNELS_PER_SOCKET";
pub const SOCKETS_VAR: &str = "HWFACTS_SOCKETS";
pub const PLATFORM_VENDOR_VAR: &str = "HWFACTS_PLATFORM_VENDOR";
pub const OVERRIDE_UARCH_VAR: &str = "HWFACTS_OVERRIDE_UARCH";

/// Platform facts the DIMM resolver needs besides the records themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLayout {
    pub channels_per_socket: u32,
    pub sockets: u32,
    /// Platform vendor string as reported by firmware, e.g. `"Dell Inc."`.
    pub vendor: String,
}

impl MemoryLayout {
    #[must_use]
    pub fn new(channels_per_socket: u32, sockets: u32, vendor: &str) -> Self {
        Self {
            channels_per_socket,
            sockets,
            vendor: vendor.to_string(),
        }
    }

    /// # Errors
    /// `InvalidLayout` when the platform reports no channels or no sockets.
    pub fn validate(&self) -> HwFactsResult<()> {
        if self.channels_per_socket == 0 {
            return Err(HwFactsError::InvalidLayout("zero channels per socket"));
        }
        if self.sockets == 0 {
            return Err(HwFactsError::InvalidLayout("zero sockets"));
        }
        Ok(())
    }

    /// Applies `HWFACTS_*` overrides found through `lookup`. Values that do not parse are
    /// ignored.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(CHANNELS_PER_SOCKET_VAR) {
            match val.trim().parse::<u32>() {
                Ok(n) => {
                    info!("{CHANNELS_PER_SOCKET_VAR} overrides channels per socket with {n}");
                    self.channels_per_socket = n;
                }
                Err(e) => warn!("Ignoring {CHANNELS_PER_SOCKET_VAR}={val:?}: {e}"),
            }
        }

        if let Some(val) = lookup(SOCKETS_VAR) {
            match val.trim().parse::<u32>() {
                Ok(n) => {
                    info!("{SOCKETS_VAR} overrides socket count with {n}");
                    self.sockets = n;
                }
                Err(e) => warn!("Ignoring {SOCKETS_VAR}={val:?}: {e}"),
            }
        }

        if let Some(val) = lookup(PLATFORM_VENDOR_VAR) {
            info!("{PLATFORM_VENDOR_VAR} overrides platform vendor with {val:?}");
            self.vendor = val;
        }

        self
    }

    /// [`with_overrides_from`](Self::with_overrides_from) over the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }
}

/// The microarchitecture identifier to decode with, after `HWFACTS_OVERRIDE_UARCH`.
///
/// An empty override is ignored.
#[must_use]
pub fn uarch_override_from<F>(uarch: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(OVERRIDE_UARCH_VAR) {
        Some(val) if !val.trim().is_empty() => {
            info!("{OVERRIDE_UARCH_VAR} overrides microarchitecture {uarch:?} with {val:?}");
            val.trim().to_string()
        }
        Some(_) => {
            warn!("Ignoring empty {OVERRIDE_UARCH_VAR}");
            uarch.to_string()
        }
        None => uarch.to_string(),
    }
}

#[must_use]
pub fn uarch_from_env(uarch: &str) -> String {
    uarch_override_from(uarch, |key| env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_validate() {
        assert!(MemoryLayout::new(8, 2, "").validate().is_ok());
        assert_eq!(
            MemoryLayout::new(0, 2, "").validate(),
            Err(HwFactsError::InvalidLayout("zero channels per socket"))
        );
        assert_eq!(
            MemoryLayout::new(8, 0, "").validate(),
            Err(HwFactsError::InvalidLayout("zero sockets"))
        );
    }

    #[test]
    fn test_overrides() {
        let layout = MemoryLayout::new(8, 2, "Intel Corporation").with_overrides_from(lookup(&[
            (CHANNELS_PER_SOCKET_VAR, " 12 "),
            (SOCKETS_VAR, "two"),
            (PLATFORM_VENDOR_VAR, "Dell Inc."),
        ]));
        assert_eq!(layout, MemoryLayout::new(12, 2, "Dell Inc."));

        let untouched = MemoryLayout::new(8, 2, "HPE").with_overrides_from(lookup(&[]));
        assert_eq!(untouched, MemoryLayout::new(8, 2, "HPE"));
    }

    #[test]
    fn test_uarch_override() {
        assert_eq!(uarch_override_from("SPR", lookup(&[])), "SPR");
        assert_eq!(
            uarch_override_from("SPR", lookup(&[(OVERRIDE_UARCH_VAR, "GNR_X2")])),
            "GNR_X2"
        );
        assert_eq!(
            uarch_override_from("SPR", lookup(&[(OVERRIDE_UARCH_VAR, "  ")])),
            "SPR"
        );
    }
}
