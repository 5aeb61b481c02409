use crate::config::MemoryLayout;
use crate::dimm::dialect::{LocatorTokens, classify};
use crate::dimm::vendor::PlatformVendor;
use crate::dimm::{DimmPosition, DimmRecord};
use crate::error::{HwFactsError, HwFactsResult};
use log::{debug, info, warn};

/// Maps every DIMM record to its (socket, channel, slot), in input order.
///
/// Records must arrive grouped by socket, then channel, with each channel's slots
/// consecutive from slot 0, as firmware lists them. Dell, HPE and Amazon EC2 platforms are
/// tried with their own numbering first and fall back to the generic dialects when that
/// fails.
///
/// # Errors
/// - `InvalidLayout` for a layout with no channels or sockets.
/// - `NoDimms` for an empty listing.
/// - `UnknownDialect` when the first record matches no dialect, or a later one does not
///   fit the first record's dialect.
/// - `InconsistentChannel` when any derived channel falls outside the socket.
pub fn resolve_dimm_positions(
    records: &[DimmRecord],
    layout: &MemoryLayout,
) -> HwFactsResult<Vec<DimmPosition>> {
    layout.validate()?;
    if records.is_empty() {
        return Err(HwFactsError::NoDimms);
    }

    if let Some(vendor) = PlatformVendor::identify(&layout.vendor) {
        let derived = vendor
            .derive(records, layout)
            .and_then(|positions| check_channels(positions, layout.channels_per_socket));
        match derived {
            Ok(positions) => return Ok(positions),
            Err(e) => warn!(
                "Failed to parse DIMM info on {} platform, trying generic formats: {e}",
                vendor.name()
            ),
        }
    }

    let positions = derive_generic(records)?;
    check_channels(positions, layout.channels_per_socket)
}

/// Classifies the listing by its first record and extracts every record with that dialect.
fn derive_generic(records: &[DimmRecord]) -> HwFactsResult<Vec<DimmPosition>> {
    let Some(first) = records.first() else {
        return Err(HwFactsError::NoDimms);
    };
    let dialect = classify(first)?;

    let mut scan = ChannelScan::default();
    records
        .iter()
        .map(|dimm| {
            let tokens = dialect.extract(dimm).ok_or_else(|| {
                info!(
                    "Couldn't extract socket and slot from {:?} / {:?} as {dialect:?}",
                    dimm.bank_locator, dimm.locator
                );
                HwFactsError::UnknownDialect {
                    bank_locator: dimm.bank_locator.clone(),
                    locator: dimm.locator.clone(),
                }
            })?;
            Ok(scan.advance(tokens))
        })
        .collect()
}

fn check_channels(
    positions: Vec<DimmPosition>,
    channels_per_socket: u32,
) -> HwFactsResult<Vec<DimmPosition>> {
    if let Some((index, bad)) = positions
        .iter()
        .enumerate()
        .find(|(_, p)| p.channel >= channels_per_socket)
    {
        return Err(HwFactsError::InconsistentChannel {
            index,
            channel: bad.channel,
            channels_per_socket,
        });
    }
    Ok(positions)
}

// ===============================================================================================
// Channel scan
// ===============================================================================================

/// Infers channels for formats that only name socket and slot.
///
/// A new, higher socket restarts at channel 0; slot 0 on the same socket opens the next
/// channel. A channel stated by the locator replaces the inferred one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelScan {
    previous_socket: Option<u32>,
    channel: u32,
}

impl ChannelScan {
    pub fn advance(&mut self, tokens: LocatorTokens) -> DimmPosition {
        match self.previous_socket {
            None => self.channel = 0,
            Some(prev) if tokens.socket > prev => self.channel = 0,
            Some(prev) if tokens.socket == prev && tokens.slot == 0 => self.channel += 1,
            Some(_) => {}
        }
        if let Some(channel) = tokens.channel {
            self.channel = channel;
        }
        self.previous_socket = Some(tokens.socket);

        debug!(
            "socket {} slot {} -> channel {}",
            tokens.socket, tokens.slot, self.channel
        );
        DimmPosition::new(tokens.socket, self.channel, tokens.slot)
    }
}
