use crate::dimm::{DimmPosition, DimmRecord};
use log::warn;
use std::collections::HashSet;

/// Leading number and unit of a size field, e.g. `"32 GB"` -> `(32, "GB")`.
fn split_size(size: &str) -> Option<(u64, &str)> {
    let size = size.trim_start();
    let digits_end = size
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(size.len());
    if digits_end == 0 {
        return None;
    }
    let amount = match size[..digits_end].parse() {
        Ok(n) => n,
        Err(e) => {
            warn!("Don't recognize DIMM size format {size:?}: {e}");
            return None;
        }
    };
    let rest = size[digits_end..].trim_start();
    let unit_end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    Some((amount, &rest[..unit_end]))
}

/// One line per distinct (type, size, speed, configured speed), in first-seen order.
///
/// e.g. `"256GB (8x32GB DDR5 4800MT/s [4400MT/s])"`. Empty slots, whose size carries no
/// number, are left out. Groups are joined by `"; "`.
#[must_use]
pub fn installed_memory(records: &[DimmRecord]) -> String {
    let mut groups: Vec<(&DimmRecord, u64)> = Vec::new();
    for dimm in records {
        let same_kind = |seen: &DimmRecord| {
            seen.mem_type == dimm.mem_type
                && seen.size == dimm.size
                && seen.speed == dimm.speed
                && seen.configured_speed == dimm.configured_speed
        };
        match groups.iter_mut().find(|(seen, _)| same_kind(*seen)) {
            Some((_, count)) => *count += 1,
            None => groups.push((dimm, 1)),
        }
    }

    groups
        .into_iter()
        .filter_map(|(dimm, count)| {
            let (size, unit) = split_size(&dimm.size)?;
            let Some(total) = count.checked_mul(size) else {
                warn!("{count} x {:?} overflows the installed memory total", dimm.size);
                return None;
            };
            Some(format!(
                "{total}{unit} ({count}x{size}{unit} {kind} {speed} [{configured}])",
                kind = dimm.mem_type,
                speed = dimm.speed.replace(' ', ""),
                configured = dimm.configured_speed.replace(' ', ""),
            ))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Number of distinct (socket, channel) pairs holding at least one installed DIMM.
///
/// `None` when `positions` does not line up with `records`, or nothing is installed.
#[must_use]
pub fn populated_channels(records: &[DimmRecord], positions: &[DimmPosition]) -> Option<usize> {
    if records.len() != positions.len() {
        warn!(
            "{} DIMM positions for {} DIMM records",
            positions.len(),
            records.len()
        );
        return None;
    }

    let channels: HashSet<(u32, u32)> = records
        .iter()
        .zip(positions)
        .filter(|(dimm, _)| !dimm.size.contains("No"))
        .map(|(_, p)| (p.socket, p.channel))
        .collect();

    (!channels.is_empty()).then_some(channels.len())
}
