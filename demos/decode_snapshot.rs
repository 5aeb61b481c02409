use hwfacts::config::uarch_from_env;
use hwfacts::dimm::{PlatformVendor, classify, installed_memory, populated_channels};
use hwfacts::freq::arch::find_isa;
use hwfacts::freq::{
    FrequencyBucketTable, all_core_max_frequency, consolidate_frequencies, max_frequency,
};
use hwfacts::{DimmRecord, HwFactsResult, MemoryLayout, resolve_dimm_positions};

const FREQ_DUMP: &str = include_str!("../samples/freq_gnr_x2.txt");
const DIMM_LISTING: &str = include_str!("../samples/dimms_icx_sdp.psv");

fn parse_listing(text: &str) -> HwFactsResult<Vec<DimmRecord>> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|line| DimmRecord::from_fields(&line.split('|').collect::<Vec<_>>()))
        .collect()
}

fn main() -> HwFactsResult<()> {
    env_logger::init();

    println!("============================================================");
    println!("                 Hardware Facts - Snapshot                  ");
    println!("============================================================");

    // 1. Turbo buckets
    let uarch = uarch_from_env("GNR_X2");
    println!("[+] Decoding turbo buckets for {uarch}...");
    let table = match FrequencyBucketTable::from_dump(FREQ_DUMP, &uarch) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("[-] Failed to decode frequency dump: {e}");
            return Err(e);
        }
    };
    println!("    Dies per package: {}", table.multiplier);
    for isa in &table.isas {
        let full_name = find_isa(isa).map_or("unknown", |info| info.full_name);
        println!("    ISA:              {isa} ({full_name})");
    }

    let rows = table.to_rows();
    println!();
    for row in &rows {
        let cells: Vec<String> = row.iter().map(|c| format!("{c:>14}")).collect();
        println!("   {}", cells.join(""));
    }
    println!();
    println!(
        "    Max Frequency:          {}",
        max_frequency(&rows).unwrap_or_default()
    );
    println!(
        "    All-Core Max Frequency: {}",
        all_core_max_frequency(&rows).unwrap_or_default()
    );
    println!(
        "    Consolidated (SSE):     {}",
        consolidate_frequencies(&rows, "SSE")?
    );

    // 2. DIMM positions
    println!("\n[+] Resolving DIMM positions...");
    let dimms = parse_listing(DIMM_LISTING)?;
    let layout = MemoryLayout::new(8, 2, "Intel Corporation").with_env_overrides();
    println!(
        "    Layout:        {} sockets x {} channels ({})",
        layout.sockets, layout.channels_per_socket, layout.vendor
    );
    match PlatformVendor::identify(&layout.vendor) {
        Some(vendor) => println!("    Numbering:     {} closed form", vendor.name()),
        None => println!("    Dialect:       {:?}", classify(&dimms[0])?),
    }

    let positions = match resolve_dimm_positions(&dimms, &layout) {
        Ok(positions) => positions,
        Err(e) => {
            eprintln!("[-] Failed to resolve DIMM positions: {e}");
            return Err(e);
        }
    };

    println!("\n------------------------------------------------------------");
    println!(" {:<16} {:<16} {:>6} {:>8} {:>5}", "Bank", "Locator", "Socket", "Channel", "Slot");
    println!("------------------------------------------------------------");
    for (dimm, pos) in dimms.iter().zip(&positions) {
        println!(
            " {:<16} {:<16} {:>6} {:>8} {:>5}",
            dimm.bank_locator, dimm.locator, pos.socket, pos.channel, pos.slot
        );
    }

    println!("\n[+] Installed Memory:  {}", installed_memory(&dimms));
    match populated_channels(&dimms, &positions) {
        Some(n) => println!("[+] Populated Channels: {n}"),
        None => println!("[-] Populated Channels: unknown"),
    }

    Ok(())
}
