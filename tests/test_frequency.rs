use fixtures::*;

use hwfacts::freq::consolidated::{
    encode_ratio_limits, expand_consolidated_frequencies, package_bucket_sizes,
};
use hwfacts::freq::{
    FrequencyBucketTable, all_core_max_frequency, consolidate_frequencies,
    expand_turbo_frequencies, max_frequency,
};
use hwfacts::utils::{decode_hex_vector, encode_hex_vector};
use hwfacts::{CoreRange, HwFactsError};
use pretty_assertions::assert_eq;

const SPR_SSE_HEX: &str = "0x1f20212223242526";

#[test]
fn test_hex_vector_order() {
    ensure_env_logger_initialized();
    assert_eq!(
        decode_hex_vector("0102030405060708").unwrap(),
        vec![8, 7, 6, 5, 4, 3, 2, 1]
    );
    assert_eq!(
        decode_hex_vector("0807060504030201").unwrap(),
        vec![1, 2, 3, 4, 5, 6, 7, 8]
    );
    assert_eq!(
        encode_hex_vector(&decode_hex_vector(SPR_SSE_HEX).unwrap()),
        SPR_SSE_HEX
    );
}

#[test]
fn test_spr_snapshot() {
    ensure_env_logger_initialized();
    let table = FrequencyBucketTable::from_dump(&spr_frequency_dump(), "SPR_XCC").unwrap();

    assert_eq!(table.multiplier, 1);
    assert_eq!(table.isas, vec!["SSE", "AVX2", "AVX512", "AMX"]);
    assert_eq!(table.package_ranges(), table.die_ranges());

    let rows = table.to_rows();
    assert_eq!(rows[0], vec!["Cores", "SSE", "AVX2", "AVX512", "AMX"]);
    assert_eq!(rows[1], vec!["1-28", "3.8", "3.6", "3.4", "3.2"]);
    assert_eq!(rows[8], vec!["53-56", "3.1", "2.9", "2.7", "2.5"]);

    let sse = expand_turbo_frequencies(&rows, "SSE").unwrap();
    assert_eq!(sse.len(), 56);
    assert_eq!(sse[0], "3.8");
    assert_eq!(sse[27], "3.8");
    assert_eq!(sse[28], "3.7");
    assert_eq!(sse[55], "3.1");

    assert_eq!(max_frequency(&rows), Some("3.8GHz".to_string()));
    assert_eq!(all_core_max_frequency(&rows), Some("3.1GHz".to_string()));

    assert_eq!(
        expand_turbo_frequencies(&rows, "AVX512H"),
        Err(HwFactsError::UnknownIsa("AVX512H".to_string()))
    );
}

#[test]
fn test_gnr_snapshot_truncates_padding() {
    ensure_env_logger_initialized();
    let table = FrequencyBucketTable::from_dump(&gnr_frequency_dump(), "GNR_X2").unwrap();

    assert_eq!(table.multiplier, 2);
    assert_eq!(
        table.package_ranges(),
        vec![
            CoreRange { start: 1, end: 40 },
            CoreRange { start: 41, end: 80 },
            CoreRange { start: 81, end: 86 },
        ]
    );

    let rows = table.to_rows();
    assert_eq!(rows[0], vec!["Cores", "Cores per Die", "SSE", "AVX2"]);
    assert_eq!(rows[3], vec!["81-86", "41-43", "3.2", "3.0"]);

    // Expansion always keys on the package-level column.
    assert_eq!(expand_turbo_frequencies(&rows, "sse").unwrap().len(), 86);
    assert_eq!(
        consolidate_frequencies(&rows, "SSE").unwrap(),
        "1-40/3.6, 41-80/3.4, 81-86/3.2"
    );
}

#[test]
fn test_consolidated_round_trip_to_register() {
    ensure_env_logger_initialized();
    let table = FrequencyBucketTable::from_dump(&spr_frequency_dump(), "SPR_XCC").unwrap();
    let consolidated = consolidate_frequencies(&table.to_rows(), "SSE").unwrap();
    assert_eq!(
        consolidated,
        "1-28/3.8, 29-32/3.7, 33-36/3.6, 37-40/3.5, 41-44/3.4, 45-48/3.3, 49-52/3.2, 53-56/3.1"
    );

    let sizes = package_bucket_sizes("0x3834302c2824201c", "SPR_XCC").unwrap();
    let freqs = expand_consolidated_frequencies(&consolidated, &sizes).unwrap();
    let register = encode_ratio_limits(&freqs).unwrap();
    assert_eq!(register, 0x1f20_2122_2324_2526);
}

#[test]
fn test_bucket_serialization_shape() {
    let table = FrequencyBucketTable::from_dump(&gnr_frequency_dump(), "GNR_X2").unwrap();
    let json = serde_json::to_value(&table.buckets[0]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "cores": {"start": 1, "end": 40},
            "die_cores": {"start": 1, "end": 20},
            "frequencies": [
                {"isa": "SSE", "ghz": 3.6},
                {"isa": "AVX2", "ghz": 3.4},
            ],
        })
    );
}

#[test]
fn test_single_core_bucket_survives_consolidation() {
    ensure_env_logger_initialized();
    let rows = vec![
        vec!["Cores", "SSE"],
        vec!["1-20", "3.5"],
        vec!["21-21", "3.2"],
    ];
    let consolidated = consolidate_frequencies(&rows, "SSE").unwrap();
    assert_eq!(consolidated, "1-20/3.5, 21/3.2");

    let freqs =
        expand_consolidated_frequencies(&consolidated, &[20, 21, 21, 21, 21, 21, 21, 21]).unwrap();
    assert_eq!(freqs, vec![3.5, 3.2, 3.2, 3.2, 3.2, 3.2, 3.2, 3.2]);
    assert_eq!(encode_ratio_limits(&freqs).unwrap(), 0x2020_2020_2020_2023);
}
