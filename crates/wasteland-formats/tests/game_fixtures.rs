//! Integration tests against the shipped game archives.
//!
//! These tests load `GAME1` and `GAME2` from `test_fixtures/` and check that
//! every block parses, every map block decodes with the default layout, and
//! the archive re-encodes byte for byte.
//!
//! The archives are not redistributable. To run the tests, copy them from a
//! Wasteland installation to `crates/wasteland-formats/test_fixtures/`.
//!
//! If no fixture files are present, the tests are skipped.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use wasteland_formats::decode_archive;
use wasteland_formats::layout::GameLayout;
use wasteland_formats::msq::{encode_archive, parse_archive};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn load(name: &str) -> Option<Vec<u8>> {
    let path = fixture_dir().join(name);
    if !path.exists() {
        eprintln!("SKIPPED: no {name} fixture in {}", fixture_dir().display());
        return None;
    }
    Some(std::fs::read(&path).unwrap())
}

fn check_archive(name: &str, game_index: u8) {
    init_tracing();
    let Some(data) = load(name) else {
        return;
    };

    let layout = GameLayout::default();
    let archive = layout.archive(game_index).unwrap();

    let blocks = parse_archive(&data, archive.map_block_count)
        .unwrap_or_else(|e| panic!("{name}: parse failed: {e}"));
    assert!(blocks.len() >= archive.map_block_count);
    for block in &blocks {
        assert_eq!(block.header.game_index, game_index);
        assert_eq!(block.header.seeds(), block.body.seeds());
    }

    let rebuilt = encode_archive(&blocks).unwrap();
    assert_eq!(rebuilt.len(), data.len(), "{name}: length changed");
    assert!(rebuilt == data, "{name}: re-encoded bytes differ");

    let decoded = decode_archive(&data, archive).unwrap_or_else(|e| panic!("{name}: decode failed: {e}"));
    assert_eq!(decoded.maps.len(), archive.map_block_count);
    for (i, map) in decoded.maps.iter().enumerate() {
        assert_eq!(
            map.map_tiles().len(),
            archive.map_dims[i].tiles_len(),
            "{name}: block {i}"
        );
        map.strings
            .decompress_all()
            .unwrap_or_else(|e| panic!("{name}: block {i}: {e}"));
    }
}

#[test]
fn game1_fixture_round_trip() {
    check_archive("GAME1", 0);
}

#[test]
fn game2_fixture_round_trip() {
    check_archive("GAME2", 1);
}
