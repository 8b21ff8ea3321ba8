use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use gnss::prelude::SV;
use nalgebra::Vector3;

use crate::{
    cache::PositionCache,
    error::Error,
    parser::load_into_cache,
    registry::DesignatorRegistry,
    tests::{five_minute_file, init_logger, ten_step_file, FIXTURE_START_STEP},
    time::Step,
};

fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn ten_step_file_fills_cache() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "tenstep.sp3", &ten_step_file());

    let mut cache = PositionCache::new(1000);
    let mut registry = DesignatorRegistry::default();
    let inserted = load_into_cache(&path, &mut cache, &mut registry).unwrap();
    assert_eq!(inserted, 10);

    // designators in first-seen order
    for (index, desig) in [(0, "G01"), (1, "G02"), (2, "G03"), (3, "R05")] {
        assert_eq!(registry.designator_of(index), Some(SV::from_str(desig).unwrap()));
    }

    for k in 0..10 {
        let table = cache.lookup(Step(FIXTURE_START_STEP + k)).unwrap();
        assert_eq!(table.sample(0), Some(Vector3::new(7000.0, 0.0, 0.0)));
        assert_eq!(
            table.sample(1),
            Some(Vector3::new(15_000.0, 100.0 * k as f64, 3000.0))
        );
        if k == 5 {
            // published as the all-zero marker: no data
            assert_eq!(table.sample(2), None);
        } else {
            assert_eq!(table.sample(2), Some(Vector3::new(12_000.0, 5000.0, 6000.0)));
        }
        // R05 is registered but never carries data
        assert_eq!(table.sample(3), None);
    }
    assert!(!cache.contains(Step(FIXTURE_START_STEP + 10)));
}

#[test]
fn reload_inserts_nothing_new() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "tenstep.sp3", &ten_step_file());

    let mut cache = PositionCache::new(1000);
    let mut registry = DesignatorRegistry::default();
    assert_eq!(load_into_cache(&path, &mut cache, &mut registry).unwrap(), 10);
    assert_eq!(load_into_cache(&path, &mut cache, &mut registry).unwrap(), 0);
    assert_eq!(cache.len(), 10);
    assert_eq!(registry.len(), 4);
}

#[test]
fn five_minute_cadence_realigns_to_grid() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "fivemin.sp3", &five_minute_file());

    let mut cache = PositionCache::new(1000);
    let mut registry = DesignatorRegistry::default();
    let inserted = load_into_cache(&path, &mut cache, &mut registry).unwrap();
    assert_eq!(inserted, 3);

    // step k carries record 3k: two of every three records are dropped
    for (k, record) in [(0, 1.0), (1, 4.0), (2, 7.0)] {
        let table = cache.lookup(Step(FIXTURE_START_STEP + k)).unwrap();
        assert_eq!(
            table.sample(0),
            Some(Vector3::new(1000.0 * record, 0.0, 20_000.0))
        );
    }
    assert!(!cache.contains(Step(FIXTURE_START_STEP + 3)));
}

#[test]
fn malformed_header_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "broken.sp3", "#dP2015\njunk\n* \nPG01 1.0 2.0 3.0\n");

    let mut cache = PositionCache::new(1000);
    let mut registry = DesignatorRegistry::default();
    let result = load_into_cache(&path, &mut cache, &mut registry);
    assert!(matches!(result, Err(Error::MalformedHeader)));
    assert_eq!(cache.len(), 0);
}

#[test]
fn unexpected_cadence_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let content = "\
#dP2015  2 10  0  0  0.00000000      10 ORBIT IGb08 HLM  IGS
## 1831 172800.00000000   600.00000000 57063 0.0000000000000
*  2015  2 10  0  0  0.00000000
PG01   7000.000000      0.000000      0.000000
EOF
";
    let path = write_fixture(&dir, "cadence.sp3", content);

    let mut cache = PositionCache::new(1000);
    let mut registry = DesignatorRegistry::default();
    let result = load_into_cache(&path, &mut cache, &mut registry);
    assert!(matches!(result, Err(Error::UnexpectedCadence(600))));
}

#[test]
fn start_before_system_start_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let content = "\
#dP1975  1  1  0  0  0.00000000      10 ORBIT IGb08 HLM  IGS
## 0000      0.00000000   900.00000000 42413 0.0000000000000
*  1975  1  1  0  0  0.00000000
EOF
";
    let path = write_fixture(&dir, "early.sp3", content);

    let mut cache = PositionCache::new(1000);
    let mut registry = DesignatorRegistry::default();
    let result = load_into_cache(&path, &mut cache, &mut registry);
    assert!(matches!(result, Err(Error::BadStartStep(_))));
}

#[test]
fn malformed_position_lines_leave_slots_empty() {
    let dir = tempfile::tempdir().unwrap();
    let content = "\
#dP2015  2 10  0  0  0.00000000      10 ORBIT IGb08 HLM  IGS
## 1831 172800.00000000   900.00000000 57063 0.0000000000000
*  2015  2 10  0  0  0.00000000
PG01   7000.000000      0.000000      0.000000
PG02   not-a-number    12.0           13.0
PG03   8000.0
PX99   9000.000000   1000.000000   2000.000000
EOF
";
    let path = write_fixture(&dir, "ragged.sp3", content);

    let mut cache = PositionCache::new(1000);
    let mut registry = DesignatorRegistry::default();
    assert_eq!(load_into_cache(&path, &mut cache, &mut registry).unwrap(), 1);

    let table = cache.lookup(Step(FIXTURE_START_STEP)).unwrap();
    assert_eq!(table.sample(0), Some(Vector3::new(7000.0, 0.0, 0.0)));
    // unparsable coordinates and truncated lines stay empty
    assert_eq!(table.sample(1), None);
    assert_eq!(table.sample(2), None);
    // unknown designator syntax is skipped without registering
    assert_eq!(registry.len(), 3);
}
