use std::fs;
use std::io::Write;

use flate2::{write::GzEncoder, Compression};
use hifitime::Epoch;

use crate::{
    cfg::Config,
    fetch::{decompress, FailureLog, FetchError, Fetcher, FAILURE_LOG_NAME},
    tests::init_logger,
};

const URL: &str = "https://127.0.0.1:1/products/orbit.sp3.gz";

fn unix_now() -> i64 {
    Epoch::now().unwrap().to_unix_seconds() as i64
}

#[test]
fn failure_is_memoized_within_window() {
    let dir = tempfile::tempdir().unwrap();
    let log = FailureLog::new(dir.path().join(FAILURE_LOG_NAME), 360);

    log.record(URL, -3, 1000);
    assert_eq!(log.recent_failure(URL, 1200), Some(-3));
    // window closes at exactly retry-wait seconds
    assert_eq!(log.recent_failure(URL, 1360), None);
    // other urls are unaffected
    assert_eq!(log.recent_failure("https://127.0.0.1:1/other", 1200), None);
}

#[test]
fn wait_directive_updates_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(FAILURE_LOG_NAME);
    let log = FailureLog::new(path.clone(), 360);

    // a directive shrinks the window for the lines after it
    let content = format!("wait 60\n{:>13} {:>5} {}\n", 1000, -4, URL);
    fs::write(&path, content).unwrap();
    assert_eq!(log.recent_failure(URL, 1059), Some(-4));
    assert_eq!(log.recent_failure(URL, 1061), None);

    // and can widen it far beyond the default
    let content = format!("wait 7200\n{:>13} {:>5} {}\n", 1000, -1, URL);
    fs::write(&path, content).unwrap();
    assert_eq!(log.recent_failure(URL, 5000), Some(-1));
}

#[test]
fn second_attempt_within_window_never_touches_network() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::default().with_cache_dir(dir.path());
    let fetcher = Fetcher::new(&cfg);

    let log = FailureLog::new(dir.path().join(FAILURE_LOG_NAME), cfg.retry_wait_s);
    log.record(URL, -3, unix_now());

    // suppressed before any socket is opened: an unroutable URL would
    // otherwise produce a transfer error, not the memoized code
    let destination = dir.path().join("orbit.sp3.gz");
    let result = fetcher.fetch(URL, &destination, false);
    assert_eq!(result, Err(FetchError::Suppressed(-3)));
    assert!(!destination.exists());
}

#[test]
fn gunzip_leaves_decompressed_file_at_stem() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("orbit.sp3.gz");

    let mut encoder = GzEncoder::new(fs::File::create(&archive).unwrap(), Compression::default());
    encoder.write_all(b"synthetic orbit payload").unwrap();
    encoder.finish().unwrap();

    decompress(&archive).unwrap();
    assert!(!archive.exists());
    assert_eq!(
        fs::read(dir.path().join("orbit.sp3")).unwrap(),
        b"synthetic orbit payload"
    );
}

#[test]
fn corrupt_archive_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("orbit.sp3.gz");
    fs::write(&archive, b"this is not gzip data").unwrap();

    assert_eq!(decompress(&archive), Err(FetchError::Decompression));
    assert!(!dir.path().join("orbit.sp3").exists());
}
