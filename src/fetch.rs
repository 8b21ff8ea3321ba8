//! Remote orbit file retrieval, with failure memoization.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use flate2::read::GzDecoder;
use hifitime::Epoch;
use log::{debug, warn};
use thiserror::Error;

use crate::cfg::Config;

/// Failure records accumulate here, next to the downloaded files.
pub(crate) const FAILURE_LOG_NAME: &str = "fetch_failures.txt";

/// A log line starting with this prefix updates the retry-wait window for
/// every line after it, instead of recording a failure.
const WAIT_DIRECTIVE: &str = "wait";

/// Transport failures never cross the engine boundary: the provider chain
/// simply moves on to its next candidate. Each variant carries a stable
/// numeric code for the failure log.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum FetchError {
    /// Body was too small to be orbit data: an error page.
    #[error("download too small ({0} bytes)")]
    TooSmall(u64),

    /// Destination file could not be created or written.
    #[error("could not write destination file")]
    Destination,

    /// Transfer failed or timed out.
    #[error("transfer failed")]
    Transfer,

    /// Sustained rate fell below the configured floor after the grace
    /// period: the server was trickling bytes.
    #[error("transfer stalled")]
    Stalled,

    /// Archive could not be decompressed.
    #[error("decompression failed")]
    Decompression,

    /// The same URL failed recently: attempt skipped, memoized code
    /// returned without touching the network.
    #[error("url failed recently (code {0}), attempt suppressed")]
    Suppressed(i32),
}

impl FetchError {
    /// Stable code recorded in the failure log.
    pub fn code(&self) -> i32 {
        match self {
            Self::TooSmall(_) => -1,
            Self::Destination => -2,
            Self::Transfer => -3,
            Self::Stalled => -4,
            Self::Decompression => -5,
            Self::Suppressed(code) => *code,
        }
    }
}

/// Current unix time, in whole seconds. A clock failure disables failure
/// memoization rather than aborting the fetch.
fn unix_now() -> i64 {
    Epoch::now().map(|t| t.to_unix_seconds() as i64).unwrap_or(0)
}

/// Append-only record of failed fetches, consulted before every attempt:
/// this is what keeps a provider outage from being hammered with retries.
#[derive(Debug, Clone)]
pub(crate) struct FailureLog {
    path: PathBuf,
    default_wait_s: u64,
}

impl FailureLog {
    /// New [FailureLog] stored at `path`.
    pub fn new(path: PathBuf, default_wait_s: u64) -> Self {
        Self {
            path,
            default_wait_s,
        }
    }

    /// Code of a failure for `url` still within the retry-wait window, if
    /// any. `wait` directives encountered while scanning adjust the window
    /// for the lines that follow them.
    pub fn recent_failure(&self, url: &str, now_unix_s: i64) -> Option<i32> {
        let file = File::open(&self.path).ok()?;
        let mut wait = self.default_wait_s as i64;
        let mut memoized = None;

        for line in BufReader::new(file).lines() {
            let Ok(line) = line else {
                break;
            };
            if let Some(directive) = line.strip_prefix(WAIT_DIRECTIVE) {
                if let Ok(seconds) = directive.trim().parse::<i64>() {
                    wait = seconds;
                }
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(stamp), Some(code), Some(failed_url)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            let (Ok(stamp), Ok(code)) = (stamp.parse::<i64>(), code.parse::<i32>()) else {
                continue;
            };
            if failed_url == url && now_unix_s - stamp < wait {
                memoized = Some(code);
            }
        }
        memoized
    }

    /// Append one failure record.
    pub fn record(&self, url: &str, code: i32, now_unix_s: i64) {
        let entry = format!("{:>13} {:>5} {}\n", now_unix_s, code, url);
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut file) => {
                let _ = file.write_all(entry.as_bytes());
            },
            Err(e) => warn!("could not record failure for {}: {}", url, e),
        }
    }
}

/// Blocking downloader. Bounds every transfer with a connect timeout, an
/// absolute timeout and a minimum sustained rate, sanity-checks the final
/// size, gunzips `.gz` payloads in place, and memoizes failures.
pub(crate) struct Fetcher {
    agent: ureq::Agent,
    log: FailureLog,
    min_file_size: u64,
    min_rate: u64,
    grace: Duration,
}

impl Fetcher {
    /// Builds a new [Fetcher] from [Config].
    pub fn new(cfg: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(cfg.connect_timeout_s))
            .timeout(Duration::from_secs(cfg.transfer_timeout_s))
            .build();
        Self {
            agent,
            log: FailureLog::new(cfg.cache_dir.join(FAILURE_LOG_NAME), cfg.retry_wait_s),
            min_file_size: cfg.min_file_size,
            min_rate: cfg.min_transfer_rate,
            grace: Duration::from_secs(cfg.rate_grace_s),
        }
    }

    /// Download `url` into `destination`, appending instead of truncating
    /// when `append` is set. Returns the number of body bytes written. On
    /// failure any partial output is deleted and the failure is logged;
    /// a URL that failed recently is skipped outright.
    pub fn fetch(&self, url: &str, destination: &Path, append: bool) -> Result<u64, FetchError> {
        let now = unix_now();
        if let Some(code) = self.log.recent_failure(url, now) {
            debug!("skipping {}: failed with code {} within retry window", url, code);
            return Err(FetchError::Suppressed(code));
        }
        match self.attempt(url, destination, append) {
            Ok(written) => {
                debug!("downloaded {}: {} bytes", url, written);
                Ok(written)
            },
            Err(e) => {
                let _ = fs::remove_file(destination);
                self.log.record(url, e.code(), now);
                warn!("fetch {} failed: {}", url, e);
                Err(e)
            },
        }
    }

    fn attempt(&self, url: &str, destination: &Path, append: bool) -> Result<u64, FetchError> {
        let response = self.agent.get(url).call().map_err(|e| {
            debug!("{}: {}", url, e);
            FetchError::Transfer
        })?;

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let mut file = options.open(destination).map_err(|_| FetchError::Destination)?;

        let mut reader = response.into_reader();
        let mut buffer = [0u8; 16 * 1024];
        let mut written = 0u64;
        let started = Instant::now();

        loop {
            let read = reader.read(&mut buffer).map_err(|_| FetchError::Transfer)?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read]).map_err(|_| FetchError::Destination)?;
            written += read as u64;

            let elapsed = started.elapsed();
            if elapsed > self.grace
                && (written as f64) < self.min_rate as f64 * elapsed.as_secs_f64()
            {
                return Err(FetchError::Stalled);
            }
        }

        if written < self.min_file_size {
            // just got an error message
            return Err(FetchError::TooSmall(written));
        }
        if destination.extension().is_some_and(|ext| ext == "gz") {
            decompress(destination)?;
        }
        Ok(written)
    }
}

/// Gunzip `path` next to itself, leaving the decompressed file at the
/// stem and removing the archive.
pub(crate) fn decompress(path: &Path) -> Result<(), FetchError> {
    let target = path.with_extension("");
    let copied = (|| -> io::Result<u64> {
        let mut decoder = GzDecoder::new(File::open(path)?);
        let mut output = File::create(&target)?;
        io::copy(&mut decoder, &mut output)
    })();
    match copied {
        Ok(bytes) => {
            debug!("decompressed {}: {} bytes", target.display(), bytes);
            let _ = fs::remove_file(path);
            Ok(())
        },
        Err(e) => {
            debug!("gunzip {} failed: {}", path.display(), e);
            let _ = fs::remove_file(&target);
            Err(FetchError::Decompression)
        },
    }
}
