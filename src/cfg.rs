use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::Deserialize;

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_retry_wait() -> u64 {
    360
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_transfer_timeout() -> u64 {
    120
}

fn default_min_rate() -> u64 {
    512
}

fn default_rate_grace() -> u64 {
    5
}

fn default_min_file_size() -> u64 {
    500
}

fn default_cache_capacity() -> usize {
    1000
}

/// [Resolver] parametrization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Directory holding downloaded orbit files and the failure log.
    #[cfg_attr(feature = "serde", serde(default = "default_cache_dir"))]
    pub cache_dir: PathBuf,

    /// Do not retry a failed URL within this many seconds. The failure log
    /// itself may override this with a `wait` directive.
    #[cfg_attr(feature = "serde", serde(default = "default_retry_wait"))]
    pub retry_wait_s: u64,

    /// Connect timeout for any single fetch, in seconds.
    #[cfg_attr(feature = "serde", serde(default = "default_connect_timeout"))]
    pub connect_timeout_s: u64,

    /// Absolute bound on any single transfer, in seconds.
    #[cfg_attr(feature = "serde", serde(default = "default_transfer_timeout"))]
    pub transfer_timeout_s: u64,

    /// Minimum sustained transfer rate in bytes per second. A server
    /// trickling bytes below this is aborted rather than waited out.
    #[cfg_attr(feature = "serde", serde(default = "default_min_rate"))]
    pub min_transfer_rate: u64,

    /// Grace period before the rate check applies, in seconds.
    #[cfg_attr(feature = "serde", serde(default = "default_rate_grace"))]
    pub rate_grace_s: u64,

    /// Downloads smaller than this many bytes are provider error pages,
    /// not orbit data, and are discarded.
    #[cfg_attr(feature = "serde", serde(default = "default_min_file_size"))]
    pub min_file_size: u64,

    /// Tabulated steps kept in memory.
    #[cfg_attr(feature = "serde", serde(default = "default_cache_capacity"))]
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            retry_wait_s: default_retry_wait(),
            connect_timeout_s: default_connect_timeout(),
            transfer_timeout_s: default_transfer_timeout(),
            min_transfer_rate: default_min_rate(),
            rate_grace_s: default_rate_grace(),
            min_file_size: default_min_file_size(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Config {
    /// Returns [Config] with updated storage directory.
    pub fn with_cache_dir(&self, dir: impl Into<PathBuf>) -> Self {
        let mut s = self.clone();
        s.cache_dir = dir.into();
        s
    }

    /// Returns [Config] with updated retry-wait window.
    pub fn with_retry_wait(&self, seconds: u64) -> Self {
        let mut s = self.clone();
        s.retry_wait_s = seconds;
        s
    }

    /// Returns [Config] with updated cache capacity.
    pub fn with_cache_capacity(&self, capacity: usize) -> Self {
        let mut s = self.clone();
        s.cache_capacity = capacity;
        s
    }
}
