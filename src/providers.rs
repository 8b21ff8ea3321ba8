//! Prioritized, date-gated resolution of tabulated orbit data.
//!
//! If possible, positions come from the rapid multi-GNSS combined
//! solution. Failing that, the final, rapid and 5-day-predicted
//! single-center solutions are tried in turn, the predicted one walking
//! backward day by day. Ultra-rapid 6-hourly files are the last resort:
//! combined with their two-day coverage, data for a step might sit in any
//! of eight of them.

use std::path::PathBuf;

use hifitime::Epoch;
use log::{debug, warn};

use crate::{
    cache::PositionCache,
    cfg::Config,
    constants::STEPS_PER_DAY,
    error::Error,
    fetch::Fetcher,
    parser,
    registry::DesignatorRegistry,
    table::PositionTable,
    time::Step,
};

/// First GPS week with rapid multi-GNSS combined solutions.
const COMBINED_START_WEEK: i64 = 1782;

/// Final solutions trail real time by roughly this many days.
const FINAL_LATENCY_DAYS: i64 = 11;

/// Rapid solutions stay at the provider root this many days back.
const RAPID_WINDOW_DAYS: i64 = 14;

/// Predicted files are walked back at most this many days.
const PREDICTED_LOOKBACK_DAYS: i64 = 5;

/// Ultra-rapid attempts bracketing the target across the 6-hourly grid.
const ULTRA_RAPID_ATTEMPTS: i64 = 8;

/// Requests beyond tomorrow are outside every provider's coverage.
const MAX_FUTURE_DAYS: i64 = 1;

pub(crate) struct SourceChain {
    fetcher: Fetcher,
    cache_dir: PathBuf,
    /// Last transport code produced, surfaced in coverage errors.
    last_code: i32,
}

impl SourceChain {
    /// Builds a new [SourceChain] from [Config].
    pub fn new(cfg: &Config) -> Self {
        Self {
            fetcher: Fetcher::new(cfg),
            cache_dir: cfg.cache_dir.clone(),
            last_code: 0,
        }
    }

    /// Tabulated positions for `step`. The cache is always consulted
    /// first; with `allow_network` unset nothing else is, which lets the
    /// engine sweep a whole window cache-only before downloading anything.
    pub fn resolve(
        &mut self,
        cache: &mut PositionCache,
        registry: &mut DesignatorRegistry,
        step: Step,
        allow_network: bool,
    ) -> Result<PositionTable, Error> {
        if let Some(table) = cache.lookup(step) {
            return Ok(table.clone());
        }
        if !allow_network {
            return Err(Error::Unresolved {
                step,
                code: self.last_code,
            });
        }

        let today = Epoch::now().map_err(|_| Error::SystemClock)?;
        let today_day = Step::containing(today).day_number();
        let day = step.day_number();
        let week = step.gps_week();
        let dow = step.day_of_week();
        let (year, doy) = step.year_doy();

        // rapid multi-GNSS combined solution, two mirrors
        if week >= COMBINED_START_WEEK && day <= today_day + MAX_FUTURE_DAYS {
            let name = format!("GBM0MGXRAP_{:04}{:03}0000_01D_05M_ORB.SP3.gz", year, doy);
            let urls = [
                format!(
                    "https://cddis.nasa.gov/archive/gnss/products/mgex/{}/{}",
                    week, name
                ),
                format!(
                    "https://ftp.gfz-potsdam.de/pub/GNSS/products/mgex/{}_IGS20/{}",
                    week, name
                ),
            ];
            if let Some(table) = self.try_candidate(cache, registry, step, &name, &urls)? {
                return Ok(table);
            }
        } else {
            debug!("step {}: outside combined-solution coverage", step);
        }

        // final solution, filed under its year directory
        if day + FINAL_LATENCY_DAYS <= today_day {
            let name = format!("COD{:04}{}.EPH.gz", week, dow);
            let urls = [format!("http://ftp.aiub.unibe.ch/CODE/{:04}/{}", year, name)];
            if let Some(table) = self.try_candidate(cache, registry, step, &name, &urls)? {
                return Ok(table);
            }
        }

        // rapid solution, kept at the provider root for a couple of weeks
        if day + RAPID_WINDOW_DAYS >= today_day && day <= today_day {
            let name = format!("COD{:04}{}.EPH_R", week, dow);
            let urls = [format!("http://ftp.aiub.unibe.ch/CODE/{}", name)];
            if let Some(table) = self.try_candidate(cache, registry, step, &name, &urls)? {
                return Ok(table);
            }
        }

        // 5-day predicted solution: walk back until one covers the step
        for back in 0..PREDICTED_LOOKBACK_DAYS {
            let base_day = day - back;
            if base_day > today_day {
                continue;
            }
            let name = format!("COD{:04}{}.EPH_5D", base_day / 7, base_day % 7);
            let urls = [format!("http://ftp.aiub.unibe.ch/CODE/{}", name)];
            if let Some(table) = self.try_candidate(cache, registry, step, &name, &urls)? {
                return Ok(table);
            }
        }

        // ultra-rapid 6-hourly files bracketing the target
        for i in 0..ULTRA_RAPID_ATTEMPTS {
            let probe = step + (i - 3) * (STEPS_PER_DAY / 4);
            if probe.day_number() > today_day + MAX_FUTURE_DAYS {
                continue;
            }
            let hour = (probe.hour_of_day() / 6) * 6;
            let (probe_year, probe_doy) = probe.year_doy();
            let name = format!(
                "IGS0OPSULT_{:04}{:03}{:02}00_02D_15M_ORB.SP3.gz",
                probe_year, probe_doy, hour
            );
            let urls = [format!(
                "https://cddis.nasa.gov/archive/gnss/products/{}/{}",
                probe.gps_week(),
                name
            )];
            if let Some(table) = self.try_candidate(cache, registry, step, &name, &urls)? {
                return Ok(table);
            }
        }

        Err(Error::Unresolved {
            step,
            code: self.last_code,
        })
    }

    /// Downloads one candidate file (unless an earlier invocation already
    /// left it on disk), parses it fully into the cache and re-consults
    /// the cache for `step`. Transport and data-shape problems are
    /// absorbed here; only registry exhaustion propagates.
    fn try_candidate(
        &mut self,
        cache: &mut PositionCache,
        registry: &mut DesignatorRegistry,
        step: Step,
        name: &str,
        urls: &[String],
    ) -> Result<Option<PositionTable>, Error> {
        let local = self.cache_dir.join(name.strip_suffix(".gz").unwrap_or(name));

        if !local.is_file() {
            let archive = self.cache_dir.join(name);
            for url in urls {
                debug!("step {}: trying {}", step, url);
                match self.fetcher.fetch(url, &archive, false) {
                    Ok(_) => break,
                    Err(e) => self.last_code = e.code(),
                }
            }
        }
        if !local.is_file() {
            return Ok(None);
        }

        match parser::load_into_cache(&local, cache, registry) {
            Ok(_) => {},
            Err(e @ Error::DesignatorCapacity(_)) => return Err(e),
            Err(e) => warn!("{}: {}", local.display(), e),
        }
        Ok(cache.lookup(step).cloned())
    }
}
