//! Consumption of the designator cross-reference table.
//!
//! Orbit products identify satellites with three-character designators
//! that are reused over time: the same code can denote different physical
//! satellites in different eras. The cross-reference table (built offline
//! from the antenna-calibration publications) maps a designator plus a
//! validity date range to the international identifier and a human
//! readable name, one fixed-column record per line:
//!
//! ```text
//! 48948 54756 G01 G032 1992-079A BLOCK IIA
//! 00000 99999 J01      2010-045A QZS-1 (MICHIBIKI)
//! ```
//!
//! This module only consumes the table; building it is out of scope.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use gnss::prelude::SV;
use hifitime::Epoch;
use log::debug;

use crate::error::Error;

/// One validity record of the cross-reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteInfo {
    /// First day of validity (MJD)
    pub valid_from_mjd: i64,
    /// Last day of validity (MJD)
    pub valid_until_mjd: i64,
    /// File-local designator
    pub sv: SV,
    /// Alternate (antenna-calibration) designator, when published
    pub alternate: Option<String>,
    /// International (COSPAR) identifier
    pub international_id: String,
    /// Catalog number, when published
    pub catalog_number: Option<u32>,
    /// Free-text name
    pub name: String,
}

/// Cross-designation lookup, loaded once and kept for the process
/// lifetime. Read-only.
#[derive(Debug, Default)]
pub struct NameTable {
    records: Vec<SatelliteInfo>,
}

impl NameTable {
    /// Loads a cross-reference table. Comment lines and unparsable
    /// records are skipped.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.starts_with('#') {
                continue;
            }
            if let Some(record) = parse_record(&line) {
                records.push(record);
            }
        }
        debug!("{}: {} cross-designation records", path.display(), records.len());
        Ok(Self { records })
    }

    /// Metadata for `sv` valid at `t`, by date-range containment.
    pub fn lookup(&self, sv: SV, t: Epoch) -> Option<&SatelliteInfo> {
        let mjd = t.to_mjd_utc_days().floor() as i64;
        self.records
            .iter()
            .find(|r| r.sv == sv && r.valid_from_mjd <= mjd && mjd <= r.valid_until_mjd)
    }

    /// Number of validity records loaded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no record was loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fixed columns: MJD range at 0..5 and 6..11, designator at 12..15,
/// alternate at 16..20 (possibly blank), international identifier at
/// 21..30, then an optional catalog number and the free-text name.
fn parse_record(line: &str) -> Option<SatelliteInfo> {
    let valid_from_mjd = line.get(0..5)?.trim().parse().ok()?;
    let valid_until_mjd = line.get(6..11)?.trim().parse().ok()?;
    let sv = SV::from_str(line.get(12..15)?.trim()).ok()?;
    let alternate = line
        .get(16..20)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let international_id = line.get(21..30)?.trim().to_string();

    let remainder = line.get(31..).unwrap_or("").trim();
    let (catalog_number, name) = match remainder.split_once(' ') {
        Some((first, rest))
            if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) =>
        {
            (first.parse().ok(), rest.trim().to_string())
        },
        _ => (None, remainder.to_string()),
    };

    Some(SatelliteInfo {
        valid_from_mjd,
        valid_until_mjd,
        sv,
        alternate,
        international_id,
        catalog_number,
        name,
    })
}
