//! Tabulated orbit file parsing.
//!
//! Files carry a two-line header followed by repeating blocks: a sentinel
//! line (first character `*`) opening one time step, then one line per
//! satellite (first character `P`, designator at offset 1, three
//! fixed-field coordinates in kilometers from offset 4).

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::str::FromStr;

use gnss::prelude::SV;
use log::debug;
use nalgebra::Vector3;

use crate::{
    cache::PositionCache,
    constants::{GPS_SYSTEM_START_MJD, STEPS_PER_DAY},
    error::Error,
    registry::DesignatorRegistry,
    table::PositionTable,
    time::Step,
};

/// Line reader that can hand a record marker back without committing the
/// read, so repeated step reads stay synchronized on block boundaries.
struct RecordReader<R: BufRead> {
    lines: Lines<R>,
    pushed_back: Option<String>,
}

impl<R: BufRead> RecordReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            pushed_back: None,
        }
    }

    fn next_line(&mut self) -> Option<String> {
        if let Some(line) = self.pushed_back.take() {
            return Some(line);
        }
        self.lines.next()?.ok()
    }

    fn push_back(&mut self, line: String) {
        self.pushed_back = Some(line);
    }
}

struct Header {
    start: Step,
    cadence_s: i64,
}

/// Fixed fields of interest all sit on the second header line: cadence in
/// seconds at bytes 24..38, start time as MJD at 39..44 plus fractional
/// day at 45..60.
fn parse_header(line: &str) -> Result<Header, Error> {
    let cadence_s = fixed_field(line, 24, 38)?
        .parse::<f64>()
        .map_err(|_| Error::MalformedHeader)? as i64;
    if cadence_s != 300 && cadence_s != 900 {
        return Err(Error::UnexpectedCadence(cadence_s));
    }

    let mjd = fixed_field(line, 39, 44)?
        .parse::<f64>()
        .map_err(|_| Error::MalformedHeader)?;
    let day_fraction = fixed_field(line, 45, 60)?
        .parse::<f64>()
        .map_err(|_| Error::MalformedHeader)?;

    let start =
        ((mjd + day_fraction - GPS_SYSTEM_START_MJD) * STEPS_PER_DAY as f64 + 1.0e-4).floor() as i64;
    if start <= 0 {
        return Err(Error::BadStartStep(start));
    }

    Ok(Header {
        start: Step(start),
        cadence_s,
    })
}

fn fixed_field(line: &str, from: usize, to: usize) -> Result<&str, Error> {
    let end = to.min(line.len());
    line.get(from..end).map(str::trim).ok_or(Error::MalformedHeader)
}

/// Reads one tabulated step: scans forward to the next `*` sentinel, then
/// consumes consecutive `P` lines. The first differently-marked line is
/// pushed back so the next call starts exactly on the following block.
/// Returns `None` once no sentinel remains.
fn read_step<R: BufRead>(
    reader: &mut RecordReader<R>,
    registry: &mut DesignatorRegistry,
    collect: bool,
) -> Result<Option<PositionTable>, Error> {
    while let Some(line) = reader.next_line() {
        if !line.starts_with('*') {
            continue;
        }
        let mut table = PositionTable::new();
        while let Some(line) = reader.next_line() {
            if !line.starts_with('P') {
                reader.push_back(line);
                break;
            }
            if collect {
                parse_position_line(&line, registry, &mut table)?;
            }
        }
        return Ok(Some(table));
    }
    Ok(None)
}

/// One satellite-position line. Malformed numeric fields, unknown
/// designator syntax and the all-zero "no data" marker all leave the
/// slot empty; nothing here aborts the parse.
fn parse_position_line(
    line: &str,
    registry: &mut DesignatorRegistry,
    table: &mut PositionTable,
) -> Result<(), Error> {
    let Some(designator) = line.get(1..4) else {
        return Ok(());
    };
    let Ok(sv) = SV::from_str(designator.trim()) else {
        debug!("unrecognized designator {:?}", designator);
        return Ok(());
    };
    // register even when the sample turns out absent
    let index = registry.index_of(sv)?;

    let Some(fields) = line.get(4..) else {
        return Ok(());
    };
    let mut coordinates = fields.split_whitespace().map(str::parse::<f64>);
    let (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) =
        (coordinates.next(), coordinates.next(), coordinates.next())
    else {
        return Ok(());
    };
    if x == 0.0 && y == 0.0 && z == 0.0 {
        return Ok(());
    }
    table.set(index, Vector3::new(x, y, z));
    Ok(())
}

/// Parses one tabulated orbit file, inserting every step found that the
/// cache does not already hold, and returns the number inserted. Files
/// tabulated at 5-minute cadence are realigned to the 15-minute grid by
/// dropping two of every three records.
pub(crate) fn load_into_cache(
    path: &Path,
    cache: &mut PositionCache,
    registry: &mut DesignatorRegistry,
) -> Result<usize, Error> {
    let file = File::open(path)?;
    let mut reader = RecordReader::new(BufReader::new(file));

    if reader.next_line().is_none() {
        return Err(Error::MalformedHeader);
    }
    let second = reader.next_line().ok_or(Error::MalformedHeader)?;
    let header = parse_header(&second)?;
    debug!(
        "{}: starts at step {}, {} s cadence",
        path.display(),
        header.start,
        header.cadence_s
    );

    let mut step = header.start;
    let mut inserted = 0;
    while let Some(table) = read_step(&mut reader, registry, true)? {
        if !cache.contains(step) {
            cache.insert(step, table);
            inserted += 1;
        }
        step = step + 1;
        if header.cadence_s == 300 {
            for _ in 0..2 {
                let _ = read_step(&mut reader, registry, false)?;
            }
        }
    }
    debug!("{}: {} steps inserted", path.display(), inserted);
    Ok(inserted)
}
