//! Text output: route files, diagnostics CSV and experiment tables.
//!
//! Every writer comes in two forms: `*_to` writes to any [`Write`] and
//! returns plain I/O errors, while the path form creates the file and
//! reports failures as [`Error::Io`] naming the path.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::experiment::ExperimentRow;
use crate::pool::DiagnosticRecord;

/// Column layout of the diagnostics CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticsFormat {
    /// `walker,temperature,energy`
    #[default]
    Plain,
    /// `walker,temperature,iteration,energy`
    WithIteration,
}

impl DiagnosticsFormat {
    pub fn header(self) -> &'static str {
        match self {
            DiagnosticsFormat::Plain => "walker,temperature,energy",
            DiagnosticsFormat::WithIteration => "walker,temperature,iteration,energy",
        }
    }
}

/// Renders a tour as `a --> b --> ... --> a` using point labels.
pub fn format_route(tour: &[usize], labels: &[String]) -> String {
    let Some(&first) = tour.first() else {
        return String::new();
    };
    let mut out = String::new();
    for &v in tour {
        out.push_str(&labels[v]);
        out.push_str(" --> ");
    }
    out.push_str(&labels[first]);
    out
}

pub fn write_route_to<W: Write>(mut w: W, tour: &[usize]) -> io::Result<()> {
    writeln!(w, "route")?;
    for v in tour {
        writeln!(w, "{v}")?;
    }
    w.flush()
}

/// Writes a route file: a `route` header, then one point index per line.
pub fn write_route(path: impl AsRef<Path>, tour: &[usize]) -> Result<()> {
    let path = path.as_ref();
    let file = create(path)?;
    write_route_to(file, tour).map_err(|e| Error::io(path, e))
}

pub fn write_diagnostics_to<W: Write>(
    mut w: W,
    records: &[DiagnosticRecord],
    format: DiagnosticsFormat,
) -> io::Result<()> {
    writeln!(w, "{}", format.header())?;
    for r in records {
        match format {
            DiagnosticsFormat::Plain => {
                writeln!(w, "{},{},{}", r.walker, r.temperature, r.energy)?
            }
            DiagnosticsFormat::WithIteration => writeln!(
                w,
                "{},{},{},{}",
                r.walker, r.temperature, r.iteration, r.energy
            )?,
        }
    }
    w.flush()
}

/// Writes one CSV row per sampled energy.
pub fn write_diagnostics(
    path: impl AsRef<Path>,
    records: &[DiagnosticRecord],
    format: DiagnosticsFormat,
) -> Result<()> {
    let path = path.as_ref();
    let file = create(path)?;
    write_diagnostics_to(file, records, format).map_err(|e| Error::io(path, e))
}

pub const EXPERIMENT_HEADER: &str = "npoints,energy,time,temperature,cooling,period,schedule";

pub fn write_experiment_row_to<W: Write>(mut w: W, row: &ExperimentRow) -> io::Result<()> {
    writeln!(
        w,
        "{},{},{},{},{},{},{}",
        row.npoints, row.energy, row.seconds, row.temperature, row.cooling, row.period, row.schedule
    )
}

/// Opens `path` for writing, wrapped in a buffer.
pub fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| Error::io(path, e))
}
