//! Problem instances: point sets with labels and a precomputed distance matrix.

use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::distance::{DistanceMatrix, Point};
use crate::error::{Error, Result};

/// A TSP instance.
///
/// Immutable once built. Walkers borrow it for the lifetime of a search.
#[derive(Debug, Clone)]
pub struct Problem {
    points: Vec<Point>,
    labels: Vec<String>,
    distances: DistanceMatrix,
}

impl Problem {
    /// Builds a problem from labelled points.
    ///
    /// # Errors
    /// [`Error::EmptyProblem`] if there are no points, [`Error::InvalidConfig`]
    /// if label and point counts differ.
    pub fn new(labels: Vec<String>, points: Vec<Point>) -> Result<Self> {
        if labels.len() != points.len() {
            return Err(Error::InvalidConfig(format!(
                "{} labels for {} points",
                labels.len(),
                points.len()
            )));
        }
        let distances = DistanceMatrix::new(&points)?;
        Ok(Self {
            points,
            labels,
            distances,
        })
    }

    /// Builds a problem from unlabelled points; labels are the indices.
    pub fn from_points(points: Vec<Point>) -> Result<Self> {
        let labels = (0..points.len()).map(|i| i.to_string()).collect();
        Self::new(labels, points)
    }

    /// Regular `n`-gon inscribed in the unit circle.
    ///
    /// Point `i` sits at angle `2πi/n`, so the identity tour is optimal with
    /// length `2n·sin(π/n)`.
    pub fn polygon(n: usize) -> Result<Self> {
        let points = (0..n)
            .map(|i| {
                let theta = 2.0 * i as f64 * PI / n as f64;
                [theta.cos(), theta.sin()]
            })
            .collect();
        Self::from_points(points)
    }

    /// Reads a `label,x,y` CSV file. The first line is a header and is skipped.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::from_csv_reader(BufReader::new(file)).map_err(|e| match e {
            Error::Io { source, .. } => Error::io(path, source),
            other => other,
        })
    }

    /// Reads `label,x,y` records from any buffered reader.
    ///
    /// Blank lines are skipped. A record with fewer than three fields or a
    /// non-numeric coordinate is rejected with its 1-based line number.
    pub fn from_csv_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut labels = Vec::new();
        let mut points = Vec::new();

        for (idx, line) in reader.lines().enumerate().skip(1) {
            let line = line.map_err(|e| Error::io("<input>", e))?;
            let record = line.trim();
            if record.is_empty() {
                continue;
            }
            let (label, point) = parse_record(record).map_err(|reason| Error::Parse {
                line: idx + 1,
                content: line.clone(),
                reason,
            })?;
            labels.push(label);
            points.push(point);
        }

        Self::new(labels, points)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Cyclic length of `tour` on this instance.
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        self.distances.tour_length(tour)
    }
}

fn parse_record(record: &str) -> std::result::Result<(String, Point), String> {
    let mut fields = record.split(',');
    let label = fields.next().unwrap_or_default().trim().to_string();
    let x = parse_coordinate(fields.next(), "x")?;
    let y = parse_coordinate(fields.next(), "y")?;
    Ok((label, [x, y]))
}

fn parse_coordinate(field: Option<&str>, axis: &str) -> std::result::Result<f64, String> {
    let field = field.ok_or_else(|| format!("missing {axis} coordinate"))?;
    field
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid {axis} coordinate: {e}"))
}
