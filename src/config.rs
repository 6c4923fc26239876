//! Where a problem instance comes from.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::problem::Problem;

/// Source of the points to tour.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PointSource {
    /// A `label,x,y` CSV file.
    File(PathBuf),
    /// A regular polygon with this many vertices.
    Polygon(usize),
}

impl PointSource {
    /// Picks a source from optional command-line inputs.
    ///
    /// A file wins over a polygon size. A polygon size of zero counts as
    /// absent.
    ///
    /// # Errors
    /// [`Error::NoProblem`] if neither is given.
    pub fn resolve(file: Option<PathBuf>, polygon: Option<usize>) -> Result<Self> {
        match (file, polygon) {
            (Some(path), _) => Ok(PointSource::File(path)),
            (None, Some(n)) if n > 0 => Ok(PointSource::Polygon(n)),
            _ => Err(Error::NoProblem),
        }
    }

    /// Builds the problem.
    pub fn load(&self) -> Result<Problem> {
        match self {
            PointSource::File(path) => Problem::from_csv_path(path),
            PointSource::Polygon(n) => Problem::polygon(*n),
        }
    }
}

impl fmt::Display for PointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointSource::File(path) => write!(f, "{}", path.display()),
            PointSource::Polygon(n) => write!(f, "{n}-gon"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_file() {
        let src = PointSource::resolve(Some("cities.csv".into()), Some(10)).unwrap();
        assert_eq!(src, PointSource::File("cities.csv".into()));
    }

    #[test]
    fn test_resolve_polygon() {
        assert_eq!(
            PointSource::resolve(None, Some(7)).unwrap(),
            PointSource::Polygon(7)
        );
    }

    #[test]
    fn test_resolve_nothing_is_error() {
        assert!(matches!(PointSource::resolve(None, None), Err(Error::NoProblem)));
        assert!(matches!(PointSource::resolve(None, Some(0)), Err(Error::NoProblem)));
    }

    #[test]
    fn test_load_polygon() {
        let problem = PointSource::Polygon(6).load().unwrap();
        assert_eq!(problem.len(), 6);
        assert_eq!(PointSource::Polygon(6).to_string(), "6-gon");
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = PointSource::File("/no/such/points.csv".into())
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/no/such/points.csv"));
    }
}
