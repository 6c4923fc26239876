//! TSP problem instances.
//!
//! A [`Problem`] bundles an immutable point set, one label per point and the
//! precomputed [`DistanceMatrix`]. Instances come from a `label,x,y` CSV file,
//! from a synthetic regular polygon, or from raw points.

mod distance;
mod instance;

pub use distance::{distance, DistanceMatrix, Point};
pub use instance::Problem;
