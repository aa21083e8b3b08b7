pub mod artifact;
pub mod coordinate;

pub use artifact::{Artifact, RaceId};
pub use coordinate::{BoundingBox, Coordinate};
