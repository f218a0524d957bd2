mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from teethwhiten for tests
pub use teethwhiten::{
    BoundingBox, FsDiagnostics, ObjectDetector, TeethWhitener, WhitenConfig, WhitenError,
};
