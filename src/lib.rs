pub mod config;
pub mod detection;
pub mod diagnostics;
pub mod error;
pub mod imageio;
pub mod models;
pub mod pipeline;

pub use config::WhitenConfig;
pub use detection::{TeethWhitener, WhitenOutcome, WhitenedRegion};
pub use detection::detector::{CascadeDetector, ObjectDetector};
pub use diagnostics::{DiagnosticsSink, FsDiagnostics, NoDiagnostics};
pub use error::{Result, WhitenError};
pub use models::{BoundingBox, Contour};
pub use pipeline::{MetadataValue, Pipeline, PipelineContext, PipelineData, PipelineStep};
