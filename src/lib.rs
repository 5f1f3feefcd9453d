pub mod batch;
pub mod detection;
pub mod error;
pub mod models;
pub mod page;
pub mod pipeline;

pub use detection::{DetectionParams, PanelDetector, build_standard_pipeline};
pub use error::DetectionError;
pub use models::{Rect, Region};
pub use page::{Page, Panel};
pub use pipeline::{
    DebugConfig, MetadataValue, Pipeline, PipelineContext, PipelineStep, StageData,
};
