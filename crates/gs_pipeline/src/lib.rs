pub mod orchestrator;

pub use orchestrator::{Pipeline, PipelineAbort, PipelineState};

pub mod prelude {
    pub use super::{Pipeline, PipelineAbort};
    pub use gs_core::{FailedItem, FailurePolicy, FatalError, PipelineSummary, SearchQuery};
}
