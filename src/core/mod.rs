pub mod extractor;
pub mod motion;
pub mod pipeline;

pub use motion::MotionSequence;
pub use pipeline::{BatchPipeline, FileOutcome};
