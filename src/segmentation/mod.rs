// Sequential changepoint segmentation
//
// Pipeline per series:
//   Series -> super_segments(gap_threshold)
//          -> scan() per super-segment (scanner.rs)
//          -> global Segment list + Breakpoints (outer.rs)
//
// Configuration is an immutable `SegmentationConfig` passed by reference
// into every stage.

mod breakpoints;
mod config;
mod outer;
mod scanner;

pub use breakpoints::Breakpoints;
pub use config::{FailurePolicy, IntersectionMode, SegmentationConfig};
pub use outer::{segment_series, Segmentation, SkippedSuperSegment};
pub use scanner::{scan, Segment};
