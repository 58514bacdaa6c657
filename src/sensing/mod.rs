pub mod controller;
pub mod loop_worker;
pub mod source;
pub mod tracker;

pub use controller::{WatcherConfig, WindowWatcher};
pub use source::{classify, QueryError, ScriptedWindowSource, SystemWindowSource, WindowSample, WindowSource};
pub use tracker::{ClosedSpan, SegmentTracker};
