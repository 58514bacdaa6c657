pub mod label;
pub mod segment;

pub use label::{is_registrable, KnownLabel};
pub use segment::{LoggedSegment, WindowSegment, WorkStatus};
