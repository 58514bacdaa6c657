pub mod registry;

pub use registry::{TagRegistry, DEFAULT_TAGS, SENTINEL_TAG};
