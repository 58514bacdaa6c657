//! Logger setup.
//!
//! `RUST_LOG` wins when set. Otherwise the level is `Info`, or `Debug` when
//! `WINDOW_MONITOR_DEBUG` is `1` or `true`.

use log::LevelFilter;

pub fn debug_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}

pub fn default_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Install the global logger. Safe to call more than once; later calls are
/// ignored.
pub fn init() {
    let debug = debug_enabled(std::env::var("WINDOW_MONITOR_DEBUG").ok().as_deref());

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level(debug));
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // Silently keep the first logger if one is already installed.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_values() {
        assert!(debug_enabled(Some("1")));
        assert!(debug_enabled(Some("TRUE")));
        assert!(!debug_enabled(Some("0")));
        assert!(!debug_enabled(Some("yes")));
        assert!(!debug_enabled(None));
    }

    #[test]
    fn level_follows_debug_flag() {
        assert_eq!(default_level(true), LevelFilter::Debug);
        assert_eq!(default_level(false), LevelFilter::Info);
    }
}
