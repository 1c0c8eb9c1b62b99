// BirthWindow - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "BirthWindow";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "BirthWindow";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Timeline
// =============================================================================

/// Display marker for a slot whose end time is not yet known.
///
/// Only ever reported for a non-last slot that has not been finalised; the
/// last slot falls back to the declared window end instead.
pub const UNKNOWN_END_MARKER: &str = "??:??";

/// Time format used for every `TimeOfDay` rendering and parse.
pub const TIME_FORMAT: &str = "%H:%M";

/// Default window start when no range has been declared yet.
pub const DEFAULT_WINDOW_START: (u32, u32) = (0, 0);

/// Default window end when no range has been declared yet.
pub const DEFAULT_WINDOW_END: (u32, u32) = (23, 59);

/// Separator used when a range set is rendered as a single text value.
pub const RANGE_JOIN_SEPARATOR: &str = ", ";

// =============================================================================
// Reference data limits
// =============================================================================

/// Maximum size of a reference-data TOML file in bytes.
pub const MAX_REFERENCE_FILE_SIZE: u64 = 2 * 1024 * 1024; // 2 MB

/// Number of houses in a chart.
pub const HOUSE_COUNT: u8 = 12;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Export
// =============================================================================

/// Default CSV export file name.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "birth_window_analysis.csv";

/// CSV header row, in column order.
pub const EXPORT_HEADER: [&str; 7] = [
    "start_time",
    "end_time",
    "hour_lord",
    "ascendant_range",
    "saturn_house_range",
    "chiron_house_range",
    "alive",
];

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default reference-data file name, looked up in the config directory when
/// neither the CLI nor config.toml names one.
pub const REFERENCE_FILE_NAME: &str = "questions.toml";
