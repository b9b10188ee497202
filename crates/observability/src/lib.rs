//! Tracing and logging (shared setup).

/// Initialize process-wide tracing with the default level (`info`) and JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init("info", LogFormat::Json);
}

/// Initialize process-wide tracing with an explicit default level and format.
///
/// `RUST_LOG`, when set, still wins over `default_level`.
pub fn init_with(default_level: &str, format: LogFormat) {
    tracing::init(default_level, format);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use crate::tracing::LogFormat;
