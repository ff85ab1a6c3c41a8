//! Process-wide setup shared by the binaries: tracing and shutdown signalling.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

pub mod shutdown;
/// Tracing configuration (filters, layers).
pub mod tracing;

pub use shutdown::shutdown_signal;
