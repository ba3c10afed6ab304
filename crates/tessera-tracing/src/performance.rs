//! Timing spans and standard-format events for the kernel runtime
//!
//! ```rust
//! use tessera_tracing::performance::{record_texture_allocation, PerformanceSpan};
//!
//! let span = PerformanceSpan::new("multiply_forward", Some(100));
//! // ... do work ...
//! drop(span); // Logs only if duration >= 100μs
//!
//! record_texture_allocation(3, 2, 24);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static PERF_ENABLED: AtomicBool = AtomicBool::new(true);
static PERF_THRESHOLD_US: AtomicU64 = AtomicU64::new(NO_THRESHOLD);

const NO_THRESHOLD: u64 = u64::MAX;

/// Set the process-wide switch and minimum duration for [`PerformanceSpan`] events.
pub fn configure(enabled: bool, threshold_us: Option<u64>) {
    PERF_ENABLED.store(enabled, Ordering::Relaxed);
    PERF_THRESHOLD_US.store(threshold_us.unwrap_or(NO_THRESHOLD), Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    PERF_ENABLED.load(Ordering::Relaxed)
}

fn global_threshold() -> Option<u64> {
    match PERF_THRESHOLD_US.load(Ordering::Relaxed) {
        NO_THRESHOLD => None,
        us => Some(us),
    }
}

/// Times a region and logs `performance_span_complete` inside its span when dropped.
///
/// A span-specific threshold wins over the global one.
pub struct PerformanceSpan {
    name: String,
    threshold_us: Option<u64>,
    start: Instant,
    span: tracing::Span,
}

impl PerformanceSpan {
    /// Debug-level span carrying only the operation name.
    pub fn new(name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        let name = name.into();
        let span = tracing::debug_span!("perf", name = %name);
        Self::from_span(name, span, threshold_us)
    }

    /// Time `span`, which may carry extra fields recorded at creation.
    pub fn from_span(name: impl Into<String>, span: tracing::Span, threshold_us: Option<u64>) -> Self {
        Self {
            name: name.into(),
            threshold_us,
            start: Instant::now(),
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn elapsed_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Drop for PerformanceSpan {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_us = self.elapsed_us();
        let threshold = self.threshold_us.or_else(global_threshold);
        if threshold.is_none_or(|t| elapsed_us >= t) {
            let _entered = self.span.enter();
            tracing::debug!(
                span = %self.name,
                duration_us = elapsed_us,
                duration_ms = elapsed_us as f64 / 1000.0,
                "performance_span_complete"
            );
        }
    }
}

/// Direction of a host/device copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    HostToDevice,
    DeviceToHost,
}

impl TransferDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            TransferDirection::HostToDevice => "H2D",
            TransferDirection::DeviceToHost => "D2H",
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn record_texture_allocation(width: usize, height: usize, size_bytes: usize) {
    tracing::debug!(
        event = "texture_allocated",
        width = width,
        height = height,
        size_bytes = size_bytes,
    );
}

pub fn record_transfer(bytes: usize, direction: TransferDirection, duration_us: u64) {
    tracing::debug!(
        event = "texture_transfer",
        bytes = bytes,
        direction = direction.as_str(),
        duration_us = duration_us,
    );
}

/// `parallel` is true when rows were evaluated on the rayon pool.
pub fn record_kernel_dispatch(kernel: &str, elements: usize, parallel: bool, duration_us: u64) {
    tracing::debug!(
        event = "kernel_dispatch",
        kernel = kernel,
        elements = elements,
        parallel = parallel,
        duration_us = duration_us,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_performance_span_elapsed() {
        let span = PerformanceSpan::new("test_elapsed", None);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(span.name(), "test_elapsed");
        assert!(span.elapsed_us() >= 10_000, "Should have elapsed at least 10ms");
    }

    #[test]
    fn test_transfer_direction_labels() {
        assert_eq!(TransferDirection::HostToDevice.to_string(), "H2D");
        assert_eq!(TransferDirection::DeviceToHost.as_str(), "D2H");
    }

    #[test]
    fn test_record_events() {
        record_texture_allocation(3, 2, 24);
        record_transfer(4096, TransferDirection::HostToDevice, 250);
        record_kernel_dispatch("multiply_forward", 6, false, 12);
    }
}
