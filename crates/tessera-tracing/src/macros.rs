//! Performance tracing macros
//!
//! The expansions refer to `tracing::` directly, so calling crates depend on `tracing`.

/// Time the enclosing scope with a [`crate::performance::PerformanceSpan`].
///
/// Extra fields are recorded on the span, so the completion event logged on drop carries them.
///
/// ```rust
/// use tessera_tracing::perf_span;
///
/// {
///     let _span = perf_span!("graph_predict", layers = 3);
///     // ... operation code ...
/// }
/// ```
#[macro_export]
macro_rules! perf_span {
    ($name:expr) => {{
        $crate::performance::PerformanceSpan::new($name, None)
    }};
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {{
        let name = $name;
        let span = tracing::debug_span!("perf", name = %name, $($field = $value),+);
        $crate::performance::PerformanceSpan::from_span(name, span, None)
    }};
}

/// Emit a debug-level event tagged with `event = $name`.
///
/// ```rust
/// use tessera_tracing::perf_event;
///
/// perf_event!("kernel_cache_hit", kernel = "multiply_forward", width = 3);
/// ```
#[macro_export]
macro_rules! perf_event {
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {
        tracing::debug!(
            event = $name,
            $($field = $value),+
        );
    };
}
