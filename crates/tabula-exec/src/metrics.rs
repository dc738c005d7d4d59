//! Trace hooks for the streaming engine.
//!
//! Compiled to no-ops unless the `tracing` feature is on; subscribers are
//! the embedding application's business.

#[cfg(feature = "tracing")]
pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::trace_span!("tabula", event);
    let _guard = span.enter();
    for (k, v) in key_values {
        tracing::trace!(%k, %v, "metric");
    }
}

#[cfg(not(feature = "tracing"))]
pub fn emit_span(_event: &str, _key_values: &[(&str, String)]) { /* no-op */
}
