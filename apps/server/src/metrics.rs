//! Prometheus metrics for the operation guard
//!
//! Counters are registered in the default registry; an embedding process
//! exposes them with `prometheus::gather()`.

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Guard ticks by outcome (`ok`, `failed`)
    pub static ref GUARD_TICKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fhir_guard_ticks_total",
        "Total number of operation guard ticks",
        &["status"]
    )
    .expect("Failed to register GUARD_TICKS_TOTAL");

    /// Kill attempts by outcome (`killed`, `failed`)
    pub static ref GUARD_KILLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "fhir_guard_kills_total",
        "Total number of long-running operations the guard tried to kill",
        &["status"]
    )
    .expect("Failed to register GUARD_KILLS_TOTAL");
}

/// Render every registered metric in the Prometheus text format
pub fn render() -> String {
    use prometheus::{Encoder, TextEncoder};

    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buf) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_rendered_with_labels() {
        GUARD_KILLS_TOTAL.with_label_values(&["killed"]).inc();
        GUARD_TICKS_TOTAL.with_label_values(&["ok"]).inc();

        let text = render();
        assert!(text.contains("fhir_guard_kills_total{status=\"killed\"}"));
        assert!(text.contains("fhir_guard_ticks_total{status=\"ok\"}"));
    }
}
