use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_metrics() -> Result<(), BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    if METRICS_HANDLE.set(handle).is_err() {
        tracing::warn!("Metrics recorder already initialized");
    }
    Ok(())
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count a consent state change by audit action.
pub fn record_consent_transition(action: &'static str) {
    counter!("consent_transitions_total", "action" => action).increment(1);
}

pub fn record_gating_denial(action: &'static str, reason: &'static str) {
    counter!("gating_denials_total", "action" => action, "reason" => reason).increment(1);
}

pub fn record_content_sanitized() {
    counter!("content_sanitized_total").increment(1);
}

pub fn record_data_rights_operation(operation: &'static str) {
    counter!("data_rights_operations_total", "operation" => operation).increment(1);
}
