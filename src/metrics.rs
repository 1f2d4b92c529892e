// ABOUTME: Prometheus metrics initialization and recording helpers.
// ABOUTME: Counts ingress requests, dispatch outcomes, and outbound sends.

use anyhow::{Context as _, Result};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return its render handle.
///
/// Must be called at most once per process, before any metric is recorded.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    describe_counter!(
        "goalgate_ingress_requests_total",
        "Inbound HTTP requests by route and outcome"
    );
    describe_counter!(
        "goalgate_dispatch_total",
        "Dispatched updates by tag and outcome"
    );
    describe_counter!(
        "goalgate_messages_sent_total",
        "Messages delivered through the outbound client"
    );

    Ok(handle)
}

pub fn record_ingress_request(route: &'static str, outcome: &'static str) {
    counter!("goalgate_ingress_requests_total", "route" => route, "outcome" => outcome)
        .increment(1);
}

pub fn record_dispatch(tag: &'static str, outcome: &'static str) {
    counter!("goalgate_dispatch_total", "tag" => tag, "outcome" => outcome).increment(1);
}

pub fn record_message_sent() {
    counter!("goalgate_messages_sent_total").increment(1);
}
