use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, TextEncoder, opts, register_int_counter};

pub static UPDATES_RECEIVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_updates_received_total",
        "Total number of transport updates received"
    ))
    .unwrap()
});

pub static MESSAGES_RELAYED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_messages_relayed_total",
        "Total number of user messages forwarded to the operator"
    ))
    .unwrap()
});

pub static REPLIES_DELIVERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_replies_delivered_total",
        "Total number of operator replies copied back to users"
    ))
    .unwrap()
});

pub static BLOCKED_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_blocked_dropped_total",
        "Total number of messages dropped because the sender is blocked"
    ))
    .unwrap()
});

pub static RELAY_RESOLVE_MISSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_resolve_misses_total",
        "Total number of operator replies with no matching relay link"
    ))
    .unwrap()
});

pub static TRANSPORT_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "relay_transport_errors_total",
        "Total number of failed transport operations"
    ))
    .unwrap()
});

pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}
