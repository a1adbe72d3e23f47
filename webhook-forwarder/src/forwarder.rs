use crate::bus::{BusEntry, EventBus, PublishAck, TransportError};
use crate::config::Config;
use crate::envelope::{InboundEnvelope, SourcePayload};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Returns true if the payload is the kind of event that should go onto the bus.
pub fn should_forward(payload: &SourcePayload, interest_action: &str) -> bool {
    payload.action == interest_action
}

/// Picks the detail-type from the request headers.
/// The header name is matched exactly, so `X-GitHub-Event` does not match `x-github-event`.
pub fn detail_type<'a>(headers: &'a HashMap<String, String>, config: &'a Config) -> &'a str {
    headers
        .get(&config.detail_type_header)
        .map(String::as_str)
        .unwrap_or(&config.default_detail_type)
}

/// Publishes the original raw event onto the bus, once.
/// The envelope is only used for routing. Errors are returned to the caller as-is, without a retry.
pub async fn forward(
    raw_event: &Value,
    envelope: &InboundEnvelope,
    bus: &dyn EventBus,
    config: &Config,
) -> Result<PublishAck, TransportError> {
    let entry = BusEntry {
        source: config.event_source.clone(),
        detail_type: detail_type(&envelope.headers, config).to_owned(),
        detail: serde_json::to_string(raw_event)?,
        event_bus_name: config.event_bus_name.clone(),
    };

    debug!("Publishing {} to {}", entry.detail_type, entry.event_bus_name);

    bus.publish(entry).await
}
