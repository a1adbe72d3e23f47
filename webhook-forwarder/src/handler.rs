//! Per-invocation orchestration: validate, filter, forward and answer in the gateway's format.
use crate::bus::EventBus;
use crate::config::Config;
use crate::envelope::validate;
use crate::forwarder::{forward, should_forward};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{error, info, warn};

pub const SKIPPED_MESSAGE: &str = "repo not created skipping";
pub const FORWARDED_MESSAGE: &str = "Event published in default event bus";

/// How an invocation ended. There is no state carried over to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    RejectedInvalid,
    Skipped,
    Forwarded,
    ForwardFailed,
}

/// The response API Gateway expects back from a Lambda integration.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    /// JSON text, e.g. `"repo not created skipping"` including the quotes
    pub body: String,
}

impl GatewayResponse {
    fn json(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            headers: HashMap::from([("Content-Type".to_owned(), "application/json".to_owned())]),
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub outcome: Outcome,
    pub response: GatewayResponse,
}

impl Reply {
    fn new(outcome: Outcome, status_code: u16, body: Value) -> Self {
        Self {
            outcome,
            response: GatewayResponse::json(status_code, body),
        }
    }
}

/// Handles a single raw gateway event. Never fails: every error becomes a 400 response.
pub async fn handle(raw_event: &Value, bus: &dyn EventBus, config: &Config) -> Reply {
    let envelope = match validate(raw_event) {
        Ok(v) => v,
        Err(failure) => {
            warn!("Invalid envelope: {}", failure);
            return Reply::new(Outcome::RejectedInvalid, 400, failure.to_json());
        }
    };

    if !should_forward(&envelope.body, &config.interest_action) {
        info!("Action: {}, {}", envelope.body.action, SKIPPED_MESSAGE);
        return Reply::new(Outcome::Skipped, 200, Value::from(SKIPPED_MESSAGE));
    }

    match forward(raw_event, &envelope, bus, config).await {
        Ok(ack) => {
            info!("Published with ID: {}", ack.event_id);
            Reply::new(Outcome::Forwarded, 200, Value::from(FORWARDED_MESSAGE))
        }
        Err(e) => {
            error!("Failed to publish: {}", e);
            Reply::new(Outcome::ForwardFailed, 400, Value::from(format!("Client Error: {e}")))
        }
    }
}
