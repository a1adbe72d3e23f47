//! The event bus seam: what gets published and who publishes it.
use async_trait::async_trait;
use aws_sdk_eventbridge::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_eventbridge::operation::put_events::PutEventsError;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use aws_sdk_eventbridge::Client as EventBridgeClient;
use tracing::{debug, info};

/// One message for the bus, mirroring a `PutEvents` request entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEntry {
    pub source: String,
    pub detail_type: String,
    /// JSON text of the original raw event
    pub detail: String,
    pub event_bus_name: String,
}

/// The bus acknowledgment for an accepted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAck {
    pub event_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The call to the bus failed, e.g. permissions, throttling or network
    #[error("{0}")]
    Sdk(String),
    /// The call went through, but the bus refused the entry
    #[error("{bus} rejected the entry with {code}: {message}")]
    Rejected { bus: String, code: String, message: String },
    #[error("Failed to serialize the event detail: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Publishes entries onto an event bus.
/// Implementations are shared across invocations and must not hold per-request state.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, entry: BusEntry) -> Result<PublishAck, TransportError>;
}

/// Publishes to Amazon EventBridge. Build it once per process and share it.
pub struct EventBridgeBus {
    client: EventBridgeClient,
}

impl EventBridgeBus {
    pub fn new(client: EventBridgeClient) -> Self {
        Self { client }
    }

    /// Creates a client with the region and credentials from the Lambda environment.
    pub async fn from_env() -> Self {
        Self::new(EventBridgeClient::new(&aws_config::load_from_env().await))
    }
}

#[async_trait]
impl EventBus for EventBridgeBus {
    async fn publish(&self, entry: BusEntry) -> Result<PublishAck, TransportError> {
        let bus = entry.event_bus_name.clone();

        let request_entry = PutEventsRequestEntry::builder()
            .source(entry.source)
            .detail_type(entry.detail_type)
            .detail(entry.detail)
            .event_bus_name(entry.event_bus_name)
            .build();

        let resp = match self.client.put_events().entries(request_entry).send().await {
            Ok(v) => v,
            Err(e) => {
                debug!("PutEvents error: {}", DisplayErrorContext(&e));
                return Err(TransportError::Sdk(sdk_error_text(&e)));
            }
        };

        debug!("EventBridge response: {:?}", resp);

        // PutEvents reports per-entry failures in a 200 response
        let result = resp.entries().first();
        if let Some(code) = result.and_then(|v| v.error_code()) {
            return Err(TransportError::Rejected {
                bus,
                code: code.to_owned(),
                message: result.and_then(|v| v.error_message()).unwrap_or_default().to_owned(),
            });
        }

        if resp.failed_entry_count() > 0 {
            return Err(TransportError::Rejected {
                bus,
                code: FAILED_ENTRY_CODE.to_owned(),
                message: format!("{} failed entries without error details", resp.failed_entry_count()),
            });
        }

        match result.and_then(|v| v.event_id()) {
            Some(event_id) => Ok(PublishAck {
                event_id: event_id.to_owned(),
            }),
            None => Err(TransportError::Rejected {
                bus,
                code: MISSING_EVENT_ID_CODE.to_owned(),
                message: "no event ID was returned for the entry".to_owned(),
            }),
        }
    }
}

/// Error codes for rejections where EventBridge gave none of its own
pub const FAILED_ENTRY_CODE: &str = "FailedEntry";
pub const MISSING_EVENT_ID_CODE: &str = "MissingEventId";

/// Service errors become `Code: message`, same as the AWS CLI prints them.
/// Anything else, e.g. a timeout or a dispatch failure, has no metadata and keeps the full error chain.
fn sdk_error_text(e: &SdkError<PutEventsError>) -> String {
    match e.as_service_error() {
        Some(service_error) => format!(
            "{}: {}",
            service_error.code().unwrap_or("UnknownError"),
            service_error.message().unwrap_or_default()
        ),
        None => DisplayErrorContext(e).to_string(),
    }
}

/// Logs entries instead of publishing them. Used for local replays.
#[derive(Debug, Default)]
pub struct DryRunBus;

pub const DRY_RUN_EVENT_ID: &str = "dry-run";

#[async_trait]
impl EventBus for DryRunBus {
    async fn publish(&self, entry: BusEntry) -> Result<PublishAck, TransportError> {
        info!(
            "Dry run, not published\n- bus: {}\n- source: {}\n- detail-type: {}\n- detail: {}",
            entry.event_bus_name, entry.source, entry.detail_type, entry.detail
        );

        Ok(PublishAck {
            event_id: DRY_RUN_EVENT_ID.to_owned(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Accepts everything and keeps a copy of each entry.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingBus {
        published: Arc<Mutex<Vec<BusEntry>>>,
    }

    impl RecordingBus {
        pub(crate) async fn take_published(&self) -> Vec<BusEntry> {
            let mut guard = self.published.lock().await;
            std::mem::take(&mut *guard)
        }
    }

    #[async_trait]
    impl EventBus for RecordingBus {
        async fn publish(&self, entry: BusEntry) -> Result<PublishAck, TransportError> {
            let mut guard = self.published.lock().await;
            guard.push(entry);
            Ok(PublishAck {
                event_id: format!("event-{}", guard.len()),
            })
        }
    }

    /// Fails every publish with the given message and counts the attempts.
    #[derive(Default)]
    pub(crate) struct FailingBus {
        pub(crate) message: String,
        pub(crate) attempts: AtomicUsize,
    }

    impl FailingBus {
        pub(crate) fn new(message: &str) -> Self {
            Self {
                message: message.to_owned(),
                attempts: AtomicUsize::new(0),
            }
        }

        pub(crate) fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventBus for FailingBus {
        async fn publish(&self, _entry: BusEntry) -> Result<PublishAck, TransportError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Sdk(self.message.clone()))
        }
    }
}
