//! Local replay: run one saved gateway event through the handler without deploying it.
use crate::bus::EventBus;
use crate::config::Config;
use crate::handler::{handle, Reply};
use serde_json::Value;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to read payload from {file}: {source}")]
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Payload in {file} is not valid JSON: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a raw gateway event from `payload_file` and handles it as a regular invocation.
pub async fn run(payload_file: &str, bus: &dyn EventBus, config: &Config) -> Result<Reply, ReplayError> {
    let payload = std::fs::read_to_string(payload_file).map_err(|source| ReplayError::Read {
        file: payload_file.to_owned(),
        source,
    })?;

    let raw_event: Value = serde_json::from_str(&payload).map_err(|source| ReplayError::Parse {
        file: payload_file.to_owned(),
        source,
    })?;

    info!("Replaying {}", payload_file);

    Ok(handle(&raw_event, bus, config).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::testing::RecordingBus;
    use crate::handler::Outcome;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn payload_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn path_of(file: &NamedTempFile) -> &str {
        file.path().to_str().unwrap()
    }

    #[tokio::test]
    async fn replays_a_saved_event() {
        let file = payload_file(
            r#"{
                "version": "2.0",
                "routeKey": "POST /webhook",
                "rawPath": "/webhook",
                "rawQueryString": "",
                "headers": { "x-github-event": "repository" },
                "requestContext": {},
                "body": "{\"action\":\"created\",\"repository\":{},\"organization\":{},\"sender\":{}}",
                "isBase64Encoded": false
            }"#,
        );
        let bus = RecordingBus::default();

        let reply = run(path_of(&file), &bus, &Config::default()).await.unwrap();

        assert_eq!(reply.outcome, Outcome::Forwarded);
        assert_eq!(bus.take_published().await[0].detail_type, "repository");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let bus = RecordingBus::default();
        let err = run("/nonexistent/payload.json", &bus, &Config::default()).await.unwrap_err();
        assert!(matches!(err, ReplayError::Read { .. }));
    }

    #[tokio::test]
    async fn malformed_file_is_a_parse_error() {
        let file = payload_file("{ this is not json");
        let bus = RecordingBus::default();

        let err = run(path_of(&file), &bus, &Config::default()).await.unwrap_err();

        assert!(matches!(err, ReplayError::Parse { .. }));
        assert!(bus.take_published().await.is_empty());
    }
}
