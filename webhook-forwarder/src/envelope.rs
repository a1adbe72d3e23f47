//! Typed model of the API Gateway envelope and the GitHub webhook payload it carries.
//!
//! [`validate`] checks the raw event against the expected shape, collects every field error
//! it finds and only then builds the typed [`InboundEnvelope`].
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;

/// The outer request wrapper delivered by API Gateway (HTTP API, payload v2).
/// Fields not listed here, e.g. `cookies` or `pathParameters`, are ignored.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InboundEnvelope {
    pub version: String,
    pub route_key: String,
    pub raw_path: String,
    pub raw_query_string: String,
    /// Keys are kept exactly as received
    pub headers: HashMap<String, String>,
    /// Passed through without validation
    pub request_context: Map<String, Value>,
    /// Always the decoded payload, even if it arrived as a JSON string
    pub body: SourcePayload,
    pub is_base64_encoded: bool,
}

/// The GitHub organization webhook payload, e.g. a `repository` event.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SourcePayload {
    /// Filtering discriminator, e.g. `created`
    pub action: String,
    pub repository: Map<String, Value>,
    pub organization: Map<String, Value>,
    pub sender: Map<String, Value>,
}

/// The `body` field as it arrives on the wire: either JSON text or an inline object.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawBody {
    Encoded(String),
    Inline(Map<String, Value>),
}

impl RawBody {
    /// Normalizes the body into a JSON value ready for the payload checks.
    pub fn resolve(self) -> Result<Value, serde_json::Error> {
        match self {
            RawBody::Encoded(text) => serde_json::from_str(&text),
            RawBody::Inline(map) => Ok(Value::Object(map)),
        }
    }
}

/// Machine-readable constraint that a field failed.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Missing,
    StringType,
    BoolType,
    DictType,
    ModelType,
    JsonInvalid,
}

impl ErrorKind {
    fn message(self) -> &'static str {
        match self {
            ErrorKind::Missing => "Field required",
            ErrorKind::StringType => "Input should be a valid string",
            ErrorKind::BoolType => "Input should be a valid boolean",
            ErrorKind::DictType => "Input should be a valid dictionary",
            ErrorKind::ModelType => "Input should be a valid dictionary or object to extract fields from",
            ErrorKind::JsonInvalid => "Invalid JSON",
        }
    }
}

/// A single field-level diagnostic: where, what was expected and what was received.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Path to the field from the envelope root, e.g. `["body", "sender"]`
    pub loc: Vec<String>,
    pub msg: String,
    /// The offending value. For missing fields this is the object the field was expected in.
    pub input: Value,
}

/// All field errors found in one raw event. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    /// Returns the `{"error": [...]}` document sent back to the caller.
    pub fn to_json(&self) -> Value {
        json!({ "error": self.errors })
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field error(s)", self.errors.len())?;
        for e in &self.errors {
            write!(f, "; {}: {}", e.loc.join("."), e.msg)?;
        }
        Ok(())
    }
}

/// Parses the raw gateway event into a typed envelope.
/// A string `body` is decoded as JSON before the payload checks run.
/// No side effects.
pub fn validate(raw_event: &Value) -> Result<InboundEnvelope, ValidationFailure> {
    let mut check = Checker::default();

    let envelope = match raw_event.as_object() {
        Some(v) => v,
        None => {
            check.push(ErrorKind::ModelType, &[], raw_event.clone());
            return Err(check.into_failure());
        }
    };

    for key in ["version", "routeKey", "rawPath", "rawQueryString"] {
        check.string(envelope, &[], key);
    }
    check.string_mapping(envelope, &[], "headers");
    check.mapping(envelope, &[], "requestContext");
    let body = check.field(envelope, &[], "body").and_then(|v| check.body(v));
    check.boolean(envelope, &[], "isBase64Encoded");

    if !check.errors.is_empty() {
        return Err(check.into_failure());
    }

    // swap in the decoded body so the typed model never sees the encoded form
    let mut normalized = envelope.clone();
    if let Some(body) = body {
        normalized.insert("body".to_owned(), body);
    }

    serde_json::from_value(Value::Object(normalized)).map_err(|e| {
        check.push_with_msg(ErrorKind::ModelType, &[], raw_event.clone(), e.to_string());
        check.into_failure()
    })
}

/// Accumulates field errors while walking the raw event.
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn push(&mut self, kind: ErrorKind, loc: &[&str], input: Value) {
        self.push_with_msg(kind, loc, input, kind.message().to_owned());
    }

    fn push_with_msg(&mut self, kind: ErrorKind, loc: &[&str], input: Value, msg: String) {
        self.errors.push(FieldError {
            kind,
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg,
            input,
        });
    }

    fn into_failure(self) -> ValidationFailure {
        ValidationFailure { errors: self.errors }
    }

    /// Returns the value of a required field or records it as missing.
    fn field<'a>(&mut self, obj: &'a Map<String, Value>, parent: &[&str], key: &str) -> Option<&'a Value> {
        let value = obj.get(key);
        if value.is_none() {
            self.push(ErrorKind::Missing, &path(parent, key), Value::Object(obj.clone()));
        }
        value
    }

    fn string(&mut self, obj: &Map<String, Value>, parent: &[&str], key: &str) {
        if let Some(v) = self.field(obj, parent, key) {
            if !v.is_string() {
                self.push(ErrorKind::StringType, &path(parent, key), v.clone());
            }
        }
    }

    fn boolean(&mut self, obj: &Map<String, Value>, parent: &[&str], key: &str) {
        if let Some(v) = self.field(obj, parent, key) {
            if !v.is_boolean() {
                self.push(ErrorKind::BoolType, &path(parent, key), v.clone());
            }
        }
    }

    fn mapping<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        parent: &[&str],
        key: &str,
    ) -> Option<&'a Map<String, Value>> {
        let v = self.field(obj, parent, key)?;
        let map = v.as_object();
        if map.is_none() {
            self.push(ErrorKind::DictType, &path(parent, key), v.clone());
        }
        map
    }

    /// A mapping whose values must all be strings, e.g. `headers`.
    fn string_mapping(&mut self, obj: &Map<String, Value>, parent: &[&str], key: &str) {
        if let Some(map) = self.mapping(obj, parent, key) {
            let loc = path(parent, key);
            for (name, v) in map {
                if !v.is_string() {
                    self.push(ErrorKind::StringType, &path(&loc, name), v.clone());
                }
            }
        }
    }

    /// Resolves the body and checks it against the payload shape.
    /// Returns the decoded body if it could be decoded into an object.
    fn body(&mut self, value: &Value) -> Option<Value> {
        let resolved = match RawBody::deserialize(value) {
            Ok(raw) => match raw.resolve() {
                Ok(v) => v,
                Err(e) => {
                    self.push_with_msg(
                        ErrorKind::JsonInvalid,
                        &["body"],
                        value.clone(),
                        format!("{}: {}", ErrorKind::JsonInvalid.message(), e),
                    );
                    return None;
                }
            },
            Err(_) => {
                self.push(ErrorKind::ModelType, &["body"], value.clone());
                return None;
            }
        };

        let payload = match resolved.as_object() {
            Some(v) => v,
            None => {
                self.push(ErrorKind::ModelType, &["body"], resolved.clone());
                return None;
            }
        };

        self.string(payload, &["body"], "action");
        for key in ["repository", "organization", "sender"] {
            self.mapping(payload, &["body"], key);
        }

        Some(resolved)
    }
}

fn path<'a>(parent: &[&'a str], key: &'a str) -> Vec<&'a str> {
    let mut loc = parent.to_vec();
    loc.push(key);
    loc
}
