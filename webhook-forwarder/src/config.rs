use std::env::var;

pub const EVENT_BUS_NAME_VAR: &str = "FORWARDER_EVENT_BUS_NAME";
pub const EVENT_SOURCE_VAR: &str = "FORWARDER_EVENT_SOURCE";
pub const DEFAULT_DETAIL_TYPE_VAR: &str = "FORWARDER_DEFAULT_DETAIL_TYPE";
pub const DETAIL_TYPE_HEADER_VAR: &str = "FORWARDER_DETAIL_TYPE_HEADER";
pub const INTEREST_ACTION_VAR: &str = "FORWARDER_INTEREST_ACTION";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} env var is set, but empty. Unset it to use the default value.")]
    Empty(&'static str),
}

/// Routing and filtering settings shared by all invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// E.g. `default`
    pub event_bus_name: String,
    /// The `Source` of every published entry, e.g. `github.com`
    pub event_source: String,
    /// Used as the detail-type when the request has no `detail_type_header`
    pub default_detail_type: String,
    /// Exact, case-sensitive header name, e.g. `x-github-event`
    pub detail_type_header: String,
    /// Only payloads with this `action` are forwarded, e.g. `created`
    pub interest_action: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_bus_name: "default".to_owned(),
            event_source: "github.com".to_owned(),
            default_detail_type: "github-webhook-lambda".to_owned(),
            detail_type_header: "x-github-event".to_owned(),
            interest_action: "created".to_owned(),
        }
    }
}

impl Config {
    /// Creates a new Config instance from the environment variables.
    /// Any variable that is not set keeps its default value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| var(key).ok())
    }

    /// Same as `from_env`, but reads the values with `lookup` instead of the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            event_bus_name: setting(&lookup, EVENT_BUS_NAME_VAR, defaults.event_bus_name)?,
            event_source: setting(&lookup, EVENT_SOURCE_VAR, defaults.event_source)?,
            default_detail_type: setting(&lookup, DEFAULT_DETAIL_TYPE_VAR, defaults.default_detail_type)?,
            detail_type_header: setting(&lookup, DETAIL_TYPE_HEADER_VAR, defaults.detail_type_header)?,
            interest_action: setting(&lookup, INTEREST_ACTION_VAR, defaults.interest_action)?,
        })
    }
}

fn setting<F>(lookup: &F, key: &'static str, default: String) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Err(ConfigError::Empty(key)),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.event_bus_name, "default");
        assert_eq!(config.event_source, "github.com");
        assert_eq!(config.default_detail_type, "github-webhook-lambda");
        assert_eq!(config.detail_type_header, "x-github-event");
        assert_eq!(config.interest_action, "created");
    }

    #[test]
    fn env_values_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            (EVENT_BUS_NAME_VAR, "github-events"),
            (INTEREST_ACTION_VAR, "deleted"),
        ]))
        .unwrap();

        assert_eq!(config.event_bus_name, "github-events");
        assert_eq!(config.interest_action, "deleted");
        assert_eq!(config.event_source, "github.com");
    }

    #[test]
    fn blank_value_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[(EVENT_SOURCE_VAR, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Empty(EVENT_SOURCE_VAR));
    }
}
