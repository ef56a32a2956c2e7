//! Client configuration
//!
//! Base URLs and static keys for the four backend services, plus transport
//! settings. API keys have no built-in values: the backend rotates them, so
//! they must come from a config file or the environment.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const DEFAULT_AUTH_URL: &str =
    "https://www.transperth.wa.gov.au/DesktopModules/JJPApiService/API/JJPApi";
const DEFAULT_JOURNEY_PLANNER_URL: &str =
    "https://au-journeyplanner.silverrail.io/journeyplannerservice/v2/REST/DataSets/PerthRestricted";
const DEFAULT_REALTIME_URL: &str = "https://realtime.transperth.info";
const DEFAULT_FARE_URL: &str = "https://serviceinformation.transperth.info/api";

/// A backend service: where it lives and its static key, if it has one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL, without a trailing slash
    pub base_url: String,

    /// Static API key issued with the app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl EndpointConfig {
    /// Create an endpoint without a static key
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Set the static API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Join a request target onto the base URL
    pub(crate) fn url(&self, target: &str) -> String {
        format!("{}{target}", self.base_url.trim_end_matches('/'))
    }
}

/// Configuration for [`TransperthClient`](crate::TransperthClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransperthConfig {
    /// Authentication and SmartRider account service
    #[serde(default = "default_auth")]
    pub auth: EndpointConfig,

    /// Journey planner (stops, routes, timetables, trip plans)
    #[serde(default = "default_journey_planner")]
    pub journey_planner: EndpointConfig,

    /// Realtime trip service
    #[serde(default = "default_realtime")]
    pub realtime: EndpointConfig,

    /// Fare and service information
    #[serde(default = "default_fare")]
    pub fare: EndpointConfig,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// IANA timezone used for realtime token timestamps (system local time if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime_timezone: Option<String>,
}

fn default_auth() -> EndpointConfig {
    EndpointConfig::new(DEFAULT_AUTH_URL)
}

fn default_journey_planner() -> EndpointConfig {
    EndpointConfig::new(DEFAULT_JOURNEY_PLANNER_URL)
}

fn default_realtime() -> EndpointConfig {
    EndpointConfig::new(DEFAULT_REALTIME_URL)
}

fn default_fare() -> EndpointConfig {
    EndpointConfig::new(DEFAULT_FARE_URL)
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("transperth_client/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for TransperthConfig {
    fn default() -> Self {
        Self {
            auth: default_auth(),
            journey_planner: default_journey_planner(),
            realtime: default_realtime(),
            fare: default_fare(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            realtime_timezone: None,
        }
    }
}

impl TransperthConfig {
    /// Load configuration from an optional `transperth` file and the environment
    ///
    /// Environment variables use the `TRANSPERTH` prefix and `__` as the
    /// nesting separator, e.g. `TRANSPERTH__REALTIME__API_KEY`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("auth.base_url", DEFAULT_AUTH_URL)?
            .set_default("journey_planner.base_url", DEFAULT_JOURNEY_PLANNER_URL)?
            .set_default("realtime.base_url", DEFAULT_REALTIME_URL)?
            .set_default("fare.base_url", DEFAULT_FARE_URL)?
            .add_source(config::File::with_name("transperth").required(false))
            .add_source(
                config::Environment::with_prefix("TRANSPERTH")
                    .prefix_separator("__")
                    .separator("__"),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Point every service at one base URL, with placeholder keys
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            auth: EndpointConfig::new(base_url).with_api_key("test-app-key"),
            journey_planner: EndpointConfig::new(base_url),
            realtime: EndpointConfig::new(base_url).with_api_key("test-realtime-key"),
            fare: EndpointConfig::new(base_url),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    /// The configured realtime timezone, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a known IANA timezone.
    pub fn timezone(&self) -> Result<Option<Tz>, String> {
        self.realtime_timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| format!("unknown realtime_timezone: {name}"))
            })
            .transpose()
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        for (name, endpoint) in [
            ("auth", &self.auth),
            ("journey_planner", &self.journey_planner),
            ("realtime", &self.realtime),
            ("fare", &self.fare),
        ] {
            if endpoint.base_url.is_empty() {
                return Err(format!("{name}.base_url must not be empty"));
            }
            if endpoint.api_key.as_deref().is_some_and(str::is_empty) {
                return Err(format!("{name}.api_key must not be empty when set"));
            }
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        self.timezone()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransperthConfig::default();
        assert_eq!(config.auth.base_url, DEFAULT_AUTH_URL);
        assert_eq!(config.realtime.base_url, "https://realtime.transperth.info");
        assert!(config.auth.api_key.is_none());
        assert!(config.realtime.api_key.is_none());
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.starts_with("transperth_client/"));
    }

    #[test]
    fn test_testing_config() {
        let config = TransperthConfig::for_testing("http://127.0.0.1:9999");
        assert_eq!(config.fare.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.realtime.api_key.as_deref(), Some("test-realtime-key"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_url_join() {
        let endpoint = EndpointConfig::new("https://example.com/api/");
        assert_eq!(endpoint.url("/TripInfo"), "https://example.com/api/TripInfo");
    }

    #[test]
    fn test_validation_success() {
        assert!(TransperthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_base_url() {
        let config = TransperthConfig {
            fare: EndpointConfig::new(""),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("fare.base_url"));
    }

    #[test]
    fn test_validation_empty_key() {
        let config = TransperthConfig {
            realtime: default_realtime().with_api_key(""),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = TransperthConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timezone() {
        let config = TransperthConfig {
            realtime_timezone: Some("Australia/Perth".to_string()),
            ..Default::default()
        };
        assert_eq!(config.timezone().unwrap(), Some(chrono_tz::Australia::Perth));
        assert!(config.validate().is_ok());

        let config = TransperthConfig {
            realtime_timezone: Some("Mars/Olympus_Mons".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{ "realtime": { "base_url": "http://rt", "api_key": "k-1" } }"#;
        let config: TransperthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.realtime.base_url, "http://rt");
        assert_eq!(config.realtime.api_key.as_deref(), Some("k-1"));
        assert_eq!(config.auth.base_url, DEFAULT_AUTH_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_without_sources() {
        let config = TransperthConfig::load().unwrap();
        assert_eq!(config.journey_planner.base_url, DEFAULT_JOURNEY_PLANNER_URL);
    }
}
