//! Request templates
//!
//! Each request starts from a template built from the current session and
//! overlays its own fields onto a copy. Overlays borrow the template, so a
//! template can never pick up fields from an earlier call.

use serde_json::{Map, Value, json};

use crate::session::SessionSnapshot;

/// `authMode` value the authentication service expects
pub(crate) const AUTH_MODE: u8 = 1;

/// Ordered query parameters
pub type QueryParams = Vec<(&'static str, String)>;

/// Default query parameters for a GET endpoint family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTemplate {
    params: QueryParams,
}

impl QueryTemplate {
    /// `format=json`, plus `ApiKey` when a journey-planner key is known
    ///
    /// With no key the parameter is left out entirely, which the backend
    /// answers with an error response rather than the client failing.
    #[must_use]
    pub fn journey_planner(api_key: Option<&str>) -> Self {
        let mut params = vec![("format", "json".to_string())];
        if let Some(key) = api_key {
            params.push(("ApiKey", key.to_string()));
        }
        Self { params }
    }

    /// Fare service parameters: only `ApiKey`, and only if one is configured
    #[must_use]
    pub fn fare(api_key: Option<&str>) -> Self {
        Self {
            params: api_key
                .map(|key| vec![("ApiKey", key.to_string())])
                .unwrap_or_default(),
        }
    }

    /// Template parameters alone
    #[must_use]
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Copy the template and apply `fields` on top
    ///
    /// A field whose name is already in the template replaces it; repeated
    /// names within `fields` are all kept (used for list parameters).
    #[must_use]
    pub fn overlay(&self, fields: impl IntoIterator<Item = (&'static str, String)>) -> QueryParams {
        let fields: QueryParams = fields.into_iter().collect();
        let mut params: QueryParams = self
            .params
            .iter()
            .filter(|(name, _)| !fields.iter().any(|(field, _)| field == name))
            .cloned()
            .collect();
        params.extend(fields);
        params
    }
}

/// Default JSON body for the authentication/account service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyTemplate {
    fields: Map<String, Value>,
}

impl BodyTemplate {
    /// Body carrying the app key, auth mode and current session identity
    ///
    /// Unset session fields are sent as `null`; `AuthToken` only appears once
    /// a user has been authenticated.
    #[must_use]
    pub fn account(
        app_api_key: Option<&str>,
        journey_planner_key: Option<&str>,
        session: &SessionSnapshot,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert("format".to_string(), json!("json"));
        fields.insert("AppApiKey".to_string(), json!(app_api_key));
        fields.insert("authMode".to_string(), json!(AUTH_MODE));
        fields.insert(
            "Device".to_string(),
            json!({ "DeviceId": session.device_id }),
        );
        fields.insert("ApiKey".to_string(), json!(journey_planner_key));
        fields.insert("Email".to_string(), json!(session.email));
        if let Some(token) = session.auth_token_str() {
            fields.insert("AuthToken".to_string(), json!(token));
        }
        Self { fields }
    }

    /// Template body alone
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Copy the template and apply `fields` on top (top-level keys replace)
    #[must_use]
    pub fn overlay(&self, fields: Map<String, Value>) -> Value {
        let mut body = self.fields.clone();
        body.extend(fields);
        Value::Object(body)
    }
}

/// Build an overlay map from a `json!` object literal
pub(crate) fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Render a bool the way the backend's query parser expects
pub(crate) const fn bool_str(val: bool) -> &'static str {
    if val { "true" } else { "false" }
}
