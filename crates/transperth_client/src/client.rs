//! Transperth backend client
//!
//! One method per remote operation. Each builds its request from a fresh
//! template plus the current session, sends exactly one HTTP request and
//! hands back the raw response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::config::TransperthConfig;
use crate::error::TransperthError;
use crate::models::{
    ApiResponse, JourneyQuery, NearbyStopsQuery, RealtimeTripQuery, RouteTimetableQuery,
    TransactionHistoryQuery, TransportMode, geo_coordinate, parse_trip_id,
};
use crate::realtime::RealtimeAuth;
use crate::session::{Session, SessionSnapshot};
use crate::templates::{BodyTemplate, QueryTemplate, bool_str, object};

const JSON: &str = "application/json";

/// Operations offered by the Transperth backend
#[async_trait]
pub trait TransperthApi: Send + Sync {
    /// Authenticate a device ID, storing the journey-planner key and device ID on 200
    async fn authenticate_device(&self, device_id: &str) -> Result<ApiResponse, TransperthError>;

    /// Authenticate a user, storing the auth token and email on 200
    async fn authenticate_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ApiResponse, TransperthError>;

    /// SmartRider transactions for a card linked to the authenticated user
    async fn fetch_transaction_history(
        &self,
        query: &TransactionHistoryQuery,
    ) -> Result<ApiResponse, TransperthError>;

    /// SmartRiders linked to the authenticated user
    async fn get_smartrider_list(&self) -> Result<ApiResponse, TransperthError>;

    /// Stops near a coordinate
    async fn fetch_stops_near_me(
        &self,
        query: &NearbyStopsQuery,
    ) -> Result<ApiResponse, TransperthError>;

    /// Routes whose code contains `code` as a subsequence (matched server-side)
    async fn fetch_route_lookup(&self, code: &str) -> Result<ApiResponse, TransperthError>;

    /// Trips and stop patterns of a route over a date interval
    async fn fetch_route_timetable(
        &self,
        query: &RouteTimetableQuery,
    ) -> Result<ApiResponse, TransperthError>;

    /// Extra per-trip timetable data for composite trip identifiers
    async fn fetch_timetable_data(
        &self,
        date: &str,
        trips: &[String],
    ) -> Result<ApiResponse, TransperthError>;

    /// Trip plans between two places
    async fn fetch_journeys(&self, query: &JourneyQuery) -> Result<ApiResponse, TransperthError>;

    /// Vehicle position and realtime status of a trip occurrence
    async fn fetch_realtime_trip(
        &self,
        query: &RealtimeTripQuery,
    ) -> Result<ApiResponse, TransperthError>;

    /// URLs of the bulk reference datasets used by the app
    async fn check_available_reference_data(&self) -> Result<ApiResponse, TransperthError>;
}

/// HTTP client for the Transperth app backend
#[derive(Debug)]
pub struct TransperthClient {
    client: Client,
    config: TransperthConfig,
    session: Arc<Session>,
    timezone: Option<Tz>,
}

impl TransperthClient {
    /// Create a client with a fresh session
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &TransperthConfig) -> Result<Self, TransperthError> {
        Self::with_session(config, Arc::new(Session::new()))
    }

    /// Create a client around an existing session
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn with_session(
        config: &TransperthConfig,
        session: Arc<Session>,
    ) -> Result<Self, TransperthError> {
        config
            .validate()
            .map_err(TransperthError::ConfigurationError)?;
        let timezone = config
            .timezone()
            .map_err(TransperthError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| TransperthError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
            session,
            timezone,
        })
    }

    /// The session this client reads and updates
    #[must_use]
    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// POST a form to the realtime service with a freshly computed `Authorization` header
    ///
    /// # Errors
    ///
    /// Returns an error if no realtime key is configured or the request fails
    /// at the transport level.
    #[instrument(skip(self, form))]
    pub async fn realtime_request(
        &self,
        target: &str,
        form: &[(&str, String)],
    ) -> Result<ApiResponse, TransperthError> {
        let key = self.config.realtime.api_key.as_deref().ok_or_else(|| {
            TransperthError::ConfigurationError("realtime.api_key is not set".to_string())
        })?;
        let authorization = RealtimeAuth::new(key, self.timezone).header();

        let url = self.config.realtime.url(target);
        debug!(?url, "Sending realtime request");

        let request = self
            .client
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .form(form);
        self.send(request).await
    }

    /// Journey-planner key: the session's, else the configured static one
    fn journey_planner_key(&self, session: &SessionSnapshot) -> Option<String> {
        session
            .journey_planner_key
            .clone()
            .or_else(|| self.config.journey_planner.api_key.clone())
    }

    fn account_template(&self, session: &SessionSnapshot) -> BodyTemplate {
        BodyTemplate::account(
            self.config.auth.api_key.as_deref(),
            self.journey_planner_key(session).as_deref(),
            session,
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, TransperthError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransperthError::from_transport(&e, self.config.timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransperthError::from_transport(&e, self.config.timeout_secs))?;

        debug!(%status, bytes = body.len(), "Response received");
        Ok(ApiResponse { status, body })
    }

    async fn post_account(&self, target: &str, body: &Value) -> Result<ApiResponse, TransperthError> {
        let url = self.config.auth.url(target);
        debug!(?url, "Posting to account service");

        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON)
            .json(body);
        self.send(request).await
    }

    async fn get_journey_planner(
        &self,
        target: &str,
        fields: Vec<(&'static str, String)>,
    ) -> Result<ApiResponse, TransperthError> {
        let key = self.journey_planner_key(&self.session.snapshot());
        if key.is_none() {
            debug!("No journey-planner key yet, sending request without ApiKey");
        }
        let params = QueryTemplate::journey_planner(key.as_deref()).overlay(fields);

        let url = self.config.journey_planner.url(target);
        debug!(?url, "Querying journey planner");

        let request = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, JSON)
            .query(&params);
        self.send(request).await
    }
}

/// Read a string field from an authentication response body
fn auth_field(body: &Value, field: &'static str) -> Result<String, TransperthError> {
    body.get(field)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or(TransperthError::MalformedAuthResponse { field })
}

/// Parse an authentication body, treating non-JSON as a missing `field`
fn auth_body(response: &ApiResponse, field: &'static str) -> Result<Value, TransperthError> {
    response
        .json_value()
        .map_err(|_| TransperthError::MalformedAuthResponse { field })
}

#[async_trait]
impl TransperthApi for TransperthClient {
    #[instrument(skip(self))]
    async fn authenticate_device(&self, device_id: &str) -> Result<ApiResponse, TransperthError> {
        let session = self.session.snapshot();
        let body = self
            .account_template(&session)
            .overlay(object(json!({ "Device": { "DeviceId": device_id } })));

        let response = self.post_account("/authenticate", &body).await?;
        if response.status != StatusCode::OK {
            warn!(status = %response.status, "Device authentication rejected");
            return Ok(response);
        }

        let parsed = auth_body(&response, "jjpapikey")?;
        let journey_planner_key = auth_field(&parsed, "jjpapikey")?;
        let issued_device_id = auth_field(&parsed, "deviceID")?;

        self.session
            .record_device(journey_planner_key, issued_device_id);
        info!("Device authenticated");
        Ok(response)
    }

    #[instrument(skip(self, password))]
    async fn authenticate_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ApiResponse, TransperthError> {
        let session = self.session.snapshot();
        if session.device_id.is_none() {
            debug!("Authenticating user before device, sending null DeviceId");
        }
        let body = self
            .account_template(&session)
            .overlay(object(json!({ "Email": email, "Password": password })));

        let response = self.post_account("/Authenticate", &body).await?;
        if response.status != StatusCode::OK {
            warn!(status = %response.status, "User authentication rejected");
            return Ok(response);
        }

        let parsed = auth_body(&response, "hash")?;
        let token = auth_field(&parsed, "hash")?;

        self.session.record_user(token, email.to_string());
        info!("User authenticated");
        Ok(response)
    }

    #[instrument(skip(self, query), fields(psn = %query.psn))]
    async fn fetch_transaction_history(
        &self,
        query: &TransactionHistoryQuery,
    ) -> Result<ApiResponse, TransperthError> {
        let body = self
            .account_template(&self.session.snapshot())
            .overlay(object(json!({
                "PSN": query.psn,
                "fromDate": query.from_date,
                "toDate": query.to_date,
                "tPageNumber": 0,
                "tPageSize": query.max_transactions,
                "mode": 4,
            })));

        self.post_account("/MyAccountGetSmartRiderDetails", &body)
            .await
    }

    #[instrument(skip(self))]
    async fn get_smartrider_list(&self) -> Result<ApiResponse, TransperthError> {
        let body = self
            .account_template(&self.session.snapshot())
            .to_value();

        self.post_account("/MyAccountGetSmartRiderList", &body)
            .await
    }

    #[instrument(skip(self, query), fields(lat = query.latitude, lon = query.longitude))]
    async fn fetch_stops_near_me(
        &self,
        query: &NearbyStopsQuery,
    ) -> Result<ApiResponse, TransperthError> {
        self.get_journey_planner(
            "/NearbyTransitStops",
            vec![
                (
                    "maximumWalkDistanceInMetres",
                    query.max_distance_metres.to_string(),
                ),
                ("maximumStopsToReturn", query.max_stops.to_string()),
                ("walkSpeed", query.walk_speed.to_string()),
                (
                    "GeoCoordinate",
                    geo_coordinate(query.latitude, query.longitude),
                ),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn fetch_route_lookup(&self, code: &str) -> Result<ApiResponse, TransperthError> {
        self.get_journey_planner("/Routes", vec![("SearchTerm", code.to_string())])
            .await
    }

    #[instrument(skip(self, query), fields(route = %query.route))]
    async fn fetch_route_timetable(
        &self,
        query: &RouteTimetableQuery,
    ) -> Result<ApiResponse, TransperthError> {
        self.get_journey_planner(
            "/Timetable",
            vec![
                ("Route", query.route.clone()),
                ("StartDate", query.begin_date.clone()),
                ("EndDate", query.end_date.clone()),
                ("ReturnNotes", bool_str(query.return_notes).to_string()),
            ],
        )
        .await
    }

    #[instrument(skip(self, trips), fields(trip_count = trips.len()))]
    async fn fetch_timetable_data(
        &self,
        date: &str,
        trips: &[String],
    ) -> Result<ApiResponse, TransperthError> {
        let trip_ids = trips
            .iter()
            .map(|trip| parse_trip_id(trip))
            .collect::<Result<Vec<_>, _>>()?;

        let fields = std::iter::once(("OperatingDate", date.to_string()))
            .chain(trip_ids.iter().map(|id| ("TripIds", id.to_string())));
        let params = QueryTemplate::fare(self.config.fare.api_key.as_deref()).overlay(fields);

        let url = self.config.fare.url("/TripInfo");
        debug!(?url, "Querying trip info");

        let request = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .query(&params);
        self.send(request).await
    }

    #[instrument(skip(self, query), fields(from = %query.origin, to = %query.destination))]
    async fn fetch_journeys(&self, query: &JourneyQuery) -> Result<ApiResponse, TransperthError> {
        self.get_journey_planner(
            "/JourneyPlan",
            vec![
                ("ReturnNotes", bool_str(query.return_notes).to_string()),
                (
                    "mappingdatarequired",
                    bool_str(query.mapping_data_required).to_string(),
                ),
                ("From", query.origin.to_string()),
                ("To", query.destination.to_string()),
                ("TimeMode", query.time_mode.as_str().to_string()),
                ("MaxChanges", query.max_changes.to_string()),
                (
                    "MaxWalkDistanceMetres",
                    query.max_walk_distance_metres.to_string(),
                ),
                (
                    "TransportModes",
                    TransportMode::join(&query.transport_modes),
                ),
                ("Date", query.date_time.clone()),
                ("CheckRealTime", bool_str(query.check_realtime).to_string()),
                ("WalkSpeed", query.walk_speed.to_string()),
                ("MaxJourneys", query.max_journeys.to_string()),
            ],
        )
        .await
    }

    #[instrument(skip(self, query), fields(trip = %query.trip))]
    async fn fetch_realtime_trip(
        &self,
        query: &RealtimeTripQuery,
    ) -> Result<ApiResponse, TransperthError> {
        let form = [
            ("TripUid", query.trip.clone()),
            ("TripDate", query.date.clone()),
            (
                "IsMappingDataReturned",
                bool_str(query.mapping_data_returned).to_string(),
            ),
            (
                "IsRealTimeChecked",
                bool_str(query.realtime_checked).to_string(),
            ),
            ("ReturnNotes", bool_str(query.return_notes).to_string()),
        ];

        self.realtime_request("/SJP/Trip", &form).await
    }

    #[instrument(skip(self))]
    async fn check_available_reference_data(&self) -> Result<ApiResponse, TransperthError> {
        self.get_journey_planner("/AvailableReferenceData", Vec::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: StatusCode, body: &str) -> ApiResponse {
        ApiResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_auth_field_present() {
        let body = json!({ "jjpapikey": "key-1", "deviceID": "dev-1" });
        assert_eq!(auth_field(&body, "jjpapikey").unwrap(), "key-1");
        assert_eq!(auth_field(&body, "deviceID").unwrap(), "dev-1");
    }

    #[test]
    fn test_auth_field_missing_or_wrong_type() {
        let body = json!({ "hash": 42 });
        assert!(matches!(
            auth_field(&body, "hash"),
            Err(TransperthError::MalformedAuthResponse { field: "hash" })
        ));
        assert!(matches!(
            auth_field(&body, "jjpapikey"),
            Err(TransperthError::MalformedAuthResponse { field: "jjpapikey" })
        ));
    }

    #[test]
    fn test_auth_body_not_json() {
        let result = auth_body(&response(StatusCode::OK, "<html/>"), "hash");
        assert!(matches!(
            result,
            Err(TransperthError::MalformedAuthResponse { field: "hash" })
        ));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = TransperthConfig {
            timeout_secs: 0,
            ..TransperthConfig::default()
        };
        assert!(matches!(
            TransperthClient::new(&config),
            Err(TransperthError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_journey_planner_key_fallback() {
        let mut config = TransperthConfig::for_testing("http://127.0.0.1:1");
        config.journey_planner.api_key = Some("static".to_string());
        let client = TransperthClient::new(&config).unwrap();

        assert_eq!(
            client
                .journey_planner_key(&client.session.snapshot())
                .as_deref(),
            Some("static")
        );

        client
            .session
            .record_device("issued".to_string(), "dev".to_string());
        assert_eq!(
            client
                .journey_planner_key(&client.session.snapshot())
                .as_deref(),
            Some("issued")
        );
    }

    #[test]
    fn test_shared_session() {
        let config = TransperthConfig::for_testing("http://127.0.0.1:1");
        let session = Arc::new(Session::new());
        let a = TransperthClient::with_session(&config, Arc::clone(&session)).unwrap();
        let b = TransperthClient::with_session(&config, Arc::clone(&session)).unwrap();

        a.session()
            .record_device("k".to_string(), "d".to_string());
        assert_eq!(b.session().journey_planner_key().as_deref(), Some("k"));
    }

    #[tokio::test]
    async fn test_realtime_without_key() {
        let mut config = TransperthConfig::for_testing("http://127.0.0.1:1");
        config.realtime.api_key = None;
        let client = TransperthClient::new(&config).unwrap();

        let result = client
            .fetch_realtime_trip(&RealtimeTripQuery::new("t", "2026-10-19"))
            .await;
        assert!(matches!(
            result,
            Err(TransperthError::ConfigurationError(_))
        ));
    }
}
