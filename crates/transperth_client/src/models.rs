//! Request parameters and raw responses
//!
//! Responses are not modelled: the backend's schemas are undocumented, so
//! callers get the status and body and decode what they need.

use std::fmt;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::TransperthError;

/// Raw HTTP response from any operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as text
    pub body: String,
}

impl ApiResponse {
    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body into a typed value
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransperthError> {
        serde_json::from_str(&self.body).map_err(|e| TransperthError::ParseError(e.to_string()))
    }

    /// Decode the body into a generic JSON tree
    pub fn json_value(&self) -> Result<serde_json::Value, TransperthError> {
        self.json()
    }
}

/// Origin or destination of a trip plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Place {
    /// A stop UID, e.g. `PerthRestricted:10001`
    Stop(String),
    /// A coordinate
    Coordinate {
        /// Latitude in degrees
        latitude: f64,
        /// Longitude in degrees
        longitude: f64,
    },
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop(uid) => f.write_str(uid),
            Self::Coordinate {
                latitude,
                longitude,
            } => write!(f, "{}", geo_coordinate(*latitude, *longitude)),
        }
    }
}

/// Coordinate as the journey planner spells it: `"lat, lon"`
pub(crate) fn geo_coordinate(latitude: f64, longitude: f64) -> String {
    format!("{latitude}, {longitude}")
}

/// Transport modes accepted by the trip planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportMode {
    /// Bus
    Bus,
    /// Train
    Rail,
    /// Ferry
    Ferry,
    /// School bus (not part of the standard journey-planner set)
    #[serde(rename = "School Bus")]
    SchoolBus,
}

impl TransportMode {
    /// Name as sent on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bus => "Bus",
            Self::Rail => "Rail",
            Self::Ferry => "Ferry",
            Self::SchoolBus => "School Bus",
        }
    }

    /// Modes searched when none are given
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::Bus, Self::Rail, Self::Ferry]
    }

    /// Semicolon-joined list, e.g. `Bus;Rail;Ferry`
    #[must_use]
    pub fn join(modes: &[Self]) -> String {
        modes
            .iter()
            .map(|mode| mode.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the trip planner reads the requested date-time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeMode {
    /// Depart at or after the time
    #[default]
    LeaveAfter,
    /// Arrive at or before the time
    ArriveBefore,
}

impl TimeMode {
    /// Name as sent on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeaveAfter => "LeaveAfter",
            Self::ArriveBefore => "ArriveBefore",
        }
    }
}

/// Nearby-stop search around a coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStopsQuery {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Maximum walking distance in metres
    pub max_distance_metres: u32,
    /// Maximum number of stops returned
    pub max_stops: u32,
    /// Walking speed, km/h
    pub walk_speed: u32,
}

impl NearbyStopsQuery {
    /// Search around a coordinate with the app's defaults
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            max_distance_metres: 6500,
            max_stops: 15,
            walk_speed: 4,
        }
    }
}

/// Timetable of one route over a date interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTimetableQuery {
    /// Route UID, as returned by the route lookup
    pub route: String,
    /// First date, ISO 8601
    pub begin_date: String,
    /// Last date, ISO 8601 (usually equal to `begin_date`)
    pub end_date: String,
    /// Include service notes
    pub return_notes: bool,
}

impl RouteTimetableQuery {
    /// Timetable for a single day
    #[must_use]
    pub fn for_day(route: impl Into<String>, date: impl Into<String>) -> Self {
        let date = date.into();
        Self {
            route: route.into(),
            begin_date: date.clone(),
            end_date: date,
            return_notes: true,
        }
    }
}

/// Trip-plan search
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyQuery {
    /// Where the journey starts
    pub origin: Place,
    /// Where the journey ends
    pub destination: Place,
    /// Date-time, `YYYY-MM-DDTHH:MM`
    pub date_time: String,
    /// Include service notes
    pub return_notes: bool,
    /// Include the polyline of each leg
    pub mapping_data_required: bool,
    /// How `date_time` is read
    pub time_mode: TimeMode,
    /// Maximum number of changes
    pub max_changes: i32,
    /// Maximum total walking distance in metres
    pub max_walk_distance_metres: u32,
    /// Modes of transport allowed
    pub transport_modes: Vec<TransportMode>,
    /// Ask for realtime data (the backend appears to ignore this)
    pub check_realtime: bool,
    /// Walking speed, km/h
    pub walk_speed: u32,
    /// Upper bound on journeys returned (not strictly honoured)
    pub max_journeys: u32,
}

impl JourneyQuery {
    /// Search between two places with the app's defaults
    #[must_use]
    pub fn new(origin: Place, destination: Place, date_time: impl Into<String>) -> Self {
        Self {
            origin,
            destination,
            date_time: date_time.into(),
            return_notes: true,
            mapping_data_required: true,
            time_mode: TimeMode::LeaveAfter,
            max_changes: i32::MAX,
            max_walk_distance_metres: 2000,
            transport_modes: TransportMode::defaults(),
            check_realtime: false,
            walk_speed: 4,
            max_journeys: 5,
        }
    }
}

/// Realtime lookup of a trip occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeTripQuery {
    /// Trip UID
    pub trip: String,
    /// Operating date of the trip
    pub date: String,
    /// Include the trip's polyline
    pub mapping_data_returned: bool,
    /// Check the trip against realtime data
    pub realtime_checked: bool,
    /// Include service notes
    pub return_notes: bool,
}

impl RealtimeTripQuery {
    /// Look up a trip with the app's defaults
    #[must_use]
    pub fn new(trip: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            trip: trip.into(),
            date: date.into(),
            mapping_data_returned: false,
            realtime_checked: true,
            return_notes: true,
        }
    }
}

/// SmartRider transaction history request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHistoryQuery {
    /// Card serial number
    pub psn: String,
    /// Start of range
    pub from_date: String,
    /// End of range
    pub to_date: String,
    /// Page size (the whole history is one page)
    pub max_transactions: u32,
}

impl TransactionHistoryQuery {
    /// History of one card over a date range
    #[must_use]
    pub fn new(
        psn: impl Into<String>,
        from_date: impl Into<String>,
        to_date: impl Into<String>,
    ) -> Self {
        Self {
            psn: psn.into(),
            from_date: from_date.into(),
            to_date: to_date.into(),
            max_transactions: 500,
        }
    }
}

/// Trip ID from a composite identifier: the integer after the last `:`
///
/// # Errors
///
/// Returns [`TransperthError::InvalidTripId`] if that part is not an integer.
pub fn parse_trip_id(trip: &str) -> Result<i64, TransperthError> {
    let tail = trip.rsplit(':').next().unwrap_or(trip);
    tail.trim()
        .parse()
        .map_err(|_| TransperthError::InvalidTripId {
            value: trip.to_string(),
        })
}
