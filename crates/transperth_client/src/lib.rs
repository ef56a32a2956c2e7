//! Transperth app backend client
//!
//! Programmatic access to the services behind the Transperth mobile app:
//! trip planning, stop lookup and route timetables via the journey planner,
//! SmartRider account data via the authentication service, per-trip data via
//! the service-information API, and vehicle positions via the realtime API.
//!
//! # Architecture
//!
//! [`TransperthApi`] lists the remote operations and [`TransperthClient`]
//! implements them over `reqwest`. Authentication results live in a
//! [`Session`] owned by the client (or injected with
//! [`TransperthClient::with_session`]); every other request reads it. The
//! realtime service uses its own header scheme, see [`realtime`].
//!
//! Operations return the raw [`ApiResponse`]. A non-2xx status is not an
//! error; only transport failures, malformed authentication bodies and bad
//! trip identifiers are.
//!
//! # Example
//!
//! ```rust,ignore
//! use transperth_client::{NearbyStopsQuery, TransperthApi, TransperthClient, TransperthConfig};
//!
//! let config = TransperthConfig::load()?;
//! let client = TransperthClient::new(&config)?;
//!
//! client.authenticate_device("0123456789abcdef").await?;
//! let stops = client
//!     .fetch_stops_near_me(&NearbyStopsQuery::new(-31.9505, 115.8605))
//!     .await?
//!     .json_value()?;
//! ```

mod client;
mod config;
mod error;
mod models;
pub mod realtime;
mod session;
mod templates;

pub use client::{TransperthApi, TransperthClient};
pub use config::{EndpointConfig, TransperthConfig};
pub use error::TransperthError;
pub use models::{
    ApiResponse, JourneyQuery, NearbyStopsQuery, Place, RealtimeTripQuery, RouteTimetableQuery,
    TimeMode, TransactionHistoryQuery, TransportMode, parse_trip_id,
};
pub use realtime::RealtimeAuth;
pub use session::{Session, SessionSnapshot};
pub use templates::{BodyTemplate, QueryParams, QueryTemplate};
