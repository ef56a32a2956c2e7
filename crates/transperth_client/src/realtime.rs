//! Realtime service authentication
//!
//! The realtime service does not take bearer or basic credentials. Every
//! request carries
//!
//! ```text
//! Authorization: Custom Username=PhoneApp, Nonce=<nonce>, Token=<token>
//! ```
//!
//! where, for the request timestamp `now` (`DDMMYYYYHHMMSS`):
//!
//! - `nonce = BASE64(<six random digits> "-" now)`
//! - `token = BASE64(SHA1("TrAnSpErTh-" key_without_hyphens "-" now))`
//!
//! The header must match what the backend computes, so it is rebuilt for
//! every request and never cached.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local, TimeZone, Utc};
use chrono_tz::Tz;
use rand::Rng;
use sha1::{Digest, Sha1};

/// Prefix hashed in front of the realtime key
pub const TOKEN_PREFIX: &str = "TrAnSpErTh-";

/// Username the app presents
pub const USERNAME: &str = "PhoneApp";

/// `strftime` pattern of the request timestamp
pub const TIMESTAMP_FORMAT: &str = "%d%m%Y%H%M%S";

const NONCE_DIGITS: usize = 6;

/// Format an instant as a request timestamp
#[must_use]
pub fn format_timestamp<Z: TimeZone>(at: &DateTime<Z>) -> String
where
    Z::Offset: fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Current request timestamp, in `timezone` or system local time
#[must_use]
pub fn timestamp_now(timezone: Option<Tz>) -> String {
    match timezone {
        Some(tz) => format_timestamp(&Utc::now().with_timezone(&tz)),
        None => format_timestamp(&Local::now()),
    }
}

/// `BASE64(<six random digits> "-" timestamp)`
#[must_use]
pub fn generate_nonce<R: Rng + ?Sized>(rng: &mut R, timestamp: &str) -> String {
    let digits: String = (0..NONCE_DIGITS)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    STANDARD.encode(format!("{digits}-{timestamp}"))
}

/// `BASE64(SHA1("TrAnSpErTh-" key_without_hyphens "-" timestamp))`
#[must_use]
pub fn compute_token(key: &str, timestamp: &str) -> String {
    let stripped = key.replace('-', "");
    let digest = Sha1::digest(format!("{TOKEN_PREFIX}{stripped}-{timestamp}").as_bytes());
    STANDARD.encode(digest)
}

/// Assemble the `Authorization` header value
#[must_use]
pub fn authorization_header(nonce: &str, token: &str) -> String {
    format!("Custom Username={USERNAME}, Nonce={nonce}, Token={token}")
}

/// Realtime key plus the clock it is stamped with
#[derive(Clone)]
pub struct RealtimeAuth {
    key: String,
    timezone: Option<Tz>,
}

impl fmt::Debug for RealtimeAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeAuth")
            .field("key", &"[REDACTED]")
            .field("timezone", &self.timezone)
            .finish()
    }
}

impl RealtimeAuth {
    /// Create from the realtime service's static key
    #[must_use]
    pub fn new(key: impl Into<String>, timezone: Option<Tz>) -> Self {
        Self {
            key: key.into(),
            timezone,
        }
    }

    /// Header value for a fixed timestamp
    #[must_use]
    pub fn header_at<R: Rng + ?Sized>(&self, timestamp: &str, rng: &mut R) -> String {
        let nonce = generate_nonce(rng, timestamp);
        let token = compute_token(&self.key, timestamp);
        authorization_header(&nonce, &token)
    }

    /// Header value for a request sent now
    #[must_use]
    pub fn header(&self) -> String {
        let timestamp = timestamp_now(self.timezone);
        self.header_at(&timestamp, &mut rand::rng())
    }
}
