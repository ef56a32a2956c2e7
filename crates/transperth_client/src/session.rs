//! Session state shared by every request
//!
//! Populated by the two authentication calls and read by everything else.
//! Fields are only ever overwritten by a later successful authentication.

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};

/// Point-in-time copy of the session state
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Journey-planner key issued by device authentication
    pub journey_planner_key: Option<String>,
    /// Device ID echoed back by device authentication
    pub device_id: Option<String>,
    /// User token issued by user authentication
    pub auth_token: Option<SecretString>,
    /// Email the user authenticated with
    pub email: Option<String>,
}

impl SessionSnapshot {
    /// Exposed auth token, for placing into a request body
    pub(crate) fn auth_token_str(&self) -> Option<&str> {
        self.auth_token.as_ref().map(|token| token.expose_secret())
    }
}

/// Mutable session held by a client
///
/// Build one with [`Session::new`] and hand it to
/// [`TransperthClient::with_session`](crate::TransperthClient::with_session)
/// to share or isolate sessions explicitly.
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionSnapshot>,
}

impl Session {
    /// Create an empty, unauthenticated session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current state
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.read().clone()
    }

    /// Journey-planner key, if the device has been authenticated
    #[must_use]
    pub fn journey_planner_key(&self) -> Option<String> {
        self.state.read().journey_planner_key.clone()
    }

    /// Device ID, if the device has been authenticated
    #[must_use]
    pub fn device_id(&self) -> Option<String> {
        self.state.read().device_id.clone()
    }

    /// Email of the authenticated user
    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.state.read().email.clone()
    }

    /// Whether a user token is held
    #[must_use]
    pub fn is_user_authenticated(&self) -> bool {
        self.state.read().auth_token.is_some()
    }

    /// Record the result of device authentication
    pub(crate) fn record_device(&self, journey_planner_key: String, device_id: String) {
        let mut state = self.state.write();
        state.journey_planner_key = Some(journey_planner_key);
        state.device_id = Some(device_id);
    }

    /// Record the result of user authentication
    pub(crate) fn record_user(&self, auth_token: String, email: String) {
        let mut state = self.state.write();
        state.auth_token = Some(SecretString::from(auth_token));
        state.email = Some(email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        let snapshot = session.snapshot();
        assert!(snapshot.journey_planner_key.is_none());
        assert!(snapshot.device_id.is_none());
        assert!(snapshot.auth_token.is_none());
        assert!(snapshot.email.is_none());
        assert!(!session.is_user_authenticated());
    }

    #[test]
    fn test_record_device() {
        let session = Session::new();
        session.record_device("jp-key".to_string(), "device-1".to_string());
        assert_eq!(session.journey_planner_key().as_deref(), Some("jp-key"));
        assert_eq!(session.device_id().as_deref(), Some("device-1"));
        assert!(!session.is_user_authenticated());
    }

    #[test]
    fn test_record_user_keeps_device() {
        let session = Session::new();
        session.record_device("jp-key".to_string(), "device-1".to_string());
        session.record_user("hash-1".to_string(), "a@example.com".to_string());

        let snapshot = session.snapshot();
        assert_eq!(snapshot.auth_token_str(), Some("hash-1"));
        assert_eq!(snapshot.email.as_deref(), Some("a@example.com"));
        assert_eq!(snapshot.device_id.as_deref(), Some("device-1"));
    }

    #[test]
    fn test_reauthentication_overwrites() {
        let session = Session::new();
        session.record_device("old".to_string(), "d1".to_string());
        session.record_device("new".to_string(), "d2".to_string());
        assert_eq!(session.journey_planner_key().as_deref(), Some("new"));
        assert_eq!(session.device_id().as_deref(), Some("d2"));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let session = Session::new();
        let before = session.snapshot();
        session.record_device("k".to_string(), "d".to_string());
        assert!(before.journey_planner_key.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new();
        session.record_user("super-secret-hash".to_string(), "a@example.com".to_string());
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret-hash"));
    }
}
