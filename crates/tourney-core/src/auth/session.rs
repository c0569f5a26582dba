//! In-memory session state and the session-end event.

use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::models::UserProfile;

/// Capacity of the session event channel. Events are rare (one per logout
/// or expiry), so a small buffer never lags in practice.
const EVENT_BUFFER_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup reconciliation has not finished yet
    Unknown,
    Authenticated(UserProfile),
    Anonymous,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Unknown)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The refresh exchange failed or no refresh token was available
    Expired,
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Ended { reason: SessionEndReason },
}

/// Owner of the session state. All mutation goes through the named
/// transitions below.
pub struct Session {
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { state, events }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Wait until startup reconciliation has resolved the state
    pub async fn wait_resolved(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        let resolved = rx.wait_for(SessionState::is_resolved).await;
        match resolved {
            Ok(state) => state.clone(),
            // Unreachable while `self` holds the sender
            Err(_) => SessionState::Anonymous,
        }
    }

    pub(crate) fn authenticate(&self, profile: UserProfile) {
        info!(user = %profile.username, "Session authenticated");
        self.state.send_replace(SessionState::Authenticated(profile));
    }

    /// Replace the profile of an authenticated session. No-op otherwise.
    pub(crate) fn update_profile(&self, profile: UserProfile) {
        self.state.send_if_modified(|state| match state {
            SessionState::Authenticated(current) => {
                *current = profile;
                true
            }
            _ => false,
        });
    }

    /// Resolve to anonymous without a session-end event (nothing was lost)
    pub(crate) fn mark_anonymous(&self) {
        debug!("Session resolved as anonymous");
        self.state.send_replace(SessionState::Anonymous);
    }

    /// Move to anonymous and fire the session-end event, once per transition.
    /// Callers clear the credential store first.
    pub(crate) fn end(&self, reason: SessionEndReason) -> bool {
        let previous = self.state.send_replace(SessionState::Anonymous);
        if previous == SessionState::Anonymous {
            return false;
        }

        info!(?reason, "Session ended");
        if self.events.send(SessionEvent::Ended { reason }).is_err() {
            debug!("No session event subscribers");
        }
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::sync::broadcast::error::TryRecvError;

    fn profile(username: &str) -> UserProfile {
        UserProfile {
            id: 1,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            avatar: None,
            num_whatsapp: None,
            is_verified: false,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_starts_unknown() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Unknown);
        assert!(!session.state().is_resolved());
    }

    #[test]
    fn test_end_fires_once_per_transition() {
        let session = Session::new();
        let mut events = session.subscribe();

        session.authenticate(profile("ana"));
        assert!(session.end(SessionEndReason::LoggedOut));
        assert!(!session.end(SessionEndReason::Expired));

        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::Ended { reason: SessionEndReason::LoggedOut }
        );
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_end_from_unknown_fires() {
        let session = Session::new();
        let mut events = session.subscribe();
        assert!(session.end(SessionEndReason::Expired));
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::Ended { reason: SessionEndReason::Expired }
        );
    }

    #[test]
    fn test_mark_anonymous_is_silent() {
        let session = Session::new();
        let mut events = session.subscribe();
        session.mark_anonymous();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_update_profile_only_when_authenticated() {
        let session = Session::new();
        session.update_profile(profile("ghost"));
        assert_eq!(session.state(), SessionState::Unknown);

        session.authenticate(profile("ana"));
        session.update_profile(profile("ana2"));
        assert_eq!(session.state().profile().unwrap().username, "ana2");
    }

    #[tokio::test]
    async fn test_wait_resolved() {
        let session = std::sync::Arc::new(Session::new());
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_resolved().await })
        };
        session.authenticate(profile("ana"));
        let state = waiter.await.unwrap();
        assert!(state.is_authenticated());
    }
}
