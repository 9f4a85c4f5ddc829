//! Publish/subscribe channel for authentication state.
//!
//! Replaces a framework-coupled auth-state provider with an explicit
//! broadcaster: it owns a [`tokio::sync::broadcast`] channel and pushes a
//! new [`AuthState`] to every subscriber the moment a login or logout
//! lands in the session slot. The UI shell is just one subscriber among
//! possibly several (audit log, telemetry).

use tokio::sync::broadcast;
use tracing::info;

use crate::{AuthService, User};

/// Identity attributes derived from the authenticated user.
///
/// The broadcaster only ever holds a transient copy; the session slot in
/// [`AuthService`] remains the owner of the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
    pub role: String,
}

impl From<&User> for Claims {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role.clone(),
        }
    }
}

/// Current authentication state of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(Claims),
}

/// Holds the broadcast channel and the auth service whose session slot is
/// the source of truth for [`AuthStateBroadcaster::current_state`].
#[derive(Clone)]
pub struct AuthStateBroadcaster {
    auth: AuthService,
    sender: broadcast::Sender<AuthState>,
}

impl AuthStateBroadcaster {
    /// Subscribers that lag beyond this many pending notifications start
    /// missing the oldest ones.
    const CHANNEL_CAPACITY: usize = 16;

    pub fn new(auth: AuthService) -> Self {
        let (sender, _) = broadcast::channel(Self::CHANNEL_CAPACITY);
        Self { auth, sender }
    }

    /// Register a new subscriber. Only transitions after this call are
    /// delivered; the current state can always be read via
    /// [`Self::current_state`].
    pub fn subscribe(&self) -> broadcast::Receiver<AuthState> {
        self.sender.subscribe()
    }

    /// The state derived from the session slot right now.
    ///
    /// Re-reads the slot on every call rather than caching, so the answer
    /// always reflects the latest login or logout.
    pub async fn current_state(&self) -> AuthState {
        match self.auth.current_user().await {
            Some(user) => AuthState::Authenticated(Claims::from(&user)),
            None => AuthState::Anonymous,
        }
    }

    /// Record `user` as the authenticated identity and notify subscribers.
    pub async fn mark_authenticated(&self, user: User) {
        let state = AuthState::Authenticated(Claims::from(&user));
        info!(username = %user.username, role = %user.role, "user authenticated");

        self.auth.set_current_user(Some(user)).await;
        // A send error only means there are no subscribers right now.
        let _ = self.sender.send(state);
    }

    /// Clear the authenticated identity and notify subscribers.
    pub async fn mark_logged_out(&self) {
        info!("user logged out");

        self.auth.set_current_user(None).await;
        let _ = self.sender.send(AuthState::Anonymous);
    }
}
