//! Who is logged in, and how we know.

use crate::{
    client::HttpClient,
    endpoints::{self, AuthResponse, EndpointError},
    events::AuthEvent,
    storage::{self, StorageError},
    Credentials, Registration, User,
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinHandle;

/// A snapshot of the session state.
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
    /// Set once a token has been accepted by the server, or tentatively
    /// while a restored token is being verified.
    pub is_authenticated: bool,
    pub is_loading: bool,
    /// Has [`SessionStore::init()`] (or a login/logout) run yet?
    pub initialized: bool,
}

/// Read-only access to the session, for things which only need to know
/// whether a request is worth sending.
pub trait SessionAccess: Send + Sync {
    fn token(&self) -> Option<String>;
    fn is_authenticated(&self) -> bool;
}

/// Possible errors from the session's state transitions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("Unable to persist the session")]
    Storage(#[from] StorageError),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Endpoint(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Owns the session token and the logged in user.
///
/// Every transition is written through to the client's storage, which is
/// where the [`HttpClient`] reads the token from, so requests pick up the
/// change without being told.
#[derive(Debug)]
pub struct SessionStore {
    client: Arc<HttpClient>,
    state: RwLock<Session>,
}

impl SessionStore {
    pub fn new(client: Arc<HttpClient>) -> Self {
        SessionStore {
            client,
            state: RwLock::new(Session::default()),
        }
    }

    pub fn state(&self) -> Session { self.read().clone() }

    pub fn user(&self) -> Option<User> { self.read().user.clone() }

    pub fn is_initialized(&self) -> bool { self.read().initialized }

    /// Log in, persisting the new session.
    ///
    /// On failure the session is left as it was and the server's error is
    /// returned.
    pub async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<User, SessionError> {
        self.set_loading(true);

        let result = match endpoints::prime_csrf(&self.client).await {
            Ok(_) => endpoints::login(&self.client, credentials).await,
            Err(e) => Err(e),
        };

        self.sign_in(result)
    }

    /// Create an account and log straight into it.
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<User, SessionError> {
        self.set_loading(true);

        let result = match endpoints::prime_csrf(&self.client).await {
            Ok(_) => endpoints::register(&self.client, registration).await,
            Err(e) => Err(e),
        };

        self.sign_in(result)
    }

    /// Log out. The local session is always cleared, even if the server
    /// can't be told about it.
    pub async fn logout(&self) {
        if let Err(e) = endpoints::logout(&self.client).await {
            log::warn!("Unable to notify the server about the logout: {}", e);
        }

        self.clear();
        log::info!("Logged out");
        self.client.events().publish(AuthEvent::SignedOut);
    }

    /// Restore the session saved by a previous run.
    ///
    /// If both a token and a user were saved the session is tentatively
    /// marked as authenticated straight away, and the token is verified in
    /// the background. The returned handle resolves to the outcome of that
    /// verification. Must be called from within a tokio runtime.
    pub fn init(self: &Arc<Self>) -> Option<JoinHandle<bool>> {
        let storage = self.client.storage();
        let token = storage::load_token(&**storage);
        let user = storage::load_user(&**storage);

        match (token, user) {
            (Some(token), Some(user)) => {
                log::debug!("Restoring the session for {}", user.email);

                {
                    let mut state = self.write();
                    state.token = Some(token);
                    state.user = Some(user);
                    state.is_authenticated = true;
                    state.is_loading = true;
                    state.initialized = true;
                }

                let this = Arc::clone(self);
                Some(tokio::spawn(async move { this.check_auth().await }))
            },
            _ => {
                log::debug!("No saved session to restore");
                self.clear();
                None
            },
        }
    }

    /// Ask the server whether our token is still good, refreshing the
    /// cached user if it is and clearing the session if it isn't.
    pub async fn check_auth(&self) -> bool {
        let token = self.read().token.clone();
        let token = match token {
            Some(token) => token,
            None => {
                self.clear();
                return false;
            },
        };

        self.set_loading(true);

        match endpoints::current_user(&self.client).await {
            Ok(user) => {
                let mut state = self.write();

                if state.token.as_deref() != Some(token.as_str()) {
                    // someone logged in or out while we were waiting
                    state.is_loading = false;
                    return state.is_authenticated;
                }

                if let Err(e) = storage::save_user(&**self.client.storage(), &user) {
                    log::warn!("Unable to cache the user profile: {}", e);
                }

                state.user = Some(user);
                state.is_authenticated = true;
                state.is_loading = false;
                true
            },
            Err(e) => {
                log::info!("Unable to verify the session: {}", e);

                let (still_ours, was_authenticated) = {
                    let state = self.read();
                    (
                        state.token.as_deref() == Some(token.as_str()),
                        state.is_authenticated,
                    )
                };

                if !still_ours {
                    self.set_loading(false);
                    return false;
                }

                self.clear();
                if was_authenticated {
                    self.client.events().publish(AuthEvent::SessionExpired);
                }

                false
            },
        }
    }

    /// React to something another part of the application noticed.
    pub fn on_auth_event(&self, event: &AuthEvent) {
        // SessionExpired is only published after we've cleared ourselves
        if let AuthEvent::Unauthenticated { .. } = event {
            self.clear();
        }
    }

    fn sign_in(
        &self,
        result: Result<AuthResponse, EndpointError>,
    ) -> Result<User, SessionError> {
        let AuthResponse { token, user } = match result {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Authentication failed: {}", e);
                self.set_loading(false);
                return Err(e.into());
            },
        };

        if let Err(e) = storage::save_session(&**self.client.storage(), &token, &user) {
            self.set_loading(false);
            return Err(e.into());
        }

        {
            let mut state = self.write();
            state.token = Some(token);
            state.user = Some(user.clone());
            state.is_authenticated = true;
            state.is_loading = false;
            state.initialized = true;
        }

        self.client.events().publish(AuthEvent::SignedIn);

        Ok(user)
    }

    fn clear(&self) {
        storage::clear_session(&**self.client.storage());

        *self.write() = Session {
            initialized: true,
            ..Session::default()
        };
    }

    fn set_loading(&self, loading: bool) { self.write().is_loading = loading; }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionAccess for SessionStore {
    fn token(&self) -> Option<String> { self.read().token.clone() }

    fn is_authenticated(&self) -> bool { self.read().is_authenticated }
}
