//! Client-side state for the API's resources.

mod plans;
mod sequence;
mod settings;

pub use plans::{PlansState, PlansStore};
pub use sequence::{RequestSequence, Ticket};
pub use settings::{SettingsState, SettingsStore};

use crate::{
    client::HttpClient, endpoints::EndpointError, session::SessionAccess, storage,
};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Fail fast when there's no token worth sending.
///
/// The client clears storage as soon as the server rejects a token, which
/// can be before the session hears about it, so both need a token.
fn ensure_authenticated(
    session: &dyn SessionAccess,
    client: &HttpClient,
) -> Result<(), EndpointError> {
    if session.token().is_none() {
        log::debug!("Not sending a request because nobody is logged in");
        Err(EndpointError::AuthenticationRequired)
    } else if storage::load_token(&**client.storage()).is_none() {
        log::debug!("Not sending a request because the stored token was cleared");
        Err(EndpointError::AuthenticationRequired)
    } else {
        Ok(())
    }
}

/// Bookkeeping shared by every store: the state callers can see, plus how
/// many requests are still in flight.
trait StoreState: Clone {
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, error: Option<String>);
}

#[derive(Debug, Default)]
struct StoreCell<S> {
    inner: RwLock<Inner<S>>,
}

#[derive(Debug, Default)]
struct Inner<S> {
    state: S,
    in_flight: usize,
}

impl<S: StoreState> StoreCell<S> {
    fn snapshot(&self) -> S { read(&self.inner).state.clone() }

    fn update<F: FnOnce(&mut S)>(&self, mutate: F) { mutate(&mut write(&self.inner).state) }

    /// Mark a request as started.
    fn begin(&self) {
        let mut inner = write(&self.inner);
        inner.in_flight += 1;
        inner.state.set_loading(true);
    }

    /// Record a request which was rejected before it was sent.
    fn reject(&self, action: &str, error: EndpointError) -> EndpointError {
        log::warn!("Unable to {}: {}", action, error);
        write(&self.inner)
            .state
            .set_error(Some(error.user_message()));
        error
    }

    /// Mark a request as finished, applying its result if it is still
    /// current. Stale results are handed back to the caller but never
    /// touch the state.
    ///
    /// `is_current` and `apply` both run while the state is locked, so a
    /// mutation which invalidates older fetches can't interleave with them.
    fn finish<T, C, F>(
        &self,
        action: &str,
        result: Result<T, EndpointError>,
        is_current: C,
        apply: F,
    ) -> Result<T, EndpointError>
    where
        C: FnOnce() -> bool,
        F: FnOnce(&mut S, &T),
    {
        let mut inner = write(&self.inner);
        inner.in_flight = inner.in_flight.saturating_sub(1);
        let loading = inner.in_flight > 0;
        inner.state.set_loading(loading);
        let current = is_current();

        match &result {
            Ok(value) if current => apply(&mut inner.state, value),
            Err(e) if current => {
                log::error!("Unable to {}: {}", action, e);
                inner.state.set_error(Some(e.user_message()));
            },
            _ => log::debug!("Discarding a stale response to \"{}\"", action),
        }

        result
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
