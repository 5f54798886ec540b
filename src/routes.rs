//! The pages a user can visit, and who is allowed to visit them.

use crate::{
    events::AuthEvent,
    session::{SessionAccess, SessionStore},
    PlanId, PlanType,
};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
    sync::Arc,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Dashboard,
    Settings,
    Plans,
    PlanDetail(PlanId),
    PlanCreate(PlanType),
}

impl Route {
    /// Where users end up after logging in.
    pub const LANDING: Route = Route::Dashboard;

    /// Can this page only be seen by a logged in user?
    pub fn requires_auth(self) -> bool {
        match self {
            Route::Home | Route::Login | Route::Register => false,
            Route::Dashboard
            | Route::Settings
            | Route::Plans
            | Route::PlanDetail(_)
            | Route::PlanCreate(_) => true,
        }
    }

    fn is_login_or_register(self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Settings => write!(f, "/settings"),
            Route::Plans => write!(f, "/plans"),
            Route::PlanDetail(id) => write!(f, "/plans/{}", id),
            Route::PlanCreate(plan_type) => write!(f, "/plan/create/{}", plan_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("There is no page at \"{0}\"")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownRoute(s.to_string());
        let segments: Vec<&str> =
            s.trim().split('/').filter(|seg| !seg.is_empty()).collect();

        match segments.as_slice() {
            [] => Ok(Route::Home),
            ["login"] => Ok(Route::Login),
            ["register"] => Ok(Route::Register),
            ["dashboard"] => Ok(Route::Dashboard),
            ["settings"] => Ok(Route::Settings),
            ["plans"] => Ok(Route::Plans),
            ["plans", id] => id.parse().map(Route::PlanDetail).map_err(|_| unknown()),
            ["plan", "create", plan_type] => plan_type
                .parse()
                .map(Route::PlanCreate)
                .map_err(|_| unknown()),
            _ => Err(unknown()),
        }
    }
}

/// The outcome of trying to visit a page.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Navigation {
    Allow,
    Redirect(Route),
}

/// Decide whether someone may visit `target`.
pub fn guard(target: Route, is_authenticated: bool) -> Navigation {
    if target.requires_auth() && !is_authenticated {
        Navigation::Redirect(Route::Login)
    } else if target.is_login_or_register() && is_authenticated {
        Navigation::Redirect(Route::LANDING)
    } else {
        Navigation::Allow
    }
}

/// Keeps track of the page the user is on.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigator {
    current: Route,
}

impl Navigator {
    pub fn new() -> Self { Navigator { current: Route::Home } }

    pub fn current(&self) -> Route { self.current }

    /// Try to visit `target`, returning the page we actually end up on.
    ///
    /// The session is initialized on the first navigation. A restored
    /// session counts as logged in while it is being verified.
    pub fn navigate(&mut self, target: Route, session: &Arc<SessionStore>) -> Route {
        if !session.is_initialized() {
            // the verification finishes in the background and reports a
            // rejected session with AuthEvent::SessionExpired
            let _ = session.init();
        }

        self.go(target, &**session)
    }

    /// Re-check the current page against the session, e.g. after the
    /// session was verified.
    pub fn refresh(&mut self, session: &dyn SessionAccess) -> Route {
        let current = self.current;
        self.go(current, session)
    }

    /// React to a change in the session, returning the new page if we had
    /// to move.
    pub fn on_auth_event(&mut self, event: &AuthEvent) -> Option<Route> {
        let next = match event {
            AuthEvent::Unauthenticated { .. } | AuthEvent::SessionExpired
                if self.current == Route::Login =>
            {
                return None;
            },
            AuthEvent::Unauthenticated { .. }
            | AuthEvent::SessionExpired
            | AuthEvent::SignedOut => Route::Login,
            AuthEvent::SignedIn => Route::LANDING,
        };

        if next == self.current {
            return None;
        }

        log::debug!("Moving from {} to {} after {:?}", self.current, next, event);
        self.current = next;
        Some(next)
    }

    fn go(&mut self, target: Route, session: &dyn SessionAccess) -> Route {
        self.current = match guard(target, session.is_authenticated()) {
            Navigation::Allow => target,
            Navigation::Redirect(to) => {
                log::debug!("Redirecting from {} to {}", target, to);
                to
            },
        };

        self.current
    }
}

impl Default for Navigator {
    fn default() -> Self { Navigator::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        storage,
        test_utils::{FakeSession, Harness},
        User,
    };
    use reqwest::StatusCode;

    #[test]
    fn parse_and_print_every_route() {
        let inputs = vec![
            ("/", Route::Home),
            ("/login", Route::Login),
            ("/register", Route::Register),
            ("/dashboard", Route::Dashboard),
            ("/settings", Route::Settings),
            ("/plans", Route::Plans),
            ("/plans/42", Route::PlanDetail(PlanId::new(42))),
            ("/plan/create/open-house", Route::PlanCreate(PlanType::OpenHouse)),
        ];

        for (path, route) in inputs {
            assert_eq!(path.parse::<Route>().unwrap(), route);
            assert_eq!(route.to_string(), path);
        }
    }

    #[test]
    fn trailing_slashes_are_ignored() {
        assert_eq!("/plans/".parse::<Route>().unwrap(), Route::Plans);
    }

    #[test]
    fn unknown_routes_are_rejected() {
        for path in &["/nope", "/plans/abc", "/plan/create/cold-call", "/plans/1/2"] {
            assert_eq!(
                path.parse::<Route>(),
                Err(UnknownRoute(path.to_string()))
            );
        }
    }

    #[test]
    fn the_guard_table() {
        let inputs = vec![
            (Route::Home, false, Navigation::Allow),
            (Route::Home, true, Navigation::Allow),
            (Route::Plans, false, Navigation::Redirect(Route::Login)),
            (Route::Plans, true, Navigation::Allow),
            (
                Route::PlanDetail(PlanId::new(1)),
                false,
                Navigation::Redirect(Route::Login),
            ),
            (Route::Login, false, Navigation::Allow),
            (Route::Login, true, Navigation::Redirect(Route::Dashboard)),
            (Route::Register, true, Navigation::Redirect(Route::Dashboard)),
        ];

        for (target, authenticated, should_be) in inputs {
            assert_eq!(guard(target, authenticated), should_be, "{}", target);
        }
    }

    #[test]
    fn unauthenticated_on_the_login_page_doesnt_loop() {
        let mut nav = Navigator::new();
        nav.go(Route::Login, &FakeSession::logged_out());

        let got = nav.on_auth_event(&AuthEvent::Unauthenticated {
            status: StatusCode::UNAUTHORIZED,
        });

        assert_eq!(got, None);
        assert_eq!(nav.on_auth_event(&AuthEvent::SessionExpired), None);
        assert_eq!(nav.current(), Route::Login);
    }

    #[test]
    fn expired_sessions_go_back_to_the_login_page() {
        let mut nav = Navigator::new();
        nav.go(Route::Plans, &FakeSession::logged_in());

        let got = nav.on_auth_event(&AuthEvent::SessionExpired);

        assert_eq!(got, Some(Route::Login));
    }

    #[test]
    fn auth_events_move_the_user() {
        let mut nav = Navigator::new();
        nav.go(Route::Settings, &FakeSession::logged_in());

        let got = nav.on_auth_event(&AuthEvent::Unauthenticated {
            status: StatusCode::FORBIDDEN,
        });
        assert_eq!(got, Some(Route::Login));

        assert_eq!(nav.on_auth_event(&AuthEvent::SignedIn), Some(Route::Dashboard));
        assert_eq!(nav.on_auth_event(&AuthEvent::SignedOut), Some(Route::Login));
    }

    #[test]
    fn refresh_kicks_out_users_who_lost_their_session() {
        let mut nav = Navigator::new();
        nav.go(Route::Plans, &FakeSession::logged_in());

        assert_eq!(nav.refresh(&FakeSession::logged_out()), Route::Login);
    }

    #[tokio::test]
    async fn the_first_navigation_restores_the_session() {
        let h = Harness::new();
        let session = Arc::new(SessionStore::new(Arc::clone(&h.client)));
        let user = User {
            email: String::from("jane@example.com"),
            name: String::from("Jane Doe"),
        };
        storage::save_session(&*h.storage, "saved-token", &user).unwrap();
        let _verification = h.transport.reply_later();
        let mut nav = Navigator::new();

        let got = nav.navigate(Route::Plans, &session);

        assert_eq!(got, Route::Plans);
        assert!(session.is_initialized());
    }

    #[tokio::test]
    async fn logged_out_users_are_sent_to_the_login_page() {
        let h = Harness::new();
        let session = Arc::new(SessionStore::new(Arc::clone(&h.client)));
        let mut nav = Navigator::new();

        assert_eq!(nav.navigate(Route::Dashboard, &session), Route::Login);
        assert!(session.is_initialized());
        assert!(h.transport.requests().is_empty());
    }
}
