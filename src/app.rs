use crate::{
    client::{HttpClient, ReqwestTransport, Transport},
    events::{self, AuthEvent},
    routes::{Navigator, Route},
    session::{SessionAccess, SessionStore},
    storage::Storage,
    stores::{PlansStore, SettingsStore},
    Config,
};
use reqwest::cookie::{CookieStore, Jar};
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;

/// Everything needed to drive the application, wired together.
///
/// The HTTP layer and the session never navigate on their own. Instead they
/// publish [`AuthEvent`]s which are handed to the session and the
/// [`Navigator`] by [`App::pump_events()`].
#[derive(Debug)]
pub struct App {
    client: Arc<HttpClient>,
    session: Arc<SessionStore>,
    plans: PlansStore,
    settings: SettingsStore,
    navigator: Navigator,
    events: Receiver<AuthEvent>,
}

impl App {
    /// Create an app which talks to the real server.
    pub fn new(
        config: &Config,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, reqwest::Error> {
        let jar = Arc::new(Jar::default());
        let transport = ReqwestTransport::new(config, Arc::clone(&jar))?;

        Ok(App::with_transport(config, Arc::new(transport), jar, storage))
    }

    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
        cookies: Arc<dyn CookieStore>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let bus = events::AuthEvents::new();
        let events = bus.subscribe();

        let client = Arc::new(HttpClient::new(config, transport, cookies, storage, bus));
        let session = Arc::new(SessionStore::new(Arc::clone(&client)));
        let access: Arc<dyn SessionAccess> = session.clone();

        App {
            plans: PlansStore::new(Arc::clone(&client), Arc::clone(&access)),
            settings: SettingsStore::new(Arc::clone(&client), access),
            navigator: Navigator::new(),
            client,
            session,
            events,
        }
    }

    pub fn client(&self) -> &HttpClient { &self.client }

    pub fn session(&self) -> &Arc<SessionStore> { &self.session }

    pub fn plans(&self) -> &PlansStore { &self.plans }

    pub fn settings(&self) -> &SettingsStore { &self.settings }

    pub fn current_route(&self) -> Route { self.navigator.current() }

    /// Restore the previous session and wait until the server has confirmed
    /// (or rejected) it, returning the page we should be on.
    pub async fn start(&mut self) -> Route {
        if let Some(verification) = self.session.init() {
            match verification.await {
                Ok(true) => log::info!("Restored the previous session"),
                Ok(false) => log::info!("The previous session has expired"),
                Err(e) => log::warn!("Unable to verify the previous session: {}", e),
            }
        }

        self.pump_events();
        self.navigator.refresh(&*self.session)
    }

    /// Try to visit `target`, returning the page we actually end up on.
    pub fn navigate(&mut self, target: Route) -> Route {
        self.pump_events();
        self.navigator.navigate(target, &self.session)
    }

    /// Hand every pending [`AuthEvent`] to whoever needs to react to it.
    pub fn pump_events(&mut self) -> Vec<AuthEvent> {
        let pending = events::drain(&mut self.events);

        for event in &pending {
            self.session.on_auth_event(event);

            if let Some(route) = self.navigator.on_auth_event(event) {
                log::info!("Now on {}", route);
            }
        }

        pending
    }
}
