//! Helpers shared by the unit tests.

use crate::{
    client::{Body, HttpClient, Request, Response, Transport, TransportError},
    events::AuthEvents,
    session::SessionAccess,
    storage::{MemoryStorage, Storage, TOKEN_KEY},
    Config,
};
use async_trait::async_trait;
use reqwest::{
    cookie::{CookieStore, Jar},
    StatusCode,
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use tokio::sync::oneshot;

type Reply = Result<Response, TransportError>;

const FAKE_TOKEN: &str = "fake-token";

enum Scripted {
    Ready(Reply),
    Deferred(oneshot::Receiver<Reply>),
}

/// A [`Transport`] which records every request and answers from a script.
///
/// Replies are handed out in the order they were scripted, regardless of
/// which request they end up answering.
#[derive(Default)]
pub(crate) struct MockTransport {
    requests: Mutex<Vec<Request>>,
    replies: Mutex<VecDeque<Scripted>>,
}

impl MockTransport {
    pub fn new() -> Self { MockTransport::default() }

    pub fn reply(&self, status: StatusCode, body: Vec<u8>) {
        self.push(Scripted::Ready(Ok(Response::new(status, body))));
    }

    pub fn reply_json(&self, status: StatusCode, body: serde_json::Value) {
        self.reply(status, serde_json::to_vec(&body).unwrap());
    }

    pub fn reply_unreachable(&self, reason: &str) {
        self.push(Scripted::Ready(Err(TransportError::Unreachable(
            reason.to_string(),
        ))));
    }

    /// Script a reply which won't resolve until the returned [`Deferred`] is
    /// completed.
    pub fn reply_later(&self) -> Deferred {
        let (tx, rx) = oneshot::channel();
        self.push(Scripted::Deferred(rx));
        Deferred(tx)
    }

    pub fn requests(&self) -> Vec<Request> { self.requests.lock().unwrap().clone() }

    pub fn json_body(request: &Request) -> serde_json::Value {
        match &request.body {
            Body::Json(raw) => serde_json::from_slice(raw).unwrap(),
            other => panic!("Expected a JSON body, found {:?}", other),
        }
    }

    /// Let other tasks run until `count` requests have been sent.
    pub async fn wait_for_requests(&self, count: usize) {
        for _ in 0..1000 {
            if self.requests.lock().unwrap().len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }

        panic!("Never saw {} requests", count);
    }

    fn push(&self, scripted: Scripted) {
        self.replies.lock().unwrap().push_back(scripted);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();

        match next {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Deferred(rx)) => rx.await.unwrap_or_else(|_| {
                Err(TransportError::Unreachable(String::from("reply dropped")))
            }),
            None => Err(TransportError::Unreachable(format!(
                "No reply scripted for {} {}",
                request.method, request.url
            ))),
        }
    }
}

/// The sending half of a [`MockTransport::reply_later()`].
pub(crate) struct Deferred(oneshot::Sender<Reply>);

impl Deferred {
    pub fn json(self, status: StatusCode, body: serde_json::Value) {
        let response = Response::new(status, serde_json::to_vec(&body).unwrap());
        let _ = self.0.send(Ok(response));
    }

    pub fn unreachable(self) {
        let _ = self
            .0
            .send(Err(TransportError::Unreachable(String::from("timed out"))));
    }
}

/// Everything needed to build a store on top of a [`MockTransport`].
pub(crate) struct Harness {
    pub config: Config,
    pub transport: Arc<MockTransport>,
    pub storage: Arc<MemoryStorage>,
    pub jar: Arc<Jar>,
    pub events: AuthEvents,
    pub client: Arc<HttpClient>,
}

impl Harness {
    pub fn new() -> Self {
        let config = Config::default();
        let transport = Arc::new(MockTransport::new());
        let storage = Arc::new(MemoryStorage::new());
        let jar = Arc::new(Jar::default());
        let events = AuthEvents::new();
        let client = Arc::new(HttpClient::new(
            &config,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&jar) as Arc<dyn CookieStore>,
            Arc::clone(&storage) as Arc<dyn Storage>,
            events.clone(),
        ));

        Harness {
            config,
            transport,
            storage,
            jar,
            events,
            client,
        }
    }

    /// Store the token a [`FakeSession::logged_in()`] reports, so requests
    /// are sent the same way they would be for a real session.
    pub fn save_token(&self) {
        self.storage.set(TOKEN_KEY, FAKE_TOKEN).unwrap();
    }

    pub fn set_cookie(&self, cookie: &str) {
        self.jar.add_cookie_str(cookie, &self.config.base_url);
    }
}

/// A client wired up to a fresh [`MockTransport`] and [`MemoryStorage`].
pub(crate) fn client() -> (Arc<HttpClient>, Arc<MockTransport>, Arc<MemoryStorage>) {
    let harness = Harness::new();
    (harness.client, harness.transport, harness.storage)
}

/// A [`SessionAccess`] with a fixed answer.
pub(crate) struct FakeSession(Option<String>);

impl FakeSession {
    pub fn logged_in() -> Self { FakeSession(Some(String::from(FAKE_TOKEN))) }

    pub fn logged_out() -> Self { FakeSession(None) }
}

impl SessionAccess for FakeSession {
    fn token(&self) -> Option<String> { self.0.clone() }

    fn is_authenticated(&self) -> bool { self.0.is_some() }
}
