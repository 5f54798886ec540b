//! The request pipeline every API call goes through.

use crate::{
    cookies,
    endpoints::EndpointError,
    events::{AuthEvent, AuthEvents},
    storage::{self, Storage},
    Config,
};
use async_trait::async_trait;
use reqwest::{
    cookie::{CookieStore, Jar},
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};
use url::Url;

/// The header the server expects the CSRF token in.
pub const CSRF_HEADER: &str = "x-csrftoken";

const JSON: &str = "application/json";

/// Something which can send a [`Request`] and hand back the raw
/// [`Response`].
///
/// Status codes are not interpreted at this level. A 404 is still a
/// successful round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// The request never made it to the server (or the response never made it
/// back).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("The HTTP client encountered an error")]
    Http(#[from] reqwest::Error),
    #[error("The server couldn't be reached: {0}")]
    Unreachable(String),
}

/// A fully prepared request, headers and all.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[derive(Clone, PartialEq)]
pub enum Body {
    Empty,
    /// A pre-encoded JSON document.
    Json(Vec<u8>),
    Multipart(Vec<FilePart>),
}

impl Body {
    pub fn json<T: Serialize>(value: &T) -> Result<Body, EndpointError> {
        serde_json::to_vec(value)
            .map(Body::Json)
            .map_err(EndpointError::Encode)
    }

    pub fn is_multipart(&self) -> bool {
        match self {
            Body::Multipart(_) => true,
            _ => false,
        }
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Json(raw) => f
                .debug_tuple("Json")
                .field(&String::from_utf8_lossy(raw))
                .finish(),
            Body::Multipart(parts) => {
                f.debug_tuple("Multipart").field(parts).finish()
            },
        }
    }
}

/// A single file in a multipart form.
#[derive(Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Debug for FilePart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Response {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, EndpointError> {
        serde_json::from_slice(&self.body).map_err(EndpointError::ResponseParse)
    }

    pub fn text(&self) -> String { String::from_utf8_lossy(&self.body).into_owned() }
}

/// Which interceptors a request should go through.
#[derive(Debug, Copy, Clone, PartialEq)]
enum Auth {
    /// Attach whatever token is in storage (if any), use the default
    /// headers, and react to 401/403 responses.
    Ambient,
    /// Require a token, skip the default headers and leave 401/403
    /// handling to the caller.
    Explicit,
}

/// The shared request pipeline.
///
/// Nothing here is mutated after construction. The token and CSRF token are
/// looked up fresh for every request, so there is no default
/// `Authorization` header to keep in sync with the session.
pub struct HttpClient {
    base_url: Url,
    csrf_cookie: String,
    transport: Arc<dyn Transport>,
    cookies: Arc<dyn CookieStore>,
    storage: Arc<dyn Storage>,
    events: AuthEvents,
}

impl HttpClient {
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        cookies: Arc<dyn CookieStore>,
        storage: Arc<dyn Storage>,
        events: AuthEvents,
    ) -> Self {
        HttpClient {
            base_url: config.base_url.clone(),
            csrf_cookie: config.csrf_cookie.clone(),
            transport,
            cookies,
            storage,
            events,
        }
    }

    pub fn base_url(&self) -> &Url { &self.base_url }

    pub fn events(&self) -> &AuthEvents { &self.events }

    pub fn storage(&self) -> &Arc<dyn Storage> { &self.storage }

    pub fn url(&self, path: &str) -> Result<Url, EndpointError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(EndpointError::from)
    }

    /// The CSRF token the server last gave us for this API.
    pub fn csrf_token(&self) -> Option<String> {
        cookies::csrf_token(&*self.cookies, &self.base_url, &self.csrf_cookie)
    }

    /// Build a request the way the default pipeline would send it.
    pub fn prepare(
        &self,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<Request, EndpointError> {
        self.build(method, path, body, Auth::Ambient)
    }

    /// Build a request which must carry the stored token, failing without
    /// touching the network if there isn't one.
    pub fn prepare_authenticated(
        &self,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<Request, EndpointError> {
        self.build(method, path, body, Auth::Explicit)
    }

    /// Send a request through the default pipeline.
    ///
    /// A 401 or 403 clears the persisted session and publishes
    /// [`AuthEvent::Unauthenticated`] before the error is handed back.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<Response, EndpointError> {
        let request = self.prepare(method, path, body)?;
        let response = self.dispatch(request).await?;

        if is_auth_failure(response.status) {
            self.on_auth_failure(response.status);
        }

        check_status(response)
    }

    /// Send a request with explicitly constructed auth headers.
    pub async fn send_authenticated(
        &self,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<Response, EndpointError> {
        let request = self.prepare_authenticated(method, path, body)?;
        let response = self.dispatch(request).await?;

        check_status(response)
    }

    /// Send a request through the default pipeline and parse the JSON
    /// response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<T, EndpointError> {
        self.send(method, path, body).await?.json()
    }

    fn build(
        &self,
        method: Method,
        path: &str,
        body: Body,
        auth: Auth,
    ) -> Result<Request, EndpointError> {
        let url = self.url(path)?;
        let token = storage::load_token(&*self.storage);
        let mut headers = HeaderMap::new();

        match (auth, token) {
            (_, Some(token)) => {
                let value = format!("Token {}", token);
                headers.insert(AUTHORIZATION, HeaderValue::from_str(&value)?);
            },
            (Auth::Explicit, None) => {
                log::debug!("Refusing to send {} {} without a token", method, url);
                return Err(EndpointError::AuthenticationRequired);
            },
            (Auth::Ambient, None) => {},
        }

        // multipart bodies get a boundary-aware content type from the
        // transport
        let json_body = match auth {
            Auth::Ambient => !body.is_multipart(),
            Auth::Explicit => matches!(body, Body::Json(_)),
        };
        if json_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        }

        if method != Method::GET {
            if let Some(csrf) = self.csrf_token() {
                headers.insert(
                    HeaderName::from_static(CSRF_HEADER),
                    HeaderValue::from_str(&csrf)?,
                );
            }
        }

        Ok(Request {
            method,
            url,
            headers,
            body,
        })
    }

    async fn dispatch(&self, request: Request) -> Result<Response, EndpointError> {
        log::debug!("Sending a {} request to {}", request.method, request.url);
        log::trace!("Request: {:#?}", request);

        let response = self.transport.send(request).await?;

        log::debug!("Received {}", response.status);
        log::trace!("Headers: {:#?}", response.headers);
        log::trace!("Body: {}", response.text());

        Ok(response)
    }

    fn on_auth_failure(&self, status: StatusCode) {
        log::warn!("The server responded with {}, clearing the session", status);

        storage::clear_session(&*self.storage);
        self.events.publish(AuthEvent::Unauthenticated { status });
    }
}

impl Debug for HttpClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("csrf_cookie", &self.csrf_cookie)
            .field("storage", &self.storage)
            .finish()
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Turn a non-2xx response into an [`EndpointError`], much like
/// [`reqwest::Response::error_for_status()`].
pub fn check_status(response: Response) -> Result<Response, EndpointError> {
    if response.status.is_success() {
        return Ok(response);
    }

    let message = crate::endpoints::server_message(&response.body);

    if is_auth_failure(response.status) {
        Err(EndpointError::Unauthorized {
            status: response.status,
            message,
        })
    } else {
        let message = message.unwrap_or_else(|| {
            response
                .status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        Err(EndpointError::Rejected {
            status: response.status,
            message,
        })
    }
}

/// A [`Transport`] which actually talks to the network.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport which keeps its cookies in `jar`, so they can also
    /// be read by the [`HttpClient`].
    pub fn new(config: &Config, jar: Arc<Jar>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_provider(jar);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(ReqwestTransport {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let Request {
            method,
            url,
            headers,
            body,
        } = request;

        let builder = self.client.request(method, url).headers(headers);

        let builder = match body {
            Body::Empty => builder,
            Body::Json(raw) => builder.body(raw),
            Body::Multipart(parts) => {
                let mut form = reqwest::multipart::Form::new();

                for part in parts {
                    let FilePart {
                        field,
                        filename,
                        mime,
                        bytes,
                    } = part;
                    let part = reqwest::multipart::Part::bytes(bytes)
                        .file_name(filename)
                        .mime_str(&mime)?;
                    form = form.part(field, part);
                }

                builder.multipart(form)
            },
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
