//! The SmartPlan API's endpoints.

mod csrf;
mod login;
mod logout;
mod plans;
mod settings;
mod user;

pub use csrf::prime_csrf;
pub use login::{login, register, AuthResponse};
pub use logout::logout;
pub use plans::{create_plan, delete_plan, get_plan, list_plans, update_plan};
pub use settings::{get_settings, update_settings, upload_logo};
pub use user::current_user;

use crate::client::TransportError;
use reqwest::{header::InvalidHeaderValue, StatusCode};
use serde_derive::Deserialize;

/// Typical endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The request never reached the server, or the response never came
    /// back.
    #[error("Unable to send the request")]
    Transport(#[from] TransportError),
    /// The server rejected our credentials (401 or 403).
    #[error("The server rejected our credentials ({status})")]
    Unauthorized {
        status: StatusCode,
        message: Option<String>,
    },
    /// Any other non-2xx response.
    #[error("The server responded with {status}: {message}")]
    Rejected { status: StatusCode, message: String },
    /// We need a session token but don't have one.
    #[error("You need to log in first")]
    AuthenticationRequired,
    /// The request was caught by a client-side check.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Unable to build the request URL")]
    Url(#[from] url::ParseError),
    #[error("A header contained invalid characters")]
    Header(#[from] InvalidHeaderValue),
    #[error("Unable to serialize the request body")]
    Encode(#[source] serde_json::Error),
    /// Unable to parse the response.
    #[error("Unable to parse the response")]
    ResponseParse(#[source] serde_json::Error),
}

impl EndpointError {
    /// Is this error about missing or invalid credentials?
    pub fn is_authentication_error(&self) -> bool {
        match self {
            EndpointError::Unauthorized { .. }
            | EndpointError::AuthenticationRequired => true,
            _ => false,
        }
    }

    /// A message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            EndpointError::Unauthorized {
                message: Some(message),
                ..
            } => message.clone(),
            EndpointError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// The different ways the server tends to explain itself.
#[derive(Debug, Deserialize)]
struct ServerMessage {
    message: Option<String>,
    error: Option<String>,
    detail: Option<String>,
}

/// Pull a human readable message out of an error response's body, if there
/// is one.
pub(crate) fn server_message(body: &[u8]) -> Option<String> {
    let msg: ServerMessage = serde_json::from_slice(body).ok()?;
    msg.message.or(msg.error).or(msg.detail)
}
