use crate::cookies::DEFAULT_CSRF_COOKIE;
use std::time::Duration;
use url::Url;

/// Where the API lives when nothing else is specified.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";

/// Settings shared by everything that talks to the SmartPlan API.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The API's root. Always ends in a `/` so endpoint paths can be joined
    /// onto it.
    pub base_url: Url,
    /// The cookie holding the CSRF token.
    pub csrf_cookie: String,
    pub user_agent: String,
    /// How long to wait for a response. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Config {
            base_url: normalize_base_url(base_url)?,
            ..Config::default()
        })
    }

    pub fn with_csrf_cookie<S: Into<String>>(mut self, name: S) -> Self {
        self.csrf_cookie = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            base_url: Url::parse(DEFAULT_BASE_URL)
                .expect("The default base URL is always valid"),
            csrf_cookie: String::from(DEFAULT_CSRF_COOKIE),
            user_agent: String::from(crate::DEFAULT_USER_AGENT),
            timeout: None,
        }
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|error| ConfigError::BadBaseUrl {
        url: raw.to_string(),
        error,
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase(raw.to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("\"{url}\" isn't a valid URL")]
    BadBaseUrl {
        url: String,
        #[source]
        error: url::ParseError,
    },
    #[error("\"{0}\" can't be used as a base URL")]
    NotABase(String),
}
