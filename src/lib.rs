//! A session-aware client for the SmartPlan planning API.
//!
//! The [`App`] wires everything together: a [`SessionStore`] which owns the
//! login token, resource stores for plans and settings, and a
//! [`routes::Navigator`] which keeps logged out users away from protected
//! pages.

#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod app;
pub mod client;
mod config;
pub mod cookies;
pub mod endpoints;
pub mod events;
mod id;
mod plan;
mod profile;
pub mod routes;
mod session;
pub mod storage;
pub mod stores;
#[cfg(test)]
mod test_utils;
mod user;

pub use app::App;
pub use config::{Config, ConfigError, DEFAULT_BASE_URL};
pub use id::PlanId;
pub use plan::{
    Channel, NewPlan, Plan, PlanStatus, PlanType, PlanUpdate, Timeline,
    UnknownVariant,
};
pub use profile::{
    Branding, BrandingUpdate, BusinessInfo, BusinessUpdate, LogoUpload,
    SettingsProfile, SettingsUpdate, SocialMedia, SocialUpdate,
};
pub use session::{Session, SessionAccess, SessionError, SessionStore};
pub use user::{Credentials, Registration, User};

/// The default user agent to use when communicating with the SmartPlan
/// server.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));
