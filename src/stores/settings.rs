use super::{ensure_authenticated, RequestSequence, StoreCell, StoreState};
use crate::{
    client::HttpClient,
    endpoints::{self, EndpointError},
    session::SessionAccess,
    LogoUpload, SettingsProfile, SettingsUpdate,
};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsState {
    pub profile: Option<SettingsProfile>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl StoreState for SettingsState {
    fn set_loading(&mut self, loading: bool) { self.is_loading = loading; }

    fn set_error(&mut self, error: Option<String>) { self.error = error; }
}

/// The user's account settings.
///
/// Every action replaces the whole profile, so they all share one request
/// sequence and only the most recently issued response is kept.
pub struct SettingsStore {
    client: Arc<HttpClient>,
    session: Arc<dyn SessionAccess>,
    cell: StoreCell<SettingsState>,
    requests: RequestSequence,
}

impl SettingsStore {
    pub fn new(client: Arc<HttpClient>, session: Arc<dyn SessionAccess>) -> Self {
        SettingsStore {
            client,
            session,
            cell: StoreCell::default(),
            requests: RequestSequence::new(),
        }
    }

    pub fn state(&self) -> SettingsState { self.cell.snapshot() }

    pub async fn fetch_settings(&self) -> Result<SettingsProfile, EndpointError> {
        const ACTION: &str = "fetch settings";
        self.check_auth().map_err(|e| self.cell.reject(ACTION, e))?;

        let ticket = self.requests.issue();
        self.cell.begin();
        let result = endpoints::get_settings(&self.client).await;
        let is_current = || self.requests.is_current(ticket);

        self.cell.finish(ACTION, result, is_current, replace_profile)
    }

    pub async fn save_settings(
        &self,
        update: &SettingsUpdate,
    ) -> Result<SettingsProfile, EndpointError> {
        const ACTION: &str = "save settings";
        self.check_auth().map_err(|e| self.cell.reject(ACTION, e))?;

        let ticket = self.requests.issue();
        self.cell.begin();
        let result = endpoints::update_settings(&self.client, update).await;
        let is_current = || self.requests.is_current(ticket);

        self.cell.finish(ACTION, result, is_current, replace_profile)
    }

    pub async fn upload_logo(
        &self,
        logo: &LogoUpload,
    ) -> Result<SettingsProfile, EndpointError> {
        const ACTION: &str = "upload the logo";
        self.check_auth().map_err(|e| self.cell.reject(ACTION, e))?;

        let ticket = self.requests.issue();
        self.cell.begin();
        let result = endpoints::upload_logo(&self.client, logo).await;
        let is_current = || self.requests.is_current(ticket);

        self.cell.finish(ACTION, result, is_current, replace_profile)
    }

    pub fn check_auth(&self) -> Result<(), EndpointError> {
        ensure_authenticated(&*self.session, &self.client)
    }

    pub fn clear_error(&self) { self.cell.update(|state| state.error = None); }
}

fn replace_profile(state: &mut SettingsState, profile: &SettingsProfile) {
    state.profile = Some(profile.clone());
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{FakeSession, Harness},
        BrandingUpdate,
    };
    use reqwest::StatusCode;
    use serde_json::json;

    fn store(h: &Harness) -> Arc<SettingsStore> {
        h.save_token();
        Arc::new(SettingsStore::new(
            Arc::clone(&h.client),
            Arc::new(FakeSession::logged_in()),
        ))
    }

    #[tokio::test]
    async fn every_action_replaces_the_profile() {
        let h = Harness::new();
        let settings = store(&h);
        h.transport.reply_json(
            StatusCode::OK,
            json!({ "email": "jane@example.com", "branding": { "brand_voice": "calm" } }),
        );
        h.transport.reply_json(
            StatusCode::OK,
            json!({ "email": "jane@example.com", "branding": { "brand_voice": "bold" } }),
        );
        h.transport.reply_json(
            StatusCode::OK,
            json!({ "email": "jane@example.com", "logo": "/media/logos/jane.png" }),
        );

        settings.fetch_settings().await.unwrap();
        assert_eq!(
            settings.state().profile.unwrap().branding.brand_voice.as_deref(),
            Some("calm")
        );

        let update = SettingsUpdate::Branding(BrandingUpdate {
            brand_voice: Some(String::from("bold")),
            ..BrandingUpdate::default()
        });
        settings.save_settings(&update).await.unwrap();
        assert_eq!(
            settings.state().profile.unwrap().branding.brand_voice.as_deref(),
            Some("bold")
        );

        let logo = LogoUpload::new("jane.png", vec![1, 2, 3]);
        settings.upload_logo(&logo).await.unwrap();
        let profile = settings.state().profile.unwrap();
        assert_eq!(profile.logo.as_deref(), Some("/media/logos/jane.png"));
        assert_eq!(profile.branding.brand_voice, None);

        for request in h.transport.requests() {
            assert_eq!(request.header("authorization"), Some("Token fake-token"));
        }
    }

    #[tokio::test]
    async fn an_acknowledged_save_keeps_a_real_profile() {
        let h = Harness::new();
        let settings = store(&h);
        h.transport.reply_json(
            StatusCode::OK,
            json!({ "email": "jane@example.com", "branding": { "brand_voice": "calm" } }),
        );
        h.transport.reply_json(
            StatusCode::OK,
            json!({ "status": "success", "message": "Settings updated successfully" }),
        );
        h.transport.reply_json(
            StatusCode::OK,
            json!({ "email": "jane@example.com", "branding": { "brand_voice": "bold" } }),
        );

        settings.fetch_settings().await.unwrap();
        let update = SettingsUpdate::Branding(BrandingUpdate {
            brand_voice: Some(String::from("bold")),
            ..BrandingUpdate::default()
        });
        settings.save_settings(&update).await.unwrap();

        let profile = settings.state().profile.unwrap();
        assert_eq!(profile.email, "jane@example.com");
        assert_eq!(profile.branding.brand_voice.as_deref(), Some("bold"));
        assert_eq!(h.transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn failed_saves_keep_the_old_profile() {
        let h = Harness::new();
        let settings = store(&h);
        h.transport.reply_json(StatusCode::OK, json!({ "email": "jane@example.com" }));
        h.transport.reply_unreachable("connection reset");

        settings.fetch_settings().await.unwrap();
        let update = SettingsUpdate::Branding(BrandingUpdate::default());
        let err = settings.save_settings(&update).await.unwrap_err();

        assert!(matches!(err, EndpointError::Transport(_)));
        let state = settings.state();
        assert_eq!(state.profile.unwrap().email, "jane@example.com");
        assert!(state.error.is_some());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn a_slow_fetch_cant_clobber_a_newer_save() {
        let h = Harness::new();
        let settings = store(&h);
        let fetch_reply = h.transport.reply_later();
        h.transport.reply_json(
            StatusCode::OK,
            json!({ "email": "jane@example.com", "branding": { "primary_color": "#ffffff" } }),
        );

        let fetch = tokio::spawn({
            let settings = Arc::clone(&settings);
            async move { settings.fetch_settings().await }
        });
        h.transport.wait_for_requests(1).await;

        let update = SettingsUpdate::Branding(BrandingUpdate {
            primary_color: Some(String::from("#ffffff")),
            ..BrandingUpdate::default()
        });
        settings.save_settings(&update).await.unwrap();

        fetch_reply.json(
            StatusCode::OK,
            json!({ "email": "jane@example.com", "branding": { "primary_color": "#000000" } }),
        );
        fetch.await.unwrap().unwrap();

        let state = settings.state();
        assert_eq!(
            state.profile.unwrap().branding.primary_color.as_deref(),
            Some("#ffffff")
        );
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn logged_out_users_cant_fetch_settings() {
        let h = Harness::new();
        let settings = SettingsStore::new(
            Arc::clone(&h.client),
            Arc::new(FakeSession::logged_out()),
        );

        let err = settings.fetch_settings().await.unwrap_err();

        assert!(err.is_authentication_error());
        assert!(h.transport.requests().is_empty());
    }
}
