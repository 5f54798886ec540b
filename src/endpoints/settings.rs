use super::EndpointError;
use crate::{
    client::{Body, FilePart, HttpClient, Response},
    LogoUpload, SettingsProfile, SettingsUpdate,
};
use reqwest::Method;

const SETTINGS: &str = "auth/settings/";

pub async fn get_settings(
    client: &HttpClient,
) -> Result<SettingsProfile, EndpointError> {
    client.send_json(Method::GET, SETTINGS, Body::Empty).await
}

/// Save one section of the settings page.
pub async fn update_settings(
    client: &HttpClient,
    update: &SettingsUpdate,
) -> Result<SettingsProfile, EndpointError> {
    log::trace!("Payload: {:#?}", update);

    let response = client
        .send(Method::PUT, SETTINGS, Body::json(update)?)
        .await?;

    saved_profile(client, response).await
}

/// Upload a new logo as a multipart form.
pub async fn upload_logo(
    client: &HttpClient,
    logo: &LogoUpload,
) -> Result<SettingsProfile, EndpointError> {
    log::debug!("Uploading {:?}", logo);

    let body = Body::Multipart(vec![FilePart {
        field: String::from(LogoUpload::FIELD),
        filename: logo.filename.clone(),
        mime: logo.mime.clone(),
        bytes: logo.bytes.clone(),
    }]);

    let response = client.send(Method::PUT, SETTINGS, body).await?;

    saved_profile(client, response).await
}

/// The server may answer a save with the updated profile or with a bare
/// acknowledgement, in which case we need to ask for the profile again.
async fn saved_profile(
    client: &HttpClient,
    response: Response,
) -> Result<SettingsProfile, EndpointError> {
    match response.json() {
        Ok(profile) => Ok(profile),
        Err(_) => {
            log::debug!(
                "The server acknowledged the save without sending the profile: {}",
                response.text()
            );
            get_settings(client).await
        },
    }
}
