use super::EndpointError;
use crate::{
    client::{Body, HttpClient},
    User,
};
use reqwest::Method;
use serde_derive::Deserialize;

/// Fetch the profile belonging to the stored session token.
///
/// This always goes through the explicit-auth path, so it fails immediately
/// when there is no token.
pub async fn current_user(client: &HttpClient) -> Result<User, EndpointError> {
    let response = client
        .send_authenticated(Method::GET, "auth/user/", Body::Empty)
        .await?;

    let doc: UserDocument = response.json()?;
    log::trace!("Parsed response: {:#?}", doc);

    doc.user.ok_or(EndpointError::AuthenticationRequired)
}

#[derive(Debug, Deserialize)]
struct UserDocument {
    user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        storage::{Storage, TOKEN_KEY},
        test_utils,
    };
    use reqwest::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_the_current_user() {
        let (client, transport, storage) = test_utils::client();
        storage.set(TOKEN_KEY, "abc").unwrap();
        transport.reply_json(
            StatusCode::OK,
            json!({ "user": { "email": "jane@example.com", "name": "Jane" } }),
        );

        let got = current_user(&client).await.unwrap();

        assert_eq!(got.email, "jane@example.com");
        assert_eq!(
            transport.requests()[0].header("authorization"),
            Some("Token abc")
        );
    }

    #[tokio::test]
    async fn a_null_user_means_we_arent_logged_in() {
        let (client, transport, storage) = test_utils::client();
        storage.set(TOKEN_KEY, "abc").unwrap();
        transport.reply_json(StatusCode::OK, json!({ "user": null }));

        let got = current_user(&client).await;

        assert!(matches!(got, Err(EndpointError::AuthenticationRequired)));
    }
}
