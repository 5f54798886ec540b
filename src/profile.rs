//! The account settings shown on the settings page.

use serde_derive::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};

/// Everything the server knows about the user's business and brand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsProfile {
    /// Always present, which is how a profile is told apart from the
    /// server's `{"status": ..., "message": ...}` acknowledgements.
    pub email: String,
    #[serde(default)]
    pub business_info: BusinessInfo,
    #[serde(default)]
    pub social_media: SocialMedia,
    #[serde(default)]
    pub branding: Branding,
    /// Where the uploaded logo can be found.
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<serde_json::Value>,
    pub target_market: Option<String>,
    pub value_proposition: Option<String>,
    pub additional_context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialMedia {
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub tiktok: Option<String>,
    pub linkedin: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub threads: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branding {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub brand_voice: Option<String>,
    pub brand_description: Option<String>,
}

/// A change to one section of the settings page.
///
/// The server only looks at one section per request, so each variant is
/// sent on its own (e.g. `{"social": {"instagram": "..."}}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsUpdate {
    Business(BusinessUpdate),
    Social(SocialUpdate),
    Branding(BrandingUpdate),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<serde_json::Value>,
    pub target_market: Option<String>,
    pub value_proposition: Option<String>,
    pub additional_context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocialUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiktok: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_description: Option<String>,
}

/// An image to use as the business's logo.
#[derive(Clone, PartialEq)]
pub struct LogoUpload {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl LogoUpload {
    /// The multipart field the server reads the logo from.
    pub const FIELD: &'static str = "logo";

    /// Create an upload, guessing the MIME type from the file extension.
    pub fn new<S: Into<String>>(filename: S, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime = mime_for(&filename).to_string();

        LogoUpload {
            filename,
            mime,
            bytes,
        }
    }
}

impl Debug for LogoUpload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoUpload")
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn mime_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_the_settings_page() {
        let raw = json!({
            "email": "jane@example.com",
            "business_info": {
                "name": "Jane's Homes",
                "phone": null,
                "address": {"city": "Springfield"},
                "target_market": "First home buyers",
                "value_proposition": null,
                "additional_context": null
            },
            "social_media": { "instagram": "https://instagram.com/jane" },
            "branding": { "primary_color": "#485fc7" }
        });

        let got: SettingsProfile = serde_json::from_value(raw).unwrap();

        assert_eq!(got.email, "jane@example.com");
        assert_eq!(got.business_info.name.as_deref(), Some("Jane's Homes"));
        assert_eq!(
            got.social_media.instagram.as_deref(),
            Some("https://instagram.com/jane")
        );
        assert_eq!(got.social_media.tiktok, None);
        assert_eq!(got.branding.primary_color.as_deref(), Some("#485fc7"));
        assert_eq!(got.logo, None);
    }

    #[test]
    fn acknowledgements_arent_profiles() {
        let raw = json!({
            "status": "success",
            "message": "Settings updated successfully"
        });

        assert!(serde_json::from_value::<SettingsProfile>(raw).is_err());
    }

    #[test]
    fn updates_are_wrapped_in_their_section() {
        let update = SettingsUpdate::Branding(BrandingUpdate {
            primary_color: Some(String::from("#000000")),
            brand_voice: Some(String::from("friendly")),
            ..Default::default()
        });

        let got = serde_json::to_value(&update).unwrap();

        assert_eq!(
            got,
            json!({
                "branding": { "primaryColor": "#000000", "brandVoice": "friendly" }
            })
        );
    }

    #[test]
    fn business_updates_send_every_field() {
        // the server overwrites the whole business section, so missing
        // fields have to be sent as nulls
        let update = SettingsUpdate::Business(BusinessUpdate {
            name: Some(String::from("Jane's Homes")),
            ..Default::default()
        });

        let got = serde_json::to_value(&update).unwrap();

        assert_eq!(got["business"]["name"], json!("Jane's Homes"));
        assert_eq!(got["business"]["targetMarket"], json!(null));
    }

    #[test]
    fn guess_logo_mime_types() {
        assert_eq!(LogoUpload::new("logo.PNG", vec![]).mime, "image/png");
        assert_eq!(LogoUpload::new("a.b.jpeg", vec![]).mime, "image/jpeg");
        assert_eq!(
            LogoUpload::new("logo", vec![]).mime,
            "application/octet-stream"
        );
    }
}
