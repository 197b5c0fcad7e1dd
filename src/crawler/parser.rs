//! Response parsing for the REST API
//!
//! Every response is a JSON object with a `stat` field. Successful listing
//! responses carry a `photos` block; people lookups also carry a `user`
//! block; failures carry a `message`.
//!
//! The API is loose about numeric types (`farm` is a number, `server` a
//! string, `total` either), so scalar fields go through lenient
//! deserializers.

use crate::model::{build_download_link, MediaRecord};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use thiserror::Error;

/// Top-level response envelope
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub stat: String,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub code: Option<i64>,

    #[serde(default)]
    pub photos: Option<PhotoPage>,

    #[serde(default)]
    pub user: Option<UserInfo>,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.stat == "ok"
    }

    /// Describes a failed response
    pub fn failure_message(&self) -> String {
        match (&self.message, self.code) {
            (Some(message), Some(code)) => format!("{} (code {})", message, code),
            (Some(message), None) => message.clone(),
            (None, Some(code)) => format!("stat '{}' (code {})", self.stat, code),
            (None, None) => format!("stat '{}'", self.stat),
        }
    }
}

/// One page of a listing
#[derive(Debug, Default, Deserialize)]
pub struct PhotoPage {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u64,

    #[serde(default)]
    pub photo: Option<Vec<PhotoItem>>,
}

/// One listed item
#[derive(Debug, Deserialize)]
pub struct PhotoItem {
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,

    #[serde(deserialize_with = "lenient_text")]
    pub owner: String,

    #[serde(deserialize_with = "lenient_text")]
    pub secret: String,

    #[serde(deserialize_with = "lenient_text")]
    pub server: String,

    #[serde(deserialize_with = "lenient_text")]
    pub farm: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub ispublic: bool,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub safe: bool,
}

impl PhotoItem {
    pub fn into_record(self, media_base_url: &str) -> MediaRecord {
        let link = build_download_link(
            media_base_url,
            &self.farm,
            &self.server,
            &self.id,
            &self.secret,
        );
        MediaRecord::new(self.owner, self.title, self.ispublic, self.safe, link)
    }
}

/// Account block returned with `get_user_info=1`
#[derive(Debug, Deserialize)]
pub struct UserInfo {
    #[serde(deserialize_with = "lenient_text")]
    pub nsid: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub username: String,

    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub path_alias: Option<String>,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub ispro: bool,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_ad_free: bool,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_deleted: bool,

    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub datecreate: Option<String>,
}

/// Parses a response body
pub fn parse_response(body: &str) -> Result<ApiResponse, serde_json::Error> {
    serde_json::from_str(body)
}

/// An `ok` listing response that lacks its item list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response has no {0} block")]
pub struct MissingListing(&'static str);

/// Converts a successful listing response into media records
///
/// An empty `photo` array is a valid empty page; a missing one is not.
pub fn extract_media(
    response: ApiResponse,
    media_base_url: &str,
) -> Result<Vec<MediaRecord>, MissingListing> {
    let page = response.photos.ok_or(MissingListing("photos"))?;
    let items = page.photo.ok_or(MissingListing("photos.photo"))?;

    Ok(items
        .into_iter()
        .map(|item| item.into_record(media_base_url))
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_optional_text(deserializer)?.unwrap_or_default())
}

fn lenient_optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => None,
        Some(Scalar::Bool(b)) => Some(b.to_string()),
        Some(Scalar::Int(n)) => Some(n.to_string()),
        Some(Scalar::Float(n)) => Some(n.to_string()),
        Some(Scalar::Text(s)) => Some(s),
    })
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => false,
        Some(Scalar::Bool(b)) => b,
        Some(Scalar::Int(n)) => n != 0,
        Some(Scalar::Float(n)) => n != 0.0,
        Some(Scalar::Text(s)) => !matches!(s.trim(), "" | "0" | "false"),
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Scalar::Int(n)) => u64::try_from(n).map_err(de::Error::custom),
        Some(Scalar::Text(s)) => s.trim().parse().map_err(de::Error::custom),
        Some(Scalar::Bool(_)) | Some(Scalar::Float(_)) => {
            Err(de::Error::custom("expected a whole-number count"))
        }
    }
}
