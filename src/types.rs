use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// OAuth credentials held by the token manager and mirrored in the
/// credential store.
///
/// `issue_time + expiry_seconds` is informational only: validity is decided
/// by whether the remote accepts the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    pub access_token: String,
    pub issue_time: DateTime<Utc>,
    pub expiry_seconds: u64,
    pub refresh_token: String,
}

impl TokenBundle {
    pub fn new(access_token: String, expiry_seconds: u64, refresh_token: String) -> Self {
        Self {
            access_token,
            issue_time: Utc::now(),
            expiry_seconds,
            refresh_token,
        }
    }

    /// `None` when the expiry does not fit the calendar.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expiry_seconds).ok()?;
        self.issue_time
            .checked_add_signed(Duration::try_seconds(secs)?)
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        !self.access_token.is_empty()
            && !self.refresh_token.is_empty()
            && self.expires_at().is_some()
    }
}

/// PKCE verifier and the S256 challenge derived from it.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

/// Response body of the accounts service `/api/token` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub product: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl UserProfile {
    pub fn is_premium(&self) -> bool {
        self.product.as_deref() == Some("premium")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksRef {
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    pub tracks: Option<PlaylistTracksRef>,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub id: String,
    pub tracks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<&str>>()
            .join(", ")
    }
}

/// Playlist entry; `track` is null for local files and removed episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub name: String,
    pub kind: String,
    pub id: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRequest {
    pub uris: Vec<String>,
    pub position_ms: u64,
}
