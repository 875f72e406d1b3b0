//! Configuration management for the Spotify guessing game.
//!
//! Values come from environment variables, optionally loaded from a `.env`
//! file in the local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (everything except the client ID has one)

use std::{env, io::ErrorKind, path::PathBuf};

use crate::error::Error;

const APP_DIR: &str = "spotguess";

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
const DEFAULT_SCOPE: &str = "playlist-read-private playlist-read-collaborative streaming user-read-email user-read-private user-modify-playback-state user-read-playback-state";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Returns the platform specific data directory of the application.
///
/// - Linux: `~/.local/share/spotguess`
/// - macOS: `~/Library/Application Support/spotguess`
/// - Windows: `%LOCALAPPDATA%/spotguess`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Directory holding the persisted verifier and token bundle.
pub fn credentials_dir() -> PathBuf {
    data_dir().join("credentials")
}

/// Loads environment variables from `.env` in the local data directory.
///
/// A missing file is not an error; every setting can also come from the
/// process environment.
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or the `.env`
/// file exists but cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Address the local OAuth callback server binds to (`SERVER_ADDRESS`).
pub fn server_addr() -> String {
    var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Returns the Spotify API client ID for authentication.
///
/// There is no default: every installation registers its own application
/// with Spotify.
///
/// # Errors
///
/// Returns [`Error::Config`] if `SPOTIFY_API_AUTH_CLIENT_ID` is unset or empty.
pub fn spotify_client_id() -> Result<String, Error> {
    match env::var("SPOTIFY_API_AUTH_CLIENT_ID") {
        Ok(id) if !id.is_empty() => Ok(id),
        _ => Err(Error::Config(
            "SPOTIFY_API_AUTH_CLIENT_ID must be set".to_string(),
        )),
    }
}

/// Callback URL Spotify redirects to after authorization
/// (`SPOTIFY_API_REDIRECT_URI`). Must match the application settings.
pub fn spotify_redirect_uri() -> String {
    var_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI)
}

/// Permissions requested during authorization (`SPOTIFY_API_AUTH_SCOPE`).
pub fn spotify_scope() -> String {
    var_or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)
}

pub fn spotify_apiauth_url() -> String {
    var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL)
}

pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", DEFAULT_API_URL)
}

pub fn spotify_apitoken_url() -> String {
    var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}
