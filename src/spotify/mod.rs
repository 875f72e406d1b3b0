//! # Spotify Integration Module
//!
//! HTTP layer between the game and Spotify's services.
//!
//! ```text
//! CLI / Game
//!     ↓
//! library (pagination)  ──→  TokenManager::call (refresh + retry once)
//!     ↓                              ↓
//! api (resource endpoints)     auth (accounts service, PKCE login)
//!     ↓                              ↓
//! Spotify Web API              accounts.spotify.com
//! ```
//!
//! ## Submodules
//!
//! - [`auth`] - [`SpotifyAccounts`](auth::SpotifyAccounts), the accounts
//!   service behind the token manager, and the interactive browser login.
//! - [`api`] - One function per resource endpoint. Each takes the access
//!   token as its first argument so it can be handed to
//!   [`TokenManager::call`](crate::management::TokenManager::call) inside a
//!   closure binding the remaining arguments.
//! - [`library`] - Pagination over playlists and playlist tracks.
//!
//! ## Errors
//!
//! Resource endpoints answering `401 Unauthorized` produce
//! [`Error::NotAuthed`], the only error the token manager reacts to. Any
//! other non-success status becomes [`Error::Remote`]. The token endpoint
//! never yields `NotAuthed`: a rejected exchange is a remote error.

pub mod api;
pub mod auth;
pub mod library;

use reqwest::{Response, StatusCode};

use crate::{
    config,
    error::{Error, Result},
    management::{CredentialStore, FileStore, TokenManager},
};

use auth::SpotifyAccounts;

pub type SpotifyTokenManager = TokenManager<FileStore, SpotifyAccounts>;

/// Token manager backed by the credential files in the data directory,
/// restoring the last session if one was persisted.
pub async fn token_manager() -> Result<SpotifyTokenManager> {
    let accounts = SpotifyAccounts::from_env()?;
    let credentials = CredentialStore::new(FileStore::new(config::credentials_dir()));
    Ok(TokenManager::load(credentials, accounts).await)
}

/// Maps a resource endpoint response to the error taxonomy.
pub(crate) async fn check_resource(res: Response) -> Result<Response> {
    if res.status() == StatusCode::UNAUTHORIZED {
        return Err(Error::NotAuthed);
    }
    check_remote(res).await
}

/// Non-success responses become [`Error::Remote`] carrying the body text.
pub(crate) async fn check_remote(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let message = res.text().await.unwrap_or_default();
    Err(Error::Remote {
        status: status.as_u16(),
        message,
    })
}
