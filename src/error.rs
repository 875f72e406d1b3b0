//! Error taxonomy shared by the token manager, the credential store and the
//! Spotify client.
//!
//! Only [`Error::NotAuthed`] coming back from a resource call is acted upon
//! (one refresh, one retry). Everything else is handed to the caller as is.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No token is held, or a resource endpoint rejected the access token.
    #[error("not authenticated, run `spotguess auth`")]
    NotAuthed,

    /// The refresh exchange failed. All token state has been cleared.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The authorization callback arrived without a pending verifier.
    #[error("no pending login found, restart the login flow")]
    MissingVerifier,

    /// Non-success response from a remote endpoint.
    #[error("remote responded with {status}: {message}")]
    Remote { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("request failed: {0}")]
    Transport(String),

    #[error("credential storage failed: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("timed out waiting for the authorization callback")]
    LoginTimedOut,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
