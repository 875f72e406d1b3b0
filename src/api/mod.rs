//! # API Module
//!
//! Endpoints of the local HTTP server used during login.
//!
//! - [`callback`] - Redirect target of Spotify's authorization page. Hands the
//!   authorization code to the token manager, which exchanges it using the
//!   persisted PKCE verifier.
//! - [`health`] - Status and version, handy to check the server is reachable
//!   on the configured `SERVER_ADDRESS`.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
