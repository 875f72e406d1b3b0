//! # CLI Module
//!
//! User-facing commands of `spotguess`. Each command builds the token
//! manager from the persisted credentials, delegates to the Spotify and game
//! modules and reports through the console macros.
//!
//! ## Commands
//!
//! - [`auth`] / [`logout`] / [`status`] - session handling
//! - [`playlists`] / [`devices`] - what can be played, and where
//! - [`guess`] - score a single guess against a playlist
//! - [`play`] - the game: clips from a playlist, guesses from stdin
//!
//! ## Usage
//!
//! ```bash
//! spotguess auth
//! spotguess playlists
//! spotguess play 37i9dQZF1DXcBWIGoYBM5M --questions 5
//! spotguess guess 37i9dQZF1DXcBWIGoYBM5M "bohemian"
//! ```
//!
//! Failures that leave nothing to do end the process through `error!`;
//! an expired session always points back to `spotguess auth`.

mod auth;
mod guess;
mod play;
mod playlists;

pub use auth::auth;
pub use auth::logout;
pub use auth::status;
pub use guess::guess;
pub use play::play;
pub use playlists::devices;
pub use playlists::playlists;

use crate::{
    error,
    spotify::{self, SpotifyTokenManager},
};

async fn token_manager() -> SpotifyTokenManager {
    match spotify::token_manager().await {
        Ok(manager) => manager,
        Err(e) => error!("Cannot set up Spotify client: {}", e),
    }
}
