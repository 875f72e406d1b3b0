//! Spotify Playlist Guessing Game Library
//!
//! Hear two seconds of a track from one of your playlists, type what you
//! think it is. This library holds everything behind the `spotguess` binary:
//! the OAuth token lifecycle, the Spotify client, the title matcher and the
//! quiz logic.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by auth, storage and API calls
//! - `game` - Guess matching and quiz rounds
//! - `management` - Credential persistence and the token manager
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API and accounts service clients
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE helpers and formatting
//!
//! # Example
//!
//! ```
//! use spotguess::{config, spotify};
//!
//! #[tokio::main]
//! async fn main() -> spotguess::Res<()> {
//!     config::load_env().await?;
//!     let manager = spotify::token_manager().await?;
//!     let playlists = spotify::library::fetch_all_playlists(&manager).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod game;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Boxed result used by the binary and the CLI layer, where errors from
/// configuration, the callback server and the library meet.
///
/// Library code returns [`error::Result`] instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// ```
/// info!("Question {} of {}", index + 1, total);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for the CLI layer: the process terminates with exit code 1 right
/// after printing, so library code never calls it.
///
/// ```
/// error!("Failed to load configuration: {}", e);
/// // Program exits here
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable problems: a discarded stored token bundle, a failed
/// refresh, a browser that could not be opened.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
