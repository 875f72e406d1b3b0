use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotguess::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in with Spotify
    Auth,

    /// Forget the stored Spotify session
    Logout,

    /// Show who is logged in and the state of the access token
    Status,

    /// List your playlists and their IDs
    Playlists,

    /// List the devices Spotify can play on
    Devices,

    /// Score a single guess against the tracks of a playlist
    Guess(GuessOptions),

    #[clap(about = "Play a round: hear clips from a playlist, guess the titles")]
    Play(PlayOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct GuessOptions {
    /// Playlist to match against
    playlist: String,

    /// The guess; several words are joined with spaces
    #[clap(required = true, num_args = 1..)]
    text: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayOptions {
    /// Playlist to draw questions from
    playlist: String,

    /// Number of questions in the round
    #[clap(long)]
    questions: Option<usize>,

    /// Device to play on; defaults to the active or first available device
    #[clap(long)]
    device: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Logout => cli::logout().await,
        Command::Status => cli::status().await,
        Command::Playlists => cli::playlists().await,
        Command::Devices => cli::devices().await,
        Command::Guess(opt) => cli::guess(opt.playlist, opt.text.join(" ")).await,
        Command::Play(opt) => cli::play(opt.playlist, opt.questions, opt.device).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
