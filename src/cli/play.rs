use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::sleep,
};

use crate::{
    error,
    error::Result,
    game::{
        GuessOutcome, Question, Quiz,
        quiz::{DEFAULT_QUESTION_COUNT, PLAYBACK_BUFFER_MS, PLAYBACK_LENGTH_MS},
    },
    info,
    spotify::{SpotifyTokenManager, api, library},
    success,
    types::{PlayRequest, Track},
    utils, warning,
};

pub async fn play(playlist_id: String, questions: Option<usize>, device: Option<String>) {
    let manager = super::token_manager().await;

    let profile = match manager.call(api::get_current_users_profile).await {
        Ok(profile) => profile,
        Err(e) => error!("Failed to load profile: {}\nRun spotguess auth", e),
    };
    if !profile.is_premium() {
        error!("You must have Spotify Premium to use this app!");
    }

    let device_id = match device {
        Some(id) => id,
        None => select_device(&manager).await,
    };

    let tracks = match library::fetch_all_playlist_tracks(&manager, &playlist_id).await {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to fetch playlist tracks: {}", e),
    };
    if tracks.is_empty() {
        error!("Playlist has no playable tracks");
    }

    let count = questions.unwrap_or(DEFAULT_QUESTION_COUNT);
    let mut quiz = Quiz::new(tracks, count, &mut rand::rng());
    info!(
        "{} questions. Type a title to guess; :r replay, :n next, :p previous, :q quit",
        quiz.len()
    );
    present(&manager, &device_id, &quiz).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let answered = match line.trim() {
            "" => continue,
            ":q" => break,
            ":r" => {
                replay(&manager, &device_id, &quiz).await;
                continue;
            }
            ":n" => {
                if quiz.next() {
                    present(&manager, &device_id, &quiz).await;
                } else {
                    info!("This is the last question");
                }
                continue;
            }
            ":p" => {
                if quiz.previous() {
                    present(&manager, &device_id, &quiz).await;
                } else {
                    info!("This is the first question");
                }
                continue;
            }
            text => report(quiz.guess(text)),
        };

        if answered {
            if !quiz.next() {
                break;
            }
            present(&manager, &device_id, &quiz).await;
        }
    }

    success!(
        "Score: {}/{} ({} answered)",
        quiz.score(),
        quiz.len(),
        quiz.answered()
    );
}

/// Prints the outcome of a guess; true when it counted as an answer.
fn report(outcome: Option<GuessOutcome<'_>>) -> bool {
    match outcome {
        Some(GuessOutcome::Correct(track)) => {
            success!("Correct! {} by {}", track.name, track.artist_names());
            true
        }
        Some(GuessOutcome::Incorrect { guessed, actual }) => {
            warning!(
                "You guessed {}. It was {} by {}",
                guessed.name,
                actual.name,
                actual.artist_names()
            );
            true
        }
        Some(GuessOutcome::NotSpecificEnough(_)) => {
            warning!("Not specific enough! Type some more.");
            false
        }
        None => false,
    }
}

async fn select_device(manager: &SpotifyTokenManager) -> String {
    let devices = match manager.call(api::get_available_devices).await {
        Ok(devices) => devices,
        Err(e) => error!("Failed to fetch devices: {}", e),
    };

    let chosen = devices
        .iter()
        .find(|d| d.is_active && d.id.is_some())
        .or_else(|| devices.iter().find(|d| d.id.is_some()));

    match chosen {
        Some(device) => {
            info!("Playing on {}", device.name);
            device.id.clone().unwrap_or_default()
        }
        None => error!(
            "No playback device found. Open Spotify on any device and try again, or pass --device"
        ),
    }
}

async fn present(manager: &SpotifyTokenManager, device_id: &str, quiz: &Quiz) {
    info!("Question {}/{}", quiz.index() + 1, quiz.len());
    replay(manager, device_id, quiz).await;
}

async fn replay(manager: &SpotifyTokenManager, device_id: &str, quiz: &Quiz) {
    let Some((question, track)) = quiz.current() else {
        return;
    };
    if let Err(e) = play_clip(manager, device_id, question, track).await {
        warning!("Playback failed: {}", e);
    }
}

/// Plays one clip: start at the question's offset, wait, pause.
async fn play_clip(
    manager: &SpotifyTokenManager,
    device_id: &str,
    question: &Question,
    track: &Track,
) -> Result<()> {
    let request = PlayRequest {
        uris: vec![track.uri.clone()],
        position_ms: question.start_position_ms,
    };
    manager
        .call(|token| api::play(token, device_id.to_string(), request.clone()))
        .await?;

    info!(
        "Playing from {}",
        utils::format_position(question.start_position_ms)
    );
    sleep(Duration::from_millis(PLAYBACK_LENGTH_MS + PLAYBACK_BUFFER_MS)).await;

    manager
        .call(|token| api::pause(token, device_id.to_string()))
        .await
}
