use crate::{
    error,
    game::{compute_guess, guess_distance},
    info,
    spotify::library,
    success, warning,
};

/// Scores `text` against every track of a playlist and prints the best
/// matches.
pub async fn guess(playlist_id: String, text: String) {
    let manager = super::token_manager().await;
    let tracks = match library::fetch_all_playlist_tracks(&manager, &playlist_id).await {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to fetch playlist tracks: {}", e),
    };

    let matches = compute_guess(&text, &tracks);
    let Some(first) = matches.first() else {
        info!("Playlist has no playable tracks");
        return;
    };

    let distance = guess_distance(&text, &first.name);
    match matches.len() {
        1 => success!(
            "{} by {} (distance {})",
            first.name,
            first.artist_names(),
            distance
        ),
        n => {
            warning!("Not specific enough, {} titles at distance {}:", n, distance);
            for track in matches {
                info!("{} by {}", track.name, track.artist_names());
            }
        }
    }
}
