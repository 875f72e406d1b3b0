use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    error::Result,
    management::{AuthorizationServer, KeyValueStore, TokenManager},
    types::{Playlist, Track},
};

use super::api;

const PAGE_SIZE: usize = 50;

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Fetches every playlist of the current user, page by page.
pub async fn fetch_all_playlists<K: KeyValueStore, E: AuthorizationServer>(
    manager: &TokenManager<K, E>,
) -> Result<Vec<Playlist>> {
    let pb = spinner("Fetching playlists...");
    let mut playlists: Vec<Playlist> = Vec::new();

    loop {
        let offset = playlists.len();
        let page = match manager
            .call(|token| api::get_current_users_playlists(token, PAGE_SIZE, offset))
            .await
        {
            Ok(page) => page,
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        };

        let fetched = page.items.len();
        playlists.extend(page.items);
        if fetched == 0 || playlists.len() >= page.total {
            break;
        }
    }

    pb.finish_and_clear();
    Ok(playlists)
}

/// Fetches every playable track of a playlist.
///
/// Entries without a track (local files, removed episodes) are skipped but
/// still count towards paging.
pub async fn fetch_all_playlist_tracks<K: KeyValueStore, E: AuthorizationServer>(
    manager: &TokenManager<K, E>,
    playlist_id: &str,
) -> Result<Vec<Track>> {
    let pb = spinner("Fetching playlist tracks...");
    let mut tracks: Vec<Track> = Vec::new();
    let mut offset = 0;

    loop {
        let page = match manager
            .call(|token| {
                api::get_playlist_tracks(token, playlist_id.to_string(), PAGE_SIZE, offset)
            })
            .await
        {
            Ok(page) => page,
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        };

        let fetched = page.items.len();
        offset += fetched;
        tracks.extend(page.items.into_iter().filter_map(|item| item.track));
        if fetched == 0 || offset >= page.total {
            break;
        }
    }

    pb.finish_and_clear();
    Ok(tracks)
}
