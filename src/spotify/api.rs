//! Resource endpoints of the Spotify Web API.
//!
//! Every function takes the access token first and owns its remaining
//! arguments, so a call can be bound in a closure and passed to
//! [`TokenManager::call`](crate::management::TokenManager::call):
//!
//! ```ignore
//! let page = manager
//!     .call(|token| api::get_current_users_playlists(token, 50, 0))
//!     .await?;
//! ```

use reqwest::Client;

use crate::{
    config,
    error::Result,
    types::{Device, DevicesResponse, Paging, PlayRequest, Playlist, PlaylistTrack, UserProfile},
};

use super::check_resource;

pub async fn get_current_users_profile(token: String) -> Result<UserProfile> {
    let res = Client::new()
        .get(format!("{uri}/me", uri = config::spotify_apiurl()))
        .bearer_auth(token)
        .send()
        .await?;

    Ok(check_resource(res).await?.json::<UserProfile>().await?)
}

pub async fn get_current_users_playlists(
    token: String,
    limit: usize,
    offset: usize,
) -> Result<Paging<Playlist>> {
    let api_url = format!(
        "{uri}/me/playlists?limit={limit}&offset={offset}",
        uri = config::spotify_apiurl(),
    );

    let res = Client::new().get(&api_url).bearer_auth(token).send().await?;
    Ok(check_resource(res).await?.json::<Paging<Playlist>>().await?)
}

pub async fn get_playlist_tracks(
    token: String,
    playlist_id: String,
    limit: usize,
    offset: usize,
) -> Result<Paging<PlaylistTrack>> {
    let api_url = format!(
        "{uri}/playlists/{playlist_id}/tracks?limit={limit}&offset={offset}",
        uri = config::spotify_apiurl(),
    );

    let res = Client::new().get(&api_url).bearer_auth(token).send().await?;
    Ok(check_resource(res)
        .await?
        .json::<Paging<PlaylistTrack>>()
        .await?)
}

pub async fn get_available_devices(token: String) -> Result<Vec<Device>> {
    let res = Client::new()
        .get(format!("{uri}/me/player/devices", uri = config::spotify_apiurl()))
        .bearer_auth(token)
        .send()
        .await?;

    let body = check_resource(res).await?.json::<DevicesResponse>().await?;
    Ok(body.devices)
}

/// Starts playback of `request.uris` on `device_id` at `request.position_ms`.
pub async fn play(token: String, device_id: String, request: PlayRequest) -> Result<()> {
    let res = Client::new()
        .put(format!("{uri}/me/player/play", uri = config::spotify_apiurl()))
        .query(&[("device_id", device_id)])
        .bearer_auth(token)
        .json(&request)
        .send()
        .await?;

    check_resource(res).await?;
    Ok(())
}

pub async fn pause(token: String, device_id: String) -> Result<()> {
    let res = Client::new()
        .put(format!("{uri}/me/player/pause", uri = config::spotify_apiurl()))
        .query(&[("device_id", device_id)])
        .bearer_auth(token)
        .header(reqwest::header::CONTENT_LENGTH, 0)
        .send()
        .await?;

    check_resource(res).await?;
    Ok(())
}
