use tabled::Table;

use crate::{
    error, info,
    spotify::{api, library},
    types::{DeviceTableRow, PlaylistTableRow},
};

pub async fn playlists() {
    let manager = super::token_manager().await;
    let playlists = match library::fetch_all_playlists(&manager).await {
        Ok(playlists) => playlists,
        Err(e) => error!("Failed to fetch playlists: {}", e),
    };

    if playlists.is_empty() {
        info!("No playlists found");
        return;
    }

    let rows: Vec<PlaylistTableRow> = playlists
        .into_iter()
        .map(|p| PlaylistTableRow {
            name: p.name,
            id: p.id,
            tracks: p.tracks.map_or(0, |t| t.total),
        })
        .collect();

    println!("{}", Table::new(rows));
}

pub async fn devices() {
    let manager = super::token_manager().await;
    let devices = match manager.call(api::get_available_devices).await {
        Ok(devices) => devices,
        Err(e) => error!("Failed to fetch devices: {}", e),
    };

    if devices.is_empty() {
        info!("No devices available. Open Spotify on any device first");
        return;
    }

    let rows: Vec<DeviceTableRow> = devices
        .into_iter()
        .map(|d| DeviceTableRow {
            name: d.name,
            kind: d.kind,
            id: d.id.unwrap_or_default(),
            active: d.is_active,
        })
        .collect();

    println!("{}", Table::new(rows));
}
