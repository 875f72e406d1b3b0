use crate::{
    error, info,
    management::AuthState,
    spotify::{self, api},
    success, warning,
};

pub async fn auth() {
    let manager = super::token_manager().await;
    if manager.state() == AuthState::Authenticated {
        info!("Already logged in, a new login replaces the current session");
    }

    match spotify::auth::login(&manager).await {
        Ok(()) => success!("Authentication successful!"),
        Err(e) => error!("Authentication failed: {}", e),
    }
}

pub async fn logout() {
    let manager = super::token_manager().await;
    match manager.logout().await {
        Ok(()) => success!("Logged out"),
        Err(e) => error!("Failed to remove stored credentials: {}", e),
    }
}

pub async fn status() {
    let manager = super::token_manager().await;
    let Some(bundle) = manager.token_bundle().await else {
        warning!("Not logged in. Run spotguess auth");
        return;
    };

    match manager.call(api::get_current_users_profile).await {
        Ok(profile) => {
            success!(
                "Logged in as {}",
                profile.display_name.as_deref().unwrap_or(&profile.id)
            );
            if !profile.is_premium() {
                warning!("Playback needs Spotify Premium");
            }
        }
        Err(e) => error!("Session is not usable: {}\nRun spotguess auth", e),
    }

    // the call above may have refreshed the bundle
    let bundle = manager.token_bundle().await.unwrap_or(bundle);
    let issued = bundle.issue_time.format("%Y-%m-%d %H:%M:%S UTC");
    match bundle.expires_at() {
        Some(expiry) => info!(
            "Access token issued {}, nominally valid until {}",
            issued,
            expiry.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => info!("Access token issued {}, expiry unknown", issued),
    }
}
