use std::{net::SocketAddr, str::FromStr};

use axum::{Extension, Router, routing::get};

use crate::{
    Res, api, config,
    management::{AuthorizationServer, KeyValueStore, TokenManager},
};

/// Serves `/health` and the OAuth redirect target `/callback` until the task
/// is aborted.
pub async fn start_api_server<K: KeyValueStore, E: AuthorizationServer>(
    manager: TokenManager<K, E>,
) -> Res<()> {
    let app = Router::new()
        .route("/health", get(api::health::<K, E>))
        .route("/callback", get(api::callback::<K, E>))
        .layer(Extension(manager));

    let addr = SocketAddr::from_str(&config::server_addr())?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
