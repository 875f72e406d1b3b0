use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::management::{AuthState, AuthorizationServer, KeyValueStore, TokenManager};

pub async fn health<K: KeyValueStore, E: AuthorizationServer>(
    Extension(manager): Extension<TokenManager<K, E>>,
) -> Json<Value> {
    let auth = match manager.state() {
        AuthState::LoggedOut => "logged_out",
        AuthState::Authenticating => "authenticating",
        AuthState::Authenticated => "authenticated",
        AuthState::Refreshing => "refreshing",
    };

    Json(json!({
        "status": "ok",
        "auth": auth,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
