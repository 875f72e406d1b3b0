use std::collections::HashMap;

use axum::{Extension, extract::Query, response::Html};

use crate::{
    error::Error,
    management::{AuthorizationServer, KeyValueStore, TokenManager},
    warning,
};

pub async fn callback<K: KeyValueStore, E: AuthorizationServer>(
    Query(params): Query<HashMap<String, String>>,
    Extension(manager): Extension<TokenManager<K, E>>,
) -> Html<&'static str> {
    if let Some(reason) = params.get("error") {
        warning!("Authorization denied: {}", reason);
        return Html("<h4>Authorization denied.</h4>");
    }

    let Some(code) = params.get("code") else {
        return Html("<h4>Missing authorization code.</h4>");
    };

    match manager.complete_auth_callback(code).await {
        Ok(()) => Html("<h2>Authentication successful.</h2><p>Close browser window.</p>"),
        Err(Error::MissingVerifier) => {
            Html("<h4>Login session expired.</h4><p>Run <code>spotguess auth</code> again.</p>")
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            Html("<h4>Login failed.</h4>")
        }
    }
}
