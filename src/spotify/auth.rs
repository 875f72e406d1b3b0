use std::time::Duration;

use reqwest::{Client, Url};

use crate::{
    config,
    error::{Error, Result},
    management::{AuthorizationServer, KeyValueStore, TokenManager},
    server::start_api_server,
    types::{TokenBundle, TokenResponse},
    warning,
};

use super::check_remote;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Spotify's accounts service: authorization page and `/api/token`.
pub struct SpotifyAccounts {
    client: Client,
    client_id: String,
    redirect_uri: String,
    scope: String,
    authorize_endpoint: Url,
    token_endpoint: Url,
}

impl SpotifyAccounts {
    pub fn new(
        client_id: String,
        redirect_uri: String,
        scope: String,
        authorize_endpoint: &str,
        token_endpoint: &str,
    ) -> Result<Self> {
        let parse = |url: &str| {
            Url::parse(url).map_err(|e| Error::Config(format!("{url}: {e}")))
        };

        Ok(Self {
            client: Client::new(),
            client_id,
            redirect_uri,
            scope,
            authorize_endpoint: parse(authorize_endpoint)?,
            token_endpoint: parse(token_endpoint)?,
        })
    }

    /// Builds the accounts client from the environment configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(
            config::spotify_client_id()?,
            config::spotify_redirect_uri(),
            config::spotify_scope(),
            &config::spotify_apiauth_url(),
            &config::spotify_apitoken_url(),
        )
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let res = self
            .client
            .post(self.token_endpoint.clone())
            .form(form)
            .send()
            .await?;

        Ok(check_remote(res).await?.json::<TokenResponse>().await?)
    }
}

impl AuthorizationServer for SpotifyAccounts {
    fn authorize_url(&self, code_challenge: &str) -> String {
        let mut url = self.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", self.client_id.as_str())
            .append_pair("scope", &self.scope)
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", code_challenge)
            .append_pair("redirect_uri", &self.redirect_uri);
        url.into()
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenBundle> {
        let json = self
            .request_token(&[
                ("client_id", self.client_id.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_verifier", verifier),
            ])
            .await?;

        let Some(refresh_token) = json.refresh_token else {
            return Err(Error::Remote {
                status: 200,
                message: "token response carried no refresh token".to_string(),
            });
        };

        Ok(TokenBundle::new(
            json.access_token,
            json.expires_in,
            refresh_token,
        ))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenBundle> {
        let json = self
            .request_token(&[
                ("client_id", self.client_id.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        Ok(TokenBundle::new(
            json.access_token,
            json.expires_in,
            json.refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
        ))
    }
}

/// Runs the interactive OAuth 2.0 PKCE login.
///
/// 1. **PKCE Setup**: the token manager generates a verifier/challenge pair
///    and persists the verifier
/// 2. **Server Start**: a local HTTP server is spawned to receive the redirect
/// 3. **Browser Launch**: the authorization URL is opened in the default
///    browser, or printed when no browser can be launched
/// 4. **Callback Handling**: the server hands the code to
///    [`TokenManager::complete_auth_callback`], which exchanges it and
///    persists the new bundle
/// 5. **Completion**: this function returns once the manager reports a
///    successful code exchange through
///    [`TokenManager::subscribe_logins`]. Refreshes and failed exchanges
///    do not count
///
/// # Errors
///
/// - [`Error::LoginTimedOut`] if no successful callback arrives within two
///   minutes. A failed exchange leaves the flow waiting so the user can retry
///   from the browser.
/// - Storage errors while persisting the verifier.
pub async fn login<K: KeyValueStore, E: AuthorizationServer>(
    manager: &TokenManager<K, E>,
) -> Result<()> {
    let mut logins = manager.subscribe_logins();
    let request = manager.initiate_auth_flow().await?;

    let server_manager = manager.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(server_manager).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if webbrowser::open(&request.url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            request.url
        )
    }

    let authenticated = async { logins.changed().await.is_ok() };
    let outcome = tokio::time::timeout(LOGIN_TIMEOUT, authenticated).await;
    server.abort();

    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::NotAuthed),
        Err(_) => Err(Error::LoginTimedOut),
    }
}
