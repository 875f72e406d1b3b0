use std::{collections::HashMap, future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, watch};

use crate::{
    error::{Error, Result},
    types::TokenBundle,
    utils, warning,
};

use super::{credentials::CredentialStore, store::KeyValueStore};

/// The remote side of the authorization code flow.
pub trait AuthorizationServer: Send + Sync + 'static {
    /// URL the user is sent to, with the PKCE challenge embedded.
    fn authorize_url(&self, code_challenge: &str) -> String;

    fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> impl Future<Output = Result<TokenBundle>> + Send;

    /// Trades a refresh token for a new bundle. A response without a refresh
    /// token keeps `refresh_token`.
    fn refresh(&self, refresh_token: &str) -> impl Future<Output = Result<TokenBundle>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    /// Code exchange in flight.
    Authenticating,
    Authenticated,
    Refreshing,
}

/// Everything needed to send the user to the authorization endpoint.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub code_challenge: String,
}

type PendingRefresh = Shared<BoxFuture<'static, Result<TokenBundle>>>;

/// Owns the current token bundle and keeps it usable.
///
/// Cloning is cheap and every clone shares the same state. All resource calls
/// go through [`TokenManager::call`], which refreshes once on
/// [`Error::NotAuthed`] and retries once. Concurrent refreshes of the same
/// refresh token share a single request to the accounts service.
pub struct TokenManager<K, E> {
    inner: Arc<Inner<K, E>>,
}

impl<K, E> Clone for TokenManager<K, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<K, E> {
    credentials: CredentialStore<K>,
    server: E,
    // replaced wholesale, never patched field by field
    bundle: Mutex<Option<TokenBundle>>,
    // keyed by refresh token value
    in_flight: Mutex<HashMap<String, PendingRefresh>>,
    state: watch::Sender<AuthState>,
    // bumped once per successful code exchange
    logins: watch::Sender<u64>,
}

impl<K: KeyValueStore, E: AuthorizationServer> TokenManager<K, E> {
    /// Creates a manager, restoring a previously persisted bundle if there is
    /// a valid one.
    pub async fn load(credentials: CredentialStore<K>, server: E) -> Self {
        let bundle = credentials.load_token_bundle().await;
        let initial = if bundle.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::LoggedOut
        };
        let (state, _) = watch::channel(initial);
        let (logins, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                credentials,
                server,
                bundle: Mutex::new(bundle),
                in_flight: Mutex::new(HashMap::new()),
                state,
                logins,
            }),
        }
    }

    pub fn state(&self) -> AuthState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Changes only when a code exchange succeeds. Refreshes and failed
    /// exchanges never touch it.
    pub fn subscribe_logins(&self) -> watch::Receiver<u64> {
        self.inner.logins.subscribe()
    }

    pub async fn token_bundle(&self) -> Option<TokenBundle> {
        self.inner.bundle.lock().await.clone()
    }

    pub fn credentials(&self) -> &CredentialStore<K> {
        &self.inner.credentials
    }

    /// Generates a verifier/challenge pair, persists the verifier and returns
    /// the authorization URL carrying the challenge.
    pub async fn initiate_auth_flow(&self) -> Result<AuthorizationRequest> {
        let pkce = utils::generate_pkce_challenge();
        self.inner.credentials.store_verifier(&pkce.verifier).await?;

        Ok(AuthorizationRequest {
            url: self.inner.server.authorize_url(&pkce.challenge),
            code_challenge: pkce.challenge,
        })
    }

    /// Exchanges the authorization code for a bundle using the persisted
    /// verifier. Not retried on failure.
    ///
    /// While an older bundle is held the session stays `Authenticated` for
    /// the whole exchange, and a failed exchange publishes nothing.
    pub async fn complete_auth_callback(&self, code: &str) -> Result<()> {
        let Some(verifier) = self.inner.credentials.load_verifier().await? else {
            return Err(Error::MissingVerifier);
        };

        let held = self.inner.bundle.lock().await.is_some();
        if !held {
            self.inner.state.send_replace(AuthState::Authenticating);
        }

        match self.inner.server.exchange_code(code, &verifier).await {
            Ok(bundle) => {
                if let Err(e) = self.inner.credentials.clear_verifier().await {
                    warning!("Failed to discard used verifier: {}", e);
                }
                self.inner.install(bundle).await;
                self.inner.state.send_replace(AuthState::Authenticated);
                self.inner.logins.send_modify(|n| *n += 1);
                Ok(())
            }
            Err(e) => {
                if !held {
                    self.inner.state.send_replace(AuthState::LoggedOut);
                }
                Err(e)
            }
        }
    }

    /// Drops the bundle and any pending verifier, in memory and on disk.
    pub async fn logout(&self) -> Result<()> {
        {
            let mut held = self.inner.bundle.lock().await;
            held.take();
            self.inner.state.send_replace(AuthState::LoggedOut);
            self.inner.credentials.clear_token_bundle().await?;
        }
        self.inner.credentials.clear_verifier().await
    }

    /// Runs `op` with the current access token.
    ///
    /// Fails with [`Error::NotAuthed`] without calling `op` when no bundle is
    /// held. If `op` reports [`Error::NotAuthed`] the bundle is refreshed and
    /// `op` runs exactly once more; its result is returned as is. Other
    /// errors are returned immediately.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(used) = self.token_bundle().await else {
            return Err(Error::NotAuthed);
        };

        match op(used.access_token.clone()).await {
            Err(Error::NotAuthed) => {
                let refreshed = self.refresh_after(&used).await?;
                op(refreshed.access_token).await
            }
            result => result,
        }
    }

    /// Resolves to a bundle newer than `stale`, joining a refresh already in
    /// flight for the same refresh token when there is one.
    async fn refresh_after(&self, stale: &TokenBundle) -> Result<TokenBundle> {
        let pending = {
            let mut in_flight = self.inner.in_flight.lock().await;
            if let Some(pending) = in_flight.get(&stale.refresh_token).cloned() {
                pending
            } else {
                match self.inner.bundle.lock().await.as_ref() {
                    None => return Err(Error::NotAuthed),
                    // a refresh already settled since `stale` was read
                    Some(held) if held.access_token != stale.access_token => {
                        return Ok(held.clone());
                    }
                    Some(_) => {}
                }

                let pending = self.spawn_refresh(stale.refresh_token.clone());
                in_flight.insert(stale.refresh_token.clone(), pending.clone());
                pending
            }
        };

        pending.await
    }

    fn spawn_refresh(&self, refresh_token: String) -> PendingRefresh {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run_refresh(refresh_token).await });

        async move {
            task.await
                .unwrap_or_else(|e| Err(Error::RefreshFailed(e.to_string())))
        }
        .boxed()
        .shared()
    }
}

impl<K: KeyValueStore, E: AuthorizationServer> Inner<K, E> {
    async fn run_refresh(&self, refresh_token: String) -> Result<TokenBundle> {
        self.state.send_replace(AuthState::Refreshing);
        let refreshed = self.server.refresh(&refresh_token).await;

        // held across persistence so logout and login cannot interleave
        let outcome = {
            let mut held = self.bundle.lock().await;
            let current = held
                .as_ref()
                .is_some_and(|b| b.refresh_token == refresh_token);

            if !current {
                // logged out or logged in again while the request was out
                match held.as_ref() {
                    Some(bundle) => {
                        self.state.send_replace(AuthState::Authenticated);
                        Ok(bundle.clone())
                    }
                    None => {
                        self.state.send_replace(AuthState::LoggedOut);
                        Err(Error::NotAuthed)
                    }
                }
            } else {
                match refreshed {
                    Ok(bundle) => {
                        if let Err(e) = self.credentials.store_token_bundle(&bundle).await {
                            warning!("Failed to persist token bundle: {}", e);
                        }
                        *held = Some(bundle.clone());
                        self.state.send_replace(AuthState::Authenticated);
                        Ok(bundle)
                    }
                    Err(e) => {
                        warning!("Token refresh failed, logging out: {}", e);
                        held.take();
                        if let Err(e) = self.credentials.clear_token_bundle().await {
                            warning!("Failed to clear stored token bundle: {}", e);
                        }
                        self.state.send_replace(AuthState::LoggedOut);
                        Err(Error::RefreshFailed(e.to_string()))
                    }
                }
            }
        };

        self.in_flight.lock().await.remove(&refresh_token);
        outcome
    }

    async fn install(&self, bundle: TokenBundle) {
        let mut held = self.bundle.lock().await;
        if let Err(e) = self.credentials.store_token_bundle(&bundle).await {
            warning!("Failed to persist token bundle: {}", e);
        }
        *held = Some(bundle);
    }
}
