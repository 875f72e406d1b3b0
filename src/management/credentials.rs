use crate::{error::Result, types::TokenBundle, warning};

use super::store::KeyValueStore;

pub const VERIFIER_KEY: &str = "spotify-verifier";
pub const TOKEN_BUNDLE_KEY: &str = "spotify-token-bundle";

/// Durable home of the pending PKCE verifier and the current token bundle.
pub struct CredentialStore<K> {
    backend: K,
}

impl<K: KeyValueStore> CredentialStore<K> {
    pub fn new(backend: K) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }

    pub async fn store_verifier(&self, verifier: &str) -> Result<()> {
        self.backend.set(VERIFIER_KEY, verifier).await
    }

    pub async fn load_verifier(&self) -> Result<Option<String>> {
        self.backend.get(VERIFIER_KEY).await
    }

    pub async fn clear_verifier(&self) -> Result<()> {
        self.backend.remove(VERIFIER_KEY).await
    }

    pub async fn store_token_bundle(&self, bundle: &TokenBundle) -> Result<()> {
        let json = serde_json::to_string_pretty(bundle)?;
        self.backend.set(TOKEN_BUNDLE_KEY, &json).await
    }

    /// Loads the persisted bundle.
    ///
    /// Anything that does not parse into a well-formed bundle is reported as
    /// absent, including backend read failures.
    pub async fn load_token_bundle(&self) -> Option<TokenBundle> {
        let json = match self.backend.get(TOKEN_BUNDLE_KEY).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warning!("Failed to read stored token bundle: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<TokenBundle>(&json) {
            Ok(bundle) if bundle.is_well_formed() => Some(bundle),
            Ok(_) => {
                warning!("Ignoring stored token bundle with empty tokens");
                None
            }
            Err(e) => {
                warning!("Ignoring malformed stored token bundle: {}", e);
                None
            }
        }
    }

    pub async fn clear_token_bundle(&self) -> Result<()> {
        self.backend.remove(TOKEN_BUNDLE_KEY).await
    }
}
