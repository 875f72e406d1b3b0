use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::PkceChallenge;

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Fresh verifier plus its S256 challenge, ready for an authorization request.
pub fn generate_pkce_challenge() -> PkceChallenge {
    let verifier = generate_code_verifier();
    let challenge = generate_code_challenge(&verifier);
    PkceChallenge {
        verifier,
        challenge,
    }
}

/// Renders a millisecond offset as `m:ss`.
pub fn format_position(position_ms: u64) -> String {
    let total_secs = position_ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
