mod auth;
mod credentials;
mod store;

pub use auth::AuthState;
pub use auth::AuthorizationRequest;
pub use auth::AuthorizationServer;
pub use auth::TokenManager;
pub use credentials::CredentialStore;
pub use credentials::TOKEN_BUNDLE_KEY;
pub use credentials::VERIFIER_KEY;
pub use store::FileStore;
pub use store::KeyValueStore;
pub use store::MemoryStore;
