use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::future::join_all;
use tokio::sync::Notify;
use spotguess::error::{Error, Result};
use spotguess::management::{
    AuthState, AuthorizationServer, CredentialStore, MemoryStore, TokenManager,
};
use spotguess::types::TokenBundle;

#[derive(Clone, Default)]
struct Counters {
    exchanges: Arc<AtomicUsize>,
    refreshes: Arc<AtomicUsize>,
}

/// Accounts service double: issues `fresh-<n>` access tokens and counts
/// every request it receives.
struct FakeAccounts {
    counters: Counters,
    fail_refresh: bool,
    fail_exchange: bool,
    // refresh requests wait here when set
    refresh_gate: Option<Arc<Notify>>,
}

impl FakeAccounts {
    fn new(counters: &Counters) -> Self {
        Self {
            counters: counters.clone(),
            fail_refresh: false,
            fail_exchange: false,
            refresh_gate: None,
        }
    }
}

impl AuthorizationServer for FakeAccounts {
    fn authorize_url(&self, code_challenge: &str) -> String {
        format!("https://accounts.test/authorize?code_challenge={code_challenge}")
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenBundle> {
        self.counters.exchanges.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail_exchange {
            return Err(Error::Remote {
                status: 400,
                message: "invalid_grant".to_string(),
            });
        }
        Ok(TokenBundle::new(
            format!("access-for-{code}"),
            3600,
            format!("refresh-for-{}", verifier.len()),
        ))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenBundle> {
        let n = self.counters.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = &self.refresh_gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;
        if self.fail_refresh {
            return Err(Error::Remote {
                status: 400,
                message: "invalid_grant".to_string(),
            });
        }
        Ok(TokenBundle::new(
            format!("fresh-{n}"),
            3600,
            refresh_token.to_string(),
        ))
    }
}

fn stale_bundle() -> TokenBundle {
    TokenBundle::new("stale".to_string(), 3600, "refresh-1".to_string())
}

async fn create_manager(
    accounts: FakeAccounts,
    bundle: Option<TokenBundle>,
) -> TokenManager<MemoryStore, FakeAccounts> {
    let credentials = CredentialStore::new(MemoryStore::new());
    if let Some(bundle) = bundle {
        credentials.store_token_bundle(&bundle).await.unwrap();
    }
    TokenManager::load(credentials, accounts).await
}

/// Resource call double: rejects the `stale` token, echoes any other.
async fn echo_token(calls: Arc<AtomicUsize>, token: String) -> Result<String> {
    calls.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
    if token == "stale" {
        Err(Error::NotAuthed)
    } else {
        Ok(token)
    }
}

#[tokio::test]
async fn test_call_without_bundle_fails_without_calling() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), None).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let result = manager
        .call(|token| echo_token(calls.clone(), token))
        .await;

    assert_eq!(result, Err(Error::NotAuthed));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 0);
    assert_eq!(manager.state(), AuthState::LoggedOut);
}

#[tokio::test]
async fn test_call_passes_current_token() {
    let counters = Counters::default();
    let bundle = TokenBundle::new("valid".to_string(), 3600, "refresh-1".to_string());
    let manager = create_manager(FakeAccounts::new(&counters), Some(bundle)).await;
    let calls = Arc::new(AtomicUsize::new(0));

    assert_eq!(manager.state(), AuthState::Authenticated);
    let result = manager
        .call(|token| echo_token(calls.clone(), token))
        .await;

    assert_eq!(result, Ok("valid".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_and_retried_once() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let result = manager
        .call(|token| echo_token(calls.clone(), token))
        .await;

    assert_eq!(result, Ok("fresh-1".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(manager.state(), AuthState::Authenticated);

    // the new bundle replaced the old one in memory and in the store
    let held = manager.token_bundle().await.unwrap();
    assert_eq!(held.access_token, "fresh-1");
    assert_eq!(held.refresh_token, "refresh-1");
    assert_eq!(manager.credentials().load_token_bundle().await, Some(held));
}

#[tokio::test]
async fn test_concurrent_rejections_share_one_refresh() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let results = join_all((0..8).map(|_| {
        let manager = manager.clone();
        let calls = calls.clone();
        async move {
            manager
                .call(|token| echo_token(calls.clone(), token))
                .await
        }
    }))
    .await;

    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 1);
    for result in results {
        assert_eq!(result, Ok("fresh-1".to_string()));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rejections_share_one_refresh_across_workers() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let manager = manager.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                manager
                    .call(|token| echo_token(calls.clone(), token))
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), Ok("fresh-1".to_string()));
    }
    // callers scheduled after the refresh settled never see `stale`
    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(manager.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_refresh_settling_after_logout_is_discarded() {
    let counters = Counters::default();
    let gate = Arc::new(Notify::new());
    let mut accounts = FakeAccounts::new(&counters);
    accounts.refresh_gate = Some(gate.clone());
    let manager = create_manager(accounts, Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let task = {
        let manager = manager.clone();
        let calls = calls.clone();
        tokio::spawn(async move {
            manager
                .call(|token| echo_token(calls.clone(), token))
                .await
        })
    };
    while counters.refreshes.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    manager.logout().await.unwrap();
    gate.notify_one();

    assert_eq!(task.await.unwrap(), Err(Error::NotAuthed));
    assert_eq!(manager.state(), AuthState::LoggedOut);
    assert_eq!(manager.token_bundle().await, None);
    assert_eq!(manager.credentials().load_token_bundle().await, None);
}

#[tokio::test]
async fn test_refresh_settling_after_new_login_keeps_new_session() {
    let counters = Counters::default();
    let gate = Arc::new(Notify::new());
    let mut accounts = FakeAccounts::new(&counters);
    accounts.refresh_gate = Some(gate.clone());
    let manager = create_manager(accounts, Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let task = {
        let manager = manager.clone();
        let calls = calls.clone();
        tokio::spawn(async move {
            manager
                .call(|token| echo_token(calls.clone(), token))
                .await
        })
    };
    while counters.refreshes.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    manager.initiate_auth_flow().await.unwrap();
    manager.complete_auth_callback("code-2").await.unwrap();
    gate.notify_one();

    assert_eq!(task.await.unwrap(), Ok("access-for-code-2".to_string()));
    let held = manager.token_bundle().await.unwrap();
    assert_eq!(held.access_token, "access-for-code-2");
    assert_eq!(manager.credentials().load_token_bundle().await, Some(held));
    assert_eq!(manager.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_late_rejection_reuses_settled_refresh() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    // another call refreshes and settles while this one still holds `stale`
    let result = manager
        .call(|token| {
            let manager = manager.clone();
            let calls = calls.clone();
            async move {
                if token != "stale" {
                    return Ok(token);
                }
                if let Err(e) = manager
                    .call(|token| echo_token(calls.clone(), token))
                    .await
                {
                    return Err(e);
                }
                Err(Error::NotAuthed)
            }
        })
        .await;

    assert_eq!(result, Ok("fresh-1".to_string()));
    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_second_rejection_is_not_retried() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let result: Result<()> = manager
        .call(|_token| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::NotAuthed)
            }
        })
        .await;

    assert_eq!(result, Err(Error::NotAuthed));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 1);
    // the refresh itself succeeded, so the session survives
    assert_eq!(manager.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let result: Result<()> = manager
        .call(|_token| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Remote {
                    status: 502,
                    message: "bad gateway".to_string(),
                })
            }
        })
        .await;

    assert!(matches!(result, Err(Error::Remote { status: 502, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_refresh_clears_all_token_state() {
    let counters = Counters::default();
    let mut accounts = FakeAccounts::new(&counters);
    accounts.fail_refresh = true;
    let manager = create_manager(accounts, Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let result = manager
        .call(|token| echo_token(calls.clone(), token))
        .await;

    assert!(matches!(result, Err(Error::RefreshFailed(_))));
    assert_eq!(manager.state(), AuthState::LoggedOut);
    assert_eq!(manager.token_bundle().await, None);
    assert_eq!(manager.credentials().load_token_bundle().await, None);

    // the next call fails locally, without touching the network
    let result = manager
        .call(|token| echo_token(calls.clone(), token))
        .await;
    assert_eq!(result, Err(Error::NotAuthed));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_refresh_reaches_every_waiter() {
    let counters = Counters::default();
    let mut accounts = FakeAccounts::new(&counters);
    accounts.fail_refresh = true;
    let manager = create_manager(accounts, Some(stale_bundle())).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let results = join_all((0..4).map(|_| {
        let manager = manager.clone();
        let calls = calls.clone();
        async move {
            manager
                .call(|token| echo_token(calls.clone(), token))
                .await
        }
    }))
    .await;

    assert_eq!(counters.refreshes.load(Ordering::SeqCst), 1);
    for result in results {
        assert!(matches!(result, Err(Error::RefreshFailed(_))));
    }
}

#[tokio::test]
async fn test_initiate_auth_flow_persists_verifier() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), None).await;

    let request = manager.initiate_auth_flow().await.unwrap();
    let verifier = manager.credentials().load_verifier().await.unwrap().unwrap();

    assert_eq!(
        request.code_challenge,
        spotguess::utils::generate_code_challenge(&verifier)
    );
    assert!(request.url.ends_with(&request.code_challenge));
    assert_eq!(counters.exchanges.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_complete_auth_callback_installs_bundle() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), None).await;
    let mut state = manager.subscribe();
    let mut logins = manager.subscribe_logins();

    manager.initiate_auth_flow().await.unwrap();
    manager.complete_auth_callback("code-1").await.unwrap();

    assert!(logins.has_changed().unwrap());

    assert_eq!(manager.state(), AuthState::Authenticated);
    assert!(state.has_changed().unwrap());
    assert_eq!(*state.borrow_and_update(), AuthState::Authenticated);

    let held = manager.token_bundle().await.unwrap();
    assert_eq!(held.access_token, "access-for-code-1");
    assert_eq!(held.refresh_token, "refresh-for-128");
    assert_eq!(manager.credentials().load_token_bundle().await, Some(held));
    // the verifier is single use
    assert_eq!(manager.credentials().load_verifier().await.unwrap(), None);
}

#[tokio::test]
async fn test_complete_auth_callback_without_verifier() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), None).await;

    let result = manager.complete_auth_callback("code-1").await;

    assert_eq!(result, Err(Error::MissingVerifier));
    assert_eq!(counters.exchanges.load(Ordering::SeqCst), 0);
    assert_eq!(manager.state(), AuthState::LoggedOut);
}

#[tokio::test]
async fn test_replayed_callback_needs_a_new_login() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), None).await;

    manager.initiate_auth_flow().await.unwrap();
    manager.complete_auth_callback("code-1").await.unwrap();
    let result = manager.complete_auth_callback("code-1").await;

    assert_eq!(result, Err(Error::MissingVerifier));
    assert_eq!(counters.exchanges.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_code_exchange_is_not_retried() {
    let counters = Counters::default();
    let mut accounts = FakeAccounts::new(&counters);
    accounts.fail_exchange = true;
    let manager = create_manager(accounts, None).await;

    manager.initiate_auth_flow().await.unwrap();
    let result = manager.complete_auth_callback("code-1").await;

    assert!(matches!(result, Err(Error::Remote { status: 400, .. })));
    assert_eq!(counters.exchanges.load(Ordering::SeqCst), 1);
    assert_eq!(manager.state(), AuthState::LoggedOut);
    assert_eq!(manager.token_bundle().await, None);
    // the verifier stays so the callback can be retried from the browser
    assert!(manager.credentials().load_verifier().await.unwrap().is_some());
}

#[tokio::test]
async fn test_failed_relogin_keeps_session_and_reports_no_login() {
    let counters = Counters::default();
    let mut accounts = FakeAccounts::new(&counters);
    accounts.fail_exchange = true;
    let held = stale_bundle();
    let manager = create_manager(accounts, Some(held.clone())).await;
    let mut state = manager.subscribe();
    let mut logins = manager.subscribe_logins();

    manager.initiate_auth_flow().await.unwrap();
    let result = manager.complete_auth_callback("code-1").await;

    assert!(matches!(result, Err(Error::Remote { status: 400, .. })));
    assert!(!logins.has_changed().unwrap());
    assert!(!state.has_changed().unwrap());
    assert_eq!(manager.state(), AuthState::Authenticated);
    assert_eq!(manager.token_bundle().await, Some(held));
}

#[tokio::test]
async fn test_refresh_does_not_count_as_login() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), Some(stale_bundle())).await;
    let mut logins = manager.subscribe_logins();
    let calls = Arc::new(AtomicUsize::new(0));

    let result = manager
        .call(|token| echo_token(calls.clone(), token))
        .await;

    assert_eq!(result, Ok("fresh-1".to_string()));
    assert!(!logins.has_changed().unwrap());
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let counters = Counters::default();
    let manager = create_manager(FakeAccounts::new(&counters), Some(stale_bundle())).await;
    manager.initiate_auth_flow().await.unwrap();

    manager.logout().await.unwrap();

    assert_eq!(manager.state(), AuthState::LoggedOut);
    assert_eq!(manager.token_bundle().await, None);
    assert_eq!(manager.credentials().load_token_bundle().await, None);
    assert_eq!(manager.credentials().load_verifier().await.unwrap(), None);
}

#[tokio::test]
async fn test_corrupted_stored_bundle_starts_logged_out() {
    let counters = Counters::default();
    let credentials = CredentialStore::new(MemoryStore::new());
    {
        use spotguess::management::{KeyValueStore, TOKEN_BUNDLE_KEY};
        credentials
            .backend()
            .set(TOKEN_BUNDLE_KEY, "{\"accessToken\": true}")
            .await
            .unwrap();
    }

    let manager = TokenManager::load(credentials, FakeAccounts::new(&counters)).await;
    assert_eq!(manager.state(), AuthState::LoggedOut);
    assert_eq!(manager.token_bundle().await, None);
}
