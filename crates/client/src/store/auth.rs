//! Session state: bearer token plus the signed-in principal.
//!
//! The token is stored as-is under [`TOKEN_KEY`] and the principal as JSON
//! under [`USER_KEY`]. Both are written on login and removed on logout; a
//! saved session missing either half is discarded on load.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use eathub_core::{Principal, Role};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::{Reducer, Store};
use crate::http::TokenProvider;
use crate::storage::Storage;

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "eathub_token";

/// Storage key of the signed-in principal.
pub const USER_KEY: &str = "eathub_user";

/// A token and the principal it belongs to.
pub struct Session {
    pub token: SecretString,
    pub principal: Principal,
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            token: clone_secret(&self.token),
            principal: self.principal.clone(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("principal", &self.principal)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub session: Option<Session>,
    /// A token verification is in flight.
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum AuthAction {
    LoginSuccess { token: SecretString, principal: Principal },
    Logout,
    SetLoading(bool),
    SetError(Option<String>),
}

impl Reducer for AuthState {
    type Action = AuthAction;

    fn reduce(&self, action: AuthAction) -> Self {
        match action {
            AuthAction::LoginSuccess { token, principal } => Self {
                session: Some(Session { token, principal }),
                loading: false,
                error: None,
            },
            AuthAction::Logout => Self {
                loading: self.loading,
                ..Self::default()
            },
            AuthAction::SetLoading(loading) => Self {
                loading,
                ..self.clone()
            },
            AuthAction::SetError(error) => Self {
                error,
                ..self.clone()
            },
        }
    }
}

impl AuthState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

/// Session store, rehydrated from and persisted to storage.
pub struct AuthStore {
    store: Store<AuthState>,
}

impl AuthStore {
    /// Load any saved session from `storage` and persist every change.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let state = AuthState {
            session: load(storage.as_ref()),
            ..AuthState::default()
        };
        let store = Store::new(state);
        store.subscribe(move |state: &AuthState| save(storage.as_ref(), state));
        Self { store }
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.store.state()
    }

    /// Record a successful login.
    pub fn login(&self, token: SecretString, principal: Principal) {
        info!(user = %principal.id, role = %principal.role, "Signed in");
        self.store.dispatch(AuthAction::LoginSuccess { token, principal });
    }

    /// Drop the session and its saved copy.
    pub fn logout(&self) {
        if self.is_authenticated() {
            info!("Signed out");
        }
        self.store.dispatch(AuthAction::Logout);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.store.dispatch(AuthAction::SetError(error));
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.store
            .with_state(|s| s.session.as_ref().map(|session| clone_secret(&session.token)))
    }

    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.store
            .with_state(|s| s.session.as_ref().map(|session| session.principal.clone()))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.with_state(AuthState::is_authenticated)
    }

    /// Whether the signed-in principal is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.store.with_state(|s| {
            s.session
                .as_ref()
                .is_some_and(|session| session.principal.role == Role::Admin)
        })
    }

    /// Check the saved token with `verify` and sign out unless it is valid.
    ///
    /// Without a token this signs out and returns `false` without calling
    /// `verify`. A verification error counts as invalid. `loading` is set
    /// while `verify` runs and always cleared afterwards.
    pub async fn verify_token<F, Fut, E>(&self, verify: F) -> bool
    where
        F: FnOnce(SecretString) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: fmt::Display,
    {
        let Some(token) = self.token() else {
            self.logout();
            return false;
        };

        self.store.dispatch(AuthAction::SetLoading(true));
        let valid = match verify(token).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "Token verification failed");
                false
            }
        };
        if !valid {
            debug!("Saved token rejected");
            self.store.dispatch(AuthAction::Logout);
        }
        self.store.dispatch(AuthAction::SetLoading(false));
        valid
    }
}

impl TokenProvider for AuthStore {
    fn bearer_token(&self) -> Option<SecretString> {
        self.token()
    }
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.store.fmt(f)
    }
}

fn clone_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}

fn load(storage: &dyn Storage) -> Option<Session> {
    let token = storage.get_item(TOKEN_KEY);
    let user = storage.get_item(USER_KEY);
    let (token, user) = match (token, user) {
        (Ok(None), Ok(None)) => return None,
        (Ok(Some(token)), Ok(Some(user))) => (token, user),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "Failed to read saved session");
            return None;
        }
        _ => {
            warn!("Saved session is incomplete, discarding");
            clear(storage);
            return None;
        }
    };

    match serde_json::from_str::<Principal>(&user) {
        Ok(principal) if !token.trim().is_empty() => {
            debug!(user = %principal.id, "Restored saved session");
            Some(Session {
                token: SecretString::from(token),
                principal,
            })
        }
        Ok(_) => {
            warn!("Saved session has an empty token, discarding");
            clear(storage);
            None
        }
        Err(e) => {
            warn!(error = %e, "Saved user is corrupt, discarding session");
            clear(storage);
            None
        }
    }
}

fn save(storage: &dyn Storage, state: &AuthState) {
    let Some(session) = &state.session else {
        clear(storage);
        return;
    };
    let user = match serde_json::to_string(&session.principal) {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "Failed to encode user");
            return;
        }
    };
    if let Err(e) = storage
        .set_item(TOKEN_KEY, session.token.expose_secret())
        .and_then(|()| storage.set_item(USER_KEY, &user))
    {
        warn!(error = %e, "Failed to save session");
    }
}

fn clear(storage: &dyn Storage) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove_item(key) {
            warn!(key, error = %e, "Failed to remove saved session");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn principal(role: Role) -> Principal {
        serde_json::from_value(serde_json::json!({
            "id": "u1",
            "name": "Ana",
            "email": "ana@example.com",
            "role": role,
            "avatar": "/a.png",
        }))
        .unwrap()
    }

    fn storage() -> Arc<dyn Storage> {
        Arc::new(MemoryStorage::new())
    }

    #[test]
    fn test_login_persists_and_rehydrates() {
        let storage = storage();
        let auth = AuthStore::new(Arc::clone(&storage));
        auth.login(SecretString::from("tok-123".to_string()), principal(Role::Customer));

        assert_eq!(
            storage.get_item(TOKEN_KEY).unwrap().as_deref(),
            Some("tok-123")
        );

        let restored = AuthStore::new(Arc::clone(&storage));
        assert!(restored.is_authenticated());
        assert_eq!(restored.token().unwrap().expose_secret(), "tok-123");
        assert_eq!(restored.principal(), Some(principal(Role::Customer)));
        assert!(!restored.is_admin());
    }

    #[test]
    fn test_logout_clears_storage() {
        let storage = storage();
        let auth = AuthStore::new(Arc::clone(&storage));
        auth.login(SecretString::from("tok".to_string()), principal(Role::Admin));
        assert!(auth.is_admin());

        auth.logout();

        assert!(!auth.is_authenticated());
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_user_is_discarded() {
        let storage = storage();
        storage.set_item(TOKEN_KEY, "tok").unwrap();
        storage.set_item(USER_KEY, "{not json").unwrap();

        let auth = AuthStore::new(Arc::clone(&storage));

        assert!(!auth.is_authenticated());
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_half_session_is_discarded() {
        let storage = storage();
        storage.set_item(TOKEN_KEY, "tok").unwrap();

        let auth = AuthStore::new(Arc::clone(&storage));

        assert!(auth.token().is_none());
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_verify_without_token() {
        let auth = AuthStore::new(storage());
        let valid = auth
            .verify_token(|_| async { Ok::<_, String>(true) })
            .await;
        assert!(!valid);
        assert!(!auth.state().loading);
    }

    #[tokio::test]
    async fn test_verify_keeps_valid_session() {
        let auth = AuthStore::new(storage());
        auth.login(SecretString::from("tok".to_string()), principal(Role::Customer));

        let valid = auth
            .verify_token(|token| async move { Ok::<_, String>(token.expose_secret() == "tok") })
            .await;

        assert!(valid);
        assert!(auth.is_authenticated());
        assert!(!auth.state().loading);
    }

    #[tokio::test]
    async fn test_verify_error_signs_out() {
        let storage = storage();
        let auth = AuthStore::new(Arc::clone(&storage));
        auth.login(SecretString::from("tok".to_string()), principal(Role::Customer));

        let valid = auth
            .verify_token(|_| async { Err::<bool, _>("offline") })
            .await;

        assert!(!valid);
        assert!(!auth.is_authenticated());
        assert!(!auth.state().loading);
        assert!(storage.keys().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_token_signs_out() {
        let auth = AuthStore::new(storage());
        auth.login(SecretString::from("stale".to_string()), principal(Role::Customer));

        let valid = auth
            .verify_token(|_| async { Ok::<_, String>(false) })
            .await;

        assert!(!valid);
        assert!(auth.principal().is_none());
    }
}
