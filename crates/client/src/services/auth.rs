//! Customer sign-in, sign-up and session verification.

use std::sync::Arc;

use eathub_core::{AuthResponse, Credentials, Email, Principal, SignupRequest};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::ServiceContext;
use crate::retry::retry_request;
use crate::store::auth::AuthStore;
use crate::{Error, Result};

/// Body of the verify endpoints. A bare 2xx counts as valid.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default, alias = "admin")]
    pub user: Option<Principal>,
}

impl VerifyResponse {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.unwrap_or(true)
    }
}

/// Raw auth calls.
pub mod base {
    use eathub_core::{AuthResponse, Credentials, SignupRequest};

    use super::VerifyResponse;
    use crate::http::{ApiClient, ApiError};

    /// `POST /auth/login`
    pub async fn login(api: &ApiClient, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        api.post("auth/login", credentials).await
    }

    /// `POST /auth/signup`
    pub async fn signup(api: &ApiClient, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        api.post("auth/signup", request).await
    }

    /// `GET /auth/verify`
    pub async fn verify(api: &ApiClient) -> Result<VerifyResponse, ApiError> {
        let body: Option<VerifyResponse> = api.get("auth/verify", &[]).await?;
        Ok(body.unwrap_or_default())
    }
}

/// Validate sign-in input.
pub(crate) fn credentials(email: &str, password: &str) -> Result<Credentials> {
    let email = Email::parse(email)?;
    if password.is_empty() {
        return Err(Error::InvalidArgument("Password is required".to_string()));
    }
    Ok(Credentials {
        email,
        password: password.to_string(),
    })
}

/// Map a verify outcome: 401/403 means the token is no longer valid.
pub(crate) fn verify_outcome(
    result: std::result::Result<VerifyResponse, crate::http::ApiError>,
) -> Result<bool> {
    match result {
        Ok(response) => Ok(response.is_valid()),
        Err(e) if e.is_auth_error() => {
            debug!(status = ?e.status, "Token rejected by server");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Clone)]
pub struct AuthService {
    ctx: ServiceContext,
    store: Arc<AuthStore>,
}

impl AuthService {
    #[must_use]
    pub const fn new(ctx: ServiceContext, store: Arc<AuthStore>) -> Self {
        Self { ctx, store }
    }

    /// Sign in and start a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a malformed email or empty
    /// password, or the API error (bad credentials are a 4xx).
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Principal> {
        let credentials = credentials(email, password)?;
        let policy = self.ctx.no_retry();
        let response =
            retry_request(&policy, || base::login(&self.ctx.api, &credentials)).await?;
        Ok(self.start_session(response))
    }

    /// Create an account and start a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank name or password, or
    /// the API error.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<Principal> {
        if request.name.trim().is_empty() {
            return Err(Error::InvalidArgument("Name is required".to_string()));
        }
        if request.password.is_empty() {
            return Err(Error::InvalidArgument("Password is required".to_string()));
        }
        let policy = self.ctx.no_retry();
        let response = retry_request(&policy, || base::signup(&self.ctx.api, request)).await?;
        Ok(self.start_session(response))
    }

    /// Ask the server whether the current token is still valid.
    ///
    /// # Errors
    ///
    /// Returns network and 5xx errors once the single retry is spent.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Result<bool> {
        let policy = self.ctx.mutation_policy();
        verify_outcome(retry_request(&policy, || base::verify(&self.ctx.api)).await)
    }

    /// Verify the saved session, signing out if it is no longer valid.
    pub async fn restore_session(&self) -> bool {
        self.store.verify_token(|_token: SecretString| self.verify()).await
    }

    pub fn logout(&self) {
        self.store.logout();
    }

    fn start_session(&self, response: AuthResponse) -> Principal {
        let principal = response.user.clone();
        self.store
            .login(SecretString::from(response.token), response.user);
        principal
    }
}
