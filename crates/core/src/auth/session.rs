//! Credential session with single-flight renewal
//!
//! Manages the access credential shared by every concurrent request:
//! - Initial authentication through a [`TokenEndpoint`]
//! - Renewal on expiry or on an unauthorized response
//! - Exactly one token request per renewal, however many callers race for it
//!
//! The state machine lives behind one async mutex. Whoever holds the lock
//! while the credential needs renewal performs the token request; everyone
//! queued behind it observes the new generation and reuses its result.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use sfsync_domain::{AuthStatus, Grant, Result, SyncError, TokenSet};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::ports::TokenEndpoint;

/// Renew this long before the reported expiry
const DEFAULT_EXPIRY_SKEW_SECS: i64 = 30;

enum Phase {
    Unauthenticated,
    Authenticated(TokenSet),
    Revoked(String),
}

struct SessionState {
    phase: Phase,
    /// Password grant kept for renewal when no refresh token was issued
    retained_grant: Option<Grant>,
}

/// Shared, thread-safe credential holder
pub struct CredentialSession {
    endpoint: Arc<dyn TokenEndpoint>,
    state: Mutex<SessionState>,
    /// Bumped on every state transition
    generation: AtomicU64,
    default_ttl: Option<Duration>,
    expiry_skew: Duration,
}

impl CredentialSession {
    /// Create an unauthenticated session
    #[must_use]
    pub fn new(endpoint: Arc<dyn TokenEndpoint>) -> Self {
        Self {
            endpoint,
            state: Mutex::new(SessionState { phase: Phase::Unauthenticated, retained_grant: None }),
            generation: AtomicU64::new(0),
            default_ttl: None,
            expiry_skew: Duration::seconds(DEFAULT_EXPIRY_SKEW_SECS),
        }
    }

    /// Assume this lifetime for credentials issued without an expiry
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Renew credentials expiring within `skew`
    #[must_use]
    pub fn with_expiry_skew(mut self, skew: Duration) -> Self {
        self.expiry_skew = skew;
        self
    }

    /// Create a session and authenticate it in one step
    ///
    /// # Errors
    /// Returns the token endpoint's error when the grant is rejected.
    pub async fn connect(endpoint: Arc<dyn TokenEndpoint>, grant: Grant) -> Result<Self> {
        let session = Self::new(endpoint);
        session.authenticate(grant).await?;
        Ok(session)
    }

    /// Exchange `grant` for a credential, replacing any previous state
    ///
    /// A password grant is retained so the session can renew itself when the
    /// endpoint issues no refresh token.
    ///
    /// # Errors
    /// Returns the token endpoint's error; the previous state is kept.
    #[instrument(skip_all, fields(grant_type = grant.grant_type()))]
    pub async fn authenticate(&self, grant: Grant) -> Result<TokenSet> {
        let mut state = self.state.lock().await;
        let token = self.endpoint.request_token(&grant).await?.with_default_ttl(self.default_ttl);

        state.retained_grant = matches!(grant, Grant::Password { .. }).then_some(grant);
        state.phase = Phase::Authenticated(token.clone());
        self.bump();
        info!(instance_url = %token.instance_url, "authenticated");
        Ok(token)
    }

    /// Current credential, renewed first when it has expired
    ///
    /// # Errors
    /// - `NotAuthenticated` before the first successful `authenticate`
    /// - `AuthenticationExpired` once the session has been revoked
    pub async fn ensure_valid(&self) -> Result<TokenSet> {
        let mut state = self.state.lock().await;
        match &state.phase {
            Phase::Authenticated(token) if !token.is_expired(self.expiry_skew) => Ok(token.clone()),
            Phase::Authenticated(_) => {
                debug!("access token expired, renewing");
                self.renew_locked(&mut state).await
            }
            Phase::Unauthenticated => Err(SyncError::NotAuthenticated),
            Phase::Revoked(reason) => Err(SyncError::AuthenticationExpired(reason.clone())),
        }
    }

    /// Renew the credential (single-flight)
    ///
    /// Callers that queued up while another caller was renewing receive that
    /// caller's result without issuing a second token request.
    ///
    /// # Errors
    /// - `AuthenticationExpired` when the token endpoint rejects the renewal
    ///   grant; the session is then revoked
    /// - The transport error when the endpoint could not be reached; the
    ///   session keeps its expired credential and can be renewed again
    pub async fn refresh(&self) -> Result<TokenSet> {
        let seen = self.generation.load(Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != seen {
            debug!("refresh already completed by a concurrent caller");
            return Self::current(&state);
        }
        self.renew_locked(&mut state).await
    }

    /// Renew only if `rejected` is still the current access token
    ///
    /// A caller whose request was rejected with a token that someone else has
    /// already replaced gets the newer token without another network call.
    ///
    /// # Errors
    /// Same as [`CredentialSession::refresh`].
    pub async fn refresh_rejected(&self, rejected: &str) -> Result<TokenSet> {
        let mut state = self.state.lock().await;
        match &state.phase {
            Phase::Authenticated(token) if token.access_token != rejected => Ok(token.clone()),
            _ => self.renew_locked(&mut state).await,
        }
    }

    /// Run `operation` with a valid credential, renewing and retrying once
    /// when it reports `Unauthorized`
    ///
    /// # Errors
    /// The operation's error, a second `Unauthorized`, or a renewal failure.
    pub async fn with_token<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(TokenSet) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let token = self.ensure_valid().await?;
        let rejected = token.access_token.clone();
        match operation(token).await {
            Err(SyncError::Unauthorized(reason)) => {
                warn!(%reason, "request unauthorized, renewing credential");
                let fresh = self.refresh_rejected(&rejected).await?;
                operation(fresh).await
            }
            other => other,
        }
    }

    /// Observable session state
    pub async fn status(&self) -> AuthStatus {
        let state = self.state.lock().await;
        match &state.phase {
            Phase::Unauthenticated => AuthStatus::Unauthenticated,
            Phase::Authenticated(token) if token.is_expired(self.expiry_skew) => AuthStatus::Expired,
            Phase::Authenticated(_) => AuthStatus::Authenticated,
            Phase::Revoked(_) => AuthStatus::Revoked,
        }
    }

    /// Instance endpoint of the current credential
    pub async fn instance_url(&self) -> Option<String> {
        let state = self.state.lock().await;
        match &state.phase {
            Phase::Authenticated(token) => Some(token.instance_url.clone()),
            _ => None,
        }
    }

    fn current(state: &SessionState) -> Result<TokenSet> {
        match &state.phase {
            Phase::Authenticated(token) => Ok(token.clone()),
            Phase::Unauthenticated => Err(SyncError::NotAuthenticated),
            Phase::Revoked(reason) => Err(SyncError::AuthenticationExpired(reason.clone())),
        }
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Must be called with the state lock held
    async fn renew_locked(&self, state: &mut SessionState) -> Result<TokenSet> {
        let previous_refresh = match &state.phase {
            Phase::Authenticated(token) => token.refresh_token.clone(),
            Phase::Unauthenticated => return Err(SyncError::NotAuthenticated),
            Phase::Revoked(reason) => return Err(SyncError::AuthenticationExpired(reason.clone())),
        };

        let grant = match (&previous_refresh, &state.retained_grant) {
            (Some(refresh_token), _) => Grant::RefreshToken { refresh_token: refresh_token.clone() },
            (None, Some(retained)) => retained.clone(),
            (None, None) => {
                let reason = "no renewal credential available".to_string();
                error!(%reason, "session revoked");
                state.phase = Phase::Revoked(reason.clone());
                self.bump();
                return Err(SyncError::AuthenticationExpired(reason));
            }
        };

        debug!(grant_type = grant.grant_type(), "requesting renewed credential");
        match self.endpoint.request_token(&grant).await {
            Ok(token) => {
                let mut token = token.with_default_ttl(self.default_ttl);
                if token.refresh_token.is_none() {
                    token.refresh_token = previous_refresh;
                }
                state.phase = Phase::Authenticated(token.clone());
                self.bump();
                info!("credential renewed");
                Ok(token)
            }
            Err(err) if is_rejection(&err) => {
                let reason = format!("renewal failed: {err}");
                error!(error = %err, "credential renewal rejected, session revoked");
                state.phase = Phase::Revoked(reason.clone());
                self.bump();
                Err(SyncError::AuthenticationExpired(reason))
            }
            Err(err) => {
                // expired credential and grant stay in place for the next attempt
                warn!(error = %err, "credential renewal failed, will retry");
                Err(err)
            }
        }
    }
}

/// The token endpoint refused the grant itself, as opposed to being unreachable
fn is_rejection(err: &SyncError) -> bool {
    match err {
        SyncError::Unauthorized(_) => true,
        SyncError::Remote { status, .. } => (400..500).contains(status),
        _ => false,
    }
}
