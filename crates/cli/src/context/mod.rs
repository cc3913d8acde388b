//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use sfsync_common::RetryPolicy;
use sfsync_core::{
    AccountService, BatchExecutor, CredentialSession, ObjectStore, ProgressObserver, SchemaRegistry, SyncPipeline,
    TokenEndpoint, ValidationEngine,
};
use sfsync_domain::{Config, Grant, Result, SyncConfig};
use sfsync_infra::{OAuthTokenClient, SalesforceClient};
use tracing::info;

/// Type alias for the object store port trait object
type DynObjectStore = dyn ObjectStore + 'static;

/// Type alias for the token endpoint port trait object
type DynTokenEndpoint = dyn TokenEndpoint + 'static;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub session: Arc<CredentialSession>,
    pub store: Arc<DynObjectStore>,
    pub pipeline: Arc<SyncPipeline>,
    pub accounts: AccountService,
    pub dry_run: bool,
}

impl AppContext {
    /// Authenticate against the configured org
    ///
    /// # Errors
    /// `Unauthorized` when the login is rejected, transport errors otherwise.
    pub async fn connect(config: Config, dry_run: bool) -> Result<Self> {
        let endpoint = Arc::new(OAuthTokenClient::from_config(&config)?);
        let store = Arc::new(SalesforceClient::from_config(&config)?);
        Self::with_adapters(config, endpoint, store, dry_run).await
    }

    /// Wire the engine around explicit adapters
    ///
    /// # Errors
    /// Same as [`AppContext::connect`].
    pub async fn with_adapters(
        config: Config,
        endpoint: Arc<DynTokenEndpoint>,
        store: Arc<DynObjectStore>,
        dry_run: bool,
    ) -> Result<Self> {
        let ttl = config
            .salesforce
            .session_ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds);
        let session = Arc::new(CredentialSession::new(endpoint).with_default_ttl(ttl));
        session
            .authenticate(Grant::Password {
                username: config.salesforce.username.clone(),
                password: config.salesforce.password.clone(),
                security_token: config.salesforce.security_token.clone(),
            })
            .await?;
        info!(username = %config.salesforce.username, "authenticated");

        let registry = Arc::new(SchemaRegistry::new(store.clone()));
        let progress: Arc<dyn ProgressObserver> = Arc::new(|processed: usize, total: usize| {
            info!(processed, total, "batch progress");
        });
        let executor = Arc::new(
            BatchExecutor::new(store.clone(), registry.clone())
                .with_retry_policy(retry_policy(&config.sync))
                .with_observer(progress),
        );
        let engine = Arc::new(ValidationEngine::new(registry));
        let pipeline = Arc::new(SyncPipeline::new(engine, executor, session.clone()));
        let accounts = AccountService::new(pipeline.clone(), store.clone()).with_dry_run(dry_run);

        Ok(Self { config, session, store, pipeline, accounts, dry_run })
    }
}

/// Exponential backoff from the sync settings
pub fn retry_policy(sync: &SyncConfig) -> RetryPolicy {
    RetryPolicy::exponential(
        sync.max_attempts.max(1),
        Duration::from_millis(sync.base_backoff_ms),
        Duration::from_millis(sync.max_backoff_ms),
    )
}
