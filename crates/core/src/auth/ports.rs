//! Port interface for the OAuth token endpoint

use async_trait::async_trait;
use sfsync_domain::{Grant, Result, TokenSet};

/// Exchanges a grant for an access credential
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// A rejected grant surfaces as `SyncError::Unauthorized`
    async fn request_token(&self, grant: &Grant) -> Result<TokenSet>;
}
