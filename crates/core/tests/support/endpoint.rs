//! Token endpoint fake issuing `token-1`, `token-2`, ...

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sfsync_core::TokenEndpoint;
use sfsync_domain::{Grant, Result, SyncError, TokenSet};

pub const INSTANCE_URL: &str = "https://na1.example.com";

#[derive(Default)]
pub struct ScriptedEndpoint {
    requests: AtomicUsize,
    reject: AtomicBool,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of token requests served so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Reject every following grant
    pub fn reject_from_now(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenEndpoint for ScriptedEndpoint {
    async fn request_token(&self, _grant: &Grant) -> Result<TokenSet> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject.load(Ordering::SeqCst) {
            return Err(SyncError::Unauthorized("invalid_grant".into()));
        }
        Ok(TokenSet::new(format!("token-{request}"), INSTANCE_URL).with_refresh_token("refresh-token"))
    }
}
