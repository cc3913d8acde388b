//! Schema registry: object type -> field definitions
//!
//! Entries are populated by one describe call per object type and cached for
//! the lifetime of the process. Concurrent misses for the same type wait on a
//! per-type lock, so only the first of them describes. An entry is only ever replaced as a whole
//! (`Arc` swap under the write lock), so readers never observe a partially
//! loaded schema.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use sfsync_domain::{
    FieldDefinition, ObjectSchema, Record, RequiredWhen, Result, SyncError,
};
use tracing::{debug, info, instrument, warn};

use crate::auth::CredentialSession;
use crate::sync::ports::ObjectStore;

/// Cached field metadata per object type
pub struct SchemaRegistry {
    store: Arc<dyn ObjectStore>,
    schemas: RwLock<HashMap<String, Arc<ObjectSchema>>>,
    /// object type -> field -> conditional-required rule
    conditional: RwLock<HashMap<String, HashMap<String, RequiredWhen>>>,
    /// object type -> lock held while that type is being described
    loading: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            schemas: RwLock::new(HashMap::new()),
            conditional: RwLock::new(HashMap::new()),
            loading: Mutex::new(HashMap::new()),
        }
    }

    /// Schema of `object_type`, describing it remotely on first use
    ///
    /// Concurrent callers missing the same type share one describe call.
    /// Failures are not retried here.
    ///
    /// # Errors
    /// `SchemaDiscovery` wrapping the network or authentication failure.
    #[instrument(skip(self, session))]
    pub async fn discover(
        &self,
        session: &CredentialSession,
        object_type: &str,
        force_refresh: bool,
    ) -> Result<Arc<ObjectSchema>> {
        if !force_refresh {
            if let Some(schema) = self.cached(object_type) {
                return Ok(schema);
            }
        }

        let lock = self.loading.lock().entry(object_type.to_string()).or_default().clone();
        let _loading = lock.lock().await;
        if !force_refresh {
            if let Some(schema) = self.cached(object_type) {
                debug!(object_type, "schema loaded by a concurrent caller");
                return Ok(schema);
            }
        }

        let described = session
            .with_token(|token| async move { self.store.describe(&token, object_type).await })
            .await
            .map_err(|err| match err {
                SyncError::SchemaDiscovery { .. } => err,
                other => SyncError::SchemaDiscovery {
                    object_type: object_type.to_string(),
                    message: other.to_string(),
                },
            })?;

        let schema = self.install(described)?;
        info!(object_type, fields = schema.fields().len(), "schema discovered");
        Ok(schema)
    }

    /// Install an already-built schema, e.g. one loaded from a fixture
    ///
    /// # Errors
    /// `SchemaDiscovery` if conditional rules cannot be folded in.
    pub fn register_schema(&self, schema: ObjectSchema) -> Result<Arc<ObjectSchema>> {
        self.install(schema)
    }

    /// Cached entry, without any remote call
    pub fn cached(&self, object_type: &str) -> Option<Arc<ObjectSchema>> {
        self.schemas.read().get(object_type).cloned()
    }

    /// Cached entry or an error when the type was never discovered
    ///
    /// # Errors
    /// `SchemaDiscovery` when `object_type` is not cached.
    pub fn schema(&self, object_type: &str) -> Result<Arc<ObjectSchema>> {
        self.cached(object_type).ok_or_else(|| SyncError::SchemaDiscovery {
            object_type: object_type.to_string(),
            message: "object type has not been discovered".to_string(),
        })
    }

    /// Drop the cached entry; the next `discover` describes again
    pub fn invalidate(&self, object_type: &str) {
        self.schemas.write().remove(object_type);
    }

    /// # Errors
    /// `UnknownField` if the field or the object type is unknown.
    pub fn get_field(&self, object_type: &str, name: &str) -> Result<FieldDefinition> {
        self.cached(object_type)
            .and_then(|schema| schema.field(name).cloned())
            .ok_or_else(|| SyncError::UnknownField {
                object_type: object_type.to_string(),
                field: name.to_string(),
            })
    }

    /// Names of the fields required for `record`, static or conditional
    ///
    /// # Errors
    /// `SchemaDiscovery` when `object_type` is not cached.
    pub fn required_field_names(&self, object_type: &str, record: &Record) -> Result<BTreeSet<String>> {
        let schema = self.schema(object_type)?;
        Ok(schema
            .fields()
            .iter()
            .filter(|field| field.is_required_for(record))
            .map(|field| field.name.clone())
            .collect())
    }

    /// Register a conditional-required rule for `field`
    ///
    /// Rules are folded into the definitions at discovery time. A cached
    /// entry is rebuilt immediately.
    pub fn require_when(&self, object_type: &str, field: &str, rule: RequiredWhen) {
        self.conditional
            .write()
            .entry(object_type.to_string())
            .or_default()
            .insert(field.to_string(), rule);

        if let Some(schema) = self.cached(object_type) {
            let rebuilt = ObjectSchema::new(object_type, schema.fields().to_vec())
                .and_then(|schema| self.install(schema));
            if let Err(err) = rebuilt {
                warn!(object_type, error = %err, "failed to apply conditional rule to cached schema");
            }
        }
    }

    fn install(&self, schema: ObjectSchema) -> Result<Arc<ObjectSchema>> {
        let object_type = schema.object_type.clone();
        let mut fields = schema.into_fields();

        if let Some(rules) = self.conditional.read().get(&object_type) {
            for (name, rule) in rules {
                match fields.iter_mut().find(|field| &field.name == name) {
                    Some(field) => field.required_when = Some(rule.clone()),
                    None => warn!(
                        object_type = %object_type,
                        field = %name,
                        "conditional rule names a field the schema does not have"
                    ),
                }
            }
        }

        let schema = Arc::new(ObjectSchema::new(object_type.clone(), fields)?);
        self.schemas.write().insert(object_type, schema.clone());
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use sfsync_domain::{field_equals, Chunk, FieldKind, Grant, QueryPage, RecordOutcome, TokenSet};

    use super::*;
    use crate::auth::TokenEndpoint;
    use crate::testing::{account_schema, NullStore};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(Arc::new(NullStore))
    }

    /// Describes slowly enough for callers to overlap, counting each call
    #[derive(Default)]
    struct SlowDescribe {
        describes: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for SlowDescribe {
        async fn describe(&self, _token: &TokenSet, _object_type: &str) -> Result<ObjectSchema> {
            self.describes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(account_schema())
        }

        async fn query(&self, token: &TokenSet, soql: &str) -> Result<QueryPage> {
            NullStore.query(token, soql).await
        }

        async fn query_more(&self, token: &TokenSet, locator: &str) -> Result<QueryPage> {
            NullStore.query_more(token, locator).await
        }

        async fn submit(&self, token: &TokenSet, chunk: &Chunk) -> Result<Vec<RecordOutcome>> {
            NullStore.submit(token, chunk).await
        }
    }

    struct StaticEndpoint;

    #[async_trait]
    impl TokenEndpoint for StaticEndpoint {
        async fn request_token(&self, _grant: &Grant) -> Result<TokenSet> {
            Ok(TokenSet::new("token", "https://na1.example.com"))
        }
    }

    async fn session() -> CredentialSession {
        let grant = Grant::Password {
            username: "ops@example.com".into(),
            password: "pw".into(),
            security_token: "tok".into(),
        };
        CredentialSession::connect(Arc::new(StaticEndpoint), grant).await.unwrap()
    }

    #[tokio::test]
    async fn concurrent_misses_describe_once() {
        let store = Arc::new(SlowDescribe::default());
        let registry = Arc::new(SchemaRegistry::new(store.clone()));
        let session = Arc::new(session().await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let session = session.clone();
                tokio::spawn(async move { registry.discover(&session, "Account", false).await })
            })
            .collect();
        let mut schemas = Vec::new();
        for handle in handles {
            schemas.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(store.describes.load(Ordering::SeqCst), 1);
        assert!(schemas.iter().all(|schema| Arc::ptr_eq(schema, &schemas[0])));
    }

    #[tokio::test]
    async fn forced_refresh_describes_again() {
        let store = Arc::new(SlowDescribe::default());
        let registry = SchemaRegistry::new(store.clone());
        let session = session().await;

        registry.discover(&session, "Account", false).await.unwrap();
        registry.discover(&session, "Account", false).await.unwrap();
        registry.discover(&session, "Account", true).await.unwrap();
        assert_eq!(store.describes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_type_and_field() {
        let registry = registry();
        assert!(matches!(registry.get_field("Account", "Name"), Err(SyncError::UnknownField { .. })));

        registry.register_schema(account_schema()).unwrap();
        assert_eq!(registry.get_field("Account", "Name").unwrap().kind, FieldKind::Text);
        assert!(matches!(
            registry.get_field("Account", "Nope__c"),
            Err(SyncError::UnknownField { .. })
        ));
    }

    #[test]
    fn conditional_rules_apply_before_and_after_discovery() {
        let registry = registry();
        registry.require_when("Account", "Phone", field_equals("Type", "Customer"));
        registry.register_schema(account_schema()).unwrap();

        let customer = Record::new().with("Type", "Customer");
        let required = registry.required_field_names("Account", &customer).unwrap();
        assert!(required.contains("Phone"));
        assert!(required.contains("Name"));

        registry.require_when("Account", "Website", field_equals("Type", "Partner"));
        let partner = Record::new().with("Type", "Partner");
        let required = registry.required_field_names("Account", &partner).unwrap();
        assert!(required.contains("Website"));
        assert!(!required.contains("Phone"));
    }

    #[test]
    fn invalidate_drops_entry() {
        let registry = registry();
        registry.register_schema(account_schema()).unwrap();
        registry.invalidate("Account");
        assert!(registry.cached("Account").is_none());
        assert!(matches!(registry.schema("Account"), Err(SyncError::SchemaDiscovery { .. })));
    }
}
