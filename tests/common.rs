//! Shared fixtures for the integration tests

#![allow(dead_code)]

use docauth::config::HasherConfig;
use docauth::db_operations::{DocumentStore, SledStore, ViewDefinition};
use docauth::logging::{init_logging, LoggingConfig};
use docauth::{AuthConfig, AuthError, AuthResult, AuthSource};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, Once};
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Install a debug logger once per test binary
pub fn init_test_logging() {
    INIT.call_once(|| {
        init_logging(&LoggingConfig {
            filter: "docauth=debug".to_string(),
            include_timestamp: false,
            include_module: true,
        });
    });
}

/// Configuration with cheap hashing for tests
pub fn test_config() -> AuthConfig {
    AuthConfig {
        hasher: HasherConfig::fast(),
        ..Default::default()
    }
}

/// A source backed by a sled database in a temporary directory
pub struct TestFixture {
    pub source: AuthSource,
    pub store: Arc<SledStore>,
    pub _temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AuthConfig) -> Self {
        init_test_logging();
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db = sled::Config::new()
            .path(temp_dir.path())
            .temporary(true)
            .open()
            .expect("Failed to open temporary database");
        let store = Arc::new(SledStore::new(db).expect("Failed to create SledStore"));
        let source = AuthSource::with_store(store.clone(), &config)
            .expect("Failed to create AuthSource");

        Self {
            source,
            store,
            _temp_dir: temp_dir,
        }
    }

    pub fn add_users(&self, names: &[&str]) {
        for name in names {
            self.source
                .register_user(name, "password")
                .expect("Failed to register user");
        }
    }

    pub fn add_groups(&self, names: &[&str]) {
        for name in names {
            self.source
                .assignment()
                .save_item(&docauth::Group::new(*name))
                .expect("Failed to save group");
        }
    }

    pub fn add_permissions(&self, names: &[&str]) {
        use docauth::SourceAdapter;
        for name in names {
            self.source
                .assignment()
                .create_section(name)
                .expect("Failed to create permission");
        }
    }
}

pub fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Store wrapper that rejects saves of documents with selected names
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    name_field: String,
    failing: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn DocumentStore>, name_field: &str) -> Self {
        Self {
            inner,
            name_field: name_field.to_string(),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn rejects(&self, doc: &Value) -> bool {
        doc.get(&self.name_field)
            .and_then(Value::as_str)
            .map(|name| self.failing.lock().unwrap().contains(name))
            .unwrap_or(false)
    }
}

impl DocumentStore for FlakyStore {
    fn define_view(&self, view: ViewDefinition) -> AuthResult<()> {
        self.inner.define_view(view)
    }

    fn query(&self, view: &str, key: &str) -> AuthResult<Vec<Value>> {
        self.inner.query(view, key)
    }

    fn scan(&self, view: &str) -> AuthResult<Vec<Value>> {
        self.inner.scan(view)
    }

    fn save(&self, doc: Value) -> AuthResult<Value> {
        if self.rejects(&doc) {
            return Err(AuthError::Store("injected write failure".to_string()));
        }
        self.inner.save(doc)
    }

    fn delete(&self, doc: &Value) -> AuthResult<()> {
        self.inner.delete(doc)
    }
}
