//! Fjärrlagring av hela dokumentet
//!
//! `GET` hämtar senaste dokumentet, `POST` ersätter det. Ingen omförsök.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::models::RemoteDocument;
use crate::utils::SyncError;

/// Fjärrlagringen bakom synkmotorn (utbytbar i tester)
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Hämta dokumentet som rå JSON. Tolkningen per samling görs av anroparen.
    async fn fetch(&self) -> Result<Value, SyncError>;

    /// Ersätt hela dokumentet
    async fn store(&self, doc: &RemoteDocument) -> Result<(), SyncError>;
}

pub struct HttpRemoteStore {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpRemoteStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("youthroll/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.into(),
            http_client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self) -> Result<Value, SyncError> {
        // Cache-bust så att mellanliggande proxies inte svarar med gammalt dokument
        let stamp = chrono::Utc::now().timestamp_millis().to_string();
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("t", stamp)])
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Status(response.status().as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SyncError::Malformed(e.to_string()))
    }

    async fn store(&self, doc: &RemoteDocument) -> Result<(), SyncError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(doc)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Fjärrlagring i minnet, ersätter servern i tester av synkflödet
pub struct InMemoryRemoteStore {
    document: Mutex<Value>,
    offline: AtomicBool,
    pushes: AtomicUsize,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteStore {
    /// Tomt dokument med standardkonfiguration, som en ny server
    pub fn new() -> Self {
        let empty = serde_json::to_value(RemoteDocument::empty(String::new())).unwrap_or(Value::Null);
        Self::with_document(empty)
    }

    pub fn with_document(document: Value) -> Self {
        Self {
            document: Mutex::new(document),
            offline: AtomicBool::new(false),
            pushes: AtomicUsize::new(0),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_document(&self, document: Value) {
        if let Ok(mut current) = self.document.lock() {
            *current = document;
        }
    }

    pub fn document(&self) -> Value {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .unwrap_or(Value::Null)
    }

    /// Antal lyckade push
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), SyncError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Network("offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch(&self) -> Result<Value, SyncError> {
        self.check_online()?;
        Ok(self.document())
    }

    async fn store(&self, doc: &RemoteDocument) -> Result<(), SyncError> {
        self.check_online()?;
        let value = serde_json::to_value(doc).map_err(|e| SyncError::Malformed(e.to_string()))?;
        self.set_document(value);
        self.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
