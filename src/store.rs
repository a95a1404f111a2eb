//! Object storage layer.
//!
//! Every entity is one JSON document at `<prefix>/<id>.json` inside a bucket.
//! [`ObjectStore`] is the raw byte-level interface with an S3 implementation
//! for production and an in-memory implementation for tests; [`Bucket`] layers
//! JSON (de)serialization and key construction on top.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region},
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
};
use futures::future::try_join_all;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::config::StorageSettings;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),

    #[error("invalid object {key}: {detail}")]
    Corrupt { key: String, detail: String },
}

/// Minimal byte-level surface of an S3-style store. No retries: every call is
/// single-attempt and its failure is terminal for the current request.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` for a missing key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Idempotent: deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All keys under `prefix`, in the store's native enumeration order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn open(settings: &StorageSettings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            None,
            None,
            "config",
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials);

        // Non-AWS endpoints (MinIO and friends) want path-style addressing.
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        }
    }
}

fn sdk_detail<E>(err: E) -> String
where
    E: std::error::Error,
{
    DisplayErrorContext(err).to_string()
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?
                    .into_bytes();
                Ok(Some(bytes.to_vec()))
            }
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_no_such_key() => Ok(None),
            Err(err) => Err(StoreError::Backend(sdk_detail(err))),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| StoreError::Backend(sdk_detail(err)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        // S3 reports success for absent keys, which gives us idempotency for
        // free.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StoreError::Backend(sdk_detail(err)))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = &token {
                request = request.continuation_token(token);
            }

            let output = request
                .send()
                .await
                .map_err(|err| StoreError::Backend(sdk_detail(err)))?;

            for object in output.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            token = output.next_continuation_token().map(str::to_string);
            if token.is_none() {
                break;
            }
        }

        Ok(keys)
    }
}

/// In-memory store used by the test suite. Keys enumerate in lexicographic
/// order, which is close enough to S3's behavior for our purposes.
#[derive(Default, Clone)]
pub struct MemoryStore {
    objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let objects = self.objects.lock().unwrap();
        Ok(objects.get(key).cloned())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().unwrap();
        objects.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().unwrap();
        objects.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Strips leading/trailing slashes so `"/places/"`, `"places/"` and `"places"`
/// all address the same namespace.
pub fn normalize_prefix(raw: &str) -> String {
    raw.trim_matches('/').to_string()
}

/// JSON-document gateway over one prefix namespace of an [`ObjectStore`].
#[derive(Clone)]
pub struct Bucket {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl Bucket {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &str) -> Self {
        Self {
            store,
            prefix: normalize_prefix(prefix),
        }
    }

    fn key(&self, id: &str) -> String {
        if self.prefix.is_empty() {
            format!("{id}.json")
        } else {
            format!("{}/{id}.json", self.prefix)
        }
    }

    fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, StoreError> {
        let key = self.key(id);
        match self.store.get(&key).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                    key,
                    detail: e.to_string(),
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn put<T: Serialize>(&self, id: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.store.put(&self.key(id), bytes).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(&self.key(id)).await
    }

    /// Fetches every `.json` object under the prefix concurrently. One failed
    /// fetch fails the whole listing.
    pub async fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let keys = self.store.list(&self.list_prefix()).await?;
        let fetches = keys
            .into_iter()
            .filter(|key| key.ends_with(".json"))
            .map(|key| self.fetch(key));
        try_join_all(fetches).await
    }

    async fn fetch<T: DeserializeOwned>(&self, key: String) -> Result<T, StoreError> {
        let bytes = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("object {key} vanished during listing")))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            key,
            detail: e.to_string(),
        })
    }
}
