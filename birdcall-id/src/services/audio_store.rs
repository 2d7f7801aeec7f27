//! Durable audio storage
//!
//! Wraps an `object_store` backend (Azure Blob in production, local
//! filesystem or memory elsewhere) behind the [`AudioStore`] trait. Every
//! upload gets a fresh opaque object name, so concurrent uploads never
//! collide even with identical original filenames.

use async_trait::async_trait;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};
use std::path::Path;
use std::sync::Arc;

use birdcall_common::ids;

use crate::models::AudioSubmission;
use crate::types::{AudioStore, StorageError};

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Parsed Azure storage connection string
///
/// Only shared-key strings are understood:
/// `DefaultEndpointsProtocol=https;AccountName=..;AccountKey=..;EndpointSuffix=..`
/// with an optional `BlobEndpoint` override (emulators).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConnection {
    pub account: String,
    pub access_key: String,
    pub protocol: String,
    pub endpoint_suffix: String,
    pub blob_endpoint: Option<String>,
}

impl AzureConnection {
    pub fn parse(connection_string: &str) -> Result<Self, StorageError> {
        let mut account = None;
        let mut access_key = None;
        let mut protocol = None;
        let mut endpoint_suffix = None;
        let mut blob_endpoint = None;

        for pair in connection_string.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // Keys are base64 and may end in '='
            let Some((key, value)) = pair.split_once('=') else {
                return Err(StorageError::Config(format!(
                    "malformed connection string segment '{}'",
                    key_only(pair)
                )));
            };
            let value = value.trim().to_string();
            match key.trim() {
                "AccountName" => account = Some(value),
                "AccountKey" => access_key = Some(value),
                "DefaultEndpointsProtocol" => protocol = Some(value),
                "EndpointSuffix" => endpoint_suffix = Some(value),
                "BlobEndpoint" => blob_endpoint = Some(value),
                other => tracing::debug!(key = other, "Ignoring connection string setting"),
            }
        }

        let account = account
            .filter(|a| !a.is_empty())
            .ok_or_else(|| StorageError::Config("AccountName missing from connection string".into()))?;
        let access_key = access_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StorageError::Config("AccountKey missing from connection string".into()))?;

        Ok(Self {
            account,
            access_key,
            protocol: protocol.unwrap_or_else(|| DEFAULT_PROTOCOL.to_string()),
            endpoint_suffix: endpoint_suffix.unwrap_or_else(|| DEFAULT_ENDPOINT_SUFFIX.to_string()),
            blob_endpoint,
        })
    }

    /// Public base URL of the blob service
    pub fn blob_service_url(&self) -> String {
        match &self.blob_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!(
                "{}://{}.blob.{}",
                self.protocol, self.account, self.endpoint_suffix
            ),
        }
    }

    /// Public base URL of a container
    pub fn container_url(&self, container: &str) -> String {
        format!("{}/{}", self.blob_service_url(), container)
    }
}

/// Never echo a credential back into an error message
fn key_only(pair: &str) -> &str {
    pair.split('=').next().unwrap_or_default()
}

/// [`AudioStore`] over any `object_store` backend
pub struct ObjectAudioStore {
    store: Arc<dyn ObjectStore>,
    base_url: String,
    /// Whether the backend accepts a content-type attribute on put
    content_type_attribute: bool,
}

impl ObjectAudioStore {
    pub fn new(store: Arc<dyn ObjectStore>, base_url: impl Into<String>, content_type_attribute: bool) -> Self {
        Self {
            store,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            content_type_attribute,
        }
    }

    /// Azure Blob container addressed by a shared-key connection string
    ///
    /// The container must already exist.
    pub fn azure(connection_string: &str, container: &str) -> Result<Self, StorageError> {
        let connection = AzureConnection::parse(connection_string)?;

        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(&connection.account)
            .with_access_key(&connection.access_key)
            .with_container_name(container);
        if let Some(endpoint) = &connection.blob_endpoint {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(endpoint.starts_with("http://"));
        }
        let store = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let base_url = connection.container_url(container);
        tracing::info!(account = %connection.account, container, url = %base_url, "Azure audio storage configured");

        Ok(Self::new(Arc::new(store), base_url, true))
    }

    /// Directory on the local filesystem, created if missing
    pub fn local(root: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root)
            .map_err(|e| StorageError::Config(format!("{}: {}", root.display(), e)))?;
        let root = std::fs::canonicalize(root)
            .map_err(|e| StorageError::Config(format!("{}: {}", root.display(), e)))?;

        let store = LocalFileSystem::new_with_prefix(&root)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let base_url = format!("file://{}", root.display());
        tracing::info!(path = %root.display(), "Local audio storage configured");

        Ok(Self::new(Arc::new(store), base_url, false))
    }

    /// Process-local store (tests and demos)
    pub fn in_memory(base_url: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), base_url, true)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Object name for a URL previously returned by [`AudioStore::upload`]
    fn object_name<'a>(&self, url: &'a str) -> Result<&'a str, StorageError> {
        url.strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))
    }
}

#[async_trait]
impl AudioStore for ObjectAudioStore {
    async fn upload(&self, submission: &AudioSubmission) -> Result<String, StorageError> {
        let name = ids::object_name(&submission.filename);
        let location = ObjectPath::from(name.as_str());

        let mut options = PutOptions::default();
        if self.content_type_attribute {
            let mut attributes = Attributes::new();
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(submission.content_type.clone()),
            );
            options.attributes = attributes;
        }

        self.store
            .put_opts(&location, PutPayload::from(submission.payload.clone()), options)
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        let url = self.object_url(location.as_ref());
        tracing::info!(
            object = %location,
            bytes = submission.payload.len(),
            content_type = %submission.content_type,
            "Audio stored"
        );
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let name = self.object_name(url)?;
        self.store
            .delete(&ObjectPath::from(name))
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        tracing::info!(object = %name, "Audio deleted");
        Ok(())
    }
}
