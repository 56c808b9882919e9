//! In-memory sandbox backend.
//!
//! Holds resource descriptors in a map keyed by lower-cased ARM id. Used by
//! the CLI in place of real Azure calls and by tests as a backend double.

use crate::port::{AzureOperationsPort, BackendError, CreateResourceParams, ResourceFilter};
use async_trait::async_trait;
use azcopilot_core::{RESOURCE_GROUP_TYPE, ResourceDescriptor, arm_resource_id};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

/// Errors loading an inventory file.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported inventory extension '{0}' (use .json, .yaml or .yml)")]
    UnsupportedFormat(String),
}

/// One inventory entry. The id is derived when omitted.
#[derive(Debug, Deserialize)]
struct InventoryEntry {
    #[serde(default)]
    id: Option<String>,
    name: String,
    resource_type: String,
    location: String,
    #[serde(default)]
    resource_group: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

pub struct InMemoryBackend {
    subscription_id: String,
    resources: RwLock<BTreeMap<String, ResourceDescriptor>>,
}

impl InMemoryBackend {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resources: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_resources(
        subscription_id: impl Into<String>,
        resources: impl IntoIterator<Item = ResourceDescriptor>,
    ) -> Self {
        let map = resources
            .into_iter()
            .map(|r| (r.id.to_ascii_lowercase(), r))
            .collect();
        Self {
            subscription_id: subscription_id.into(),
            resources: RwLock::new(map),
        }
    }

    /// Seed from a JSON or YAML list of resources.
    pub fn from_inventory_file(
        subscription_id: impl Into<String>,
        path: &Path,
    ) -> Result<Self, InventoryError> {
        let subscription_id = subscription_id.into();
        let content = fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        let entries: Vec<InventoryEntry> = match ext.as_str() {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            other => return Err(InventoryError::UnsupportedFormat(other.to_string())),
        };

        let resources = entries.into_iter().map(|entry| ResourceDescriptor {
            id: entry.id.unwrap_or_else(|| {
                arm_resource_id(
                    &subscription_id,
                    &entry.resource_group,
                    &entry.resource_type,
                    &entry.name,
                )
            }),
            name: entry.name,
            resource_type: entry.resource_type,
            location: entry.location,
            resource_group: entry.resource_group,
            tags: entry.tags,
        });
        let backend = Self::with_resources(subscription_id.clone(), resources);
        tracing::debug!(count = backend.len(), "loaded inventory");
        Ok(backend)
    }

    /// Current contents, ordered by id.
    pub fn snapshot(&self) -> Vec<ResourceDescriptor> {
        self.resources
            .read()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.resources.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AzureOperationsPort for InMemoryBackend {
    async fn list_resources(
        &self,
        filter: &ResourceFilter,
    ) -> Result<Vec<ResourceDescriptor>, BackendError> {
        let resources = self.resources.read().map_err(|e| {
            BackendError::internal(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(resources
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn create_resource(
        &self,
        params: &CreateResourceParams,
    ) -> Result<ResourceDescriptor, BackendError> {
        let is_group = params.resource_type.eq_ignore_ascii_case(RESOURCE_GROUP_TYPE);
        let group = match (&params.resource_group, is_group) {
            (_, true) => params.name.clone(),
            (Some(group), false) => group.clone(),
            (None, false) => {
                return Err(BackendError::invalid_request(format!(
                    "a resource group is required to create {}",
                    params.resource_type
                )));
            }
        };

        let id = arm_resource_id(&self.subscription_id, &group, &params.resource_type, &params.name);
        let mut resources = self.resources.write().map_err(|e| {
            BackendError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        let key = id.to_ascii_lowercase();
        if resources.contains_key(&key) {
            return Err(BackendError::conflict(format!("resource '{id}' already exists")));
        }

        let descriptor = ResourceDescriptor {
            id,
            name: params.name.clone(),
            resource_type: params.resource_type.clone(),
            location: params.location.clone(),
            resource_group: group,
            tags: BTreeMap::new(),
        };
        resources.insert(key, descriptor.clone());
        Ok(descriptor)
    }

    async fn delete_resource(&self, id: &str) -> Result<(), BackendError> {
        let mut resources = self.resources.write().map_err(|e| {
            BackendError::internal(format!("Failed to acquire write lock: {}", e))
        })?;
        resources
            .remove(&id.to_ascii_lowercase())
            .map(|_| ())
            .ok_or_else(|| BackendError::not_found(format!("resource '{id}' not found")))
    }
}
