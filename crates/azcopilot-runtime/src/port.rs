use async_trait::async_trait;
use azcopilot_core::{ResourceDescriptor, Slots, slot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Narrows a resource listing. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub resource_group: Option<String>,
    pub resource_type: Option<String>,
}

impl ResourceFilter {
    pub fn from_parameters(parameters: &Slots) -> Self {
        Self {
            resource_group: parameters.get(slot::RESOURCE_GROUP).cloned(),
            resource_type: parameters.get(slot::RESOURCE_TYPE).cloned(),
        }
    }

    /// Case-insensitive, as ARM names and types are.
    pub fn matches(&self, resource: &ResourceDescriptor) -> bool {
        let group_ok = self
            .resource_group
            .as_deref()
            .is_none_or(|g| g.eq_ignore_ascii_case(&resource.resource_group));
        let type_ok = self
            .resource_type
            .as_deref()
            .is_none_or(|t| t.eq_ignore_ascii_case(&resource.resource_type));
        group_ok && type_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResourceParams {
    pub resource_type: String,
    pub name: String,
    pub location: String,
    pub resource_group: Option<String>,
}

impl CreateResourceParams {
    /// Fails with the name of the first missing required parameter.
    pub fn from_parameters(parameters: &Slots) -> Result<Self, &'static str> {
        let required = |key: &'static str| {
            parameters
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or(key)
        };
        Ok(Self {
            resource_type: required(slot::RESOURCE_TYPE)?,
            name: required(slot::NAME)?,
            location: required(slot::LOCATION)?,
            resource_group: parameters.get(slot::RESOURCE_GROUP).cloned(),
        })
    }
}

/// Machine-readable category of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    Throttled,
    InvalidRequest,
    Unavailable,
    Internal,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendErrorKind::NotFound => write!(f, "not_found"),
            BackendErrorKind::Conflict => write!(f, "conflict"),
            BackendErrorKind::Unauthorized => write!(f, "unauthorized"),
            BackendErrorKind::Throttled => write!(f, "throttled"),
            BackendErrorKind::InvalidRequest => write!(f, "invalid_request"),
            BackendErrorKind::Unavailable => write!(f, "unavailable"),
            BackendErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Failure reported by the backend. Displays as the human message only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Conflict, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Internal, message)
    }
}

/// Boundary to whatever performs real infrastructure operations.
///
/// Retries, throttling and authentication belong behind this trait.
#[async_trait]
pub trait AzureOperationsPort: Send + Sync {
    async fn list_resources(
        &self,
        filter: &ResourceFilter,
    ) -> Result<Vec<ResourceDescriptor>, BackendError>;

    async fn create_resource(
        &self,
        params: &CreateResourceParams,
    ) -> Result<ResourceDescriptor, BackendError>;

    async fn delete_resource(&self, id: &str) -> Result<(), BackendError>;
}
