//! Azure OpenAI settings.
//!
//! Not used by the keyword classifier. Carried so that a model-backed
//! classifier can be configured from the same environment.

use std::fmt;

pub(crate) const DEFAULT_DEPLOYMENT: &str = "gpt-4-turbo";
pub(crate) const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

#[derive(Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: String,
    pub api_version: String,
}

impl OpenAiConfig {
    /// Endpoint and API key are both set.
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}
