//! Configuration for the Azure Copilot command interpreter.
//!
//! Settings come from environment variables, optionally backed by a `.env`
//! file. A [`Configuration`] is an immutable snapshot: it is validated once
//! when built and never changed afterwards. [`Configuration::reload`]
//! produces a new snapshot instead of mutating an existing one.
//!
//! # Variables
//!
//! - `AZURE_SUBSCRIPTION_ID` (required)
//! - `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`, `AZURE_TENANT_ID` (service principal, all or none)
//! - `DEFAULT_LOCATION` (default `eastus`), `DEFAULT_RESOURCE_GROUP` (default empty)
//! - `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_DEPLOYMENT`, `AZURE_OPENAI_API_VERSION`
//! - `LOG_LEVEL` (default `INFO`)
//! - `DEBUG`, `DEFAULT_DRY_RUN`, `SKIP_CONFIRMATIONS` (default false), `TRACK_TOKEN_USAGE` (default true)

pub mod log_level;
pub mod openai;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub use log_level::LogLevel;
pub use openai::OpenAiConfig;

/// Environment variable names.
pub mod vars {
    pub const SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
    pub const CLIENT_ID: &str = "AZURE_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
    pub const TENANT_ID: &str = "AZURE_TENANT_ID";
    pub const DEFAULT_LOCATION: &str = "DEFAULT_LOCATION";
    pub const DEFAULT_RESOURCE_GROUP: &str = "DEFAULT_RESOURCE_GROUP";
    pub const OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
    pub const OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
    pub const OPENAI_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";
    pub const OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const DEBUG: &str = "DEBUG";
    pub const DEFAULT_DRY_RUN: &str = "DEFAULT_DRY_RUN";
    pub const SKIP_CONFIRMATIONS: &str = "SKIP_CONFIRMATIONS";
    pub const TRACK_TOKEN_USAGE: &str = "TRACK_TOKEN_USAGE";
}

pub const DEFAULT_LOCATION: &str = "eastus";
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Validation failures. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error(
        "AZURE_SUBSCRIPTION_ID is required. Please set it in your .env file or environment variables.\n\
         Run 'az account show --query id -o tsv' to get your subscription ID."
    )]
    MissingSubscriptionId,

    #[error("Invalid LOG_LEVEL: {0}. Must be one of: DEBUG, INFO, WARNING, ERROR, CRITICAL")]
    InvalidLogLevel(String),
}

impl ConfigValidationError {
    /// Steps the operator can take to fix the problem.
    pub fn remediation(&self) -> Vec<String> {
        match self {
            ConfigValidationError::MissingSubscriptionId => vec![
                "Copy .env.example to .env:  cp .env.example .env".to_string(),
                "Run: az login".to_string(),
                "Run: az account show --query id -o tsv".to_string(),
                "Add the subscription ID to your .env file".to_string(),
            ],
            ConfigValidationError::InvalidLogLevel(_) => vec![format!(
                "Set LOG_LEVEL to one of: {}",
                LogLevel::accepted_values()
            )],
        }
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
}

/// How the backend collaborator should authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    ServicePrincipal,
    /// `DefaultAzureCredential`-style fallback to the Azure CLI login.
    AzureCli,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::ServicePrincipal => write!(f, "service_principal"),
            AuthMethod::AzureCli => write!(f, "azure_cli"),
        }
    }
}

/// Validated, read-only configuration snapshot.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    pub subscription_id: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
    pub default_location: String,
    pub default_resource_group: String,
    pub openai: OpenAiConfig,
    pub log_level: LogLevel,
    pub debug: bool,
    pub default_dry_run: bool,
    pub skip_confirmations: bool,
    pub track_token_usage: bool,
}

impl Configuration {
    /// Build a snapshot from an arbitrary key/value lookup.
    ///
    /// Empty optional values count as unset. Booleans are true only for a
    /// case-insensitive `true`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };

        let subscription_id = lookup(vars::SUBSCRIPTION_ID).unwrap_or_default();
        if subscription_id.trim().is_empty() {
            return Err(ConfigValidationError::MissingSubscriptionId);
        }

        let log_level = match lookup(vars::LOG_LEVEL) {
            Some(raw) => raw.parse::<LogLevel>()?,
            None => LogLevel::default(),
        };

        let mut openai = OpenAiConfig {
            endpoint: optional(vars::OPENAI_ENDPOINT),
            api_key: optional(vars::OPENAI_API_KEY),
            ..OpenAiConfig::default()
        };
        if let Some(deployment) = lookup(vars::OPENAI_DEPLOYMENT) {
            openai.deployment = deployment;
        }
        if let Some(api_version) = lookup(vars::OPENAI_API_VERSION) {
            openai.api_version = api_version;
        }

        Ok(Self {
            subscription_id,
            client_id: optional(vars::CLIENT_ID),
            client_secret: optional(vars::CLIENT_SECRET),
            tenant_id: optional(vars::TENANT_ID),
            default_location: lookup(vars::DEFAULT_LOCATION)
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            default_resource_group: lookup(vars::DEFAULT_RESOURCE_GROUP).unwrap_or_default(),
            openai,
            log_level,
            debug: flag(vars::DEBUG, false),
            default_dry_run: flag(vars::DEFAULT_DRY_RUN, false),
            skip_confirmations: flag(vars::SKIP_CONFIRMATIONS, false),
            track_token_usage: flag(vars::TRACK_TOKEN_USAGE, true),
        })
    }

    /// Build a snapshot from the process environment only.
    pub fn from_env() -> Result<Self, ConfigValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from the environment, falling back to an env file for unset
    /// variables.
    ///
    /// With `None`, `./.env` is used when it exists. An explicitly named
    /// file must exist.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = read_env_file(env_file)?;
        if file.is_empty() {
            return Ok(Self::from_env()?);
        }
        let config = Self::from_layers(&file, |key| std::env::var(key).ok(), Precedence::Environment)?;
        Ok(config)
    }

    /// Re-read configuration into a fresh snapshot.
    ///
    /// Unlike [`Configuration::load`], values in the env file take
    /// precedence over the process environment, so edits to the file are
    /// picked up by a running process.
    pub fn reload(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = read_env_file(env_file)?;
        let config = Self::from_layers(&file, |key| std::env::var(key).ok(), Precedence::EnvFile)?;
        Ok(config)
    }

    fn from_layers<F>(
        file: &HashMap<String, String>,
        env: F,
        precedence: Precedence,
    ) -> Result<Self, ConfigValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| match precedence {
            Precedence::Environment => env(key).or_else(|| file.get(key).cloned()),
            Precedence::EnvFile => file.get(key).cloned().or_else(|| env(key)),
        })
    }

    /// Client id, secret and tenant id are all present.
    pub fn is_service_principal_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.tenant_id.is_some()
    }

    pub fn is_openai_configured(&self) -> bool {
        self.openai.is_configured()
    }

    /// A partial service principal falls back to the Azure CLI login.
    pub fn authentication_method(&self) -> AuthMethod {
        if self.is_service_principal_configured() {
            AuthMethod::ServicePrincipal
        } else {
            AuthMethod::AzureCli
        }
    }

    /// Subscription id reduced to its last four characters.
    pub fn masked_subscription_id(&self) -> String {
        if self.subscription_id.is_empty() {
            return "NOT SET".to_string();
        }
        let chars: Vec<char> = self.subscription_id.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("***{tail}")
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config(subscription_id={}, auth_method={}, default_location={}, log_level={})",
            self.masked_subscription_id(),
            self.authentication_method(),
            self.default_location,
            self.log_level
        )
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("subscription_id", &self.masked_subscription_id())
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("tenant_id", &self.tenant_id)
            .field("default_location", &self.default_location)
            .field("default_resource_group", &self.default_resource_group)
            .field("openai", &self.openai)
            .field("log_level", &self.log_level)
            .field("debug", &self.debug)
            .field("default_dry_run", &self.default_dry_run)
            .field("skip_confirmations", &self.skip_confirmations)
            .field("track_token_usage", &self.track_token_usage)
            .finish()
    }
}

/// Parse an env file into a map without touching the process environment.
/// Which layer wins when a variable is set in both.
#[derive(Debug, Clone, Copy)]
enum Precedence {
    Environment,
    EnvFile,
}

fn read_env_file(path: Option<&Path>) -> Result<HashMap<String, String>, ConfigError> {
    let path = match path {
        Some(path) => path,
        None => {
            let default = Path::new(DEFAULT_ENV_FILE);
            if !default.is_file() {
                return Ok(HashMap::new());
            }
            default
        }
    };

    let mut values = HashMap::new();
    for entry in dotenvy::from_path_iter(path)? {
        let (key, value) = entry?;
        values.insert(key, value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_subscription_is_set() {
        let config =
            Configuration::from_lookup(lookup_from(&[(vars::SUBSCRIPTION_ID, "sub-1234")]))
                .unwrap();

        assert_eq!(config.default_location, "eastus");
        assert_eq!(config.default_resource_group, "");
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.debug);
        assert!(!config.default_dry_run);
        assert!(!config.skip_confirmations);
        assert!(config.track_token_usage);
        assert_eq!(config.openai.deployment, "gpt-4-turbo");
        assert_eq!(config.openai.api_version, "2024-02-15-preview");
        assert_eq!(config.authentication_method(), AuthMethod::AzureCli);
    }

    #[test]
    fn missing_subscription_fails_with_remediation() {
        let err = Configuration::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigValidationError::MissingSubscriptionId);
        assert!(err.to_string().contains("az account show"));
        assert!(err.remediation().iter().any(|step| step.contains("az login")));
    }

    #[test]
    fn empty_subscription_counts_as_missing() {
        let err =
            Configuration::from_lookup(lookup_from(&[(vars::SUBSCRIPTION_ID, "")])).unwrap_err();
        assert_eq!(err, ConfigValidationError::MissingSubscriptionId);
    }

    #[test]
    fn log_level_is_normalized_to_upper_case() {
        let config = Configuration::from_lookup(lookup_from(&[
            (vars::SUBSCRIPTION_ID, "sub"),
            (vars::LOG_LEVEL, "debug"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_level.to_string(), "DEBUG");
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let err = Configuration::from_lookup(lookup_from(&[
            (vars::SUBSCRIPTION_ID, "sub"),
            (vars::LOG_LEVEL, "TRACE"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigValidationError::InvalidLogLevel("TRACE".into()));
    }

    #[test]
    fn booleans_only_accept_literal_true() {
        let config = Configuration::from_lookup(lookup_from(&[
            (vars::SUBSCRIPTION_ID, "sub"),
            (vars::DEBUG, "TRUE"),
            (vars::DEFAULT_DRY_RUN, "yes"),
            (vars::SKIP_CONFIRMATIONS, "True"),
            (vars::TRACK_TOKEN_USAGE, "false"),
        ]))
        .unwrap();
        assert!(config.debug);
        assert!(!config.default_dry_run);
        assert!(config.skip_confirmations);
        assert!(!config.track_token_usage);
    }

    #[test]
    fn service_principal_requires_all_three_values() {
        let partial = Configuration::from_lookup(lookup_from(&[
            (vars::SUBSCRIPTION_ID, "sub"),
            (vars::CLIENT_ID, "client"),
            (vars::TENANT_ID, "tenant"),
        ]))
        .unwrap();
        assert!(!partial.is_service_principal_configured());
        assert_eq!(partial.authentication_method(), AuthMethod::AzureCli);

        let full = Configuration::from_lookup(lookup_from(&[
            (vars::SUBSCRIPTION_ID, "sub"),
            (vars::CLIENT_ID, "client"),
            (vars::CLIENT_SECRET, "secret"),
            (vars::TENANT_ID, "tenant"),
        ]))
        .unwrap();
        assert_eq!(full.authentication_method(), AuthMethod::ServicePrincipal);
    }

    #[test]
    fn openai_needs_endpoint_and_key() {
        let config = Configuration::from_lookup(lookup_from(&[
            (vars::SUBSCRIPTION_ID, "sub"),
            (vars::OPENAI_ENDPOINT, "https://example.openai.azure.com"),
        ]))
        .unwrap();
        assert!(!config.is_openai_configured());
    }

    #[test]
    fn display_masks_subscription_and_hides_secrets() {
        let config = Configuration::from_lookup(lookup_from(&[
            (vars::SUBSCRIPTION_ID, "00000000-1111-2222-3333-444455556666"),
            (vars::CLIENT_SECRET, "hunter2"),
        ]))
        .unwrap();

        assert_eq!(
            config.to_string(),
            "Config(subscription_id=***6666, auth_method=azure_cli, default_location=eastus, log_level=INFO)"
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("00000000-1111"));
    }

    #[test]
    fn env_file_fills_unset_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "AZCOPILOT_TEST_ONLY_SUB=from-file").unwrap();
        writeln!(file, "DEFAULT_LOCATION=westeurope").unwrap();

        let values = read_env_file(Some(file.path())).unwrap();
        assert_eq!(values.get("AZCOPILOT_TEST_ONLY_SUB").map(String::as_str), Some("from-file"));
        assert_eq!(values.get("DEFAULT_LOCATION").map(String::as_str), Some("westeurope"));
    }

    #[test]
    fn environment_wins_on_load_and_file_wins_on_reload() {
        let file: HashMap<String, String> = [
            (vars::SUBSCRIPTION_ID, "file-sub-0001"),
            (vars::DEFAULT_LOCATION, "westeurope"),
            (vars::DEFAULT_RESOURCE_GROUP, "from-file"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let env = lookup_from(&[
            (vars::SUBSCRIPTION_ID, "env-sub-0002"),
            (vars::DEFAULT_LOCATION, "uksouth"),
        ]);

        let loaded = Configuration::from_layers(&file, &env, Precedence::Environment).unwrap();
        assert_eq!(loaded.subscription_id, "env-sub-0002");
        assert_eq!(loaded.default_location, "uksouth");
        assert_eq!(loaded.default_resource_group, "from-file");

        let reloaded = Configuration::from_layers(&file, &env, Precedence::EnvFile).unwrap();
        assert_eq!(reloaded.subscription_id, "file-sub-0001");
        assert_eq!(reloaded.default_location, "westeurope");
        assert_eq!(reloaded.default_resource_group, "from-file");
    }

    #[test]
    fn explicit_env_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.env");
        assert!(matches!(
            Configuration::load(Some(&missing)),
            Err(ConfigError::EnvFile(_))
        ));
    }

    #[test]
    fn reload_returns_a_new_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "AZURE_SUBSCRIPTION_ID=reloaded-sub-9999").unwrap();
        writeln!(file, "DEFAULT_LOCATION=northeurope").unwrap();

        let reloaded = Configuration::reload(Some(file.path())).unwrap();
        assert_eq!(reloaded.subscription_id, "reloaded-sub-9999");
        assert_eq!(reloaded.default_location, "northeurope");
    }
}
