//! `azcopilot --show-config`.

use azcopilot_core::Configuration;
use std::io::{self, Write};

const UNSET: &str = "(not set)";

/// Print the configuration. Secrets are masked unless `unmasked` is set.
pub fn show_config(config: &Configuration, unmasked: bool, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{config}")?;
    writeln!(out)?;

    let secret = |value: &Option<String>| match (value, unmasked) {
        (None, _) => UNSET.to_string(),
        (Some(v), true) => v.clone(),
        (Some(_), false) => "********".to_string(),
    };
    let plain = |value: &Option<String>| value.clone().unwrap_or_else(|| UNSET.to_string());
    let subscription_id = if unmasked {
        config.subscription_id.clone()
    } else {
        config.masked_subscription_id()
    };
    let resource_group = if config.default_resource_group.is_empty() {
        UNSET.to_string()
    } else {
        config.default_resource_group.clone()
    };

    let rows = [
        ("subscription_id", subscription_id),
        ("auth_method", config.authentication_method().to_string()),
        ("client_id", plain(&config.client_id)),
        ("client_secret", secret(&config.client_secret)),
        ("tenant_id", plain(&config.tenant_id)),
        ("default_location", config.default_location.clone()),
        ("default_resource_group", resource_group),
        ("openai_endpoint", plain(&config.openai.endpoint)),
        ("openai_api_key", secret(&config.openai.api_key)),
        ("openai_deployment", config.openai.deployment.clone()),
        ("openai_api_version", config.openai.api_version.clone()),
        ("log_level", config.log_level.to_string()),
        ("debug", config.debug.to_string()),
        ("default_dry_run", config.default_dry_run.to_string()),
        ("skip_confirmations", config.skip_confirmations.to_string()),
        ("track_token_usage", config.track_token_usage.to_string()),
    ];

    for (key, value) in rows {
        writeln!(out, "  {key:<24}{value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use azcopilot_core::config::vars;

    fn config() -> Configuration {
        Configuration::from_lookup(|key| {
            let value = match key {
                vars::SUBSCRIPTION_ID => "11111111-2222-3333-4444-555555556666",
                vars::CLIENT_ID => "client",
                vars::CLIENT_SECRET => "s3cret",
                vars::TENANT_ID => "tenant",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap()
    }

    fn render(unmasked: bool) -> String {
        let mut out = Vec::new();
        show_config(&config(), unmasked, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn masked_by_default() {
        let text = render(false);
        assert!(text.starts_with("Config(subscription_id=***6666, auth_method=service_principal"));
        assert!(!text.contains("s3cret"));
        assert!(!text.contains("11111111-2222"));
        assert!(text.contains("default_resource_group  (not set)"));
    }

    #[test]
    fn unmasked_shows_raw_values() {
        let text = render(true);
        assert!(text.contains("s3cret"));
        assert!(text.contains("11111111-2222-3333-4444-555555556666"));
    }
}
