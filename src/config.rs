//! User settings and API key storage.
//!
//! Settings live in `<config dir>/tuneplan/config.toml`; a missing file means
//! defaults. API keys are never written to the settings file: they come from
//! the provider's environment variable or the OS keychain.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::enhancer::{default_model, SUPPORTED_PROVIDERS};
use crate::error::{Result, TuneplanError};

const KEYRING_USER: &str = "tuneplan";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Replacement catalog TOML; the embedded catalog is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<PathBuf>,
    pub enhancer: EnhancerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerSettings {
    pub enabled: bool,
    pub provider: String,
    /// Provider default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EnhancerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "claude".to_string(),
            model: None,
            timeout_secs: 60,
        }
    }
}

impl EnhancerSettings {
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| default_model(&self.provider).to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `<config dir>/tuneplan/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tuneplan").join("config.toml"))
}

/// Load settings from `path`, or defaults when the file does not exist.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        info!("No settings file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        TuneplanError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let settings: Settings = toml::from_str(&content).map_err(|e| {
        TuneplanError::Config(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    if !SUPPORTED_PROVIDERS.contains(&settings.enhancer.provider.as_str()) {
        return Err(TuneplanError::Config(format!(
            "Unknown enhancer provider '{}'. Supported: {}",
            settings.enhancer.provider,
            SUPPORTED_PROVIDERS.join(", ")
        )));
    }
    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings from the explicit path, else the default location.
pub fn load_settings_or_default(path: Option<&Path>) -> Result<Settings> {
    match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => load_settings(&path),
        None => {
            warn!("No config directory available, using default settings");
            Ok(Settings::default())
        }
    }
}

// =============================================================================
// API KEYS
// =============================================================================

pub fn api_key_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "claude" => Some("ANTHROPIC_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "gemini" => Some("GOOGLE_API_KEY"),
        _ => None,
    }
}

fn keyring_service(provider: &str) -> Result<String> {
    if SUPPORTED_PROVIDERS.contains(&provider) {
        Ok(format!("tuneplan-{}-api", provider))
    } else {
        Err(TuneplanError::Keychain(format!(
            "Unknown AI provider: {}",
            provider
        )))
    }
}

fn keyring_entry(service: &str) -> Result<Entry> {
    Entry::new(service, KEYRING_USER).map_err(|e| {
        warn!("Failed to create keyring entry for {}: {}", service, e);
        TuneplanError::Keychain(e.to_string())
    })
}

fn read_secret(service: &str) -> Result<Option<String>> {
    let entry = keyring_entry(service)?;
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => {
            info!("No API key found for service: {}", service);
            Ok(None)
        }
        Err(e) => {
            warn!("Failed to get password for {}: {}", service, e);
            Err(TuneplanError::Keychain(e.to_string()))
        }
    }
}

fn store_secret(service: &str, key: &str) -> Result<()> {
    let entry = keyring_entry(service)?;
    entry.set_password(key).map_err(|e| {
        warn!("Failed to set password for {}: {}", service, e);
        TuneplanError::Keychain(e.to_string())
    })
}

fn remove_secret(service: &str) -> Result<()> {
    let entry = keyring_entry(service)?;
    entry.delete_credential().map_err(|e| {
        warn!("Failed to delete credential for {}: {}", service, e);
        TuneplanError::Keychain(e.to_string())
    })
}

/// API key for `provider`: environment variable first, then the keychain.
pub fn api_key_for(provider: &str) -> Result<Option<String>> {
    if let Some(var) = api_key_env_var(provider) {
        if let Ok(key) = std::env::var(var) {
            if !key.trim().is_empty() {
                return Ok(Some(key));
            }
        }
    }
    read_secret(&keyring_service(provider)?)
}

pub fn set_api_key(provider: &str, key: &str) -> Result<()> {
    info!("Setting API key for provider: {}", provider);
    store_secret(&keyring_service(provider)?, key)
}

pub fn delete_api_key(provider: &str) -> Result<()> {
    info!("Deleting API key for provider: {}", provider);
    remove_secret(&keyring_service(provider)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.enhancer.enabled);
        assert_eq!(settings.enhancer.model(), "claude-sonnet-4-20250514");
        assert_eq!(settings.enhancer.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
knowledge_base = "/opt/catalogs/track.toml"

[enhancer]
enabled = true
provider = "gemini"
"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(
            settings.knowledge_base,
            Some(PathBuf::from("/opt/catalogs/track.toml"))
        );
        assert!(settings.enhancer.enabled);
        assert_eq!(settings.enhancer.model(), "gemini-2.0-flash");
        assert_eq!(settings.enhancer.timeout_secs, 60);
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[enhancer]\nprovider = \"kimi\"\n").unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, TuneplanError::Config(_)));
        assert!(err.to_string().contains("kimi"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[enhancer\nenabled = yes").unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(TuneplanError::Config(_))
        ));
    }

    #[test]
    fn test_settings_roundtrip_through_toml() {
        let settings = Settings {
            knowledge_base: None,
            enhancer: EnhancerSettings {
                enabled: true,
                provider: "openai".to_string(),
                model: Some("gpt-4o-mini".to_string()),
                timeout_secs: 30,
            },
        };
        let text = toml::to_string(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_provider_key_names() {
        assert_eq!(api_key_env_var("claude"), Some("ANTHROPIC_API_KEY"));
        assert_eq!(api_key_env_var("gemini"), Some("GOOGLE_API_KEY"));
        assert_eq!(api_key_env_var("kimi"), None);
        assert_eq!(keyring_service("openrouter").unwrap(), "tuneplan-openrouter-api");
        assert!(keyring_service("kimi").is_err());
    }

    #[test]
    fn test_keychain_roundtrip_when_store_available() {
        let service = format!("tuneplan-roundtrip-{}", std::process::id());
        if let Err(e) = store_secret(&service, "sk-roundtrip-123") {
            eprintln!("Skipping keychain roundtrip, no credential store: {}", e);
            return;
        }

        assert_eq!(
            read_secret(&service).unwrap(),
            Some("sk-roundtrip-123".to_string()),
            "Stored key should be readable from a fresh entry"
        );
        remove_secret(&service).unwrap();
        assert_eq!(read_secret(&service).unwrap(), None);
    }
}
