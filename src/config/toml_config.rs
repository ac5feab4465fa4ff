use crate::core::client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, TransloaditError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub auth: AuthConfig,
    pub assembly: Option<AssemblyConfig>,
    pub client: Option<ClientConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub key: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyConfig {
    pub template_id: Option<String>,
    pub redirect_url: Option<String>,
    pub notify_url: Option<String>,
    pub fields: Option<BTreeMap<String, serde_json::Value>>,
    pub steps: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub expires_in_minutes: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| TransloaditError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TRANSLOADIT_SECRET})；未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    fn assembly(&self) -> Option<&AssemblyConfig> {
        self.assembly.as_ref()
    }

    pub fn validate_config(&self) -> Result<()> {
        for (field, value) in [("auth.key", &self.auth.key), ("auth.secret", &self.auth.secret)] {
            validation::validate_non_empty_string(field, value)?;
            if value.contains("${") {
                return Err(TransloaditError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: String::new(),
                    reason: "Unresolved environment variable".to_string(),
                });
            }
        }

        validation::validate_url("client.endpoint", self.endpoint())?;
        validation::validate_optional_url("assembly.redirect_url", self.redirect_url())?;
        validation::validate_optional_url("assembly.notify_url", self.notify_url())?;

        if let Some(client) = &self.client {
            if let Some(timeout) = client.timeout_seconds {
                validation::validate_range("client.timeout_seconds", timeout, 1, 3600)?;
            }
            if let Some(minutes) = client.expires_in_minutes {
                validation::validate_range("client.expires_in_minutes", minutes, 1, 60 * 24 * 7)?;
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn endpoint(&self) -> &str {
        self.client
            .as_ref()
            .and_then(|c| c.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    fn auth_key(&self) -> Option<&str> {
        Some(&self.auth.key)
    }

    fn auth_secret(&self) -> Option<&str> {
        Some(&self.auth.secret)
    }

    fn template_id(&self) -> Option<&str> {
        self.assembly().and_then(|a| a.template_id.as_deref())
    }

    fn redirect_url(&self) -> Option<&str> {
        self.assembly().and_then(|a| a.redirect_url.as_deref())
    }

    fn notify_url(&self) -> Option<&str> {
        self.assembly().and_then(|a| a.notify_url.as_deref())
    }

    fn fields(&self) -> BTreeMap<String, serde_json::Value> {
        self.assembly()
            .and_then(|a| a.fields.clone())
            .unwrap_or_default()
    }

    fn steps(&self) -> Option<serde_json::Value> {
        self.assembly().and_then(|a| a.steps.clone())
    }

    fn expires_in(&self) -> Option<Duration> {
        self.client
            .as_ref()
            .and_then(|c| c.expires_in_minutes)
            .and_then(super::expiry_from_minutes)
    }

    fn timeout(&self) -> Duration {
        self.client
            .as_ref()
            .and_then(|c| c.timeout_seconds)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[auth]
key = "my-key"
secret = "my-secret"

[assembly]
template_id = "tpl-1"
notify_url = "https://example.com/notify"
fields = { user_id = "42", retries = 3 }

[assembly.steps.resize]
robot = "/image/resize"
width = 200

[client]
endpoint = "https://api2-eu.transloadit.com/assemblies"
timeout_seconds = 30
expires_in_minutes = 10
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.auth_key(), Some("my-key"));
        assert_eq!(config.template_id(), Some("tpl-1"));
        assert_eq!(config.endpoint(), "https://api2-eu.transloadit.com/assemblies");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.expires_in(), Some(Duration::from_secs(600)));
        assert_eq!(config.fields()["retries"], serde_json::json!(3));
        assert_eq!(config.steps().unwrap()["resize"]["width"], serde_json::json!(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[auth]
key = "k"
secret = "s"
"#,
        )
        .unwrap();

        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.fields().is_empty());
        assert!(config.template_id().is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TL_TOML_TEST_SECRET", "from-env");

        let config = TomlConfig::from_toml_str(
            r#"
[auth]
key = "k"
secret = "${TL_TOML_TEST_SECRET}"
"#,
        )
        .unwrap();
        assert_eq!(config.auth.secret, "from-env");

        std::env::remove_var("TL_TOML_TEST_SECRET");
    }

    #[test]
    fn test_unresolved_placeholder_fails_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[auth]
key = "k"
secret = "${TL_TOML_TEST_NEVER_SET}"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_expiry_does_not_overflow() {
        let config = TomlConfig::from_toml_str(
            r#"
[auth]
key = "k"
secret = "s"

[client]
expires_in_minutes = 9223372036854775807
"#,
        )
        .unwrap();

        assert!(config.expires_in().is_none());
        assert!(config.validate().is_err());

        let client = crate::TransloaditClient::from_config(&config).unwrap();
        assert!(client.signed_params().is_ok());
    }

    #[test]
    fn test_missing_auth_section_is_config_error() {
        let result = TomlConfig::from_toml_str("[client]\ntimeout_seconds = 5\n");
        assert!(matches!(result, Err(TransloaditError::ConfigError { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[auth]\nkey = \"file-key\"\nsecret = \"file-secret\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.auth.key, "file-key");
    }
}
