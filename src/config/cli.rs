use crate::config::TomlConfig;
use crate::core::client::{TransloaditClient, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, TransloaditError};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "transloadit-upload")]
#[command(about = "Upload a file to Transloadit as a signed assembly")]
pub struct CliConfig {
    /// File to upload
    pub file: Option<String>,

    #[arg(long, env = "TRANSLOADIT_KEY")]
    pub key: Option<String>,

    #[arg(long, env = "TRANSLOADIT_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    #[arg(long)]
    pub template_id: Option<String>,

    #[arg(long)]
    pub redirect_url: Option<String>,

    #[arg(long)]
    pub notify_url: Option<String>,

    /// Extra assembly field, repeatable
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Assemblies endpoint [default: https://api2.transloadit.com/assemblies]
    #[arg(long)]
    pub endpoint: Option<String>,

    /// TOML file with auth, assembly and client sections
    #[arg(long)]
    pub config: Option<String>,

    /// Name sent for the file part (defaults to the file's base name)
    #[arg(long)]
    pub name: Option<String>,

    /// Content type of the file (guessed from the extension otherwise)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Request timeout [default: 120]
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Lifetime of the signature, sent as auth.expires
    #[arg(long)]
    pub expires_in_minutes: Option<u64>,

    /// Print params and signature instead of uploading
    #[arg(long)]
    pub sign_only: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn field_map(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        self.fields
            .iter()
            .map(|raw| {
                validation::parse_field_pair(raw)
                    .map(|(key, value)| (key, serde_json::Value::String(value)))
            })
            .collect()
    }

    /// Builds the client from the TOML file (if any), then applies every
    /// flag given on the command line on top of it.
    pub fn build_client(&self) -> Result<TransloaditClient> {
        let Some(path) = &self.config else {
            return TransloaditClient::from_config(self);
        };

        let file_config = TomlConfig::from_file(path)?;
        file_config.validate()?;
        tracing::debug!("Loaded configuration from {}", path);
        let mut client = TransloaditClient::from_config(&file_config)?;

        if let Some(endpoint) = &self.endpoint {
            client.set_endpoint(endpoint.as_str());
        }
        if let Some(seconds) = self.timeout_seconds {
            client.set_timeout(Duration::from_secs(seconds))?;
        }
        if let Some(key) = self.auth_key() {
            client.set_auth_key(key);
        }
        if let Some(secret) = self.auth_secret() {
            client.set_secret(secret);
        }
        if let Some(template_id) = self.template_id() {
            client.set_template_id(template_id);
        }
        if let Some(url) = self.redirect_url() {
            client.set_redirect_url(url);
        }
        if let Some(url) = self.notify_url() {
            client.set_notify_url(url);
        }
        if !self.fields.is_empty() {
            let mut fields = client.request().fields.clone();
            fields.extend(self.field_map()?);
            client.set_fields(fields);
        }
        if let Some(lifetime) = self.expires_in() {
            client.set_expires_in(lifetime);
        }

        Ok(client)
    }
}

impl ConfigProvider for CliConfig {
    fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn auth_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn auth_secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    fn redirect_url(&self) -> Option<&str> {
        self.redirect_url.as_deref()
    }

    fn notify_url(&self) -> Option<&str> {
        self.notify_url.as_deref()
    }

    fn fields(&self) -> BTreeMap<String, serde_json::Value> {
        // malformed pairs are rejected by validate()
        self.field_map().unwrap_or_default()
    }

    fn expires_in(&self) -> Option<Duration> {
        self.expires_in_minutes.and_then(super::expiry_from_minutes)
    }

    fn timeout(&self) -> Duration {
        self.timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("endpoint", self.endpoint())?;
        validation::validate_optional_url("redirect_url", self.redirect_url.as_deref())?;
        validation::validate_optional_url("notify_url", self.notify_url.as_deref())?;
        if let Some(seconds) = self.timeout_seconds {
            validation::validate_range("timeout_seconds", seconds, 1, 3600)?;
        }
        if let Some(minutes) = self.expires_in_minutes {
            validation::validate_range("expires_in_minutes", minutes, 1, 60 * 24 * 7)?;
        }
        self.field_map()?;

        if let Some(path) = &self.config {
            validation::validate_path("config", path)?;
        }
        match &self.file {
            Some(file) => validation::validate_path("file", file)?,
            None if !self.sign_only => {
                return Err(TransloaditError::MissingConfigError {
                    field: "file".to_string(),
                })
            }
            None => {}
        }

        Ok(())
    }
}
