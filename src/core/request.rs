use crate::core::signature;
use crate::domain::model::{AssemblyParams, AuthParams, SignedParams, EXPIRES_FORMAT};
use crate::utils::error::{Result, TransloaditError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Parameters of one assembly request, before encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyRequest {
    pub auth_key: Option<String>,
    pub template_id: Option<String>,
    pub redirect_url: Option<String>,
    pub notify_url: Option<String>,
    pub steps: Option<serde_json::Value>,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub expires: Option<DateTime<Utc>>,
}

impl AssemblyRequest {
    pub fn new(auth_key: impl Into<String>) -> Self {
        Self {
            auth_key: Some(auth_key.into()),
            ..Self::default()
        }
    }

    /// Private API calls must carry `auth.key`.
    pub fn has_authorization_key(&self) -> bool {
        self.auth_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }

    /// Sets `auth.expires` to now plus `lifetime`.
    pub fn expires_after(&mut self, lifetime: Duration) {
        self.expires = chrono::Duration::from_std(lifetime)
            .ok()
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
    }

    pub fn to_params(&self) -> Result<AssemblyParams> {
        let key = match &self.auth_key {
            Some(key) if self.has_authorization_key() => key.clone(),
            _ => return Err(TransloaditError::MissingAuthKey),
        };

        Ok(AssemblyParams {
            auth: AuthParams {
                key,
                expires: self
                    .expires
                    .map(|at| at.format(EXPIRES_FORMAT).to_string()),
            },
            template_id: self.template_id.clone(),
            redirect_url: self.redirect_url.clone(),
            notify_url: self.notify_url.clone(),
            steps: self.steps.clone(),
            fields: self.fields.clone(),
        })
    }

    /// JSON-encodes the params and signs the exact encoded string.
    pub fn encoded_params_with_signature(&self, secret: &str) -> Result<SignedParams> {
        let params = self.to_params()?;
        if secret.is_empty() {
            return Err(TransloaditError::MissingSecret);
        }

        let params = serde_json::to_string(&params)?;
        let signature = signature::sign(&params, secret);
        tracing::debug!(bytes = params.len(), "Encoded and signed assembly params");

        Ok(SignedParams { params, signature })
    }
}
