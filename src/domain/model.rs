use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format Transloadit expects for `auth.expires`.
pub const EXPIRES_FORMAT: &str = "%Y/%m/%d %H:%M:%S+00:00";

/// The `auth` object of the params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

/// Parameter set that is JSON-encoded and signed.
///
/// Field order is fixed by the struct and every map is a `BTreeMap`, so the
/// encoding of a given value is always the same string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyParams {
    pub auth: AuthParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// The two form fields every request carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedParams {
    pub params: String,
    pub signature: String,
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            field_name: "file".to_string(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_written: u64,
    pub total_bytes_written: u64,
    pub total_bytes_expected: u64,
}

impl UploadProgress {
    pub fn fraction(&self) -> f64 {
        if self.total_bytes_expected == 0 {
            return 1.0;
        }
        self.total_bytes_written as f64 / self.total_bytes_expected as f64
    }
}

/// Decoded reply of the assemblies endpoint. The raw JSON is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssemblyResponse {
    pub raw: serde_json::Value,
}

impl AssemblyResponse {
    pub fn new(raw: serde_json::Value) -> Self {
        Self { raw }
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.raw.get(name).and_then(|v| v.as_str())
    }

    /// Status code such as `ASSEMBLY_COMPLETED` or `ASSEMBLY_EXECUTING`.
    pub fn ok(&self) -> Option<&str> {
        self.str_field("ok")
    }

    pub fn error(&self) -> Option<&str> {
        self.str_field("error")
    }

    pub fn message(&self) -> Option<&str> {
        self.str_field("message")
    }

    pub fn assembly_id(&self) -> Option<&str> {
        self.str_field("assembly_id")
    }

    pub fn assembly_url(&self) -> Option<&str> {
        self.str_field("assembly_url")
    }

    pub fn assembly_ssl_url(&self) -> Option<&str> {
        self.str_field("assembly_ssl_url")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_params_are_omitted() {
        let params = AssemblyParams {
            auth: AuthParams {
                key: "abc".to_string(),
                expires: None,
            },
            template_id: None,
            redirect_url: None,
            notify_url: None,
            steps: None,
            fields: BTreeMap::new(),
        };

        let encoded = serde_json::to_string(&params).unwrap();
        assert_eq!(encoded, r#"{"auth":{"key":"abc"}}"#);
    }

    #[test]
    fn test_assembly_response_accessors() {
        let response = AssemblyResponse::new(json!({
            "ok": "ASSEMBLY_EXECUTING",
            "assembly_id": "a1b2",
            "assembly_ssl_url": "https://api2.transloadit.com/assemblies/a1b2"
        }));

        assert_eq!(response.ok(), Some("ASSEMBLY_EXECUTING"));
        assert_eq!(response.assembly_id(), Some("a1b2"));
        assert!(response.error().is_none());
        assert!(response.assembly_url().is_none());
    }

    #[test]
    fn test_progress_fraction() {
        let progress = UploadProgress {
            bytes_written: 10,
            total_bytes_written: 25,
            total_bytes_expected: 100,
        };
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);
    }
}
