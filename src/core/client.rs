use crate::core::request::AssemblyRequest;
use crate::core::Storage;
use crate::domain::model::{AssemblyResponse, SignedParams, UploadFile, UploadProgress};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, TransloaditError};
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api2.transloadit.com/assemblies";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const PROGRESS_CHUNK_SIZE: usize = 64 * 1024;

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Holds credentials and request parameters, and posts assemblies.
pub struct TransloaditClient {
    http: Arc<Client>,
    endpoint: String,
    secret: Option<String>,
    request: AssemblyRequest,
    expires_in: Option<Duration>,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for TransloaditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransloaditClient")
            .field("endpoint", &self.endpoint)
            .field("request", &self.request)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl TransloaditClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http: Arc::new(http),
            endpoint: endpoint.into(),
            secret: None,
            request: AssemblyRequest::default(),
            expires_in: None,
            progress: None,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut client = Self::new(config.endpoint(), config.timeout())?;

        if let Some(key) = config.auth_key() {
            client.set_auth_key(key);
        }
        if let Some(secret) = config.auth_secret() {
            client.set_secret(secret);
        }
        client.request.template_id = config.template_id().map(str::to_string);
        client.request.redirect_url = config.redirect_url().map(str::to_string);
        client.request.notify_url = config.notify_url().map(str::to_string);
        client.request.steps = config.steps();
        client.request.fields = config.fields();
        client.expires_in = config.expires_in();

        Ok(client)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request(&self) -> &AssemblyRequest {
        &self.request
    }

    pub fn authenticate(&mut self, key: impl Into<String>, secret: impl Into<String>) {
        self.request.auth_key = Some(key.into());
        self.secret = Some(secret.into());
    }

    pub fn set_auth_key(&mut self, key: impl Into<String>) {
        self.request.auth_key = Some(key.into());
    }

    pub fn set_secret(&mut self, secret: impl Into<String>) {
        self.secret = Some(secret.into());
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    /// Rebuilds the underlying HTTP client with a new request timeout.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.http = Arc::new(Client::builder().timeout(timeout).build()?);
        Ok(())
    }

    pub fn set_template_id(&mut self, template_id: impl Into<String>) {
        self.request.template_id = Some(template_id.into());
    }

    pub fn set_redirect_url(&mut self, redirect_url: impl Into<String>) {
        self.request.redirect_url = Some(redirect_url.into());
    }

    pub fn set_notify_url(&mut self, notify_url: impl Into<String>) {
        self.request.notify_url = Some(notify_url.into());
    }

    pub fn set_fields(&mut self, fields: BTreeMap<String, serde_json::Value>) {
        self.request.fields = fields;
    }

    pub fn set_steps(&mut self, steps: serde_json::Value) {
        self.request.steps = Some(steps);
    }

    /// Each signed request gets `auth.expires` set to now + `lifetime`.
    pub fn set_expires_in(&mut self, lifetime: Duration) {
        self.expires_in = Some(lifetime);
    }

    pub fn set_upload_progress<F>(&mut self, callback: F)
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
    }

    /// Key, secret, and assembly instructions (template or steps) are present.
    pub fn all_keys_are_set(&self) -> bool {
        self.request.has_authorization_key()
            && self.secret.as_deref().is_some_and(|s| !s.is_empty())
            && (self.request.template_id.is_some() || self.request.steps.is_some())
    }

    /// The `params`/`signature` pair the next upload would send.
    pub fn signed_params(&self) -> Result<SignedParams> {
        if !self.request.has_authorization_key() {
            return Err(TransloaditError::MissingAuthKey);
        }
        let secret = self
            .secret
            .as_deref()
            .ok_or(TransloaditError::MissingSecret)?;

        let mut request = self.request.clone();
        if let Some(lifetime) = self.expires_in {
            request.expires_after(lifetime);
        }
        request.encoded_params_with_signature(secret)
    }

    pub async fn upload_file_at<S: Storage>(
        &self,
        storage: &S,
        path: &str,
        name: &str,
        content_type: &str,
    ) -> Result<AssemblyResponse> {
        tracing::debug!("Reading upload source {}", path);
        let data = storage.read_file(path).await?;
        self.upload_bytes(UploadFile::new(name, content_type, data))
            .await
    }

    /// Uploads JPEG-encoded image data under a timestamped name.
    pub async fn upload_image(&self, jpeg: Vec<u8>) -> Result<AssemblyResponse> {
        let name = format!("image_{}.jpg", chrono::Utc::now().format("%Y%m%d%H%M%S"));
        self.upload_bytes(UploadFile::new(name, "image/jpeg", jpeg))
            .await
    }

    pub async fn upload_bytes(&self, file: UploadFile) -> Result<AssemblyResponse> {
        let signed = match self.signed_params() {
            Ok(signed) => signed,
            Err(e) => {
                tracing::warn!("Refusing to send unsigned request: {}", e);
                return Err(e);
            }
        };

        let total = file.data.len() as u64;
        let body = match &self.progress {
            Some(callback) => progress_body(file.data, Arc::clone(callback)),
            None => Body::from(file.data),
        };
        let part = Part::stream_with_length(body, total)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;

        let form = Form::new()
            .text("params", signed.params)
            .text("signature", signed.signature)
            .part(file.field_name.clone(), part);

        tracing::info!(
            "Uploading {} ({} bytes) to {}",
            file.file_name,
            total,
            self.endpoint
        );
        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!("Assembly response status: {}", status);

        let assembly = parse_response(status, &body)?;
        tracing::info!(
            "Assembly {} accepted: {}",
            assembly.assembly_id().unwrap_or("<unknown>"),
            assembly.ok().unwrap_or("<no status>")
        );
        Ok(assembly)
    }
}

fn progress_body(data: Vec<u8>, callback: ProgressCallback) -> Body {
    Body::wrap_stream(progress_chunks(data, callback))
}

/// Yields the upload in chunks, copying each one only when it is polled.
fn progress_chunks(
    data: Vec<u8>,
    callback: ProgressCallback,
) -> impl futures::Stream<Item = std::io::Result<Vec<u8>>> + Send + 'static {
    let total = data.len() as u64;

    futures::stream::iter((0..data.len()).step_by(PROGRESS_CHUNK_SIZE)).map(move |start| {
        let end = (start + PROGRESS_CHUNK_SIZE).min(data.len());
        let chunk = data[start..end].to_vec();
        callback(UploadProgress {
            bytes_written: chunk.len() as u64,
            total_bytes_written: end as u64,
            total_bytes_expected: total,
        });
        Ok(chunk)
    })
}

/// Maps an HTTP status and body to a response or an error.
pub fn parse_response(status: u16, body: &str) -> Result<AssemblyResponse> {
    let json: Option<serde_json::Value> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let message = json
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("error")))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());
        tracing::warn!("Transloadit returned {}: {}", status, message);
        return Err(TransloaditError::Api { status, message });
    }

    let assembly = AssemblyResponse::new(match json {
        Some(json) => json,
        None => serde_json::from_str(body)?,
    });

    if let Some(error) = assembly.error() {
        let message = assembly.message().unwrap_or_default().to_string();
        tracing::warn!("Assembly error {}: {}", error, message);
        return Err(TransloaditError::Assembly {
            error: error.to_string(),
            message,
        });
    }

    Ok(assembly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn client() -> TransloaditClient {
        TransloaditClient::new(DEFAULT_ENDPOINT, DEFAULT_TIMEOUT).unwrap()
    }

    #[test]
    fn test_all_keys_are_set() {
        let mut client = client();
        assert!(!client.all_keys_are_set());

        client.authenticate("key", "secret");
        assert!(!client.all_keys_are_set());

        client.set_template_id("tpl");
        assert!(client.all_keys_are_set());
    }

    #[test]
    fn test_steps_count_as_instructions() {
        let mut client = client();
        client.authenticate("key", "secret");
        client.set_steps(json!({"resize": {"robot": "/image/resize", "width": 100}}));
        assert!(client.all_keys_are_set());
    }

    #[test]
    fn test_key_without_secret_reports_missing_secret() {
        struct KeyOnly;

        impl ConfigProvider for KeyOnly {
            fn endpoint(&self) -> &str {
                DEFAULT_ENDPOINT
            }
            fn auth_key(&self) -> Option<&str> {
                Some("real-key")
            }
            fn auth_secret(&self) -> Option<&str> {
                None
            }
            fn template_id(&self) -> Option<&str> {
                Some("tpl")
            }
            fn redirect_url(&self) -> Option<&str> {
                None
            }
            fn notify_url(&self) -> Option<&str> {
                None
            }
            fn fields(&self) -> BTreeMap<String, serde_json::Value> {
                BTreeMap::new()
            }
            fn expires_in(&self) -> Option<Duration> {
                None
            }
            fn timeout(&self) -> Duration {
                DEFAULT_TIMEOUT
            }
        }

        let client = TransloaditClient::from_config(&KeyOnly).unwrap();
        assert_eq!(client.request().auth_key.as_deref(), Some("real-key"));
        assert!(matches!(
            client.signed_params(),
            Err(TransloaditError::MissingSecret)
        ));
    }

    #[test]
    fn test_endpoint_and_timeout_can_be_replaced() {
        let mut client = client();
        client.set_endpoint("http://localhost:9999/assemblies");
        assert!(client.set_timeout(Duration::from_secs(5)).is_ok());
        assert_eq!(client.endpoint(), "http://localhost:9999/assemblies");
    }

    #[test]
    fn test_progress_chunks_are_lazy_and_complete() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));

        let len = PROGRESS_CHUNK_SIZE * 2 + 10;
        let stream = progress_chunks(vec![7u8; len], callback);
        assert!(seen.lock().unwrap().is_empty());

        let chunks: Vec<Vec<u8>> = futures::executor::block_on(stream.collect::<Vec<_>>())
            .into_iter()
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), len);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].bytes_written, 10);
        assert_eq!(seen[2].total_bytes_written, len as u64);
        assert_eq!(seen[2].total_bytes_expected, len as u64);
    }

    #[test]
    fn test_signed_params_carry_expiry() {
        let mut client = client();
        client.authenticate("key", "secret");
        client.set_expires_in(Duration::from_secs(3600));

        let signed = client.signed_params().unwrap();
        let params: serde_json::Value = serde_json::from_str(&signed.params).unwrap();
        assert!(params["auth"]["expires"].as_str().unwrap().ends_with("+00:00"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let mut client = client();
        client.authenticate("key", "very-secret-value");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("very-secret-value"));
    }

    #[tokio::test]
    async fn test_upload_without_key_is_rejected() {
        let client = client();
        let result = client
            .upload_bytes(UploadFile::new("a.txt", "text/plain", b"hi".to_vec()))
            .await;
        assert!(matches!(result, Err(TransloaditError::MissingAuthKey)));
    }

    #[test]
    fn test_parse_response_variants() {
        let ok = parse_response(200, r#"{"ok":"ASSEMBLY_COMPLETED","assembly_id":"x"}"#).unwrap();
        assert_eq!(ok.assembly_id(), Some("x"));

        let assembly_err = parse_response(200, r#"{"error":"INVALID_SIGNATURE","message":"bad"}"#);
        assert!(matches!(
            assembly_err,
            Err(TransloaditError::Assembly { ref error, .. }) if error == "INVALID_SIGNATURE"
        ));

        let api_err = parse_response(404, "not found");
        assert!(matches!(
            api_err,
            Err(TransloaditError::Api { status: 404, ref message }) if message == "not found"
        ));

        assert!(matches!(
            parse_response(200, "<html>"),
            Err(TransloaditError::Serialization(_))
        ));
    }
}
