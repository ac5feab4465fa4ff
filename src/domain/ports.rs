use crate::utils::error::Result;
use std::collections::BTreeMap;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Credentials and request defaults, whichever source they come from.
pub trait ConfigProvider: Send + Sync {
    fn endpoint(&self) -> &str;
    fn auth_key(&self) -> Option<&str>;
    fn auth_secret(&self) -> Option<&str>;
    fn template_id(&self) -> Option<&str>;
    fn redirect_url(&self) -> Option<&str>;
    fn notify_url(&self) -> Option<&str>;
    fn fields(&self) -> BTreeMap<String, serde_json::Value>;
    fn steps(&self) -> Option<serde_json::Value> {
        None
    }
    fn expires_in(&self) -> Option<Duration>;
    fn timeout(&self) -> Duration;
}
