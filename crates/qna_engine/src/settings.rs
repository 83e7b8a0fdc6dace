use std::time::Duration;

use reqwest::Url;

use crate::ClientError;

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    /// Path segment in front of every endpoint, e.g. `/api`. May be empty.
    pub api_prefix: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Delay between status polls while the backend initializes.
    pub poll_interval: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_prefix: "/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl BackendSettings {
    /// Joins base URL, prefix and endpoint path, tolerating stray slashes on either side.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let base = self.base_url.trim().trim_end_matches('/');
        let prefix = self.api_prefix.trim().trim_matches('/');
        let path = path.trim_start_matches('/');
        let joined = if prefix.is_empty() {
            format!("{base}/{path}")
        } else {
            format!("{base}/{prefix}/{path}")
        };
        Url::parse(&joined).map_err(|err| ClientError::InvalidUrl(format!("{joined}: {err}")))
    }
}
