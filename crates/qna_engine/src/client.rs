use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use qna_logging::{qna_debug, qna_warn};

use crate::types::clamp_percent;
use crate::{Answer, BackendSettings, ClientError, InitializeStatus, Source, StatusResponse};

/// The Q&A backend as seen by the client.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Readiness of the backend index. The credential is attached when known.
    async fn status(&self, credential: Option<&str>) -> Result<StatusResponse, ClientError>;

    /// Asks the backend to start building its index.
    async fn initialize(&self, credential: &str) -> Result<InitializeStatus, ClientError>;

    async fn ask(&self, credential: &str, question: &str) -> Result<Answer, ClientError>;

    /// Authenticated probe used to verify a credential before storing it.
    async fn health(&self, credential: &str) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    sources: Option<Vec<Source>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, ClientError> {
        // Fail early on a bad base URL rather than on the first request.
        settings.endpoint("status")?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        credential: Option<&str>,
    ) -> Result<RequestBuilder, ClientError> {
        let url = self.settings.endpoint(path)?;
        qna_debug!("{} {}", method, url);
        let builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");
        Ok(match credential {
            Some(credential) => builder.bearer_auth(credential),
            None => builder,
        })
    }

    /// Sends the request and returns the body of a successful response.
    async fn execute(
        builder: RequestBuilder,
        fallback: impl FnOnce(StatusCode) -> String,
    ) -> Result<String, ClientError> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or_else(|| fallback(status));
            qna_warn!("Backend returned {}: {}", status, detail);
            return Err(ClientError::Http {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn status(&self, credential: Option<&str>) -> Result<StatusResponse, ClientError> {
        let builder = self.request(Method::GET, "status", credential)?;
        let body = Self::execute(builder, http_error).await?;
        parse_body(&body)
    }

    async fn initialize(&self, credential: &str) -> Result<InitializeStatus, ClientError> {
        let builder = self.request(Method::POST, "initialize", Some(credential))?;
        let body = Self::execute(builder, http_error).await?;
        let reply: InitializeResponse = parse_body(&body)?;
        if let Some(error) = reply.error {
            return Err(ClientError::Backend(error));
        }
        match reply.status.as_deref() {
            Some("initialization_started") => Ok(InitializeStatus::Started),
            Some("initialization_in_progress") => Ok(InitializeStatus::InProgress {
                progress: reply.progress.map(clamp_percent),
            }),
            Some("initialization_complete") | Some("already_initialized") => {
                Ok(InitializeStatus::Complete)
            }
            other => {
                qna_warn!("Unexpected initialize status {:?}", other);
                Err(ClientError::Protocol(
                    "Unexpected response from server".to_string(),
                ))
            }
        }
    }

    async fn ask(&self, credential: &str, question: &str) -> Result<Answer, ClientError> {
        let payload = serde_json::to_string(&AskRequest { question })
            .map_err(|err| ClientError::Protocol(err.to_string()))?;
        let builder = self
            .request(Method::POST, "ask", Some(credential))?
            .body(payload);
        let body = Self::execute(builder, |_| "Failed to get response".to_string()).await?;
        let reply: AskResponse = parse_body(&body)?;
        match reply.answer {
            Some(answer) if !answer.is_empty() => Ok(Answer {
                answer,
                sources: reply.sources.unwrap_or_default(),
            }),
            _ => Err(ClientError::NoAnswer),
        }
    }

    async fn health(&self, credential: &str) -> Result<(), ClientError> {
        let builder = self.request(Method::GET, "health", Some(credential))?;
        Self::execute(builder, |_| "API key verification failed".to_string()).await?;
        Ok(())
    }
}

fn http_error(status: StatusCode) -> String {
    format!("HTTP error! status: {}", status.as_u16())
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body)
        .map_err(|err| ClientError::Protocol(format!("malformed response body: {err}")))
}

/// Extracts `detail` from an error body; non-string details are kept as JSON text.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(text) if !text.is_empty() => Some(text),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::Timeout;
    }
    if err.is_decode() {
        return ClientError::Protocol(err.to_string());
    }
    ClientError::Network(err.to_string())
}
