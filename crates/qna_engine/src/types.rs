use serde::Deserialize;
use thiserror::Error;

use crate::ApiKey;

pub type Epoch = u64;
pub type RequestId = u64;

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub initializing: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn progress_percent(&self) -> Option<u8> {
        self.progress.map(clamp_percent)
    }
}

pub(crate) fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializeStatus {
    Started,
    InProgress { progress: Option<u8> },
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StatusReceived {
        epoch: Epoch,
        result: Result<StatusResponse, ClientError>,
    },
    InitializeReceived {
        epoch: Epoch,
        result: Result<InitializeStatus, ClientError>,
    },
    CredentialVerified {
        epoch: Epoch,
        credential: ApiKey,
        result: Result<(), ClientError>,
    },
    AnswerReceived {
        request_id: RequestId,
        result: Result<Answer, ClientError>,
    },
    PollDue {
        epoch: Epoch,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("no API key stored")]
    MissingCredential,
    #[error("credential store error: {0}")]
    CredentialStore(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("{detail}")]
    Http { status: u16, detail: String },
    #[error("{0}")]
    Protocol(String),
    /// The backend answered successfully but reported an error in the body.
    #[error("{0}")]
    Backend(String),
    #[error("No answer received")]
    NoAnswer,
}

impl ClientError {
    pub fn is_credential_rejected(&self) -> bool {
        matches!(self, ClientError::Http { status: 401 | 403, .. })
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
}
