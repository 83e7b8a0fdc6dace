use crate::{Credential, Epoch, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Application started; tells whether a credential is already stored.
    Startup { credential_present: bool },
    /// User typed a credential.
    CredentialEntered(Credential),
    /// Result of the health probe issued for an entered credential.
    CredentialVerified {
        epoch: Epoch,
        credential: Credential,
        result: Result<(), String>,
    },
    /// The verified credential is now stored.
    CredentialPersisted { epoch: Epoch },
    /// Storing the verified credential failed. `still_stored` tells whether an
    /// older credential remains in the store.
    CredentialPersistFailed {
        epoch: Epoch,
        reason: String,
        still_stored: bool,
    },
    /// Removing the stored credential failed.
    CredentialClearFailed { reason: String, still_stored: bool },
    /// User asked to forget the stored credential.
    CredentialCleared,
    /// User re-confirmed the stored credential after a failure.
    CredentialConfirmed,
    /// Backend answered a status query.
    StatusReceived {
        epoch: Epoch,
        result: Result<StatusReport, String>,
    },
    /// Backend answered an initialize request.
    InitializeReceived {
        epoch: Epoch,
        result: Result<InitializeReply, String>,
    },
    /// Poll delay elapsed.
    PollDue { epoch: Epoch },
    /// User submitted a question.
    QuestionSubmitted(String),
    /// Backend answered (or failed to answer) a question.
    AnswerReceived {
        request_id: RequestId,
        result: Result<Answer, AskFailure>,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

/// Backend readiness as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusReport {
    pub initialized: bool,
    pub initializing: bool,
    pub status: Option<String>,
    pub progress: Option<u8>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializeReply {
    Started,
    InProgress { progress: Option<u8> },
    Complete,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceRef {
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskFailure {
    pub detail: String,
    /// The backend refused the credential (401/403).
    pub credential_rejected: bool,
}

impl AskFailure {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            credential_rejected: false,
        }
    }
}
