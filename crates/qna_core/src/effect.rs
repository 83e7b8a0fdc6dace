use crate::{Credential, Epoch, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Probe the backend health endpoint with a freshly entered credential.
    VerifyCredential { epoch: Epoch, credential: Credential },
    /// Store a verified credential; answered with `Msg::CredentialPersisted`
    /// or `Msg::CredentialPersistFailed`.
    PersistCredential { epoch: Epoch, credential: Credential },
    ClearCredential,
    QueryStatus { epoch: Epoch },
    StartInitialization { epoch: Epoch },
    /// Deliver `Msg::PollDue` for this epoch after the poll interval.
    SchedulePoll { epoch: Epoch },
    AskQuestion { request_id: RequestId, question: String },
    /// Ask the user to supply a (new) credential.
    PromptCredential,
}
