use std::sync::Arc;

use qna_core::{
    Answer, AskFailure, Credential, Effect, InitializeReply, Msg, SourceRef, StatusReport,
};
use qna_engine::{ApiKey, ClientError, CredentialStore, EngineEvent, EngineHandle, InitializeStatus};
use qna_logging::{qna_debug, qna_error, qna_info, qna_warn};

/// Executes core effects against the engine and the credential store, and
/// turns engine events back into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
    store: Arc<dyn CredentialStore>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, store: Arc<dyn CredentialStore>) -> Self {
        Self { engine, store }
    }

    /// Runs one effect. Store operations complete before this returns and
    /// report their outcome as a follow-up message.
    pub fn run(&self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::VerifyCredential { epoch, credential } => {
                qna_info!("Verifying API key (epoch {})", epoch);
                self.engine
                    .verify(epoch, ApiKey::new(credential.expose()));
            }
            Effect::PersistCredential { epoch, credential } => {
                return Some(match self.store.set(credential.expose()) {
                    Ok(()) => {
                        qna_info!("API key stored");
                        Msg::CredentialPersisted { epoch }
                    }
                    Err(err) => {
                        qna_error!("Failed to store API key: {}", err);
                        Msg::CredentialPersistFailed {
                            epoch,
                            reason: err.to_string(),
                            still_stored: self.still_stored(),
                        }
                    }
                });
            }
            Effect::ClearCredential => {
                if let Err(err) = self.store.clear() {
                    qna_error!("Failed to remove stored API key: {}", err);
                    return Some(Msg::CredentialClearFailed {
                        reason: err.to_string(),
                        still_stored: self.still_stored(),
                    });
                }
            }
            Effect::QueryStatus { epoch } => {
                qna_debug!("QueryStatus epoch={}", epoch);
                self.engine.query_status(epoch);
            }
            Effect::StartInitialization { epoch } => {
                qna_info!("Requesting backend initialization (epoch {})", epoch);
                self.engine.start_initialization(epoch);
            }
            Effect::SchedulePoll { epoch } => {
                self.engine.schedule_poll(epoch);
            }
            Effect::AskQuestion {
                request_id,
                question,
            } => {
                qna_info!(
                    "AskQuestion request_id={} question_len={}",
                    request_id,
                    question.len()
                );
                self.engine.ask(request_id, question);
            }
            Effect::PromptCredential => {
                qna_debug!("Credential prompt is handled by the terminal");
            }
        }
        None
    }

    fn still_stored(&self) -> bool {
        match self.store.get() {
            Ok(credential) => credential.is_some(),
            Err(err) => {
                qna_warn!("Could not read stored API key: {}", err);
                false
            }
        }
    }

    pub fn drain_events(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            msgs.push(map_event(event));
        }
        msgs
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::StatusReceived { epoch, result } => Msg::StatusReceived {
            epoch,
            result: result
                .map(|status| StatusReport {
                    initialized: status.initialized,
                    initializing: status.initializing,
                    progress: status.progress_percent(),
                    status: status.status,
                    error: status.error,
                })
                .map_err(|err| describe(&err)),
        },
        EngineEvent::InitializeReceived { epoch, result } => Msg::InitializeReceived {
            epoch,
            result: match result {
                Ok(InitializeStatus::Started) => Ok(InitializeReply::Started),
                Ok(InitializeStatus::InProgress { progress }) => {
                    Ok(InitializeReply::InProgress { progress })
                }
                Ok(InitializeStatus::Complete) => Ok(InitializeReply::Complete),
                Err(ClientError::Backend(reason)) => Ok(InitializeReply::Rejected(reason)),
                Err(err) => Err(describe(&err)),
            },
        },
        EngineEvent::CredentialVerified {
            epoch,
            credential,
            result,
        } => Msg::CredentialVerified {
            epoch,
            credential: Credential::new(credential.into_inner()),
            result: result.map_err(|err| describe(&err)),
        },
        EngineEvent::AnswerReceived { request_id, result } => Msg::AnswerReceived {
            request_id,
            result: result
                .map(|answer| Answer {
                    answer: answer.answer,
                    sources: answer
                        .sources
                        .into_iter()
                        .map(|source| SourceRef {
                            title: source.title,
                        })
                        .collect(),
                })
                .map_err(|err| AskFailure {
                    credential_rejected: err.is_credential_rejected()
                        || err == ClientError::MissingCredential,
                    detail: describe(&err),
                }),
        },
        EngineEvent::PollDue { epoch } => Msg::PollDue { epoch },
    }
}

fn describe(err: &ClientError) -> String {
    qna_warn!("Backend request failed: {}", err);
    err.to_string()
}
