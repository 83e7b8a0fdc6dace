use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use qna_logging::{qna_debug, qna_warn};

use crate::{
    ApiKey, Backend, BackendSettings, ClientError, CredentialStore, EngineError, EngineEvent,
    Epoch, ReqwestBackend, RequestId,
};

enum EngineCommand {
    QueryStatus { epoch: Epoch },
    StartInitialization { epoch: Epoch },
    Verify { epoch: Epoch, credential: ApiKey },
    Ask { request_id: RequestId, question: String },
    SchedulePoll { epoch: Epoch },
}

/// Runs backend requests and poll timers on a background tokio runtime.
///
/// Results come back as [`EngineEvent`]s tagged with the epoch or request id
/// they were issued under; nothing is cancelled.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

struct Worker {
    backend: Arc<dyn Backend>,
    store: Arc<dyn CredentialStore>,
    poll_interval: Duration,
}

impl EngineHandle {
    pub fn new(
        settings: BackendSettings,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, EngineError> {
        let poll_interval = settings.poll_interval;
        let backend = Arc::new(ReqwestBackend::new(settings)?);
        Ok(Self::with_backend(backend, store, poll_interval)?)
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        store: Arc<dyn CredentialStore>,
        poll_interval: Duration,
    ) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("qna-engine-worker")
            .build()?;
        let worker = Arc::new(Worker {
            backend,
            store,
            poll_interval,
        });

        thread::Builder::new()
            .name("qna-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let worker = worker.clone();
                    let event_tx = event_tx.clone();
                    runtime.spawn(async move {
                        let event = worker.handle(command).await;
                        let _ = event_tx.send(event);
                    });
                }
                qna_debug!("Engine command channel closed");
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn query_status(&self, epoch: Epoch) {
        self.send(EngineCommand::QueryStatus { epoch });
    }

    pub fn start_initialization(&self, epoch: Epoch) {
        self.send(EngineCommand::StartInitialization { epoch });
    }

    pub fn verify(&self, epoch: Epoch, credential: ApiKey) {
        self.send(EngineCommand::Verify { epoch, credential });
    }

    pub fn ask(&self, request_id: RequestId, question: impl Into<String>) {
        self.send(EngineCommand::Ask {
            request_id,
            question: question.into(),
        });
    }

    /// Emits [`EngineEvent::PollDue`] for `epoch` after the poll interval.
    pub fn schedule_poll(&self, epoch: Epoch) {
        self.send(EngineCommand::SchedulePoll { epoch });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            qna_warn!("Engine thread has stopped; command dropped");
        }
    }
}

impl Worker {
    async fn handle(&self, command: EngineCommand) -> EngineEvent {
        match command {
            EngineCommand::QueryStatus { epoch } => {
                let result = match self.store.get() {
                    Ok(credential) => {
                        self.backend
                            .status(credential.as_ref().map(ApiKey::expose))
                            .await
                    }
                    Err(err) => Err(ClientError::CredentialStore(err.to_string())),
                };
                EngineEvent::StatusReceived { epoch, result }
            }
            EngineCommand::StartInitialization { epoch } => {
                let result = match self.stored_credential() {
                    Ok(credential) => self.backend.initialize(credential.expose()).await,
                    Err(err) => Err(err),
                };
                EngineEvent::InitializeReceived { epoch, result }
            }
            EngineCommand::Verify { epoch, credential } => {
                let result = self.backend.health(credential.expose()).await;
                EngineEvent::CredentialVerified {
                    epoch,
                    credential,
                    result,
                }
            }
            EngineCommand::Ask {
                request_id,
                question,
            } => {
                let result = match self.stored_credential() {
                    Ok(credential) => self.backend.ask(credential.expose(), &question).await,
                    Err(err) => Err(err),
                };
                EngineEvent::AnswerReceived { request_id, result }
            }
            EngineCommand::SchedulePoll { epoch } => {
                tokio::time::sleep(self.poll_interval).await;
                EngineEvent::PollDue { epoch }
            }
        }
    }

    /// The credential is re-read for every request so a cleared key takes effect immediately.
    fn stored_credential(&self) -> Result<ApiKey, ClientError> {
        self.store
            .get()
            .map_err(|err| ClientError::CredentialStore(err.to_string()))?
            .ok_or(ClientError::MissingCredential)
    }
}
