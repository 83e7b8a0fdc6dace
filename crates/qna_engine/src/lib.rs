//! QnA engine: backend HTTP client, credential storage and effect execution.
mod client;
mod credential;
mod engine;
mod persist;
mod settings;
mod types;

pub use client::{Backend, ReqwestBackend};
pub use credential::{
    default_data_dir, masked_display, ApiKey, CredentialError, CredentialStore,
    FileCredentialStore, MemoryCredentialStore, CREDENTIAL_FILENAME, MASK_CHAR,
};
pub use engine::EngineHandle;
pub use persist::{ensure_data_dir, AtomicFileWriter, PersistError};
pub use settings::BackendSettings;
pub use types::{
    Answer, ClientError, EngineError, EngineEvent, Epoch, InitializeStatus, RequestId, Source,
    StatusResponse,
};
