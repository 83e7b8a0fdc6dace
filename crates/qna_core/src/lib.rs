//! QnA core: pure initialization/chat state machine and view-model helpers.
mod credential;
mod effect;
pub mod markup;
mod msg;
mod state;
mod update;
mod view_model;

pub use credential::Credential;
pub use effect::Effect;
pub use msg::{Answer, AskFailure, InitializeReply, Msg, SourceRef, StatusReport};
pub use state::{
    AppState, ChatMessage, Epoch, InitState, MessageRole, RequestId, Severity, StatusLine,
};
pub use update::{format_sources, update};
pub use view_model::AppViewModel;
