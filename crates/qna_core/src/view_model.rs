use crate::{ChatMessage, InitState, StatusLine};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub init: InitState,
    pub status: Option<StatusLine>,
    pub chat_enabled: bool,
    pub credential_present: bool,
    pub messages: Vec<ChatMessage>,
    pub pending_requests: usize,
    pub dirty: bool,
}
