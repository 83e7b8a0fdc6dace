use crate::view_model::AppViewModel;

/// Generation counter; bumped on every credential change and cycle restart.
pub type Epoch = u64;
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InitState {
    #[default]
    NoKey,
    Unchecked,
    Checking,
    Initializing { progress: u8, status: String },
    Ready,
    Failed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Bot,
    Info,
    Error,
    /// Transient placeholder shown while a question is outstanding.
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub seq: u64,
    pub role: MessageRole,
    pub text: String,
    pub request_id: Option<RequestId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    epoch: Epoch,
    credential_present: bool,
    init: InitState,
    status: Option<StatusLine>,
    messages: Vec<ChatMessage>,
    next_seq: u64,
    next_request_id: RequestId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            init: self.init.clone(),
            status: self.status.clone(),
            chat_enabled: self.chat_enabled(),
            credential_present: self.credential_present,
            messages: self.messages.clone(),
            pending_requests: self
                .messages
                .iter()
                .filter(|message| message.role == MessageRole::Loading)
                .count(),
            dirty: self.dirty,
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn init_state(&self) -> &InitState {
        &self.init
    }

    /// Chat input is enabled exactly while the backend is ready.
    pub fn chat_enabled(&self) -> bool {
        self.init == InitState::Ready
    }

    pub fn credential_present(&self) -> bool {
        self.credential_present
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns whether anything visible changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn bump_epoch(&mut self) -> Epoch {
        self.epoch += 1;
        self.epoch
    }

    pub(crate) fn set_init(&mut self, init: InitState) {
        if self.init != init {
            self.init = init;
            self.dirty = true;
        }
    }

    pub(crate) fn set_credential_present(&mut self, present: bool) {
        if self.credential_present != present {
            self.credential_present = present;
            self.dirty = true;
        }
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>, severity: Severity) {
        self.status = Some(StatusLine {
            text: text.into(),
            severity,
        });
        self.dirty = true;
    }

    pub(crate) fn push_message(
        &mut self,
        role: MessageRole,
        text: impl Into<String>,
        request_id: Option<RequestId>,
    ) -> u64 {
        self.next_seq += 1;
        self.messages.push(ChatMessage {
            seq: self.next_seq,
            role,
            text: text.into(),
            request_id,
        });
        self.dirty = true;
        self.next_seq
    }

    /// Removes the loading placeholder for `request_id`, if still shown.
    pub(crate) fn remove_placeholder(&mut self, request_id: RequestId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|message| {
            !(message.role == MessageRole::Loading && message.request_id == Some(request_id))
        });
        let removed = self.messages.len() != before;
        self.dirty |= removed;
        removed
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id
    }
}
