use qna_logging::qna_debug;

use crate::{
    AppState, Effect, Epoch, InitState, InitializeReply, MessageRole, Msg, Severity, SourceRef,
    StatusReport,
};

const WELCOME: &str = "Welcome to the **Q&A** assistant! I answer questions about the indexed \
books.\nEnter your API key with `/key <value>` to get started.";
const PROMPT_FOR_KEY: &str = "Please enter your API key to begin";
const SAVED: &str = "API key saved successfully!";
const READY: &str = "Ready to answer your questions!";
const LOADING: &str = "Thinking...";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Startup { credential_present } => {
            state.push_message(MessageRole::Info, WELCOME, None);
            state.set_credential_present(credential_present);
            if credential_present {
                begin_cycle(&mut state)
            } else {
                state.set_init(InitState::NoKey);
                state.set_status(PROMPT_FOR_KEY, Severity::Info);
                Vec::new()
            }
        }
        Msg::CredentialEntered(credential) => {
            if credential.is_blank() {
                state.set_status("Please enter an API key", Severity::Error);
                return (state, Vec::new());
            }
            // Any poll still in flight belongs to the previous key.
            let epoch = state.bump_epoch();
            state.set_init(InitState::NoKey);
            state.set_status("Verifying API key...", Severity::Info);
            vec![Effect::VerifyCredential {
                epoch,
                credential: credential.trimmed(),
            }]
        }
        Msg::CredentialVerified {
            epoch,
            credential,
            result,
        } => {
            if is_stale(&state, epoch, "credential verification") {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => vec![Effect::PersistCredential { epoch, credential }],
                Err(reason) => {
                    state.set_status(
                        format!("Failed to verify API key: {reason}"),
                        Severity::Error,
                    );
                    if state.credential_present() {
                        state.set_init(InitState::Failed { reason });
                    } else {
                        state.set_init(InitState::NoKey);
                    }
                    Vec::new()
                }
            }
        }
        Msg::CredentialPersisted { epoch } => {
            if is_stale(&state, epoch, "credential persistence") {
                return (state, Vec::new());
            }
            state.set_credential_present(true);
            let effects = begin_cycle(&mut state);
            state.set_status(SAVED, Severity::Success);
            effects
        }
        Msg::CredentialPersistFailed {
            epoch,
            reason,
            still_stored,
        } => {
            if is_stale(&state, epoch, "credential persistence failure") {
                return (state, Vec::new());
            }
            state.set_credential_present(still_stored);
            state.set_status(format!("Could not save API key: {reason}"), Severity::Error);
            settle_after_store_error(&mut state, reason, still_stored);
            Vec::new()
        }
        Msg::CredentialClearFailed {
            reason,
            still_stored,
        } => {
            state.set_credential_present(still_stored);
            state.set_status(
                format!("Could not remove stored API key: {reason}"),
                Severity::Error,
            );
            settle_after_store_error(&mut state, reason, still_stored);
            Vec::new()
        }
        Msg::CredentialCleared => {
            state.bump_epoch();
            state.set_credential_present(false);
            state.set_init(InitState::NoKey);
            state.set_status("API key cleared", Severity::Info);
            vec![Effect::ClearCredential]
        }
        Msg::CredentialConfirmed => {
            if state.credential_present() {
                begin_cycle(&mut state)
            } else {
                state.set_status(PROMPT_FOR_KEY, Severity::Error);
                vec![Effect::PromptCredential]
            }
        }
        Msg::StatusReceived { epoch, result } => {
            if is_stale(&state, epoch, "status response") {
                return (state, Vec::new());
            }
            if !matches!(
                state.init_state(),
                InitState::Unchecked | InitState::Initializing { .. }
            ) {
                qna_debug!(
                    "Ignoring status response in state {:?}",
                    state.init_state()
                );
                return (state, Vec::new());
            }
            match result {
                Ok(report) => apply_status_report(&mut state, epoch, report),
                Err(reason) => {
                    fail(&mut state, reason);
                    Vec::new()
                }
            }
        }
        Msg::InitializeReceived { epoch, result } => {
            if is_stale(&state, epoch, "initialize response") {
                return (state, Vec::new());
            }
            if *state.init_state() != InitState::Checking {
                qna_debug!(
                    "Ignoring initialize response in state {:?}",
                    state.init_state()
                );
                return (state, Vec::new());
            }
            match result {
                Ok(InitializeReply::Started) => {
                    enter_initializing(&mut state, epoch, 0, "Initialization started".into())
                }
                Ok(InitializeReply::InProgress { progress }) => enter_initializing(
                    &mut state,
                    epoch,
                    progress.unwrap_or(0),
                    "Initialization in progress".into(),
                ),
                Ok(InitializeReply::Complete) => {
                    become_ready(&mut state);
                    Vec::new()
                }
                Ok(InitializeReply::Rejected(reason)) | Err(reason) => {
                    fail(&mut state, reason);
                    Vec::new()
                }
            }
        }
        Msg::PollDue { epoch } => {
            if is_stale(&state, epoch, "poll timer") {
                return (state, Vec::new());
            }
            match state.init_state() {
                InitState::Initializing { .. } => vec![Effect::QueryStatus { epoch }],
                _ => Vec::new(),
            }
        }
        Msg::QuestionSubmitted(raw) => {
            let question = raw.trim();
            if question.is_empty() {
                return (state, Vec::new());
            }
            if !state.credential_present() {
                state.set_status("Please set your API key first", Severity::Error);
                return (state, vec![Effect::PromptCredential]);
            }
            if !state.chat_enabled() {
                state.set_status("The assistant is not ready yet", Severity::Error);
                return (state, Vec::new());
            }
            let question = question.to_owned();
            state.push_message(MessageRole::User, question.clone(), None);
            let request_id = state.allocate_request_id();
            state.push_message(MessageRole::Loading, LOADING, Some(request_id));
            vec![Effect::AskQuestion {
                request_id,
                question,
            }]
        }
        Msg::AnswerReceived { request_id, result } => {
            state.remove_placeholder(request_id);
            match result {
                Ok(answer) => {
                    state.push_message(MessageRole::Bot, answer.answer, None);
                    if !answer.sources.is_empty() {
                        state.push_message(
                            MessageRole::Info,
                            format_sources(&answer.sources),
                            None,
                        );
                    }
                    Vec::new()
                }
                Err(failure) => {
                    state.push_message(
                        MessageRole::Error,
                        format!("Sorry, I encountered an error: {}", failure.detail),
                        None,
                    );
                    if failure.credential_rejected {
                        state.set_status(
                            "Your API key was rejected. Please enter a new one.",
                            Severity::Error,
                        );
                        vec![Effect::PromptCredential]
                    } else {
                        Vec::new()
                    }
                }
            }
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Numbered source list shown below an answer; untitled entries fall back to `Source N`.
pub fn format_sources(sources: &[SourceRef]) -> String {
    let lines = sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let number = index + 1;
            match source.title.as_deref().filter(|title| !title.is_empty()) {
                Some(title) => format!("{number}. {title}"),
                None => format!("{number}. Source {number}"),
            }
        })
        .collect::<Vec<_>>();
    format!("Sources:\n{}", lines.join("\n"))
}

fn is_stale(state: &AppState, epoch: Epoch, what: &str) -> bool {
    if epoch == state.epoch() {
        return false;
    }
    qna_debug!(
        "Dropping stale {} for epoch {} (current {})",
        what,
        epoch,
        state.epoch()
    );
    true
}

fn begin_cycle(state: &mut AppState) -> Vec<Effect> {
    let epoch = state.bump_epoch();
    state.set_init(InitState::Unchecked);
    state.set_status("Checking initialization status...", Severity::Info);
    vec![Effect::QueryStatus { epoch }]
}

fn apply_status_report(state: &mut AppState, epoch: Epoch, report: StatusReport) -> Vec<Effect> {
    if report.initialized {
        become_ready(state);
        return Vec::new();
    }
    if report.initializing {
        let status = report.status.unwrap_or_else(|| "Initializing".to_owned());
        return enter_initializing(state, epoch, report.progress.unwrap_or(0), status);
    }
    if let Some(reason) = report.error {
        fail(state, reason);
        return Vec::new();
    }
    state.set_init(InitState::Checking);
    state.set_status("Starting initialization...", Severity::Info);
    vec![Effect::StartInitialization { epoch }]
}

fn enter_initializing(
    state: &mut AppState,
    epoch: Epoch,
    progress: u8,
    status: String,
) -> Vec<Effect> {
    let progress = progress.min(100);
    state.set_status(format!("{status} ({progress}%)"), Severity::Info);
    state.set_init(InitState::Initializing { progress, status });
    vec![Effect::SchedulePoll { epoch }]
}

/// A credential left in the store keeps `/retry` usable; otherwise wait for a new one.
fn settle_after_store_error(state: &mut AppState, reason: String, still_stored: bool) {
    if still_stored {
        state.set_init(InitState::Failed { reason });
    } else {
        state.set_init(InitState::NoKey);
    }
}

fn become_ready(state: &mut AppState) {
    state.set_init(InitState::Ready);
    state.set_status(READY, Severity::Success);
}

fn fail(state: &mut AppState, reason: String) {
    state.set_status(format!("Initialization error: {reason}"), Severity::Error);
    state.set_init(InitState::Failed { reason });
}
