use std::sync::Once;

use pretty_assertions::assert_eq;
use qna_core::{
    update, AppState, Effect, Epoch, InitState, InitializeReply, Msg, Severity, StatusReport,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(qna_logging::initialize_for_tests);
}

fn start_with_stored_key() -> (AppState, Epoch) {
    let (state, effects) = update(
        AppState::new(),
        Msg::Startup {
            credential_present: true,
        },
    );
    match effects.as_slice() {
        [Effect::QueryStatus { epoch }] => (state, *epoch),
        other => panic!("unexpected startup effects: {other:?}"),
    }
}

fn initializing(progress: u8) -> StatusReport {
    StatusReport {
        initializing: true,
        progress: Some(progress),
        ..StatusReport::default()
    }
}

fn initialized() -> StatusReport {
    StatusReport {
        initialized: true,
        ..StatusReport::default()
    }
}

fn status(state: AppState, epoch: Epoch, report: StatusReport) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusReceived {
            epoch,
            result: Ok(report),
        },
    )
}

#[test]
fn startup_without_key_waits_for_credential() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::Startup {
            credential_present: false,
        },
    );

    assert!(effects.is_empty());
    assert_eq!(*state.init_state(), InitState::NoKey);
    assert!(!state.chat_enabled());
    let view = state.view();
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.status.unwrap().severity, Severity::Info);
}

#[test]
fn startup_with_key_queries_status() {
    init_logging();
    let (state, epoch) = start_with_stored_key();

    assert_eq!(*state.init_state(), InitState::Unchecked);
    assert_eq!(epoch, state.epoch());
}

#[test]
fn scripted_progress_reaches_ready_and_enables_chat_once() {
    init_logging();
    let (mut state, epoch) = start_with_stored_key();
    let script = [initializing(10), initializing(90), initialized()];

    let mut observed = Vec::new();
    let mut enabled = Vec::new();
    for (index, report) in script.into_iter().enumerate() {
        let (next, effects) = status(state, epoch, report);
        observed.push(next.init_state().clone());
        enabled.push(next.chat_enabled());
        state = next;

        if index < 2 {
            assert_eq!(effects, vec![Effect::SchedulePoll { epoch }]);
            let (next, effects) = update(state, Msg::PollDue { epoch });
            assert_eq!(effects, vec![Effect::QueryStatus { epoch }]);
            state = next;
        } else {
            assert!(effects.is_empty());
        }
    }

    assert_eq!(
        observed,
        vec![
            InitState::Initializing {
                progress: 10,
                status: "Initializing".to_string(),
            },
            InitState::Initializing {
                progress: 90,
                status: "Initializing".to_string(),
            },
            InitState::Ready,
        ]
    );
    assert_eq!(enabled, vec![false, false, true]);
    let line = state.view().status.unwrap();
    assert_eq!(line.text, "Ready to answer your questions!");
    assert_eq!(line.severity, Severity::Success);
}

#[test]
fn progress_status_text_is_shown() {
    init_logging();
    let (state, epoch) = start_with_stored_key();
    let report = StatusReport {
        initializing: true,
        status: Some("Building index".to_string()),
        progress: Some(42),
        ..StatusReport::default()
    };

    let (state, _) = status(state, epoch, report);

    assert_eq!(state.view().status.unwrap().text, "Building index (42%)");
}

#[test]
fn reported_error_fails_and_keeps_chat_disabled() {
    init_logging();
    let (state, epoch) = start_with_stored_key();
    let report = StatusReport {
        error: Some("bad key".to_string()),
        ..StatusReport::default()
    };

    let (state, effects) = status(state, epoch, report);

    assert!(effects.is_empty());
    assert_eq!(
        *state.init_state(),
        InitState::Failed {
            reason: "bad key".to_string()
        }
    );
    assert!(!state.chat_enabled());
    let line = state.view().status.unwrap();
    assert_eq!(line.severity, Severity::Error);
    assert!(line.text.contains("bad key"));
}

#[test]
fn transport_failure_is_terminal_without_retry() {
    init_logging();
    let (state, epoch) = start_with_stored_key();

    let (state, effects) = update(
        state,
        Msg::StatusReceived {
            epoch,
            result: Err("http status 502".to_string()),
        },
    );

    assert!(effects.is_empty());
    assert!(matches!(state.init_state(), InitState::Failed { .. }));

    // Timers from the failed cycle do nothing.
    let (state, effects) = update(state, Msg::PollDue { epoch });
    assert!(effects.is_empty());
    assert!(matches!(state.init_state(), InitState::Failed { .. }));
}

#[test]
fn idle_backend_triggers_initialize_request() {
    init_logging();
    let (state, epoch) = start_with_stored_key();

    let (state, effects) = status(state, epoch, StatusReport::default());

    assert_eq!(*state.init_state(), InitState::Checking);
    assert_eq!(effects, vec![Effect::StartInitialization { epoch }]);
    assert_eq!(state.view().status.unwrap().text, "Starting initialization...");
}

#[test]
fn initialize_started_polls_until_ready() {
    init_logging();
    let (state, epoch) = start_with_stored_key();
    let (state, _) = status(state, epoch, StatusReport::default());

    let (state, effects) = update(
        state,
        Msg::InitializeReceived {
            epoch,
            result: Ok(InitializeReply::Started),
        },
    );
    assert_eq!(effects, vec![Effect::SchedulePoll { epoch }]);
    assert!(matches!(
        state.init_state(),
        InitState::Initializing { progress: 0, .. }
    ));

    let (state, effects) = update(state, Msg::PollDue { epoch });
    assert_eq!(effects, vec![Effect::QueryStatus { epoch }]);

    let (state, _) = status(state, epoch, initialized());
    assert!(state.chat_enabled());
}

#[test]
fn initialize_in_progress_keeps_reported_progress() {
    init_logging();
    let (state, epoch) = start_with_stored_key();
    let (state, _) = status(state, epoch, StatusReport::default());

    let (state, effects) = update(
        state,
        Msg::InitializeReceived {
            epoch,
            result: Ok(InitializeReply::InProgress { progress: Some(55) }),
        },
    );

    assert_eq!(effects, vec![Effect::SchedulePoll { epoch }]);
    assert!(matches!(
        state.init_state(),
        InitState::Initializing { progress: 55, .. }
    ));
}

#[test]
fn initialize_complete_is_ready_immediately() {
    init_logging();
    let (state, epoch) = start_with_stored_key();
    let (state, _) = status(state, epoch, StatusReport::default());

    let (state, effects) = update(
        state,
        Msg::InitializeReceived {
            epoch,
            result: Ok(InitializeReply::Complete),
        },
    );

    assert!(effects.is_empty());
    assert!(state.chat_enabled());
}

#[test]
fn initialize_rejection_and_transport_error_fail() {
    init_logging();
    for result in [
        Ok(InitializeReply::Rejected("quota exceeded".to_string())),
        Err("quota exceeded".to_string()),
    ] {
        let (state, epoch) = start_with_stored_key();
        let (state, _) = status(state, epoch, StatusReport::default());

        let (state, effects) = update(state, Msg::InitializeReceived { epoch, result });

        assert!(effects.is_empty());
        assert_eq!(
            *state.init_state(),
            InitState::Failed {
                reason: "quota exceeded".to_string()
            }
        );
    }
}

#[test]
fn stale_responses_do_not_overwrite_newer_state() {
    init_logging();
    let (state, old_epoch) = start_with_stored_key();
    let (mut state, _) = update(state, Msg::CredentialCleared);
    assert!(state.consume_dirty());

    let (mut state, effects) = status(state, old_epoch, initialized());
    assert!(effects.is_empty());
    assert_eq!(*state.init_state(), InitState::NoKey);
    assert!(!state.chat_enabled());
    assert!(!state.consume_dirty());

    let (mut state, effects) = update(state, Msg::PollDue { epoch: old_epoch });
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());

    let (state, effects) = update(
        state,
        Msg::InitializeReceived {
            epoch: old_epoch,
            result: Ok(InitializeReply::Complete),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(*state.init_state(), InitState::NoKey);
}

#[test]
fn responses_after_ready_are_ignored() {
    init_logging();
    let (state, epoch) = start_with_stored_key();
    let (state, _) = status(state, epoch, initialized());

    let (state, effects) = status(state, epoch, initializing(5));

    assert!(effects.is_empty());
    assert_eq!(*state.init_state(), InitState::Ready);
}

#[test]
fn confirming_credential_restarts_cycle_with_new_epoch() {
    init_logging();
    let (state, epoch) = start_with_stored_key();
    let (state, _) = update(
        state,
        Msg::StatusReceived {
            epoch,
            result: Err("network error".to_string()),
        },
    );

    let (state, effects) = update(state, Msg::CredentialConfirmed);

    assert_eq!(*state.init_state(), InitState::Unchecked);
    assert_eq!(
        effects,
        vec![Effect::QueryStatus {
            epoch: state.epoch()
        }]
    );
    assert_ne!(state.epoch(), epoch);
}

#[test]
fn confirming_without_credential_prompts() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::CredentialConfirmed);

    assert_eq!(effects, vec![Effect::PromptCredential]);
    assert_eq!(*state.init_state(), InitState::NoKey);
}
