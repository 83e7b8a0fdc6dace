use qna_core::{update, AppState, Credential, Effect, Epoch, InitState, Msg, Severity};

fn entered(state: AppState, raw: &str) -> (AppState, Vec<Effect>) {
    update(state, Msg::CredentialEntered(Credential::new(raw)))
}

#[test]
fn blank_credential_is_rejected() {
    let state = AppState::new();

    let (next, effects) = entered(state.clone(), "   ");

    assert!(effects.is_empty());
    assert_eq!(next.epoch(), state.epoch());
    let line = next.view().status.unwrap();
    assert_eq!(line.text, "Please enter an API key");
    assert_eq!(line.severity, Severity::Error);
}

#[test]
fn entered_credential_is_trimmed_and_verified() {
    let (state, effects) = entered(AppState::new(), "  sk-test-123 \n");

    assert_eq!(
        effects,
        vec![Effect::VerifyCredential {
            epoch: state.epoch(),
            credential: Credential::new("sk-test-123"),
        }]
    );
    assert_eq!(*state.init_state(), InitState::NoKey);
    assert!(!state.credential_present());
}

fn verified(raw: &str) -> (AppState, Epoch) {
    let (state, _) = entered(AppState::new(), raw);
    let epoch = state.epoch();
    let (state, effects) = update(
        state,
        Msg::CredentialVerified {
            epoch,
            credential: Credential::new(raw),
            result: Ok(()),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::PersistCredential {
            epoch,
            credential: Credential::new(raw),
        }]
    );
    (state, epoch)
}

#[test]
fn verified_credential_is_persisted_before_cycle_starts() {
    let (state, epoch) = verified("sk-test-123");

    // Nothing talks to the backend until the store confirms.
    assert!(!state.credential_present());
    assert_eq!(*state.init_state(), InitState::NoKey);

    let (state, effects) = update(state, Msg::CredentialPersisted { epoch });

    assert!(state.credential_present());
    assert_eq!(*state.init_state(), InitState::Unchecked);
    assert!(state.epoch() > epoch);
    assert_eq!(
        effects,
        vec![Effect::QueryStatus {
            epoch: state.epoch()
        }]
    );
    let line = state.view().status.unwrap();
    assert_eq!(line.text, "API key saved successfully!");
    assert_eq!(line.severity, Severity::Success);
}

#[test]
fn failed_verification_without_stored_key_returns_to_no_key() {
    let (state, _) = entered(AppState::new(), "sk-wrong");
    let epoch = state.epoch();

    let (state, effects) = update(
        state,
        Msg::CredentialVerified {
            epoch,
            credential: Credential::new("sk-wrong"),
            result: Err("http status 401".to_string()),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(*state.init_state(), InitState::NoKey);
    assert!(!state.credential_present());
    assert!(state
        .view()
        .status
        .unwrap()
        .text
        .starts_with("Failed to verify API key"));
}

#[test]
fn failed_verification_with_stored_key_is_failed_state() {
    let (state, _) = update(
        AppState::new(),
        Msg::Startup {
            credential_present: true,
        },
    );
    let (state, _) = entered(state, "sk-other");
    let epoch = state.epoch();

    let (state, _) = update(
        state,
        Msg::CredentialVerified {
            epoch,
            credential: Credential::new("sk-other"),
            result: Err("network error".to_string()),
        },
    );

    assert_eq!(
        *state.init_state(),
        InitState::Failed {
            reason: "network error".to_string()
        }
    );
}

#[test]
fn superseded_verification_is_ignored() {
    let (state, _) = entered(AppState::new(), "sk-first");
    let first_epoch = state.epoch();
    let (state, _) = entered(state, "sk-second");

    let (state, effects) = update(
        state,
        Msg::CredentialVerified {
            epoch: first_epoch,
            credential: Credential::new("sk-first"),
            result: Ok(()),
        },
    );

    assert!(effects.is_empty());
    assert!(!state.credential_present());
}

#[test]
fn clearing_twice_matches_clearing_once() {
    let (state, _) = update(
        AppState::new(),
        Msg::Startup {
            credential_present: true,
        },
    );

    let (once, first_effects) = update(state, Msg::CredentialCleared);
    let (twice, second_effects) = update(once.clone(), Msg::CredentialCleared);

    assert_eq!(once.view(), twice.view());
    assert_eq!(first_effects, vec![Effect::ClearCredential]);
    assert_eq!(second_effects, first_effects);
    assert!(!twice.credential_present());
    assert_eq!(*twice.init_state(), InitState::NoKey);
}

#[test]
fn persist_failure_without_older_key_waits_for_a_new_one() {
    let (state, epoch) = verified("sk-test");

    let (state, effects) = update(
        state,
        Msg::CredentialPersistFailed {
            epoch,
            reason: "read-only file system".to_string(),
            still_stored: false,
        },
    );

    assert!(effects.is_empty());
    assert!(!state.credential_present());
    assert_eq!(*state.init_state(), InitState::NoKey);
    let line = state.view().status.unwrap();
    assert_eq!(line.text, "Could not save API key: read-only file system");
    assert_eq!(line.severity, Severity::Error);
}

#[test]
fn persist_failure_keeps_older_stored_key_usable() {
    let (state, _) = update(
        AppState::new(),
        Msg::Startup {
            credential_present: true,
        },
    );
    let (state, _) = entered(state, "sk-new");
    let epoch = state.epoch();
    let (state, _) = update(
        state,
        Msg::CredentialVerified {
            epoch,
            credential: Credential::new("sk-new"),
            result: Ok(()),
        },
    );

    let (state, _) = update(
        state,
        Msg::CredentialPersistFailed {
            epoch,
            reason: "disk full".to_string(),
            still_stored: true,
        },
    );

    assert!(state.credential_present());
    assert_eq!(
        *state.init_state(),
        InitState::Failed {
            reason: "disk full".to_string()
        }
    );
    let (state, effects) = update(state, Msg::CredentialConfirmed);
    assert_eq!(
        effects,
        vec![Effect::QueryStatus {
            epoch: state.epoch()
        }]
    );
}

#[test]
fn failed_clear_reports_the_key_is_still_stored() {
    let (state, _) = update(
        AppState::new(),
        Msg::Startup {
            credential_present: true,
        },
    );
    let (state, _) = update(state, Msg::CredentialCleared);

    let (state, effects) = update(
        state,
        Msg::CredentialClearFailed {
            reason: "permission denied".to_string(),
            still_stored: true,
        },
    );

    assert!(effects.is_empty());
    assert!(state.credential_present());
    let line = state.view().status.unwrap();
    assert_eq!(
        line.text,
        "Could not remove stored API key: permission denied"
    );
    assert_eq!(line.severity, Severity::Error);
    let (_, effects) = update(state, Msg::CredentialConfirmed);
    assert!(matches!(effects.as_slice(), [Effect::QueryStatus { .. }]));
}

#[test]
fn stale_persist_confirmation_is_ignored() {
    let (state, epoch) = verified("sk-first");
    let (state, _) = entered(state, "sk-second");

    let (state, effects) = update(state, Msg::CredentialPersisted { epoch });

    assert!(effects.is_empty());
    assert!(!state.credential_present());
}

#[test]
fn credential_debug_output_is_redacted() {
    let effect = Effect::PersistCredential {
        epoch: 1,
        credential: Credential::new("sk-secret-value"),
    };

    let printed = format!("{effect:?}");

    assert!(!printed.contains("sk-secret-value"));
    assert!(printed.contains("15 chars"));
}
