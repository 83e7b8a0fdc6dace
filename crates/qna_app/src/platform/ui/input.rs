use qna_core::{Credential, Msg};

/// What a line typed at the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Dispatch(Msg),
    ShowStatus,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

pub fn parse_line(line: &str) -> InputAction {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return InputAction::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return InputAction::Dispatch(Msg::QuestionSubmitted(trimmed.to_owned()));
    };

    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    match name {
        "key" => InputAction::Dispatch(Msg::CredentialEntered(Credential::new(argument))),
        "clear" => InputAction::Dispatch(Msg::CredentialCleared),
        "retry" => InputAction::Dispatch(Msg::CredentialConfirmed),
        "status" => InputAction::ShowStatus,
        "help" | "?" => InputAction::Help,
        "quit" | "exit" => InputAction::Quit,
        other => InputAction::Unknown(other.to_owned()),
    }
}
