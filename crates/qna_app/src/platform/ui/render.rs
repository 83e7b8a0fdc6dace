use chrono::Local;
use qna_core::markup::{self, render_inline};
use qna_core::{AppViewModel, ChatMessage, InitState, MessageRole, Severity, StatusLine};

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";

/// Turns view models into terminal lines, printing each chat message once.
#[derive(Debug, Default)]
pub struct Renderer {
    last_seq: Option<u64>,
    last_status: Option<StatusLine>,
    chat_enabled: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut lines = Vec::new();
        let time = Local::now().format("%H:%M:%S").to_string();

        for message in &view.messages {
            if self.last_seq.is_some_and(|seen| message.seq <= seen) {
                continue;
            }
            lines.push(format_message(message, &time));
            self.last_seq = Some(message.seq);
        }

        if view.status != self.last_status {
            if let Some(status) = &view.status {
                lines.push(format_status(status));
            }
            self.last_status = view.status.clone();
        }

        if view.chat_enabled != self.chat_enabled {
            lines.push(prompt_line(view).to_string());
            self.chat_enabled = view.chat_enabled;
        }

        lines
    }
}

pub fn format_message(message: &ChatMessage, time: &str) -> String {
    let body = render_inline(&message.text, &markup::ANSI);
    match message.role {
        MessageRole::User => format!("{DIM}[{time}]{RESET} you: {body}"),
        MessageRole::Bot => format!("{DIM}[{time}]{RESET} {CYAN}assistant:{RESET} {body}"),
        MessageRole::Info => format!("{DIM}[{time}]{RESET} {GREEN}{body}{RESET}"),
        MessageRole::Error => format!("{DIM}[{time}]{RESET} {RED}{body}{RESET}"),
        MessageRole::Loading => format!("{DIM}[{time}] {body}{RESET}"),
    }
}

pub fn format_status(status: &StatusLine) -> String {
    let color = match status.severity {
        Severity::Info => DIM,
        Severity::Success => GREEN,
        Severity::Error => RED,
    };
    format!("{color}-- {} --{RESET}", status.text)
}

pub fn prompt_line(view: &AppViewModel) -> &'static str {
    if view.chat_enabled {
        "Ask me anything about the books... (/help for commands)"
    } else if view.credential_present {
        "Chat is paused until the assistant is ready. /retry to check again."
    } else {
        credential_hint()
    }
}

/// One-line description of the coordinator state for `/status`.
pub fn describe_init(init: &InitState) -> String {
    match init {
        InitState::NoKey => "waiting for an API key".to_string(),
        InitState::Unchecked => "key stored, status not checked yet".to_string(),
        InitState::Checking => "checking backend status".to_string(),
        InitState::Initializing { progress, status } => {
            format!("initializing: {status} ({progress}%)")
        }
        InitState::Ready => "ready".to_string(),
        InitState::Failed { reason } => format!("failed: {reason}"),
    }
}

pub fn credential_hint() -> &'static str {
    "Enter your API key with: /key <your-api-key>"
}

pub fn help_text() -> &'static str {
    "Commands:\n  \
     /key <value>  verify and store an API key\n  \
     /clear        remove the stored API key\n  \
     /retry        re-check the backend with the stored key\n  \
     /status       show connection details\n  \
     /help         show this help\n  \
     /quit         leave\n\
     Anything else is sent as a question."
}
