use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use qna_core::{update, AppState, Effect, Msg};
use qna_engine::{
    masked_display, CredentialStore, EngineHandle, FileCredentialStore, MemoryCredentialStore,
};
use qna_logging::{qna_info, qna_warn};

use super::cli::Cli;
use super::effects::EffectRunner;
use super::ui::input::{parse_line, InputAction};
use super::ui::render::{self, Renderer};
use super::{config, logging};

const INPUT_POLL: Duration = Duration::from_millis(20);

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    config.validate()?;

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(config.log, level);
    qna_info!("qna-chat starting against {}", config.base_url);

    let store: Arc<dyn CredentialStore> = if cli.ephemeral {
        Arc::new(MemoryCredentialStore::new())
    } else {
        Arc::new(FileCredentialStore::new(config.data_dir()))
    };
    let credential_present = match store.get() {
        Ok(credential) => credential.is_some(),
        Err(err) => {
            qna_warn!("Ignoring unreadable stored API key: {}", err);
            false
        }
    };

    let engine = EngineHandle::new(config.backend_settings(), store.clone())
        .context("failed to start backend engine")?;
    let mut app = App {
        state: AppState::new(),
        runner: EffectRunner::new(engine, store.clone()),
        renderer: Renderer::new(),
        store,
        base_url: config.base_url.clone(),
    };

    let input_rx = spawn_input_reader()?;
    app.dispatch(Msg::Startup { credential_present });

    loop {
        for msg in app.runner.drain_events() {
            app.dispatch(msg);
        }
        match input_rx.recv_timeout(INPUT_POLL) {
            Ok(InputAction::Dispatch(msg)) => app.dispatch(msg),
            Ok(InputAction::ShowStatus) => app.show_status(),
            Ok(InputAction::Help) => app.print(render::help_text()),
            Ok(InputAction::Unknown(command)) => {
                app.print(&format!("Unknown command /{command}; type /help for a list."))
            }
            Ok(InputAction::Empty) => {}
            Ok(InputAction::Quit) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => app.dispatch(Msg::Tick),
        }
    }

    qna_info!("qna-chat exiting");
    Ok(())
}

fn spawn_input_reader() -> io::Result<mpsc::Receiver<InputAction>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("qna-input".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let action = parse_line(&line);
                let quit = action == InputAction::Quit;
                if tx.send(action).is_err() || quit {
                    break;
                }
            }
        })?;
    Ok(rx)
}

struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    store: Arc<dyn CredentialStore>,
    base_url: String,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;

        if was_dirty {
            let view = self.state.view();
            for line in self.renderer.render(&view) {
                self.print(&line);
            }
        }

        let mut follow_ups = Vec::new();
        for effect in effects {
            if effect == Effect::PromptCredential {
                self.print(render::credential_hint());
            }
            if let Some(msg) = self.runner.run(effect) {
                follow_ups.push(msg);
            }
        }
        for msg in follow_ups {
            self.dispatch(msg);
        }
    }

    fn show_status(&self) {
        let stored = match self.store.get() {
            Ok(Some(key)) => masked_display(key.expose()),
            Ok(None) => "(none)".to_string(),
            Err(err) => format!("(unreadable: {err})"),
        };
        let view = self.state.view();
        self.print(&format!(
            "Backend: {}\nAPI key: {}\nState: {}\nChat enabled: {}\nPending questions: {}",
            self.base_url,
            stored,
            render::describe_init(&view.init),
            view.chat_enabled,
            view.pending_requests,
        ));
    }

    fn print(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{text}");
        let _ = stdout.flush();
    }
}
