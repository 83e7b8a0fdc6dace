//! Terminal host for the chat client: wiring between stdin, the core state
//! machine and the engine.
mod app;
mod cli;
mod config;
mod effects;
mod logging;
mod ui;

pub use app::run_app;
