//! Math Helper - an interactive command line helper for algebra and calculus
//!
//! Free-text queries such as `solve x+1=2` or `derivative x^2` are
//! classified by trigger keyword and forwarded to an algebra engine through
//! the `AlgebraEngine` trait. The bundled `SymbolicEngine` adapts the
//! `symb_anafis` computer algebra library.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod engine;
pub mod utils;

// Re-export core types and traits for easier use
pub use self::core::{
    dispatcher::{Dispatcher, Response},
    query::{Action, MatchMode, Query},
    traits::AlgebraEngine,
};
pub use commands::repl::{Session, SessionState};
pub use engine::{EngineError, EngineResult, SymbolicEngine};

/// Build a dispatcher over the bundled engine from a loaded configuration
pub fn dispatcher_from_config(config: &config::Config) -> Dispatcher<SymbolicEngine> {
    Dispatcher::new(SymbolicEngine::with_precision(config.engine.precision))
        .with_variable(config.engine.variable.clone())
        .with_match_mode(config.general.match_mode)
}
