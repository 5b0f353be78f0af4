//! hintd library - exposes modules for the binary and tests.

pub mod capture;
pub mod config;
pub mod game_context;
pub mod llm;
pub mod resolver;
pub mod routes;
pub mod search;
pub mod server;
pub mod service;

pub use config::Config;
pub use service::HintService;
