//! AI walking-tour generator.
//!
//! The backend (`server`, `service`) builds schema-constrained prompts
//! (`prompt`), forwards them to an LLM `provider`, and recovers stop records
//! from the reply (`normalize`). The front-end pieces (`wizard`, `render`,
//! `map`) are pure state machines driven by the terminal client in `walk`.

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod geocode;
pub mod log;
pub mod map;
pub mod normalize;
pub mod prompt;
pub mod provider;
pub mod render;
pub mod server;
pub mod service;
pub mod ux;
pub mod walk;
pub mod wire;
pub mod wizard;
