//! smsledger-cli: configuration, the processing pass and daemon mode behind the `smsledger` binary.

pub mod config;
pub mod daemon;
pub mod home;
pub mod pipeline;

pub use config::{Config, load_config};
pub use daemon::{SignalSleeper, Sleeper, Wake, run_daemon};
pub use pipeline::{PassSummary, process_all};
