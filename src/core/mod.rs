pub mod app;
#[cfg(not(target_arch = "wasm32"))]
pub mod cli;
pub mod command_queue;
pub mod config;
pub mod events;
pub mod state;
pub mod util;
