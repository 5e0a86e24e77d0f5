pub mod config;
pub mod error;
pub mod flags;
pub mod memory;
pub mod run_wrapper;
