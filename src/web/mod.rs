//! Thin HTTP surface over the pipeline

pub mod server;

pub use server::{router, start_server, status_for, AppState};
