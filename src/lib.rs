mod app;
pub mod config;
mod error;
pub mod invoker;
pub mod metrics;
pub mod server;

pub use app::{run, run_with_runner};
pub use error::ExporterError;
