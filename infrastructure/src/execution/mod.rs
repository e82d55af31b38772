//! Child process execution and output capture.

pub(crate) mod output;
pub mod runner;

pub use runner::SystemProcessRunner;
