//! Report rendering and output.

pub mod generator;

pub use generator::{write_report, OutputFormat};
