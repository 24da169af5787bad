//! Error types for dialog-core.

pub mod dialog_errors;

pub use dialog_errors::{DialogError, DialogResult};
