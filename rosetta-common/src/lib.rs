//! Common types and utilities shared across Rosetta Robot crates.
//!
//! This crate defines the shared error type and observability helpers used
//! throughout the workspace. It stays dependency-minimal so that every crate
//! can depend on it without pulling in the HTTP or HTML stacks.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`RobotError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use rosetta_common::RobotError;
//!
//! let err = RobotError::Wiki("login failed".into());
//! assert_eq!(err.to_string(), "Wiki error: login failed");
//! ```

pub mod observability;

/// Error types used across the Rosetta Robot workspace.
///
/// "Not found" outcomes (no URL, no edit link, no textarea) are never errors;
/// they are modelled as `Option` by the extractors.
#[derive(thiserror::Error, Debug)]
pub enum RobotError {
    /// Reading a source file or scratch directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The external documentation generator failed or produced unusable output.
    #[error("Doc generator error: {0}")]
    DocGen(String),

    /// The wiki rejected a login or edit, or answered with an unexpected shape.
    #[error("Wiki error: {0}")]
    Wiki(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`RobotError`].
pub type Result<T> = std::result::Result<T, RobotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.rs")?)
        }
        let err = read().unwrap_err();
        assert!(matches!(err, RobotError::Io(_)));
        assert!(err.to_string().starts_with("IO error:"));
    }
}
